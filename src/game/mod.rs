// Game state: the cell grid, round bookkeeping, and message dispatch.

pub mod cell;
pub mod round;
pub mod state;
