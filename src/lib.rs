mod board;
mod constraint;
mod epoch;
mod session;
mod solver;
mod view;

pub use board::{Board, BoardError, Cell, MAX_SIZE};
pub use constraint::{find_conflicts, is_placeable, is_solved};
pub use epoch::Epoch;
pub use session::{SolveEvent, SolveEvents, SolveOutcome, SolveSession};
pub use solver::{solve, PROGRESS_INTERVAL};
pub use view::BoardView;
