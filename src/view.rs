use std::collections::BTreeSet;

use crate::board::Board;

/// The rendering surface the session reports into. Widget construction,
/// input capture and painting all live behind this boundary; the session
/// only tells the view what happened.
///
/// All methods are invoked on the thread that pumps
/// [SolveEvents](crate::SolveEvents), never on the search thread.
pub trait BoardView {
    /// Locks or unlocks all cells for direct user editing.
    fn set_editable(&mut self, editable: bool);

    /// Paints the current values. The view can distinguish givens from
    /// derived values through [Board::cell](crate::Board::cell).
    fn render(&mut self, board: &Board);

    /// Marks the cells found inconsistent during pre-solve validation.
    fn flag_invalid(&mut self, cells: &BTreeSet<(usize, usize)>);

    /// The search exhausted all assignments without finding a solution.
    fn report_unsolvable(&mut self);

    /// The operator-supplied givens conflict with each other.
    fn report_validation_failure(&mut self);
}
