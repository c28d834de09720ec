use std::num::NonZeroU8;

use log::trace;

use crate::board::Board;
use crate::constraint;
use crate::epoch::Epoch;

/// The progress callback fires on every [PROGRESS_INTERVAL]-th successful
/// placement of a derived value. Rendering every single step would drown
/// the view; this keeps feedback visible without dominating the search.
pub const PROGRESS_INTERVAL: u64 = 10;

/// Runs the exhaustive backtracking search over `board`, mutating it in
/// place. Returns `true` with the board fully solved, or `false` if the
/// search exhausted all assignments or was cancelled.
///
/// Cancellation is cooperative: the search compares `epoch.current()`
/// against `epoch_snapshot` at every step and unwinds as soon as they
/// differ. The two `false` cases are not distinguished here; the caller
/// tells them apart by re-checking the epoch after the call returns.
///
/// Givens must already be consistent (see [constraint::find_conflicts]);
/// the search skips them without re-validation.
pub fn solve(
    board: &mut Board,
    epoch: &Epoch,
    epoch_snapshot: u64,
    on_progress: &mut dyn FnMut(&Board),
) -> bool {
    let mut search = Search {
        epoch,
        epoch_snapshot,
        placements: 0,
        on_progress,
    };
    let solved = fill_from(board, 0, &mut search);
    trace!(
        "search finished: solved={solved}, placements={}",
        search.placements
    );
    solved
}

struct Search<'a> {
    epoch: &'a Epoch,
    epoch_snapshot: u64,
    placements: u64,
    on_progress: &'a mut dyn FnMut(&Board),
}

impl Search<'_> {
    #[inline]
    fn cancelled(&self) -> bool {
        self.epoch.current() != self.epoch_snapshot
    }

    fn record_placement(&mut self, board: &Board) {
        self.placements += 1;
        if self.placements % PROGRESS_INTERVAL == 0 {
            (self.on_progress)(board);
        }
    }
}

// Cells are visited in column-major order: `pos` counts rows first, then
// columns. The order only determines which solution is found first, not
// whether one is found.
//
// Invariant: when this returns false for any reason other than
// cancellation, the derived cell at `pos` has been reset to empty. A stale
// value left behind would corrupt the constraint checks of the caller that
// resumes trying candidates one level up.
fn fill_from(board: &mut Board, pos: usize, search: &mut Search<'_>) -> bool {
    let size = board.size();
    if pos == size * size {
        // Walked past the last column; every cell is assigned consistently.
        return true;
    }
    let (col, row) = (pos / size, pos % size);

    if board.cell(col, row).is_given() {
        // A given contributes exactly one fixed candidate, validated
        // before the search started.
        if search.cancelled() {
            return false;
        }
        return fill_from(board, pos + 1, search);
    }

    for candidate in 1..=size as u8 {
        if search.cancelled() {
            // Abort the whole call chain; the board stays in whatever
            // partial state the search had reached.
            return false;
        }

        let candidate = NonZeroU8::new(candidate).unwrap();
        if !constraint::is_placeable(board, col, row, candidate) {
            // Don't descend into a branch that is already invalid.
            continue;
        }

        board.set_derived(col, row, Some(candidate));
        search.record_placement(board);

        if fill_from(board, pos + 1, search) {
            // First solution wins, no further candidates tried.
            return true;
        }
    }

    // All candidates failed; backtrack.
    board.set_derived(col, row, None);
    false
}
