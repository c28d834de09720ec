//! Pure constraint predicates over a [Board]. None of these mutate the
//! board or carry state between calls.

use std::collections::BTreeSet;
use std::num::NonZeroU8;

use bitvec::prelude::*;
use itertools::iproduct;

use crate::board::Board;

/// Returns whether `value` can occupy `(col, row)` without clashing with
/// another cell in the same row, column or box.
///
/// The cell at `(col, row)` itself is excluded from the scan, so the
/// predicate gives the same answer whether or not the candidate has
/// already been written to the board. Empty cells never conflict.
pub fn is_placeable(board: &Board, col: usize, row: usize, value: NonZeroU8) -> bool {
    let size = board.size();
    let value = Some(value);

    for i in 0..size {
        if i != col && board.value(i, row) == value {
            return false;
        }
        if i != row && board.value(col, i) == value {
            return false;
        }
    }

    let box_size = board.box_size();
    let col_offset = (col / box_size) * box_size;
    let row_offset = (row / box_size) * box_size;
    for (c, r) in iproduct!(0..box_size, 0..box_size) {
        let (c, r) = (col_offset + c, row_offset + r);
        if (c, r) != (col, row) && board.value(c, r) == value {
            return false;
        }
    }

    true
}

/// Checks every non-empty cell against the row/column/box constraints and
/// returns the coordinates of all offenders. The full set is returned, not
/// just the first hit, so a view can flag every conflicting cell. An empty
/// set means the board is consistent.
pub fn find_conflicts(board: &Board) -> BTreeSet<(usize, usize)> {
    let mut conflicts = BTreeSet::new();
    for (col, row) in board.coords() {
        if let Some(value) = board.value(col, row) {
            if !is_placeable(board, col, row, value) {
                conflicts.insert((col, row));
            }
        }
    }
    conflicts
}

/// Returns whether the board is completely and validly solved: no empty
/// cells, and every row, column and box holds each of 1..=N exactly once.
pub fn is_solved(board: &Board) -> bool {
    if !board.is_filled() {
        return false;
    }

    let size = board.size();
    let box_size = board.box_size();

    let row_cells = |row: usize| (0..size).map(move |col| (col, row));
    let col_cells = |col: usize| (0..size).map(move |row| (col, row));
    let box_cells = move |box_col: usize, box_row: usize| {
        iproduct!(0..box_size, 0..box_size)
            .map(move |(c, r)| (box_col * box_size + c, box_row * box_size + r))
    };

    (0..size).all(|row| house_is_complete(board, row_cells(row)))
        && (0..size).all(|col| house_is_complete(board, col_cells(col)))
        && iproduct!(0..box_size, 0..box_size)
            .all(|(bc, br)| house_is_complete(board, box_cells(bc, br)))
}

fn house_is_complete(board: &Board, cells: impl Iterator<Item = (usize, usize)>) -> bool {
    let mut seen = bitvec![0; board.size()];
    for (col, row) in cells {
        let Some(value) = board.value(col, row) else {
            return false;
        };
        let index = usize::from(value.get()) - 1;
        if seen[index] {
            return false;
        }
        seen.set(index, true);
    }
    seen.all()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(value: u8) -> NonZeroU8 {
        NonZeroU8::new(value).unwrap()
    }

    #[test]
    fn placeable_on_empty_board() {
        let board = Board::new_empty(9).unwrap();
        for value in 1..=9 {
            assert!(is_placeable(&board, 4, 4, v(value)));
        }
    }

    #[test]
    fn row_column_and_box_conflicts() {
        let board = Board::from_str(
            "
            1__4
            ____
            __2_
            ____
        ",
        )
        .unwrap();
        // same row as the 1
        assert!(!is_placeable(&board, 2, 0, v(1)));
        // same column as the 1
        assert!(!is_placeable(&board, 0, 3, v(1)));
        // same box as the 1
        assert!(!is_placeable(&board, 1, 1, v(1)));
        // no clash
        assert!(is_placeable(&board, 1, 1, v(3)));
        assert!(is_placeable(&board, 3, 1, v(2)));
        // the 2 at (2, 2) blocks its own column and box
        assert!(!is_placeable(&board, 2, 0, v(2)));
        assert!(!is_placeable(&board, 3, 3, v(2)));
    }

    #[test]
    fn cell_excludes_itself() {
        let mut board = Board::new_empty(4).unwrap();
        board.set(1, 2, Some(v(3))).unwrap();
        // Already-placed value doesn't conflict with itself.
        assert!(is_placeable(&board, 1, 2, v(3)));
        // But it does conflict with its row, column and box neighbours.
        assert!(!is_placeable(&board, 3, 2, v(3)));
        assert!(!is_placeable(&board, 1, 0, v(3)));
        assert!(!is_placeable(&board, 0, 3, v(3)));
    }

    #[test]
    fn find_conflicts_on_consistent_board() {
        let board = Board::from_str(
            "
            1__4
            ____
            __2_
            ____
        ",
        )
        .unwrap();
        assert!(find_conflicts(&board).is_empty());
    }

    #[test]
    fn find_conflicts_flags_every_offender() {
        // Two 3s in row 1 and a 1/1 pair sharing the top-left box.
        let board = Board::from_str(
            "
            1___
            31_3
            ____
            ____
        ",
        )
        .unwrap();
        let conflicts = find_conflicts(&board);
        let expected: BTreeSet<_> = [(0, 0), (0, 1), (1, 1), (3, 1)].into_iter().collect();
        assert_eq!(expected, conflicts);
    }

    #[test]
    fn solved_board_is_recognized() {
        let board = Board::from_str(
            "
            12 34
            34 12

            21 43
            43 21
        ",
        )
        .unwrap();
        assert!(is_solved(&board));
    }

    #[test]
    fn incomplete_board_is_not_solved() {
        let board = Board::from_str(
            "
            12 34
            34 12

            21 43
            43 2_
        ",
        )
        .unwrap();
        assert!(!is_solved(&board));
    }

    #[test]
    fn duplicate_in_house_is_not_solved() {
        // Rows are permutations, but columns and boxes repeat values.
        let board = Board::from_str(
            "
            12 34
            12 34

            21 43
            21 43
        ",
        )
        .unwrap();
        assert!(!is_solved(&board));
    }
}
