use crate::board::{Board, Color, Piece, Square};

const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (-2, -1), (-2, 1), (-1, -2), (-1, 2),
    (1, -2), (1, 2), (2, -1), (2, 1),
];

/// Whether `side`'s king is attacked. Used to annotate history only; the rules
/// oracle decides legality.
pub fn is_in_check(board: &Board, side: Color) -> bool {
    // Find the king's square
    let king_square = board
        .pieces()
        .find(|&(_, piece, color)| piece == Piece::King && color == side)
        .map(|(square, _, _)| square);

    let king_square = match king_square {
        Some(square) => square,
        None => return false,
    };

    board
        .pieces()
        .filter(|&(_, _, color)| color == side.opposite())
        .any(|(square, piece, color)| attacks(board, square, piece, color, king_square))
}

/// Whether the `piece` of `color` standing on `from` attacks `target`.
pub fn attacks(board: &Board, from: Square, piece: Piece, color: Color, target: Square) -> bool {
    let d_row = target.row as i32 - from.row as i32;
    let d_col = target.col as i32 - from.col as i32;

    match piece {
        // Pawns attack diagonally forward only
        Piece::Pawn => d_row == color.forward() && d_col.abs() == 1,
        Piece::Knight => KNIGHT_OFFSETS
            .iter()
            .any(|&(dr, dc)| dr == d_row && dc == d_col),
        Piece::King => d_row.abs() <= 1 && d_col.abs() <= 1 && from != target,
        Piece::Bishop => is_diagonal(d_row, d_col) && path_clear(board, from, target),
        Piece::Rook => is_straight(d_row, d_col) && path_clear(board, from, target),
        Piece::Queen => {
            (is_diagonal(d_row, d_col) || is_straight(d_row, d_col))
                && path_clear(board, from, target)
        }
    }
}

fn is_diagonal(d_row: i32, d_col: i32) -> bool {
    d_row.abs() == d_col.abs() && d_row != 0
}

fn is_straight(d_row: i32, d_col: i32) -> bool {
    (d_row == 0) != (d_col == 0)
}

// Walks from `from` toward `to`; any occupied square before `to` blocks.
fn path_clear(board: &Board, from: Square, to: Square) -> bool {
    let step_row = (to.row as i32 - from.row as i32).signum();
    let step_col = (to.col as i32 - from.col as i32).signum();

    let mut current = from;
    loop {
        current = match current.offset(step_row, step_col) {
            Some(square) => square,
            None => return false,
        };
        if current == to {
            return true;
        }
        if board.get_piece_at(current).is_some() {
            return false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_check_at_start() {
        let board = Board::new_standard();
        assert!(!is_in_check(&board, Color::White));
        assert!(!is_in_check(&board, Color::Black));
    }

    #[test]
    fn test_missing_king_is_not_check() {
        let board = Board::from_placement("8/8/8/8/8/8/8/R7");
        assert!(!is_in_check(&board, Color::Black));
    }

    #[test]
    fn test_rook_and_blocker() {
        let board = Board::from_placement("4k3/8/8/8/8/8/8/4R1K1");
        assert!(is_in_check(&board, Color::Black));

        let blocked = Board::from_placement("4k3/8/8/4p3/8/8/8/4R1K1");
        assert!(!is_in_check(&blocked, Color::Black));
    }

    #[test]
    fn test_bishop_and_queen_diagonals() {
        let board = Board::from_placement("4k3/8/8/b7/8/8/8/4K3");
        assert!(is_in_check(&board, Color::White));

        let board = Board::from_placement("4k3/8/8/8/8/8/8/Q3K2q");
        assert!(is_in_check(&board, Color::White));
        assert!(!is_in_check(&board, Color::Black));

        // Same rank for a bishop is no attack
        let board = Board::from_placement("4k3/8/8/8/8/8/8/b3K3");
        assert!(!is_in_check(&board, Color::White));
    }

    #[test]
    fn test_pawn_direction() {
        // White pawn on d7 attacks e8
        let board = Board::from_placement("4k3/3P4/8/8/8/8/8/4K3");
        assert!(is_in_check(&board, Color::Black));

        // Black pawn on d2 attacks e1, but a black pawn behind the king does not
        let board = Board::from_placement("4k3/8/8/8/8/8/3p4/4K3");
        assert!(is_in_check(&board, Color::White));
        let board = Board::from_placement("4k3/8/8/8/8/8/4K3/3p4");
        assert!(!is_in_check(&board, Color::White));
    }

    #[test]
    fn test_knight_does_not_wrap() {
        let board = Board::from_placement("4k3/8/8/8/8/5n2/8/4K3");
        assert!(is_in_check(&board, Color::White));

        // An h-file knight cannot reach the a-file
        let board = Board::from_placement("4k3/8/8/8/8/8/7n/K7");
        assert!(!is_in_check(&board, Color::White));
    }

    #[test]
    fn test_adjacent_kings() {
        let board = Board::from_placement("8/8/8/3kK3/8/8/8/8");
        assert!(is_in_check(&board, Color::White));
        assert!(is_in_check(&board, Color::Black));
    }
}
