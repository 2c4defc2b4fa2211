use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Piece {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl Piece {
    /// Lowercase FEN letter for this piece kind.
    pub fn to_char(self) -> char {
        match self {
            Piece::Pawn => 'p',
            Piece::Knight => 'n',
            Piece::Bishop => 'b',
            Piece::Rook => 'r',
            Piece::Queen => 'q',
            Piece::King => 'k',
        }
    }

    pub fn from_char(c: char) -> Option<Piece> {
        match c.to_ascii_lowercase() {
            'p' => Some(Piece::Pawn),
            'n' => Some(Piece::Knight),
            'b' => Some(Piece::Bishop),
            'r' => Some(Piece::Rook),
            'q' => Some(Piece::Queen),
            'k' => Some(Piece::King),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row delta of a forward step. Row 0 is rank 8, so White moves up.
    pub fn forward(&self) -> i32 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    /// Row of this side's back rank.
    pub fn home_row(&self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

/// A board coordinate. Row 0 is rank 8 and col 0 is file a.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square {
    pub row: u8,
    pub col: u8,
}

impl Square {
    /// Returns `None` when either coordinate falls outside 0..8.
    pub fn new(row: i32, col: i32) -> Option<Square> {
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(Square {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    pub fn from_algebraic(s: &str) -> Option<Square> {
        let mut chars = s.chars();
        let file = chars.next()?;
        let rank = chars.next()?;
        if chars.next().is_some() || !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
            return None;
        }
        let col = file as i32 - 'a' as i32;
        let row = 8 - (rank as i32 - '0' as i32);
        Square::new(row, col)
    }

    /// Chess rank number, 1..=8.
    pub fn rank(&self) -> u8 {
        8 - self.row
    }

    pub fn offset(&self, d_row: i32, d_col: i32) -> Option<Square> {
        Square::new(self.row as i32 + d_row, self.col as i32 + d_col)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.col) as char, self.rank())
    }
}

/// Castling availability inferred from home-square occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut result = String::new();
        if self.white_kingside {
            result.push('K');
        }
        if self.white_queenside {
            result.push('Q');
        }
        if self.black_kingside {
            result.push('k');
        }
        if self.black_queenside {
            result.push('q');
        }
        if result.is_empty() {
            result.push('-');
        }
        write!(f, "{}", result)
    }
}

/// An 8x8 grid of optional pieces, indexed `[row][col]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    squares: [[Option<(Piece, Color)>; 8]; 8],
}

const BACK_RANK: [Piece; 8] = [
    Piece::Rook,
    Piece::Knight,
    Piece::Bishop,
    Piece::Queen,
    Piece::King,
    Piece::Bishop,
    Piece::Knight,
    Piece::Rook,
];

impl Board {
    pub fn empty() -> Self {
        Self {
            squares: [[None; 8]; 8],
        }
    }

    pub fn new_standard() -> Self {
        let mut board = Board::empty();
        for col in 0..8 {
            board.squares[0][col] = Some((BACK_RANK[col], Color::Black));
            board.squares[1][col] = Some((Piece::Pawn, Color::Black));
            board.squares[6][col] = Some((Piece::Pawn, Color::White));
            board.squares[7][col] = Some((BACK_RANK[col], Color::White));
        }
        board
    }

    /// Parses the placement field of a FEN string. Any trailing FEN fields are
    /// ignored. Unrecognised characters and overflowing ranks are skipped, so
    /// the affected squares simply stay empty.
    pub fn from_placement(placement: &str) -> Self {
        let mut board = Board::empty();
        let field = placement.split_whitespace().next().unwrap_or("");

        for (row, rank) in field.split('/').take(8).enumerate() {
            let mut col = 0usize;
            for c in rank.chars() {
                if col >= 8 {
                    break;
                }
                if let Some(run) = c.to_digit(10) {
                    col += run as usize;
                    continue;
                }
                if let Some(piece) = Piece::from_char(c) {
                    let color = if c.is_ascii_uppercase() {
                        Color::White
                    } else {
                        Color::Black
                    };
                    board.squares[row][col] = Some((piece, color));
                }
                col += 1;
            }
        }
        board
    }

    /// Placement field only: ranks top to bottom, empty runs as digits.
    pub fn placement(&self) -> String {
        let mut fen = String::new();
        for (row, rank) in self.squares.iter().enumerate() {
            let mut empty = 0;
            for cell in rank {
                match cell {
                    None => empty += 1,
                    Some((piece, color)) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        let c = piece.to_char();
                        fen.push(if *color == Color::White {
                            c.to_ascii_uppercase()
                        } else {
                            c
                        });
                    }
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if row < 7 {
                fen.push('/');
            }
        }
        fen
    }

    /// Full position string handed to the rules oracle. Move counters are
    /// fixed at `0 1`.
    pub fn to_placement(&self, turn: Color, en_passant: Option<Square>) -> String {
        let side = match turn {
            Color::White => "w",
            Color::Black => "b",
        };
        let ep = en_passant
            .map(|sq| sq.to_string())
            .unwrap_or_else(|| "-".to_string());
        format!("{} {} {} {} 0 1", self.placement(), side, self.castling_rights(), ep)
    }

    /// King and rook on their home squares. Earlier moves are not tracked.
    pub fn castling_rights(&self) -> CastlingRights {
        let home = |color: Color, col: u8, piece: Piece| {
            self.squares[color.home_row() as usize][col as usize] == Some((piece, color))
        };
        let white_king = home(Color::White, 4, Piece::King);
        let black_king = home(Color::Black, 4, Piece::King);
        CastlingRights {
            white_kingside: white_king && home(Color::White, 7, Piece::Rook),
            white_queenside: white_king && home(Color::White, 0, Piece::Rook),
            black_kingside: black_king && home(Color::Black, 7, Piece::Rook),
            black_queenside: black_king && home(Color::Black, 0, Piece::Rook),
        }
    }

    pub fn get_piece_at(&self, square: Square) -> Option<(Piece, Color)> {
        self.squares[square.row as usize][square.col as usize]
    }

    pub fn set(&mut self, square: Square, cell: Option<(Piece, Color)>) {
        self.squares[square.row as usize][square.col as usize] = cell;
    }

    /// Moves whatever stands on `from` to `to` without any legality check.
    pub fn move_piece_raw(&mut self, from: Square, to: Square) {
        let piece = self.get_piece_at(from);
        self.set(to, piece);
        self.set(from, None);
    }

    /// Iterates every occupied square.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece, Color)> + '_ {
        self.squares.iter().enumerate().flat_map(|(row, rank)| {
            rank.iter().enumerate().filter_map(move |(col, cell)| {
                cell.map(|(piece, color)| {
                    (
                        Square {
                            row: row as u8,
                            col: col as u8,
                        },
                        piece,
                        color,
                    )
                })
            })
        })
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new_standard()
    }
}

impl Board {
    /// Text grid with rank and file labels. `flipped` draws the board from
    /// Black's side: rank 1 on top and the h-file on the left.
    pub fn render(&self, flipped: bool) -> String {
        let order: Vec<usize> = if flipped { (0..8).rev().collect() } else { (0..8).collect() };
        let mut result = String::new();
        for &row in &order {
            result.push_str(&format!("{} ", 8 - row));
            for (i, &col) in order.iter().enumerate() {
                match self.squares[row][col] {
                    Some((piece, Color::White)) => result.push(piece.to_char().to_ascii_uppercase()),
                    Some((piece, Color::Black)) => result.push(piece.to_char()),
                    None => result.push('.'),
                }
                if i < 7 {
                    result.push(' ');
                }
            }
            result.push('\n');
        }
        result.push_str(if flipped { "  h g f e d c b a\n" } else { "  a b c d e f g h\n" });
        result
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.render(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";

    #[test]
    fn test_standard_layout() {
        let board = Board::new_standard();
        for col in 0..8 {
            assert_eq!(board.squares[6][col], Some((Piece::Pawn, Color::White)));
            assert_eq!(board.squares[1][col], Some((Piece::Pawn, Color::Black)));
        }
        assert_eq!(board.squares[7][4], Some((Piece::King, Color::White)));
        assert_eq!(board.squares[0][3], Some((Piece::Queen, Color::Black)));
        assert!(board.squares[2..6].iter().all(|rank| rank.iter().all(|c| c.is_none())));
    }

    #[test]
    fn test_start_position_string() {
        let board = Board::new_standard();
        assert_eq!(board.to_placement(Color::White, None), format!("{} w KQkq - 0 1", START));
        assert_eq!(board.to_placement(Color::Black, None), format!("{} b KQkq - 0 1", START));
    }

    #[test]
    fn test_placement_round_trip() {
        let board = Board::new_standard();
        for turn in [Color::White, Color::Black] {
            assert_eq!(Board::from_placement(&board.to_placement(turn, None)), board);
        }

        let midgame = "r1bqk2r/pppp1ppp/2n2n2/2b1p3/2B1P3/5N2/PPPP1PPP/RNBQK2R";
        assert_eq!(Board::from_placement(midgame).placement(), midgame);
    }

    #[test]
    fn test_en_passant_field() {
        let board = Board::new_standard();
        let target = Square::from_algebraic("e3");
        assert!(board.to_placement(Color::Black, target).ends_with("b KQkq e3 0 1"));
    }

    #[test]
    fn test_tolerant_parse() {
        let board = Board::from_placement("rnbqkbnr/ppxppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        assert_eq!(board.squares[1][2], None);
        assert_eq!(board.squares[1][3], Some((Piece::Pawn, Color::Black)));

        // Overlong ranks and missing ranks must not panic.
        let board = Board::from_placement("KKKKKKKKKKKK/9/p");
        assert_eq!(board.squares[0][7], Some((Piece::King, Color::White)));
        assert_eq!(board.squares[2][0], Some((Piece::Pawn, Color::Black)));
        assert_eq!(Board::from_placement(""), Board::empty());
    }

    #[test]
    fn test_castling_rights_from_occupancy() {
        let board = Board::from_placement("r3k3/8/8/8/8/8/8/4K2R");
        let rights = board.castling_rights();
        assert!(rights.white_kingside);
        assert!(!rights.white_queenside);
        assert!(!rights.black_kingside);
        assert!(rights.black_queenside);
        assert_eq!(rights.to_string(), "Kq");

        let bare = Board::from_placement("8/8/8/3k4/8/8/8/3K4");
        assert_eq!(bare.castling_rights().to_string(), "-");
    }

    #[test]
    fn test_move_piece_raw() {
        let mut board = Board::new_standard();
        let from = Square::from_algebraic("g1").unwrap();
        let to = Square::from_algebraic("e2").unwrap();
        board.move_piece_raw(from, to);
        assert_eq!(board.get_piece_at(to), Some((Piece::Knight, Color::White)));
        assert_eq!(board.get_piece_at(from), None);
    }

    #[test]
    fn test_render_orientation() {
        let board = Board::new_standard();
        let normal = board.render(false);
        assert!(normal.starts_with("8 r n b q k b n r\n"));
        assert!(normal.ends_with("1 R N B Q K B N R\n  a b c d e f g h\n"));
        assert_eq!(board.to_string(), normal);

        let flipped = board.render(true);
        assert!(flipped.starts_with("1 R N B K Q B N R\n"));
        assert!(flipped.ends_with("8 r n b k q b n r\n  h g f e d c b a\n"));
    }

    #[test]
    fn test_square_conversions() {
        let e4 = Square::from_algebraic("e4").unwrap();
        assert_eq!((e4.row, e4.col), (4, 4));
        assert_eq!(e4.to_string(), "e4");
        assert_eq!(Square::new(0, 0).unwrap().to_string(), "a8");
        assert!(Square::new(-1, 0).is_none());
        assert!(Square::new(0, 8).is_none());
        assert!(Square::from_algebraic("i1").is_none());
        assert!(Square::from_algebraic("e44").is_none());
    }
}
