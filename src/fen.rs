//! FEN 解析和生成
//!
//! 格式: `<棋盘> <行棋方> <易位权> <过路兵格> <半回合计数> <回合数>`
//!
//! 棋盘符号：
//! - 白方：K Q R B N P
//! - 黑方：k q r b n p
//! - 空格：数字 (1-8)
//!
//! 易位权映射到王和车的 `has_moved` 标记；最后两段可省略（默认 0 和 1）。

use crate::board::Board;
use crate::game::{GameState, LegalMove};
use crate::types::{Color, Piece, PieceType, Position};

/// 标准开局 FEN
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// 解析 FEN 字符串
pub fn parse_fen(fen: &str) -> Result<GameState, String> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    if parts.len() < 4 || parts.len() > 6 {
        return Err(format!(
            "Invalid FEN format: expected '<board> <turn> <castling> <en-passant> [halfmove] [fullmove]', got: {}",
            fen
        ));
    }

    let mut board = parse_board(parts[0])?;

    let turn = match parts[1] {
        "w" | "b" => parts[1].chars().next().and_then(Color::from_fen_char),
        _ => None,
    }
    .ok_or_else(|| format!("Invalid turn: {}", parts[1]))?;

    apply_castling_rights(&mut board, parts[2])?;

    let en_passant = parse_en_passant(parts[3])?;

    let half_move_clock = match parts.get(4) {
        Some(s) => s
            .parse::<u32>()
            .map_err(|_| format!("Invalid halfmove clock: {}", s))?,
        None => 0,
    };
    let full_move_number = match parts.get(5) {
        Some(s) => s
            .parse::<u32>()
            .map_err(|_| format!("Invalid fullmove number: {}", s))?
            .max(1),
        None => 1,
    };

    for color in [Color::White, Color::Black] {
        if board.find_king(color).is_none() {
            return Err(format!("Missing {} king", color));
        }
    }

    Ok(GameState::from_position(
        board,
        turn,
        en_passant,
        half_move_clock,
        full_move_number,
    ))
}

/// 解析棋盘字符串
///
/// 王和车先标记为已移动，之后由易位权还原；不在起始行的兵标记为已移动。
fn parse_board(board_str: &str) -> Result<Board, String> {
    let rows: Vec<&str> = board_str.split('/').collect();
    if rows.len() != 8 {
        return Err(format!("Invalid board: expected 8 rows, got {}", rows.len()));
    }

    let mut board = Board::empty();
    for (row_idx, row_str) in rows.iter().enumerate() {
        let row = row_idx as i8;
        let mut col: i8 = 0;

        for ch in row_str.chars() {
            if let Some(skip) = ch.to_digit(10) {
                if !(1..=8).contains(&skip) {
                    return Err(format!("Invalid empty count '{}' in row {}", ch, row_idx + 1));
                }
                col += skip as i8;
                if col > 8 {
                    return Err(format!("Row {} is too long: {}", row_idx + 1, row_str));
                }
            } else {
                let piece = Piece::from_fen_char(ch)
                    .ok_or_else(|| format!("Invalid piece char: {}", ch))?;
                if col >= 8 {
                    return Err(format!("Row {} is too long: {}", row_idx + 1, row_str));
                }
                let moved = match piece.piece_type {
                    PieceType::Pawn => row != piece.color.pawn_start_row(),
                    PieceType::King | PieceType::Rook => true,
                    _ => false,
                };
                let piece = if moved { piece.moved() } else { piece };
                board.set(Position::new(row, col), Some(piece));
                col += 1;
            }
        }

        if col != 8 {
            return Err(format!(
                "Row {} must describe 8 squares, got {}: {}",
                row_idx + 1,
                col,
                row_str
            ));
        }
    }

    Ok(board)
}

/// 把易位权映射到王和车的 `has_moved` 标记
fn apply_castling_rights(board: &mut Board, rights: &str) -> Result<(), String> {
    if rights == "-" {
        return Ok(());
    }

    for ch in rights.chars() {
        let (color, rook_col) = match ch {
            'K' => (Color::White, 7),
            'Q' => (Color::White, 0),
            'k' => (Color::Black, 7),
            'q' => (Color::Black, 0),
            _ => return Err(format!("Invalid castling rights: {}", rights)),
        };
        let row = color.back_rank();
        let king_pos = Position::new(row, 4);
        let rook_pos = Position::new(row, rook_col);

        let king = board
            .get(king_pos)
            .filter(|p| p.piece_type == PieceType::King && p.color == color);
        let rook = board
            .get(rook_pos)
            .filter(|p| p.piece_type == PieceType::Rook && p.color == color);

        // 缺少对应的王或车时忽略该项
        if let (Some(king), Some(rook)) = (king, rook) {
            board.set(king_pos, Some(Piece { has_moved: false, ..king }));
            board.set(rook_pos, Some(Piece { has_moved: false, ..rook }));
        }
    }

    Ok(())
}

fn parse_en_passant(s: &str) -> Result<Option<Position>, String> {
    if s == "-" {
        return Ok(None);
    }
    let pos = Position::from_algebraic(s).ok_or_else(|| format!("Invalid en passant square: {}", s))?;
    if pos.row != 2 && pos.row != 5 {
        return Err(format!("En passant square must be on rank 3 or 6: {}", s));
    }
    Ok(Some(pos))
}

/// 根据王和车的移动标记生成易位权字段
pub fn castling_field(board: &Board) -> String {
    let mut field = String::new();
    for (color, rights) in [(Color::White, ['K', 'Q']), (Color::Black, ['k', 'q'])] {
        let row = color.back_rank();
        let unmoved = |col: i8, piece_type: PieceType| {
            board.get(Position::new(row, col)).map_or(false, |p| {
                p.piece_type == piece_type && p.color == color && !p.has_moved
            })
        };
        if !unmoved(4, PieceType::King) {
            continue;
        }
        if unmoved(7, PieceType::Rook) {
            field.push(rights[0]);
        }
        if unmoved(0, PieceType::Rook) {
            field.push(rights[1]);
        }
    }
    if field.is_empty() {
        field.push('-');
    }
    field
}

/// 生成 FEN 字符串
pub fn to_fen(state: &GameState) -> String {
    let en_passant = state
        .en_passant_target
        .map_or_else(|| "-".to_string(), |p| p.to_algebraic());

    format!(
        "{} {} {} {} {} {}",
        state.board.placement(),
        state.current_player.to_fen_char(),
        castling_field(&state.board),
        en_passant,
        state.half_move_clock,
        state.full_move_number
    )
}

/// 在 FEN 上执行走法（坐标记法），返回新的 FEN
pub fn apply_move_to_fen(fen: &str, move_str: &str) -> Result<String, String> {
    let state = parse_fen(fen)?;
    let mv = LegalMove::from_coordinate(move_str)?;
    let next = state.apply(&mv).map_err(|e| e.to_string())?;
    Ok(to_fen(&next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_positions::KIWIPETE;

    #[test]
    fn test_parse_initial_fen() {
        let state = parse_fen(START_FEN).unwrap();

        assert_eq!(state.board, Board::initial());
        assert_eq!(state.current_player, Color::White);
        assert_eq!(state.en_passant_target, None);
        assert_eq!(state.half_move_clock, 0);
        assert_eq!(state.full_move_number, 1);
        assert!(state.move_history.is_empty());
        assert!(state.position_history.is_empty());
    }

    #[test]
    fn test_fen_roundtrip() {
        for fen in [
            START_FEN,
            KIWIPETE,
            "r3k2r/8/8/8/8/8/8/R3K2R b Kq - 3 17",
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
            "8/8/8/8/8/8/8/K1k5 w - - 0 1",
        ] {
            let state = parse_fen(fen).unwrap();
            assert_eq!(to_fen(&state), fen);
        }
    }

    #[test]
    fn test_castling_rights_map_to_has_moved() {
        let state = parse_fen("r3k2r/8/8/8/8/8/8/R3K2R w Kq - 0 1").unwrap();
        let board = &state.board;
        let at = |s: &str| board.get(Position::from_algebraic(s).unwrap()).unwrap();

        assert!(!at("e1").has_moved);
        assert!(!at("h1").has_moved);
        assert!(at("a1").has_moved);
        assert!(!at("e8").has_moved);
        assert!(!at("a8").has_moved);
        assert!(at("h8").has_moved);

        let rights = board.castling_rights(Color::White);
        assert!(rights.kingside);
        assert!(!rights.queenside);
    }

    #[test]
    fn test_short_fen_defaults_counters() {
        let state = parse_fen("4k3/8/8/8/8/8/8/4K3 b - -").unwrap();
        assert_eq!(state.current_player, Color::Black);
        assert_eq!(state.half_move_clock, 0);
        assert_eq!(state.full_move_number, 1);
    }

    #[test]
    fn test_invalid_fen() {
        assert!(parse_fen("").is_err());
        assert!(parse_fen("8/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(parse_fen("rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").is_err());
        assert!(parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1").is_err());
        assert!(parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQxq - 0 1").is_err());
        assert!(parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e4 0 1").is_err());
        assert!(parse_fen("8/8/8/8/8/8/8/4K3 w - - 0 1").is_err());
    }

    #[test]
    fn test_flags_from_position() {
        let mated = parse_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3").unwrap();
        assert!(mated.is_check);
        assert!(mated.is_checkmate);

        let stalemate = parse_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(stalemate.is_stalemate);
        assert!(stalemate.is_draw);
    }

    #[test]
    fn test_apply_move() {
        let new_fen = apply_move_to_fen(START_FEN, "e2e4").unwrap();
        assert_eq!(
            new_fen,
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );

        let new_fen = apply_move_to_fen(&new_fen, "e8e7");
        assert!(new_fen.is_err());
    }

    #[test]
    fn test_king_move_drops_castling_rights() {
        let fen = apply_move_to_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", "e1f1").unwrap();
        assert_eq!(fen, "r3k2r/8/8/8/8/8/8/R4K1R b kq - 1 1");
    }
}
