//! 局面评估 - 子力、PST、机动性、王的安全、中心控制
//!
//! 所有分数都以白方视角给出：正数对白方有利。

use serde::Serialize;

use crate::board::Board;
use crate::game::{legal_moves_for, GameState};
use crate::types::{Color, PieceType, Position};

// === 常量定义 ===

/// 非王子力总和低于该值即视为残局
pub const ENDGAME_MATERIAL: i32 = 2600;

/// 每多一个合法走法的加分
const MOBILITY_WEIGHT: i32 = 5;

/// 中心四格
pub const CENTER_SQUARES: [Position; 4] = [
    Position::new(3, 3),
    Position::new(3, 4),
    Position::new(4, 3),
    Position::new(4, 4),
];

const CENTER_PAWN_BONUS: i32 = 30;
const CENTER_PIECE_BONUS: i32 = 20;

const SHIELD_PAWN_BONUS: i32 = 15;
const CENTRAL_KING_PENALTY: i32 = 20;

// === PST 表 ===

/// PST (Piece-Square Table) - 白方视角，row 0 是第 8 横线
type PstTable = [[i32; 8]; 8];

const PST_PAWN: PstTable = [
    [0, 0, 0, 0, 0, 0, 0, 0],
    [50, 50, 50, 50, 50, 50, 50, 50],
    [10, 10, 20, 30, 30, 20, 10, 10],
    [5, 5, 10, 27, 27, 10, 5, 5],
    [0, 0, 0, 25, 25, 0, 0, 0],
    [5, -5, -10, 0, 0, -10, -5, 5],
    [5, 10, 10, -25, -25, 10, 10, 5],
    [0, 0, 0, 0, 0, 0, 0, 0],
];

const PST_KNIGHT: PstTable = [
    [-50, -40, -30, -30, -30, -30, -40, -50],
    [-40, -20, 0, 0, 0, 0, -20, -40],
    [-30, 0, 10, 15, 15, 10, 0, -30],
    [-30, 5, 15, 20, 20, 15, 5, -30],
    [-30, 0, 15, 20, 20, 15, 0, -30],
    [-30, 5, 10, 15, 15, 10, 5, -30],
    [-40, -20, 0, 5, 5, 0, -20, -40],
    [-50, -40, -30, -30, -30, -30, -40, -50],
];

const PST_BISHOP: PstTable = [
    [-20, -10, -10, -10, -10, -10, -10, -20],
    [-10, 0, 0, 0, 0, 0, 0, -10],
    [-10, 0, 5, 10, 10, 5, 0, -10],
    [-10, 5, 5, 10, 10, 5, 5, -10],
    [-10, 0, 10, 10, 10, 10, 0, -10],
    [-10, 10, 10, 10, 10, 10, 10, -10],
    [-10, 5, 0, 0, 0, 0, 5, -10],
    [-20, -10, -10, -10, -10, -10, -10, -20],
];

const PST_ROOK: PstTable = [
    [0, 0, 0, 0, 0, 0, 0, 0],
    [5, 10, 10, 10, 10, 10, 10, 5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [-5, 0, 0, 0, 0, 0, 0, -5],
    [0, 0, 0, 5, 5, 0, 0, 0],
];

const PST_QUEEN: PstTable = [
    [-20, -10, -10, -5, -5, -10, -10, -20],
    [-10, 0, 0, 0, 0, 0, 0, -10],
    [-10, 0, 5, 5, 5, 5, 0, -10],
    [-5, 0, 5, 5, 5, 5, 0, -5],
    [0, 0, 5, 5, 5, 5, 0, -5],
    [-10, 5, 5, 5, 5, 5, 0, -10],
    [-10, 0, 5, 0, 0, 0, 0, -10],
    [-20, -10, -10, -5, -5, -10, -10, -20],
];

/// 王（中局）：躲在易位后的角落
const PST_KING_MIDDLE: PstTable = [
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-20, -30, -30, -40, -40, -30, -30, -20],
    [-10, -20, -20, -20, -20, -20, -20, -10],
    [20, 20, 0, 0, 0, 0, 20, 20],
    [20, 30, 10, 0, 0, 10, 30, 20],
];

/// 王（残局）：向中心靠拢
const PST_KING_END: PstTable = [
    [-50, -40, -30, -20, -20, -30, -40, -50],
    [-30, -20, -10, 0, 0, -10, -20, -30],
    [-30, -10, 20, 30, 30, 20, -10, -30],
    [-30, -10, 30, 40, 40, 30, -10, -30],
    [-30, -10, 30, 40, 40, 30, -10, -30],
    [-30, -10, 20, 30, 30, 20, -10, -30],
    [-30, -30, 0, 0, 0, 0, -30, -30],
    [-50, -30, -30, -30, -30, -30, -30, -50],
];

/// 简易评估用的兵表
const BASIC_PST_PAWN: PstTable = [
    [0, 0, 0, 0, 0, 0, 0, 0],
    [50, 50, 50, 50, 50, 50, 50, 50],
    [10, 10, 20, 30, 30, 20, 10, 10],
    [5, 5, 10, 25, 25, 10, 5, 5],
    [0, 0, 0, 20, 20, 0, 0, 0],
    [5, -5, -10, 0, 0, -10, -5, 5],
    [5, 10, 10, -20, -20, 10, 10, 5],
    [0, 0, 0, 0, 0, 0, 0, 0],
];

/// 获取 PST 分数
#[inline]
pub(super) fn get_pst_score(piece_type: PieceType, pos: Position, color: Color, is_endgame: bool) -> i32 {
    // 黑方需要翻转棋盘
    let r = match color {
        Color::White => pos.row as usize,
        Color::Black => 7 - pos.row as usize,
    };
    let c = pos.col as usize;

    match piece_type {
        PieceType::Pawn => PST_PAWN[r][c],
        PieceType::Knight => PST_KNIGHT[r][c],
        PieceType::Bishop => PST_BISHOP[r][c],
        PieceType::Rook => PST_ROOK[r][c],
        PieceType::Queen => PST_QUEEN[r][c],
        PieceType::King if is_endgame => PST_KING_END[r][c],
        PieceType::King => PST_KING_MIDDLE[r][c],
    }
}

#[inline]
fn signed(color: Color, value: i32) -> i32 {
    match color {
        Color::White => value,
        Color::Black => -value,
    }
}

/// 非王子力总和
pub fn non_king_material(board: &Board) -> i32 {
    board
        .pieces()
        .filter(|(_, p)| p.piece_type != PieceType::King)
        .map(|(_, p)| p.piece_type.value())
        .sum()
}

#[inline]
pub fn is_endgame(board: &Board) -> bool {
    non_king_material(board) < ENDGAME_MATERIAL
}

/// 王的安全：王须在底线，身前三格每个己方兵 +15，王在 c-f 线 -20
pub fn king_safety(board: &Board, color: Color) -> i32 {
    let king_row = color.back_rank();
    let king_col = (0..8).find(|&col| {
        board
            .get(Position::new(king_row, col))
            .map_or(false, |p| p.piece_type == PieceType::King && p.color == color)
    });
    let king_col = match king_col {
        Some(c) => c,
        None => return 0,
    };

    let shield_row = color.pawn_start_row();
    let shield = (-1i8..=1)
        .filter(|&dc| {
            board
                .get(Position::new(shield_row, king_col + dc))
                .map_or(false, |p| p.piece_type == PieceType::Pawn && p.color == color)
        })
        .count() as i32;

    let mut safety = shield * SHIELD_PAWN_BONUS;
    if (2..=5).contains(&king_col) {
        safety -= CENTRAL_KING_PENALTY;
    }
    safety
}

// === 评估结构体 ===

/// 详细评估结果（白方视角）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalDetail {
    /// 白方子力 + PST
    pub white_pieces: i32,
    /// 黑方子力 + PST
    pub black_pieces: i32,
    pub white_mobility: usize,
    pub black_mobility: usize,
    /// 仅中局计入
    pub white_king_safety: i32,
    pub black_king_safety: i32,
    /// 中心控制（已带符号）
    pub center: i32,
    pub is_endgame: bool,
    pub total: i32,
}

/// 详细评估
pub fn evaluate_detail(state: &GameState) -> EvalDetail {
    let board = &state.board;
    let endgame = is_endgame(board);

    let mut detail = EvalDetail {
        is_endgame: endgame,
        ..Default::default()
    };

    for (pos, piece) in board.pieces() {
        let value = piece.piece_type.value() + get_pst_score(piece.piece_type, pos, piece.color, endgame);
        match piece.color {
            Color::White => detail.white_pieces += value,
            Color::Black => detail.black_pieces += value,
        }
    }

    // 机动性：升变按四种走法计数
    let ep = state.en_passant_target;
    detail.white_mobility = legal_moves_for(board, Color::White, ep).len();
    detail.black_mobility = legal_moves_for(board, Color::Black, ep).len();

    if !endgame {
        detail.white_king_safety = king_safety(board, Color::White);
        detail.black_king_safety = king_safety(board, Color::Black);
    }

    detail.center = CENTER_SQUARES
        .iter()
        .filter_map(|&sq| board.get(sq))
        .map(|p| {
            let bonus = if p.piece_type == PieceType::Pawn {
                CENTER_PAWN_BONUS
            } else {
                CENTER_PIECE_BONUS
            };
            signed(p.color, bonus)
        })
        .sum();

    detail.total = detail.white_pieces - detail.black_pieces
        + (detail.white_mobility as i32 - detail.black_mobility as i32) * MOBILITY_WEIGHT
        + detail.white_king_safety
        - detail.black_king_safety
        + detail.center;
    detail
}

/// 搜索使用的完整评估
#[inline]
pub fn evaluate_advanced(state: &GameState) -> i32 {
    evaluate_detail(state).total
}

/// 简易评估：子力加兵、马的位置分
pub fn evaluate_basic(board: &Board) -> i32 {
    board
        .pieces()
        .map(|(pos, piece)| {
            let r = match piece.color {
                Color::White => pos.row as usize,
                Color::Black => 7 - pos.row as usize,
            };
            let c = pos.col as usize;
            let bonus = match piece.piece_type {
                PieceType::Pawn => BASIC_PST_PAWN[r][c],
                PieceType::Knight => PST_KNIGHT[r][c],
                _ => 0,
            };
            signed(piece.color, piece.piece_type.value() + bonus)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::parse_fen;
    use crate::test_positions::{END_1, KINGS_ONLY};

    #[test]
    fn test_initial_position_is_balanced() {
        let state = GameState::new();
        let detail = evaluate_detail(&state);
        assert!(!detail.is_endgame);
        assert_eq!(detail.white_mobility, 20);
        assert_eq!(detail.black_mobility, 20);
        assert_eq!(detail.white_king_safety, 25);
        assert_eq!(detail.black_king_safety, 25);
        assert_eq!(detail.total, 0);
        assert_eq!(evaluate_basic(&state.board), 0);
    }

    #[test]
    fn test_sign_convention() {
        let white_up = parse_fen("4k3/8/8/8/8/8/8/Q3K3 w - - 0 1").unwrap();
        assert!(evaluate_advanced(&white_up) > 800);
        assert!(evaluate_basic(&white_up.board) > 800);

        let black_up = parse_fen("q3k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(evaluate_advanced(&black_up) < -800);
        assert!(evaluate_basic(&black_up.board) < -800);
    }

    #[test]
    fn test_endgame_switches_king_table() {
        let state = parse_fen(KINGS_ONLY).unwrap();
        assert!(is_endgame(&state.board));
        let e1 = Position::from_algebraic("e1").unwrap();
        assert_eq!(get_pst_score(PieceType::King, e1, Color::White, true), -30);
        assert_eq!(get_pst_score(PieceType::King, e1, Color::White, false), 0);

        let detail = evaluate_detail(&state);
        assert_eq!(detail.white_king_safety, 0);
        assert_eq!(detail.total, 0);
    }

    #[test]
    fn test_pst_mirrored_for_black() {
        let e4 = Position::from_algebraic("e4").unwrap();
        let e5 = Position::from_algebraic("e5").unwrap();
        assert_eq!(
            get_pst_score(PieceType::Pawn, e4, Color::White, false),
            get_pst_score(PieceType::Pawn, e5, Color::Black, false)
        );
    }

    #[test]
    fn test_king_safety() {
        // 已易位且兵盾完整
        let castled = parse_fen("4k3/8/8/8/8/8/5PPP/6K1 w - - 0 1").unwrap();
        assert_eq!(king_safety(&castled.board, Color::White), 45);

        // 王离开底线不计分
        let walked = parse_fen("4k3/8/8/8/8/8/4K3/8 w - - 0 1").unwrap();
        assert_eq!(king_safety(&walked.board, Color::White), 0);

        // 中心王无兵盾
        let exposed = parse_fen("4k3/8/8/8/8/8/8/3K4 w - - 0 1").unwrap();
        assert_eq!(king_safety(&exposed.board, Color::White), -20);
    }

    #[test]
    fn test_center_control() {
        let state = parse_fen("4k3/8/8/8/4P3/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(evaluate_detail(&state).center, 30);
    }

    #[test]
    fn test_rook_endgame_favors_white() {
        let state = parse_fen(END_1).unwrap();
        let detail = evaluate_detail(&state);
        assert!(detail.is_endgame);
        assert!(detail.total > 400);
    }
}
