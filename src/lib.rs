//! Chess AI Engine
//!
//! 国际象棋规则引擎 + Alpha-Beta AI，支持 FEN 输入输出

pub mod ai;
pub mod board;
pub mod book;
pub mod fen;
pub mod game;
pub mod test_positions;
pub mod types;

pub use ai::{
    analyze, calculate_points, get_ai_move, AIConfig, AIMove, Difficulty, EvalDetail, ScoredMove,
    SearchOutcome,
};
pub use board::{Board, CastlingRights};
pub use book::{get_book_move, get_opening_name, is_in_book, OpeningInfo};
pub use fen::{apply_move_to_fen, parse_fen, to_fen, START_FEN};
pub use game::{perft, DrawReason, GameResult, GameState, LegalMove, MoveError};
pub use types::{CastlingSide, Color, Move, Piece, PieceType, Position};
