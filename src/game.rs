//! 对局状态
//!
//! `GameState` 是不可变的对局快照：`make_move` 总是返回新的状态，
//! 并重新计算将军、将死、逼和以及各类和棋条件。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::board::Board;
use crate::types::{CastlingSide, Color, Move, Piece, PieceType, Position, PROMOTION_TYPES};

/// 走子失败的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    /// 坐标超出棋盘
    OutOfBounds(Position),
    /// 起点没有棋子
    NoPiece(Position),
    /// 不是该方走棋
    WrongTurn { expected: Color, found: Color },
    /// 目标格不在合法走法中
    IllegalDestination { from: Position, to: Position },
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::OutOfBounds(pos) => {
                write!(f, "Position out of bounds: ({}, {})", pos.row, pos.col)
            }
            MoveError::NoPiece(pos) => write!(f, "No piece at {}", pos),
            MoveError::WrongTurn { expected, found } => {
                write!(f, "It is {}'s turn, but the piece is {}", expected, found)
            }
            MoveError::IllegalDestination { from, to } => {
                write!(f, "Illegal move: {} -> {}", from, to)
            }
        }
    }
}

impl std::error::Error for MoveError {}

/// 和棋原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawReason {
    #[serde(rename = "Stalemate")]
    Stalemate,
    #[serde(rename = "Threefold repetition")]
    ThreefoldRepetition,
    #[serde(rename = "Insufficient material")]
    InsufficientMaterial,
    #[serde(rename = "Fifty-move rule")]
    FiftyMoveRule,
}

impl DrawReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrawReason::Stalemate => "Stalemate",
            DrawReason::ThreefoldRepetition => "Threefold repetition",
            DrawReason::InsufficientMaterial => "Insufficient material",
            DrawReason::FiftyMoveRule => "Fifty-move rule",
        }
    }
}

impl fmt::Display for DrawReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 对局结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    Ongoing,
    WhiteWin,
    BlackWin,
    Draw,
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameResult::Ongoing => write!(f, "*"),
            GameResult::WhiteWin => write!(f, "1-0"),
            GameResult::BlackWin => write!(f, "0-1"),
            GameResult::Draw => write!(f, "1/2-1/2"),
        }
    }
}

/// 双方吃掉的棋子（按吃子方分组）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedPieces {
    pub white: Vec<Piece>,
    pub black: Vec<Piece>,
}

impl CapturedPieces {
    pub fn by(&self, color: Color) -> &[Piece] {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }
}

/// 一个候选走法（起点、终点、升变类型）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LegalMove {
    pub from: Position,
    pub to: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceType>,
}

impl LegalMove {
    pub fn new(from: Position, to: Position, promotion: Option<PieceType>) -> Self {
        LegalMove {
            from,
            to,
            promotion,
        }
    }

    /// 解析坐标记法（如 "e2e4"、"e7e8q"）
    pub fn from_coordinate(s: &str) -> Result<LegalMove, String> {
        let s = s.trim();
        if s.len() != 4 && s.len() != 5 {
            return Err(format!("Invalid move string: {}", s));
        }
        let from = s
            .get(0..2)
            .and_then(Position::from_algebraic)
            .ok_or_else(|| format!("Invalid from square: {}", s))?;
        let to = s
            .get(2..4)
            .and_then(Position::from_algebraic)
            .ok_or_else(|| format!("Invalid to square: {}", s))?;
        let promotion = match s.get(4..5) {
            Some(p) => Some(
                PieceType::from_name(p)
                    .filter(|t| t.is_promotion_target())
                    .ok_or_else(|| format!("Invalid promotion piece: {}", p))?,
            ),
            None => None,
        };
        Ok(LegalMove::new(from, to, promotion))
    }

    /// 坐标记法
    pub fn to_coordinate(&self) -> String {
        let mut s = format!("{}{}", self.from, self.to);
        if let Some(p) = self.promotion {
            s.push(p.to_fen_char());
        }
        s
    }
}

impl fmt::Display for LegalMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_coordinate())
    }
}

/// 某方在给定棋盘上的全部合法走法
///
/// 升到底线的兵展开为四种升变。
pub fn legal_moves_for(board: &Board, color: Color, en_passant: Option<Position>) -> Vec<LegalMove> {
    let mut moves = Vec::with_capacity(48);
    for (from, piece) in board.pieces_of(color) {
        for to in board.valid_moves(from, en_passant) {
            if piece.piece_type == PieceType::Pawn && (to.row == 0 || to.row == 7) {
                for promotion in PROMOTION_TYPES {
                    moves.push(LegalMove::new(from, to, Some(promotion)));
                }
            } else {
                moves.push(LegalMove::new(from, to, None));
            }
        }
    }
    moves
}

/// 对局快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub board: Board,
    pub current_player: Color,
    pub move_history: Vec<Move>,
    pub captured_pieces: CapturedPieces,
    pub is_check: bool,
    pub is_checkmate: bool,
    pub is_stalemate: bool,
    pub is_draw: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draw_reason: Option<DrawReason>,
    pub en_passant_target: Option<Position>,
    pub half_move_clock: u32,
    pub full_move_number: u32,
    pub position_history: Vec<String>,
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new()
    }
}

impl GameState {
    /// 标准开局
    pub fn new() -> Self {
        GameState::from_position(Board::initial(), Color::White, None, 0, 1)
    }

    /// 从任意局面构造，历史为空
    ///
    /// 只根据局面计算将军、将死和逼和；重复局面、子力不足和五十步规则
    /// 由 `make_move` 在走子时判定。
    pub fn from_position(
        board: Board,
        current_player: Color,
        en_passant_target: Option<Position>,
        half_move_clock: u32,
        full_move_number: u32,
    ) -> Self {
        let is_check = board.is_in_check(current_player);
        let has_moves = board.has_any_valid_moves(current_player, en_passant_target);
        let is_stalemate = !is_check && !has_moves;

        GameState {
            board,
            current_player,
            move_history: Vec::new(),
            captured_pieces: CapturedPieces::default(),
            is_check,
            is_checkmate: is_check && !has_moves,
            is_stalemate,
            is_draw: is_stalemate,
            draw_reason: if is_stalemate {
                Some(DrawReason::Stalemate)
            } else {
                None
            },
            en_passant_target,
            half_move_clock,
            full_move_number,
            position_history: Vec::new(),
        }
    }

    /// 执行一步走法，返回新的对局状态
    ///
    /// 兵走到底线时，`promotion` 缺省或不是可升变的类型均按升后处理。
    pub fn make_move(
        &self,
        from: Position,
        to: Position,
        promotion: Option<PieceType>,
    ) -> Result<GameState, MoveError> {
        if !from.is_valid() {
            return Err(MoveError::OutOfBounds(from));
        }
        if !to.is_valid() {
            return Err(MoveError::OutOfBounds(to));
        }
        let piece = self.board.get(from).ok_or(MoveError::NoPiece(from))?;
        if piece.color != self.current_player {
            return Err(MoveError::WrongTurn {
                expected: self.current_player,
                found: piece.color,
            });
        }
        if !self.board.valid_moves(from, self.en_passant_target).contains(&to) {
            return Err(MoveError::IllegalDestination { from, to });
        }

        let mut board = self.board.clone();
        let mut captured = board.get(to);

        // 吃过路兵
        let is_en_passant = piece.piece_type == PieceType::Pawn
            && self.en_passant_target == Some(to)
            && from.col != to.col;
        if is_en_passant {
            captured = board.take(Position::new(from.row, to.col));
        }

        // 王车易位：同时移动车
        let mut is_castling = None;
        if piece.piece_type == PieceType::King && (to.col - from.col).abs() == 2 {
            let (side, rook_from, rook_to) = if to.col == 6 {
                (CastlingSide::Kingside, 7, 5)
            } else {
                (CastlingSide::Queenside, 0, 3)
            };
            let rook = board.take(Position::new(to.row, rook_from));
            board.set(Position::new(to.row, rook_to), rook.map(Piece::moved));
            is_castling = Some(side);
        }

        // 移动棋子，到达底线的兵升变
        let promotion = if piece.piece_type == PieceType::Pawn && (to.row == 0 || to.row == 7) {
            Some(
                promotion
                    .filter(|t| t.is_promotion_target())
                    .unwrap_or(PieceType::Queen),
            )
        } else {
            None
        };
        let landed = match promotion {
            Some(t) => Piece::new(t, piece.color).moved(),
            None => piece.moved(),
        };
        board.set(to, Some(landed));
        board.set(from, None);

        let en_passant_target = if piece.piece_type == PieceType::Pawn && (to.row - from.row).abs() == 2 {
            Some(Position::new((from.row + to.row) / 2, from.col))
        } else {
            None
        };

        let next_player = self.current_player.opposite();
        let is_check = board.is_in_check(next_player);
        let has_moves = board.has_any_valid_moves(next_player, en_passant_target);
        let is_checkmate = is_check && !has_moves;
        let is_stalemate = !is_check && !has_moves;

        let mut position_history = self.position_history.clone();
        position_history.push(board.placement());

        let half_move_clock = if piece.piece_type == PieceType::Pawn || captured.is_some() {
            0
        } else {
            self.half_move_clock + 1
        };

        let draw_reason = classify_draw(is_stalemate, &position_history, &board, half_move_clock);

        let mut record = Move {
            from,
            to,
            piece,
            captured,
            is_en_passant,
            is_castling,
            promotion,
            is_check,
            is_checkmate,
            notation: String::new(),
        };
        record.notation = move_notation(&record);

        let mut captured_pieces = self.captured_pieces.clone();
        if let Some(victim) = captured {
            match self.current_player {
                Color::White => captured_pieces.white.push(victim),
                Color::Black => captured_pieces.black.push(victim),
            }
        }

        let mut move_history = self.move_history.clone();
        move_history.push(record);

        Ok(GameState {
            board,
            current_player: next_player,
            move_history,
            captured_pieces,
            is_check,
            is_checkmate,
            is_stalemate,
            is_draw: draw_reason.is_some(),
            draw_reason,
            en_passant_target,
            half_move_clock,
            full_move_number: if self.current_player == Color::Black {
                self.full_move_number + 1
            } else {
                self.full_move_number
            },
            position_history,
        })
    }

    /// 执行一个候选走法
    pub fn apply(&self, mv: &LegalMove) -> Result<GameState, MoveError> {
        self.make_move(mv.from, mv.to, mv.promotion)
    }

    /// 当前行棋方的全部合法走法
    pub fn legal_moves(&self) -> Vec<LegalMove> {
        legal_moves_for(&self.board, self.current_player, self.en_passant_target)
    }

    /// 按记谱查找合法走法，忽略末尾的 `+`/`#`
    pub fn find_move_by_san(&self, san: &str) -> Option<LegalMove> {
        let wanted = strip_check_marks(san.trim());
        self.legal_moves().into_iter().find(|mv| {
            self.apply(mv)
                .ok()
                .and_then(|next| next.move_history.last().map(|m| strip_check_marks(&m.notation) == wanted))
                .unwrap_or(false)
        })
    }

    /// 对局是否已结束
    pub fn is_terminal(&self) -> bool {
        self.is_checkmate || self.is_stalemate || self.is_draw
    }

    pub fn result(&self) -> GameResult {
        if self.is_checkmate {
            match self.current_player {
                Color::White => GameResult::BlackWin,
                Color::Black => GameResult::WhiteWin,
            }
        } else if self.is_draw || self.is_stalemate {
            GameResult::Draw
        } else {
            GameResult::Ongoing
        }
    }

    /// 已走的记谱序列
    pub fn notation_history(&self) -> Vec<String> {
        self.move_history.iter().map(|m| m.notation.clone()).collect()
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string(self).map_err(|e| format!("Failed to serialize game: {}", e))
    }

    pub fn from_json(json: &str) -> Result<GameState, String> {
        serde_json::from_str(json).map_err(|e| format!("Failed to parse game: {}", e))
    }
}

/// 按固定顺序判定和棋，先命中者为准：
/// 逼和、三次重复、子力不足、五十步
fn classify_draw(
    is_stalemate: bool,
    position_history: &[String],
    board: &Board,
    half_move_clock: u32,
) -> Option<DrawReason> {
    if is_stalemate {
        Some(DrawReason::Stalemate)
    } else if is_threefold_repetition(position_history) {
        Some(DrawReason::ThreefoldRepetition)
    } else if board.has_insufficient_material() {
        Some(DrawReason::InsufficientMaterial)
    } else if half_move_clock >= 100 {
        Some(DrawReason::FiftyMoveRule)
    } else {
        None
    }
}

/// 任一布局串出现三次及以上
pub fn is_threefold_repetition(position_history: &[String]) -> bool {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    position_history.iter().any(|p| {
        let count = counts.entry(p.as_str()).or_insert(0);
        *count += 1;
        *count >= 3
    })
}

/// 简化代数记谱（不做同种棋子的消歧义）
pub fn move_notation(mv: &Move) -> String {
    match mv.is_castling {
        Some(CastlingSide::Kingside) => return "O-O".to_string(),
        Some(CastlingSide::Queenside) => return "O-O-O".to_string(),
        None => {}
    }

    let mut notation = String::from(mv.piece.piece_type.san_letter());
    if mv.captured.is_some() || mv.is_en_passant {
        if mv.piece.piece_type == PieceType::Pawn {
            notation.push(mv.from.file_char());
        }
        notation.push('x');
    }
    notation.push_str(&mv.to.to_algebraic());

    if let Some(p) = mv.promotion {
        notation.push('=');
        notation.push_str(p.san_letter());
    }

    if mv.is_checkmate {
        notation.push('#');
    } else if mv.is_check {
        notation.push('+');
    }
    notation
}

fn strip_check_marks(san: &str) -> &str {
    san.trim_end_matches(|c| c == '+' || c == '#')
}

/// 统计给定深度的走法序列数
pub fn perft(state: &GameState, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = state.legal_moves();
    if depth == 1 {
        return moves.len() as u64;
    }
    moves
        .iter()
        .filter_map(|mv| state.apply(mv).ok())
        .map(|next| perft(&next, depth - 1))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::parse_fen;
    use crate::test_positions::{
        EARLY_POSITIONS, END_POSITIONS, KIWIPETE, MATE_POSITIONS, MID_POSITIONS, POSITION_3,
        SPECIAL_POSITIONS,
    };

    fn sq(s: &str) -> Position {
        Position::from_algebraic(s).unwrap()
    }

    fn play(state: &GameState, moves: &[&str]) -> GameState {
        moves.iter().fold(state.clone(), |s, m| {
            let mv = LegalMove::from_coordinate(m).unwrap();
            s.apply(&mv).unwrap_or_else(|e| panic!("{} failed: {}", m, e))
        })
    }

    #[test]
    fn test_initial_state() {
        let state = GameState::new();
        assert_eq!(state.current_player, Color::White);
        assert_eq!(state.legal_moves().len(), 20);
        assert!(!state.is_check);
        assert!(!state.is_terminal());
        assert_eq!(state.result(), GameResult::Ongoing);
        assert_eq!(state.full_move_number, 1);
    }

    #[test]
    fn test_double_push() {
        let state = GameState::new().make_move(sq("e2"), sq("e4"), None).unwrap();
        assert_eq!(state.en_passant_target, Some(Position::new(5, 4)));
        assert_eq!(state.half_move_clock, 0);
        assert_eq!(state.current_player, Color::Black);
        assert_eq!(state.full_move_number, 1);
        assert_eq!(state.position_history.len(), 1);
        assert_eq!(state.move_history[0].notation, "e4");
        assert!(state.board.get(sq("e4")).unwrap().has_moved);

        let state = play(&state, &["g8f6"]);
        assert_eq!(state.en_passant_target, None);
        assert_eq!(state.half_move_clock, 1);
        assert_eq!(state.full_move_number, 2);
        assert_eq!(state.notation_history(), vec!["e4", "Nf6"]);
    }

    #[test]
    fn test_rejected_moves() {
        let state = GameState::new();
        assert_eq!(
            state.make_move(Position::new(8, 0), sq("a3"), None),
            Err(MoveError::OutOfBounds(Position::new(8, 0)))
        );
        assert_eq!(
            state.make_move(sq("e4"), sq("e5"), None),
            Err(MoveError::NoPiece(sq("e4")))
        );
        assert!(matches!(
            state.make_move(sq("e7"), sq("e5"), None),
            Err(MoveError::WrongTurn { .. })
        ));
        assert_eq!(
            state.make_move(sq("e2"), sq("e5"), None),
            Err(MoveError::IllegalDestination {
                from: sq("e2"),
                to: sq("e5")
            })
        );
    }

    #[test]
    fn test_en_passant_capture() {
        let state = play(&GameState::new(), &["e2e4", "a7a6", "e4e5", "d7d5", "e5d6"]);
        let last = state.move_history.last().unwrap();
        assert!(last.is_en_passant);
        assert_eq!(last.notation, "exd6");
        assert!(state.board.get(sq("d5")).is_none());
        assert_eq!(state.captured_pieces.white.len(), 1);
        assert_eq!(state.captured_pieces.white[0].piece_type, PieceType::Pawn);
        assert_eq!(state.half_move_clock, 0);
    }

    #[test]
    fn test_castling_moves_rook() {
        let state = parse_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let after = state.make_move(sq("e1"), sq("g1"), None).unwrap();
        assert_eq!(after.move_history[0].notation, "O-O");
        assert_eq!(after.move_history[0].is_castling, Some(CastlingSide::Kingside));
        let rook = after.board.get(sq("f1")).unwrap();
        assert_eq!(rook.piece_type, PieceType::Rook);
        assert!(rook.has_moved);
        assert!(after.board.get(sq("h1")).is_none());

        let after = after.make_move(sq("e8"), sq("c8"), None).unwrap();
        assert_eq!(after.move_history[1].notation, "O-O-O");
        assert_eq!(after.board.get(sq("d8")).unwrap().piece_type, PieceType::Rook);
    }

    #[test]
    fn test_promotion_defaults_to_queen() {
        let state = parse_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let after = state.make_move(sq("a7"), sq("a8"), None).unwrap();
        assert_eq!(after.board.get(sq("a8")).unwrap().piece_type, PieceType::Queen);
        assert_eq!(after.move_history[0].notation, "a8=Q");

        let after = state.make_move(sq("a7"), sq("a8"), Some(PieceType::Knight)).unwrap();
        assert_eq!(after.board.get(sq("a8")).unwrap().piece_type, PieceType::Knight);
        assert_eq!(after.move_history[0].notation, "a8=N");

        // 升变走法展开为四种
        assert_eq!(
            state
                .legal_moves()
                .iter()
                .filter(|m| m.from == sq("a7"))
                .count(),
            4
        );
    }

    #[test]
    fn test_promotion_with_check() {
        let state = parse_fen("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let after = state.make_move(sq("a7"), sq("a8"), None).unwrap();
        assert!(after.is_check);
        assert!(!after.is_checkmate);
        assert_eq!(after.move_history[0].notation, "a8=Q+");
    }

    #[test]
    fn test_fools_mate() {
        let state = play(&GameState::new(), &["f2f3", "e7e5", "g2g4", "d8h4"]);
        assert!(state.is_check);
        assert!(state.is_checkmate);
        assert!(state.is_terminal());
        assert_eq!(state.result(), GameResult::BlackWin);
        assert_eq!(state.move_history.last().unwrap().notation, "Qh4#");
        assert!(state.legal_moves().is_empty());
    }

    #[test]
    fn test_stalemate() {
        let state = parse_fen("7k/8/6K1/8/8/8/5Q2/8 w - - 0 1").unwrap();
        let after = state.make_move(sq("f2"), sq("f7"), None).unwrap();
        assert!(after.is_stalemate);
        assert!(!after.is_check);
        assert!(after.is_draw);
        assert_eq!(after.draw_reason, Some(DrawReason::Stalemate));
        assert_eq!(after.result(), GameResult::Draw);
    }

    #[test]
    fn test_stalemate_takes_precedence_over_fifty_moves() {
        let state = parse_fen("7k/8/6K1/8/8/8/5Q2/8 w - - 99 80").unwrap();
        let after = state.make_move(sq("f2"), sq("f7"), None).unwrap();
        assert_eq!(after.half_move_clock, 100);
        assert_eq!(after.draw_reason, Some(DrawReason::Stalemate));
    }

    #[test]
    fn test_insufficient_material_after_capture() {
        let state = parse_fen("4k3/8/8/8/8/8/3p4/4K3 w - - 0 1").unwrap();
        let after = state.make_move(sq("e1"), sq("d2"), None).unwrap();
        assert_eq!(after.move_history[0].notation, "Kxd2");
        assert!(after.is_draw);
        assert_eq!(after.draw_reason, Some(DrawReason::InsufficientMaterial));
    }

    #[test]
    fn test_threefold_repetition() {
        let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"];
        let state = play(&GameState::new(), &shuffle);
        assert!(!state.is_draw);

        let state = play(&state, &["g1f3"]);
        assert!(state.is_draw);
        assert_eq!(state.draw_reason, Some(DrawReason::ThreefoldRepetition));
    }

    #[test]
    fn test_fifty_move_rule() {
        let state = parse_fen("4k3/8/8/8/8/8/8/R3K3 w - - 99 60").unwrap();
        let after = state.make_move(sq("a1"), sq("a2"), None).unwrap();
        assert_eq!(after.half_move_clock, 100);
        assert!(after.is_draw);
        assert_eq!(after.draw_reason, Some(DrawReason::FiftyMoveRule));
    }

    #[test]
    fn test_half_move_clock_resets_from_nonzero() {
        let state = parse_fen("4k3/8/8/8/8/8/P7/R3K3 w - - 57 60").unwrap();
        let quiet = state.make_move(sq("e1"), sq("d1"), None).unwrap();
        assert_eq!(quiet.half_move_clock, 58);
        let pushed = state.make_move(sq("a2"), sq("a3"), None).unwrap();
        assert_eq!(pushed.half_move_clock, 0);

        // 非兵吃子同样清零
        let state = parse_fen("4k3/8/8/8/8/8/p7/R3K3 w - - 57 60").unwrap();
        let captured = state.make_move(sq("a1"), sq("a2"), None).unwrap();
        assert_eq!(captured.move_history[0].captured.map(|p| p.piece_type), Some(PieceType::Pawn));
        assert_eq!(captured.half_move_clock, 0);
    }

    #[test]
    fn test_legal_moves_never_leave_king_in_check() {
        let groups: [&[&str]; 5] = [
            &EARLY_POSITIONS,
            &MID_POSITIONS,
            &END_POSITIONS,
            &MATE_POSITIONS,
            &SPECIAL_POSITIONS,
        ];
        for fen in groups.iter().flat_map(|g| g.iter()) {
            let state = parse_fen(fen).unwrap();
            let mover = state.current_player;
            for mv in state.legal_moves() {
                let next = state
                    .apply(&mv)
                    .unwrap_or_else(|e| panic!("{} {}: {}", fen, mv, e));
                assert!(!next.board.is_in_check(mover), "{} {} leaves king in check", fen, mv);
            }
        }
    }

    #[test]
    fn test_json_round_trip() {
        let state = play(&GameState::new(), &["e2e4", "c7c5", "g1f3"]);
        let json = state.to_json().unwrap();
        assert!(json.contains("\"currentPlayer\":\"black\""));
        assert!(json.contains("\"enPassantTarget\":null"));
        let restored = GameState::from_json(&json).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_coordinate_move_parsing() {
        let mv = LegalMove::from_coordinate("e7e8q").unwrap();
        assert_eq!(mv.promotion, Some(PieceType::Queen));
        assert_eq!(mv.to_coordinate(), "e7e8q");
        assert!(LegalMove::from_coordinate("e7e8k").is_err());
        assert!(LegalMove::from_coordinate("z9e4").is_err());
    }

    #[test]
    fn test_find_move_by_san() {
        let state = GameState::new();
        assert_eq!(
            state.find_move_by_san("Nf3"),
            Some(LegalMove::new(sq("g1"), sq("f3"), None))
        );
        assert_eq!(state.find_move_by_san("e5"), None);

        let state = play(&state, &["f2f3", "e7e5", "g2g4"]);
        assert_eq!(
            state.find_move_by_san("Qh4"),
            Some(LegalMove::new(sq("d8"), sq("h4"), None))
        );
    }

    #[test]
    fn test_perft_startpos() {
        let state = GameState::new();
        assert_eq!(perft(&state, 1), 20);
        assert_eq!(perft(&state, 2), 400);
        assert_eq!(perft(&state, 3), 8902);
    }

    #[test]
    fn test_perft_kiwipete() {
        let state = parse_fen(KIWIPETE).unwrap();
        assert_eq!(perft(&state, 1), 48);
        assert_eq!(perft(&state, 2), 2039);
    }

    #[test]
    fn test_perft_position_3() {
        let state = parse_fen(POSITION_3).unwrap();
        assert_eq!(perft(&state, 1), 14);
        assert_eq!(perft(&state, 2), 191);
        assert_eq!(perft(&state, 3), 2812);
    }
}
