//! 国际象棋核心类型定义
//!
//! 定义棋子、颜色、坐标和走法记录等基础数据类型

use serde::{Deserialize, Serialize};
use std::fmt;

/// 棋子颜色/阵营
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// 获取对方阵营
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// 从 FEN 字符解析
    pub fn from_fen_char(c: char) -> Option<Color> {
        match c {
            'w' => Some(Color::White),
            'b' => Some(Color::Black),
            _ => None,
        }
    }

    /// 转换为 FEN 字符
    pub fn to_fen_char(&self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }

    /// 底线所在行（row 0 是黑方底线，row 7 是白方底线）
    #[inline]
    pub fn back_rank(&self) -> i8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    /// 兵的前进方向
    #[inline]
    pub fn pawn_direction(&self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    /// 兵的起始行
    #[inline]
    pub fn pawn_start_row(&self) -> i8 {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

/// 棋子类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceType {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

/// 升变可选的棋子，顺序即搜索时的展开顺序
pub const PROMOTION_TYPES: [PieceType; 4] = [
    PieceType::Queen,
    PieceType::Rook,
    PieceType::Bishop,
    PieceType::Knight,
];

impl PieceType {
    /// 从 FEN 字符解析（大小写均可）
    pub fn from_fen_char(c: char) -> Option<PieceType> {
        match c.to_ascii_lowercase() {
            'k' => Some(PieceType::King),
            'q' => Some(PieceType::Queen),
            'r' => Some(PieceType::Rook),
            'b' => Some(PieceType::Bishop),
            'n' => Some(PieceType::Knight),
            'p' => Some(PieceType::Pawn),
            _ => None,
        }
    }

    /// 转换为 FEN 字符（小写）
    pub fn to_fen_char(&self) -> char {
        match self {
            PieceType::King => 'k',
            PieceType::Queen => 'q',
            PieceType::Rook => 'r',
            PieceType::Bishop => 'b',
            PieceType::Knight => 'n',
            PieceType::Pawn => 'p',
        }
    }

    /// 代数记谱中的棋子字母，兵为空
    pub fn san_letter(&self) -> &'static str {
        match self {
            PieceType::King => "K",
            PieceType::Queen => "Q",
            PieceType::Rook => "R",
            PieceType::Bishop => "B",
            PieceType::Knight => "N",
            PieceType::Pawn => "",
        }
    }

    /// 获取棋子的子力价值（王的价值只用于搜索中的排序）
    pub fn value(&self) -> i32 {
        match self {
            PieceType::Pawn => 100,
            PieceType::Knight => 320,
            PieceType::Bishop => 330,
            PieceType::Rook => 500,
            PieceType::Queen => 900,
            PieceType::King => 20000,
        }
    }

    /// 是否可以作为升变目标
    pub fn is_promotion_target(&self) -> bool {
        PROMOTION_TYPES.contains(self)
    }

    /// 是否为轻子（马、象）
    pub fn is_minor(&self) -> bool {
        matches!(self, PieceType::Knight | PieceType::Bishop)
    }

    /// 按名称解析（"queen"、"Q"、"n" 等）
    pub fn from_name(s: &str) -> Option<PieceType> {
        match s.trim().to_ascii_lowercase().as_str() {
            "king" => Some(PieceType::King),
            "queen" => Some(PieceType::Queen),
            "rook" => Some(PieceType::Rook),
            "bishop" => Some(PieceType::Bishop),
            "knight" => Some(PieceType::Knight),
            "pawn" => Some(PieceType::Pawn),
            other if other.chars().count() == 1 => other.chars().next().and_then(Self::from_fen_char),
            _ => None,
        }
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PieceType::King => "King",
            PieceType::Queen => "Queen",
            PieceType::Rook => "Rook",
            PieceType::Bishop => "Bishop",
            PieceType::Knight => "Knight",
            PieceType::Pawn => "Pawn",
        };
        write!(f, "{}", name)
    }
}

/// 棋子
///
/// `has_moved` 只用于判断王车易位资格，棋子第一次落到目标格（包括升变）时置为 true
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Piece {
    #[serde(rename = "type")]
    pub piece_type: PieceType,
    pub color: Color,
    #[serde(default)]
    pub has_moved: bool,
}

impl Piece {
    pub fn new(piece_type: PieceType, color: Color) -> Self {
        Piece {
            piece_type,
            color,
            has_moved: false,
        }
    }

    /// 返回已移动过的副本
    #[inline]
    pub fn moved(self) -> Self {
        Piece {
            has_moved: true,
            ..self
        }
    }

    /// FEN 字符：白方大写，黑方小写
    pub fn to_fen_char(&self) -> char {
        let ch = self.piece_type.to_fen_char();
        match self.color {
            Color::White => ch.to_ascii_uppercase(),
            Color::Black => ch,
        }
    }

    /// 从 FEN 字符解析
    pub fn from_fen_char(c: char) -> Option<Piece> {
        let piece_type = PieceType::from_fen_char(c)?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece::new(piece_type, color))
    }
}

/// 棋盘位置 (row, col)
///
/// row: 0-7 (0 是黑方底线即第 8 横线，7 是白方底线即第 1 横线)
/// col: 0-7 (a 线到 h 线)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: i8,
    pub col: i8,
}

impl Position {
    pub const fn new(row: i8, col: i8) -> Self {
        Position { row, col }
    }

    /// 检查位置是否在棋盘范围内
    #[inline]
    pub fn is_valid(&self) -> bool {
        (0..8).contains(&self.row) && (0..8).contains(&self.col)
    }

    /// 位置加偏移量
    #[inline]
    pub fn offset(&self, row_delta: i8, col_delta: i8) -> Position {
        Position {
            row: self.row + row_delta,
            col: self.col + col_delta,
        }
    }

    /// 列字母 a-h
    pub fn file_char(&self) -> char {
        (b'a' + self.col as u8) as char
    }

    /// 横线数字 1-8
    pub fn rank_char(&self) -> char {
        (b'8' - self.row as u8) as char
    }

    /// 从代数坐标解析（如 "e4"）
    pub fn from_algebraic(s: &str) -> Option<Position> {
        let bytes = s.trim().as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let col = match bytes[0] {
            b'a'..=b'h' => (bytes[0] - b'a') as i8,
            _ => return None,
        };
        let row = match bytes[1] {
            b'1'..=b'8' => (b'8' - bytes[1]) as i8,
            _ => return None,
        };
        Some(Position { row, col })
    }

    /// 转换为代数坐标（如 "e4"）
    pub fn to_algebraic(&self) -> String {
        format!("{}{}", self.file_char(), self.rank_char())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

/// 王车易位方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CastlingSide {
    Kingside,
    Queenside,
}

/// 一步已执行的走法记录，构造后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    pub from: Position,
    pub to: Position,
    /// 走子前的棋子快照
    pub piece: Piece,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured: Option<Piece>,
    #[serde(default)]
    pub is_en_passant: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_castling: Option<CastlingSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceType>,
    #[serde(default)]
    pub is_check: bool,
    #[serde(default)]
    pub is_checkmate: bool,
    #[serde(default)]
    pub notation: String,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.notation)
    }
}
