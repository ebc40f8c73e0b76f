//! 国际象棋棋盘
//!
//! 使用 8x8 数组存储棋子。提供伪合法走法生成、攻击检测、
//! 王车易位资格判断，以及"复制棋盘后模拟走子"的合法性过滤。

use serde::{Deserialize, Serialize};

use crate::types::{Color, Piece, PieceType, Position};

/// 马的 8 个跳跃方向
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

/// 王的 8 个相邻方向
const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// 底线棋子排列（a 线到 h 线）
const BACK_RANK: [PieceType; 8] = [
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Queen,
    PieceType::King,
    PieceType::Bishop,
    PieceType::Knight,
    PieceType::Rook,
];

/// 王车易位资格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CastlingRights {
    pub kingside: bool,
    pub queenside: bool,
}

/// 棋盘（值类型，复制后再修改）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    squares: [[Option<Piece>; 8]; 8],
}

impl Default for Board {
    fn default() -> Self {
        Board::initial()
    }
}

impl Board {
    /// 空棋盘
    pub fn empty() -> Self {
        Board {
            squares: [[None; 8]; 8],
        }
    }

    /// 标准开局
    pub fn initial() -> Self {
        let mut board = Board::empty();
        for (col, piece_type) in BACK_RANK.iter().enumerate() {
            let col = col as i8;
            board.set(Position::new(0, col), Some(Piece::new(*piece_type, Color::Black)));
            board.set(Position::new(1, col), Some(Piece::new(PieceType::Pawn, Color::Black)));
            board.set(Position::new(6, col), Some(Piece::new(PieceType::Pawn, Color::White)));
            board.set(Position::new(7, col), Some(Piece::new(*piece_type, Color::White)));
        }
        board
    }

    /// 获取某位置的棋子，越界返回 None
    #[inline]
    pub fn get(&self, pos: Position) -> Option<Piece> {
        if !pos.is_valid() {
            return None;
        }
        self.squares[pos.row as usize][pos.col as usize]
    }

    /// 设置某位置的棋子，越界时忽略
    #[inline]
    pub fn set(&mut self, pos: Position, piece: Option<Piece>) {
        if pos.is_valid() {
            self.squares[pos.row as usize][pos.col as usize] = piece;
        }
    }

    /// 取走某位置的棋子
    #[inline]
    pub fn take(&mut self, pos: Position) -> Option<Piece> {
        let piece = self.get(pos);
        self.set(pos, None);
        piece
    }

    #[inline]
    fn is_empty_square(&self, pos: Position) -> bool {
        pos.is_valid() && self.get(pos).is_none()
    }

    /// 按行优先顺序遍历所有棋子
    pub fn pieces(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        (0..8i8).flat_map(move |row| {
            (0..8i8).filter_map(move |col| {
                let pos = Position::new(row, col);
                self.get(pos).map(|piece| (pos, piece))
            })
        })
    }

    /// 获取某一方的所有棋子
    pub fn pieces_of(&self, color: Color) -> Vec<(Position, Piece)> {
        self.pieces().filter(|(_, p)| p.color == color).collect()
    }

    /// 找到王的位置
    pub fn find_king(&self, color: Color) -> Option<Position> {
        self.pieces()
            .find(|(_, p)| p.piece_type == PieceType::King && p.color == color)
            .map(|(pos, _)| pos)
    }

    // ========================================================================
    // 攻击检测
    // ========================================================================

    /// 检查 target 是否被 by 方攻击
    pub fn is_square_attacked(&self, target: Position, by: Color) -> bool {
        // 兵：攻击者位于目标格"身后"的斜对角
        let pawn_row = target.row - by.pawn_direction();
        for dc in [-1, 1] {
            if let Some(p) = self.get(Position::new(pawn_row, target.col + dc)) {
                if p.piece_type == PieceType::Pawn && p.color == by {
                    return true;
                }
            }
        }

        if self.has_attacker_at(target, by, &KNIGHT_OFFSETS, PieceType::Knight)
            || self.has_attacker_at(target, by, &KING_OFFSETS, PieceType::King)
        {
            return true;
        }

        self.has_slider_on_ray(target, by, &ROOK_DIRECTIONS, PieceType::Rook)
            || self.has_slider_on_ray(target, by, &BISHOP_DIRECTIONS, PieceType::Bishop)
    }

    fn has_attacker_at(
        &self,
        target: Position,
        by: Color,
        offsets: &[(i8, i8)],
        piece_type: PieceType,
    ) -> bool {
        offsets.iter().any(|&(dr, dc)| {
            self.get(target.offset(dr, dc))
                .map_or(false, |p| p.piece_type == piece_type && p.color == by)
        })
    }

    /// 沿射线找到第一个棋子，判断是否为对应的滑行棋子或后
    fn has_slider_on_ray(
        &self,
        target: Position,
        by: Color,
        directions: &[(i8, i8)],
        slider: PieceType,
    ) -> bool {
        for &(dr, dc) in directions {
            let mut pos = target.offset(dr, dc);
            while pos.is_valid() {
                if let Some(p) = self.get(pos) {
                    if p.color == by
                        && (p.piece_type == slider || p.piece_type == PieceType::Queen)
                    {
                        return true;
                    }
                    break;
                }
                pos = pos.offset(dr, dc);
            }
        }
        false
    }

    /// 检查某方是否被将军（没有王时视为未被将军）
    pub fn is_in_check(&self, color: Color) -> bool {
        self.find_king(color)
            .map_or(false, |king| self.is_square_attacked(king, color.opposite()))
    }

    // ========================================================================
    // 走法生成
    // ========================================================================

    /// 获取伪合法目标格（不考虑自身是否被将军，不含王车易位）
    pub fn raw_moves(&self, from: Position, en_passant: Option<Position>) -> Vec<Position> {
        let piece = match self.get(from) {
            Some(p) => p,
            None => return Vec::new(),
        };

        match piece.piece_type {
            PieceType::Pawn => self.pawn_moves(from, piece.color, en_passant),
            PieceType::Knight => self.step_moves(from, piece.color, &KNIGHT_OFFSETS),
            PieceType::King => self.step_moves(from, piece.color, &KING_OFFSETS),
            PieceType::Bishop => self.slide_moves(from, piece.color, &BISHOP_DIRECTIONS),
            PieceType::Rook => self.slide_moves(from, piece.color, &ROOK_DIRECTIONS),
            PieceType::Queen => {
                let mut moves = self.slide_moves(from, piece.color, &ROOK_DIRECTIONS);
                moves.extend(self.slide_moves(from, piece.color, &BISHOP_DIRECTIONS));
                moves
            }
        }
    }

    /// 兵的走法：前进一格、起始行前进两格、斜吃、吃过路兵
    ///
    /// 吃过路兵额外要求起点旁边确实有对方的兵；只看过路兵格本身的规则
    /// 会接受任意斜走到该格，两者在正常对局中没有区别，但存档或手写 FEN
    /// 里残留的过路兵格在这里不会产生走法。
    fn pawn_moves(&self, from: Position, color: Color, en_passant: Option<Position>) -> Vec<Position> {
        let mut moves = Vec::with_capacity(4);
        let dir = color.pawn_direction();

        let one = from.offset(dir, 0);
        if self.is_empty_square(one) {
            moves.push(one);
            let two = from.offset(2 * dir, 0);
            if from.row == color.pawn_start_row() && self.is_empty_square(two) {
                moves.push(two);
            }
        }

        for dc in [-1, 1] {
            let target = from.offset(dir, dc);
            if !target.is_valid() {
                continue;
            }
            if let Some(victim) = self.get(target) {
                if victim.color != color {
                    moves.push(target);
                }
            } else if en_passant == Some(target) {
                let passed = self.get(Position::new(from.row, target.col));
                if passed.map_or(false, |p| p.piece_type == PieceType::Pawn && p.color != color) {
                    moves.push(target);
                }
            }
        }

        moves
    }

    fn step_moves(&self, from: Position, color: Color, offsets: &[(i8, i8)]) -> Vec<Position> {
        offsets
            .iter()
            .map(|&(dr, dc)| from.offset(dr, dc))
            .filter(|to| to.is_valid() && self.get(*to).map_or(true, |p| p.color != color))
            .collect()
    }

    fn slide_moves(&self, from: Position, color: Color, directions: &[(i8, i8)]) -> Vec<Position> {
        let mut moves = Vec::with_capacity(14);
        for &(dr, dc) in directions {
            let mut to = from.offset(dr, dc);
            while to.is_valid() {
                match self.get(to) {
                    None => moves.push(to),
                    Some(p) => {
                        if p.color != color {
                            moves.push(to);
                        }
                        break;
                    }
                }
                to = to.offset(dr, dc);
            }
        }
        moves
    }

    /// 王车易位资格
    ///
    /// 要求王与车都未移动、中间格为空、王当前未被将军，
    /// 短易位检查 f、g 格不受攻击，长易位检查 c、d 格不受攻击（b 格只需为空）。
    pub fn castling_rights(&self, color: Color) -> CastlingRights {
        let mut rights = CastlingRights::default();
        let row = color.back_rank();

        let king_home = self.get(Position::new(row, 4));
        if !king_home.map_or(false, |k| {
            k.piece_type == PieceType::King && k.color == color && !k.has_moved
        }) {
            return rights;
        }
        if self.is_in_check(color) {
            return rights;
        }

        let enemy = color.opposite();
        let unmoved_rook = |col: i8| {
            self.get(Position::new(row, col)).map_or(false, |r| {
                r.piece_type == PieceType::Rook && r.color == color && !r.has_moved
            })
        };
        let empty = |cols: &[i8]| cols.iter().all(|&c| self.get(Position::new(row, c)).is_none());
        let safe = |cols: &[i8]| {
            cols.iter()
                .all(|&c| !self.is_square_attacked(Position::new(row, c), enemy))
        };

        rights.kingside = unmoved_rook(7) && empty(&[5, 6]) && safe(&[5, 6]);
        rights.queenside = unmoved_rook(0) && empty(&[1, 2, 3]) && safe(&[2, 3]);
        rights
    }

    /// 模拟走子后检查己方王是否安全
    fn leaves_king_safe(&self, from: Position, to: Position, piece: Piece, en_passant: Option<Position>) -> bool {
        let mut test = self.clone();
        test.set(to, Some(piece));
        test.set(from, None);
        if piece.piece_type == PieceType::Pawn && en_passant == Some(to) && from.col != to.col {
            test.set(Position::new(from.row, to.col), None);
        }
        !test.is_in_check(piece.color)
    }

    /// 获取合法目标格：伪合法走法过滤掉送将的，再追加王车易位
    pub fn valid_moves(&self, from: Position, en_passant: Option<Position>) -> Vec<Position> {
        let piece = match self.get(from) {
            Some(p) => p,
            None => return Vec::new(),
        };

        let mut moves: Vec<Position> = self
            .raw_moves(from, en_passant)
            .into_iter()
            .filter(|&to| self.leaves_king_safe(from, to, piece, en_passant))
            .collect();

        if piece.piece_type == PieceType::King
            && !piece.has_moved
            && from == Position::new(piece.color.back_rank(), 4)
        {
            let rights = self.castling_rights(piece.color);
            if rights.kingside {
                moves.push(Position::new(from.row, 6));
            }
            if rights.queenside {
                moves.push(Position::new(from.row, 2));
            }
        }

        moves
    }

    /// 某方是否还有任意合法走法（找到即返回）
    pub fn has_any_valid_moves(&self, color: Color, en_passant: Option<Position>) -> bool {
        self.pieces()
            .filter(|(_, p)| p.color == color)
            .any(|(pos, _)| !self.valid_moves(pos, en_passant).is_empty())
    }

    // ========================================================================
    // 局面摘要
    // ========================================================================

    /// 棋子布局串（FEN 第一段），用于重复局面判断
    pub fn placement(&self) -> String {
        let mut out = String::with_capacity(64);
        for row in 0..8i8 {
            let mut empty = 0;
            for col in 0..8i8 {
                match self.get(Position::new(row, col)) {
                    Some(piece) => {
                        if empty > 0 {
                            out.push_str(&empty.to_string());
                            empty = 0;
                        }
                        out.push(piece.to_fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            if row < 7 {
                out.push('/');
            }
        }
        out
    }

    /// 子力不足（简化规则）
    ///
    /// 单王对单王；王加一个轻子对单王；双方各剩一象（不区分格色）。
    pub fn has_insufficient_material(&self) -> bool {
        let pieces: Vec<Piece> = self.pieces().map(|(_, p)| p).collect();
        match pieces.len() {
            2 => true,
            3 => {
                let non_kings: Vec<&Piece> = pieces
                    .iter()
                    .filter(|p| p.piece_type != PieceType::King)
                    .collect();
                non_kings.len() == 1 && non_kings[0].piece_type.is_minor()
            }
            4 => {
                pieces
                    .iter()
                    .filter(|p| p.piece_type == PieceType::Bishop)
                    .count()
                    == 2
            }
            _ => false,
        }
    }

    /// 纯子力分差（白正黑负），不含王
    pub fn material_balance(&self) -> i32 {
        self.pieces()
            .filter(|(_, p)| p.piece_type != PieceType::King)
            .map(|(_, p)| match p.color {
                Color::White => p.piece_type.value(),
                Color::Black => -p.piece_type.value(),
            })
            .sum()
    }
}
