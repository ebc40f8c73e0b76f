//! AI 模块
//!
//! 难度分级、走法排序、开局库接入，以及对外的 `get_ai_move`。
//! 局面评估见 `eval`，搜索见 `search`。

pub mod eval;
pub mod search;

pub use eval::{evaluate_advanced, evaluate_basic, evaluate_detail, EvalDetail};
pub use search::{SearchContext, SearchOutcome, MATE_SCORE};

use log::{info, trace};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::board::Board;
use crate::book;
use crate::game::{GameState, LegalMove};
use crate::types::{Color, PieceType, Position};

/// 升后的排序加分
const QUEEN_PROMOTION_BONUS: i32 = 900;
/// 走到中心四格的排序加分
const CENTER_MOVE_BONUS: i32 = 15;

/// 难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    /// 难度对应的最大搜索深度
    pub fn max_depth(self) -> u32 {
        match self {
            Difficulty::Easy => 2,
            Difficulty::Medium => 4,
            Difficulty::Hard => 6,
            Difficulty::Expert => 8,
        }
    }

    /// 根走法评分噪声的总宽度（均匀分布，中心为 0）
    pub fn noise_width(self) -> f64 {
        match self {
            Difficulty::Easy => 40.0,
            Difficulty::Medium => 20.0,
            Difficulty::Hard | Difficulty::Expert => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "expert" => Ok(Difficulty::Expert),
            _ => Err(format!(
                "Unknown difficulty: {}. Available: easy, medium, hard, expert",
                s
            )),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// AI 配置
#[derive(Debug, Clone, Default)]
pub struct AIConfig {
    pub difficulty: Difficulty,
    /// 随机种子
    pub seed: Option<u64>,
    /// 覆盖难度对应的搜索深度
    pub max_depth: Option<u32>,
    /// 时间限制（秒），只决定是否开始下一轮加深
    pub time_limit: Option<f64>,
    /// 是否直接采用开局库走法
    pub use_book: bool,
}

impl AIConfig {
    pub fn with_difficulty(difficulty: Difficulty) -> Self {
        AIConfig {
            difficulty,
            ..Default::default()
        }
    }

    pub fn search_depth(&self) -> u32 {
        self.max_depth.unwrap_or_else(|| self.difficulty.max_depth())
    }

    fn time_budget(&self) -> Option<Duration> {
        self.time_limit
            .and_then(|secs| Duration::try_from_secs_f64(secs.max(0.0)).ok())
    }
}

/// AI 选出的走法及其（不含噪声的）搜索分数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AIMove {
    pub from: Position,
    pub to: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceType>,
    pub score: i32,
}

impl AIMove {
    pub fn new(mv: LegalMove, score: i32) -> Self {
        AIMove {
            from: mv.from,
            to: mv.to,
            promotion: mv.promotion,
            score,
        }
    }

    pub fn as_legal_move(&self) -> LegalMove {
        LegalMove::new(self.from, self.to, self.promotion)
    }
}

impl fmt::Display for AIMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_legal_move())
    }
}

/// 走法评分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoredMove {
    pub mv: LegalMove,
    pub score: i32,
}

/// 按分数降序（稳定）并截断
pub(crate) fn sort_and_truncate(scored: &mut Vec<ScoredMove>, n: usize) {
    scored.sort_by_key(|sm| Reverse(sm.score));
    scored.truncate(n);
}

/// 走法排序分：MVV-LVA、升后、中心
pub fn move_order_score(board: &Board, mv: &LegalMove) -> i32 {
    let mut score = 0;
    if let (Some(victim), Some(attacker)) = (board.get(mv.to), board.get(mv.from)) {
        score += victim.piece_type.value() - attacker.piece_type.value() / 10;
    }
    if mv.promotion == Some(PieceType::Queen) {
        score += QUEEN_PROMOTION_BONUS;
    }
    if eval::CENTER_SQUARES.contains(&mv.to) {
        score += CENTER_MOVE_BONUS;
    }
    score
}

/// 按排序分降序排列，同分保持生成顺序
pub fn order_moves(moves: &mut [LegalMove], board: &Board) {
    moves.sort_by_cached_key(|mv| Reverse(move_order_score(board, mv)));
}

/// 完整搜索，返回最佳走法和最深一轮的全部根分数
///
/// 开局库阶段总会取一个候选并记录；只有 `use_book` 打开时才直接采用它。
pub fn analyze(state: &GameState, config: &AIConfig) -> SearchOutcome {
    let color = state.current_player;
    let mut ctx = SearchContext::new(config.seed, config.difficulty.noise_width());

    let ply = state.move_history.len();
    if book::is_in_book(ply) {
        let history: Vec<&str> = state
            .move_history
            .iter()
            .map(|m| m.notation.trim_end_matches(|c: char| c == '+' || c == '#'))
            .collect();
        if let Some(token) = book::get_book_move(&history[..], ctx.rng_mut()) {
            trace!("开局库候选: {} (ply {})", token, ply);
            if config.use_book {
                if let Some(mv) = state.find_move_by_san(token) {
                    if let Ok(child) = state.apply(&mv) {
                        let score = ctx.minimax(&child, 0, i32::MIN, i32::MAX, false, color);
                        let best = AIMove::new(mv, score);
                        info!("{} 采用开局库走法 {} ({})", color, token, best);
                        return SearchOutcome {
                            best: Some(best),
                            depth: 0,
                            nodes: ctx.nodes(),
                            scored: vec![ScoredMove { mv, score }],
                        };
                    }
                }
            }
        }
    }

    let outcome = ctx.search_root(state, config.search_depth(), config.time_budget());
    if let Some(best) = outcome.best {
        info!(
            "{} [{}] 选择 {} score={} depth={} nodes={}",
            color, config.difficulty, best, best.score, outcome.depth, outcome.nodes
        );
    }
    outcome
}

/// 为当前行棋方选一步棋；无合法走法时返回 `None`
pub fn get_ai_move(state: &GameState, config: &AIConfig) -> Option<AIMove> {
    analyze(state, config).best
}

/// 积分：吃子价值 1/3/3/5/9，对方被将军 +1，被将死 +20
pub fn calculate_points(state: &GameState, color: Color) -> u32 {
    let mut points: u32 = state
        .captured_pieces
        .by(color)
        .iter()
        .map(|p| match p.piece_type {
            PieceType::Pawn => 1,
            PieceType::Knight | PieceType::Bishop => 3,
            PieceType::Rook => 5,
            PieceType::Queen => 9,
            PieceType::King => 0,
        })
        .sum();
    if state.current_player != color {
        if state.is_check {
            points += 1;
        }
        if state.is_checkmate {
            points += 20;
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::parse_fen;
    use crate::test_positions::{BISHOPS_ONLY, CHECKMATED, EN_PASSANT, STALEMATE};

    fn config(difficulty: Difficulty, seed: u64) -> AIConfig {
        AIConfig {
            difficulty,
            seed: Some(seed),
            ..Default::default()
        }
    }

    fn sq(s: &str) -> Position {
        Position::from_algebraic(s).unwrap()
    }

    #[test]
    fn test_difficulty_table() {
        let depths: Vec<u32> = Difficulty::ALL.iter().map(|d| d.max_depth()).collect();
        assert_eq!(depths, vec![2, 4, 6, 8]);
        assert_eq!(Difficulty::default(), Difficulty::Medium);
        assert_eq!("Hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("grandmaster".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::Expert.to_string(), "expert");
    }

    #[test]
    fn test_config_depth_override() {
        let mut cfg = AIConfig::with_difficulty(Difficulty::Hard);
        assert_eq!(cfg.search_depth(), 6);
        cfg.max_depth = Some(3);
        assert_eq!(cfg.search_depth(), 3);
        cfg.time_limit = Some(-1.0);
        assert_eq!(cfg.time_budget(), Some(Duration::ZERO));
    }

    #[test]
    fn test_every_tier_returns_legal_move() {
        let state = parse_fen(BISHOPS_ONLY).unwrap();
        let legal = state.legal_moves();
        for difficulty in Difficulty::ALL {
            let mv = get_ai_move(&state, &config(difficulty, 11)).unwrap();
            assert!(legal.contains(&mv.as_legal_move()), "{}: {}", difficulty, mv);
        }
    }

    #[test]
    fn test_easy_from_start_is_legal() {
        let state = GameState::new();
        let mv = get_ai_move(&state, &config(Difficulty::Easy, 7)).unwrap();
        assert!(state.legal_moves().contains(&mv.as_legal_move()));
        assert!(state.apply(&mv.as_legal_move()).is_ok());
    }

    #[test]
    fn test_seeded_search_is_deterministic() {
        let state = GameState::new();
        let cfg = config(Difficulty::Easy, 42);
        let a = get_ai_move(&state, &cfg);
        let b = get_ai_move(&state, &cfg);
        assert_eq!(a, b);
    }

    #[test]
    fn test_recorded_score_has_no_noise() {
        let state = GameState::new();
        let outcome = analyze(&state, &config(Difficulty::Easy, 3));
        let best = outcome.best.unwrap();
        let entry = outcome
            .scored
            .iter()
            .find(|s| s.mv == best.as_legal_move())
            .unwrap();
        assert_eq!(entry.score, best.score);
    }

    #[test]
    fn test_no_move_when_game_over() {
        let mated = parse_fen(CHECKMATED).unwrap();
        assert!(get_ai_move(&mated, &config(Difficulty::Hard, 1)).is_none());
        let stalemate = parse_fen(STALEMATE).unwrap();
        assert!(get_ai_move(&stalemate, &config(Difficulty::Hard, 1)).is_none());
    }

    #[test]
    fn test_book_move_from_start() {
        let state = GameState::new();
        let cfg = AIConfig {
            use_book: true,
            ..config(Difficulty::Expert, 5)
        };
        let outcome = analyze(&state, &cfg);
        assert_eq!(outcome.depth, 0);
        let mv = outcome.best.unwrap().as_legal_move();
        let next = state.apply(&mv).unwrap();
        let san = next.move_history.last().unwrap().notation.clone();
        assert!(["e4", "d4", "c4", "Nf3"].contains(&san.as_str()), "{}", san);
    }

    #[test]
    fn test_time_limit_keeps_first_depth() {
        let state = GameState::new();
        let cfg = AIConfig {
            time_limit: Some(0.0),
            ..config(Difficulty::Expert, 2)
        };
        let outcome = analyze(&state, &cfg);
        assert_eq!(outcome.depth, 1);
        assert!(outcome.best.is_some());
    }

    #[test]
    fn test_captures_hanging_queen() {
        let state = parse_fen("4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1").unwrap();
        let cfg = AIConfig {
            max_depth: Some(2),
            ..config(Difficulty::Hard, 1)
        };
        let mv = get_ai_move(&state, &cfg).unwrap();
        assert_eq!((mv.from, mv.to), (sq("d1"), sq("d5")));
    }

    #[test]
    fn test_move_ordering() {
        let board = parse_fen("4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1").unwrap().board;
        let capture = LegalMove::new(sq("d1"), sq("d5"), None);
        let quiet = LegalMove::new(sq("d1"), sq("d2"), None);
        assert_eq!(move_order_score(&board, &capture), 900 - 50 + CENTER_MOVE_BONUS);
        assert_eq!(move_order_score(&board, &quiet), 0);
        let center = LegalMove::new(sq("d1"), sq("d4"), None);
        assert_eq!(move_order_score(&board, &center), CENTER_MOVE_BONUS);

        let mut moves = vec![quiet, center, capture];
        order_moves(&mut moves, &board);
        assert_eq!(moves, vec![capture, center, quiet]);
    }

    #[test]
    fn test_calculate_points() {
        // 愚人杀：黑方将死白方，未吃子
        let mated = parse_fen(CHECKMATED).unwrap();
        assert_eq!(calculate_points(&mated, Color::Black), 21);
        assert_eq!(calculate_points(&mated, Color::White), 0);

        let state = parse_fen(EN_PASSANT).unwrap();
        let next = state.make_move(sq("e5"), sq("f6"), None).unwrap();
        assert_eq!(calculate_points(&next, Color::White), 1);
        assert_eq!(calculate_points(&next, Color::Black), 0);
    }
}
