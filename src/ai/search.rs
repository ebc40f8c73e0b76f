//! Alpha-Beta 极小极大搜索 + 迭代加深
//!
//! 搜索状态（随机数、节点计数、杀手走法）都放在 `SearchContext` 里，
//! 每次 `get_ai_move` 新建一个，不使用全局变量。

use log::debug;
use rand::prelude::*;
use std::cmp::Reverse;
use std::time::{Duration, Instant};

use super::eval::evaluate_advanced;
use super::{move_order_score, order_moves, sort_and_truncate, AIMove, ScoredMove};
use crate::game::{legal_moves_for, GameState, LegalMove};
use crate::types::Color;

/// 将死基准分
pub const MATE_SCORE: i32 = 100_000;

/// 杀手走法的排序加分（低于大多数吃子）
const KILLER_BONUS: i32 = 50;

/// 将死分数：剩余深度越小（越晚发生）分数越靠近 0
#[inline]
fn mate_score(depth: u32, maximizing: bool) -> i32 {
    let distance = (10 - depth as i32) * 100;
    if maximizing {
        -MATE_SCORE + distance
    } else {
        MATE_SCORE - distance
    }
}

/// 一次搜索的结果
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// 最深一轮完成后的最佳走法
    pub best: Option<AIMove>,
    /// 完成的最大深度
    pub depth: u32,
    /// 访问的节点数
    pub nodes: u64,
    /// 最深一轮所有根走法的（未加噪声）分数，降序
    pub scored: Vec<ScoredMove>,
}

/// 搜索上下文
pub struct SearchContext {
    rng: StdRng,
    nodes: u64,
    /// 按剩余深度索引，每层两个槽位
    killers: Vec<[Option<LegalMove>; 2]>,
    noise_width: f64,
}

impl SearchContext {
    pub fn new(seed: Option<u64>, noise_width: f64) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        SearchContext {
            rng,
            nodes: 0,
            killers: Vec::new(),
            noise_width,
        }
    }

    #[inline]
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// 根走法的评分噪声，宽度为 0 时不消耗随机数
    fn noise(&mut self) -> f64 {
        if self.noise_width > 0.0 {
            (self.rng.gen::<f64>() - 0.5) * self.noise_width
        } else {
            0.0
        }
    }

    fn killer_slots(&self, depth: u32) -> Option<&[Option<LegalMove>; 2]> {
        self.killers.get(depth as usize)
    }

    fn record_killer(&mut self, depth: u32, mv: LegalMove) {
        let idx = depth as usize;
        if self.killers.len() <= idx {
            self.killers.resize(idx + 1, [None, None]);
        }
        let slots = &mut self.killers[idx];
        if slots[0] != Some(mv) {
            slots[1] = slots[0];
            slots[0] = Some(mv);
        }
    }

    /// 内部节点的走法排序：MVV-LVA、升后、中心，再加杀手走法
    fn ordered_moves(&self, state: &GameState, side: Color, depth: u32) -> Vec<LegalMove> {
        let mut moves = legal_moves_for(&state.board, side, state.en_passant_target);
        let killers = self.killer_slots(depth).copied().unwrap_or([None, None]);
        moves.sort_by_cached_key(|mv| {
            let bonus = if killers.contains(&Some(*mv)) { KILLER_BONUS } else { 0 };
            Reverse(move_order_score(&state.board, mv) + bonus)
        });
        moves
    }

    /// Alpha-Beta 极小极大
    ///
    /// 分数始终站在 `root_color` 一方：`maximizing` 为真时轮到 `root_color` 走。
    pub fn minimax(
        &mut self,
        state: &GameState,
        depth: u32,
        mut alpha: i32,
        mut beta: i32,
        maximizing: bool,
        root_color: Color,
    ) -> i32 {
        self.nodes += 1;

        if depth == 0 || state.is_checkmate || state.is_draw || state.is_stalemate {
            if state.is_checkmate {
                return mate_score(depth, maximizing);
            }
            if state.is_draw || state.is_stalemate {
                return 0;
            }
            let eval = evaluate_advanced(state);
            return match root_color {
                Color::White => eval,
                Color::Black => -eval,
            };
        }

        let side = if maximizing { root_color } else { root_color.opposite() };
        let moves = self.ordered_moves(state, side, depth);

        if moves.is_empty() {
            if state.is_check {
                return if maximizing { -MATE_SCORE } else { MATE_SCORE };
            }
            return 0;
        }

        if maximizing {
            let mut max_eval = i32::MIN;
            for mv in moves {
                let Ok(child) = state.apply(&mv) else { continue };
                let eval = self.minimax(&child, depth - 1, alpha, beta, false, root_color);
                max_eval = max_eval.max(eval);
                alpha = alpha.max(eval);
                if beta <= alpha {
                    if is_quiet(state, &mv) {
                        self.record_killer(depth, mv);
                    }
                    break;
                }
            }
            max_eval
        } else {
            let mut min_eval = i32::MAX;
            for mv in moves {
                let Ok(child) = state.apply(&mv) else { continue };
                let eval = self.minimax(&child, depth - 1, alpha, beta, true, root_color);
                min_eval = min_eval.min(eval);
                beta = beta.min(eval);
                if beta <= alpha {
                    if is_quiet(state, &mv) {
                        self.record_killer(depth, mv);
                    }
                    break;
                }
            }
            min_eval
        }
    }

    /// 迭代加深：深度 1..=max_depth 依次对每个根走法做全窗口搜索
    ///
    /// 同一轮中以"分数 + 噪声"严格大于当前最好者为准（并列保留先出现的），
    /// 记录的分数不含噪声。时间限制只在开始新一轮之前检查。
    pub fn search_root(
        &mut self,
        state: &GameState,
        max_depth: u32,
        time_limit: Option<Duration>,
    ) -> SearchOutcome {
        let color = state.current_player;
        let mut moves = legal_moves_for(&state.board, color, state.en_passant_target);
        let mut outcome = SearchOutcome::default();
        if moves.is_empty() {
            return outcome;
        }
        order_moves(&mut moves, &state.board);

        let start_time = Instant::now();

        for depth in 1..=max_depth.max(1) {
            if depth > 1 {
                if let Some(limit) = time_limit {
                    if start_time.elapsed() >= limit {
                        debug!("时间到，停止于深度 {}", depth - 1);
                        break;
                    }
                }
            }

            let mut best: Option<AIMove> = None;
            let mut best_adjusted = f64::NEG_INFINITY;
            let mut scored = Vec::with_capacity(moves.len());

            for mv in &moves {
                let Ok(child) = state.apply(mv) else { continue };
                let score = self.minimax(&child, depth - 1, i32::MIN, i32::MAX, false, color);
                let adjusted = score as f64 + self.noise();

                if adjusted > best_adjusted {
                    best_adjusted = adjusted;
                    best = Some(AIMove::new(*mv, score));
                }
                scored.push(ScoredMove { mv: *mv, score });
            }

            if let Some(found) = best {
                debug!(
                    "深度 {} 完成: best={} score={} nodes={}",
                    depth, found, found.score, self.nodes
                );
                outcome.best = Some(found);
                outcome.depth = depth;
                sort_and_truncate(&mut scored, usize::MAX);
                outcome.scored = scored;
            }
        }

        outcome.nodes = self.nodes;
        outcome
    }
}

/// 不吃子且不升变的走法才记为杀手走法
#[inline]
fn is_quiet(state: &GameState, mv: &LegalMove) -> bool {
    mv.promotion.is_none() && state.board.get(mv.to).is_none()
}
