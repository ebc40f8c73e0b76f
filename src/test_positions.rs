//! 国际象棋测试局面库
//!
//! 提供命名的 FEN 测试局面，方便测试、基准和调试
//!
//! 命名规范:
//! - START: 初始局面
//! - EARLY_n: 开局阶段
//! - MID_n: 中局
//! - END_n: 残局
//! - MATE_n: 杀棋测试
//! - 其余: 特殊规则（过路兵、易位、升变、逼和、子力不足）

pub use crate::fen::START_FEN as START;

// =============================================================================
// 开局 (EARLY)
// =============================================================================

/// 1.e4
pub const EARLY_1: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";

/// 西西里防御 1.e4 c5
pub const EARLY_2: &str = "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq c6 0 2";

/// 意大利开局 1.e4 e5 2.Nf3 Nc6 3.Bc4
pub const EARLY_3: &str = "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3";

/// 后翼弃兵拒绝 1.d4 d5 2.c4 e6
pub const EARLY_4: &str = "rnbqkbnr/ppp2ppp/4p3/3p4/2PP4/8/PP2PPPP/RNBQKBNR w KQkq - 0 3";

// =============================================================================
// 中局 (MID)
// =============================================================================

/// Kiwipete：易位、过路兵、升变都很密集的 perft 局面
pub const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

/// 封闭式西班牙开局，双方已易位
pub const MID_1: &str = "r1bq1rk1/2p1bppp/p1np1n2/1p2p3/4P3/1BP2N1P/PP1P1PP1/RNBQR1K1 b - - 0 9";

// =============================================================================
// 残局 (END)
// =============================================================================

/// perft 第三局面：车兵残局，含过路兵带来的横向牵制
pub const POSITION_3: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";

/// 王车对单王
pub const END_1: &str = "4k3/8/8/8/8/8/8/R3K3 w - - 0 1";

/// 王兵对单王
pub const END_2: &str = "8/8/8/4k3/8/8/4P3/4K3 w - - 0 1";

/// 双方各剩一象：任何一步之后都是子力不足
pub const BISHOPS_ONLY: &str = "4k3/8/2b5/8/8/5B2/8/4K3 w - - 0 1";

/// 单王对单王
pub const KINGS_ONLY: &str = "4k3/8/8/8/8/8/8/4K3 w - - 0 1";

// =============================================================================
// 杀棋 (MATE)
// =============================================================================

/// 底线一步杀：Ra8#
pub const MATE_IN_ONE: &str = "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1";

/// 愚人杀之后，白方被将死
pub const CHECKMATED: &str = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";

// =============================================================================
// 特殊规则
// =============================================================================

/// 黑方被逼和
pub const STALEMATE: &str = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1";

/// 白方可以 exf6 吃过路兵
pub const EN_PASSANT: &str = "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3";

/// 双方都保留两侧易位权
pub const CASTLING: &str = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";

/// a 兵即将升变
pub const PROMOTION: &str = "8/P6k/8/8/8/8/8/K7 w - - 0 1";

// =============================================================================
// 分类集合
// =============================================================================

pub const EARLY_POSITIONS: [&str; 4] = [EARLY_1, EARLY_2, EARLY_3, EARLY_4];
pub const MID_POSITIONS: [&str; 2] = [KIWIPETE, MID_1];
pub const END_POSITIONS: [&str; 5] = [POSITION_3, END_1, END_2, BISHOPS_ONLY, KINGS_ONLY];
pub const MATE_POSITIONS: [&str; 2] = [MATE_IN_ONE, CHECKMATED];
pub const SPECIAL_POSITIONS: [&str; 4] = [STALEMATE, EN_PASSANT, CASTLING, PROMOTION];

/// 按名称查找局面（CLI 的 `--fen` 也接受这些名称）
pub fn by_name(name: &str) -> Option<&'static str> {
    let fen = match name.to_ascii_lowercase().as_str() {
        "start" | "startpos" => START,
        "early_1" => EARLY_1,
        "early_2" => EARLY_2,
        "early_3" => EARLY_3,
        "early_4" => EARLY_4,
        "kiwipete" => KIWIPETE,
        "mid_1" => MID_1,
        "position_3" => POSITION_3,
        "end_1" => END_1,
        "end_2" => END_2,
        "bishops_only" => BISHOPS_ONLY,
        "kings_only" => KINGS_ONLY,
        "mate_in_one" => MATE_IN_ONE,
        "checkmated" => CHECKMATED,
        "stalemate" => STALEMATE,
        "en_passant" => EN_PASSANT,
        "castling" => CASTLING,
        "promotion" => PROMOTION,
        _ => return None,
    };
    Some(fen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::parse_fen;

    fn assert_all_valid(group: &str, positions: &[&str]) {
        for (i, fen) in positions.iter().enumerate() {
            let state = parse_fen(fen);
            assert!(state.is_ok(), "{}_{} invalid: {:?}", group, i + 1, state.err());
        }
    }

    #[test]
    fn test_all_positions_valid() {
        assert_all_valid("EARLY", &EARLY_POSITIONS);
        assert_all_valid("MID", &MID_POSITIONS);
        assert_all_valid("END", &END_POSITIONS);
        assert_all_valid("MATE", &MATE_POSITIONS);
        assert_all_valid("SPECIAL", &SPECIAL_POSITIONS);
    }

    #[test]
    fn test_special_flags() {
        assert!(parse_fen(CHECKMATED).unwrap().is_checkmate);
        assert!(parse_fen(STALEMATE).unwrap().is_stalemate);
        assert!(!parse_fen(MATE_IN_ONE).unwrap().is_terminal());
    }

    #[test]
    fn test_by_name() {
        assert_eq!(by_name("KiwiPete"), Some(KIWIPETE));
        assert_eq!(by_name("startpos"), Some(START));
        assert_eq!(by_name("nope"), None);
    }
}
