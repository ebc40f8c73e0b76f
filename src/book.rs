//! 开局库
//!
//! 每条开局线是一串记谱（空格分隔），带开局名称和 ECO 编码。
//! 查询时要求已走记谱序列与开局线前缀完全一致。

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// 开局库只在前 12 个半回合内使用
pub const BOOK_PLY_LIMIT: usize = 12;

/// 一条开局线
#[derive(Debug, Clone)]
pub struct OpeningLine {
    pub moves: Vec<&'static str>,
    pub name: &'static str,
    pub eco: &'static str,
}

/// 开局名称和 ECO 编码
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpeningInfo {
    pub name: &'static str,
    pub eco: &'static str,
}

/// (走法, 名称, ECO)
const BOOK_TABLE: &[(&str, &str, &str)] = &[
    // 西西里防御
    ("e4 c5", "Sicilian Defense", "B20"),
    ("e4 c5 Nf3", "Sicilian Defense", "B20"),
    ("e4 c5 Nf3 d6", "Sicilian Defense, Old Sicilian", "B30"),
    ("e4 c5 Nf3 d6 d4 cxd4 Nxd4", "Sicilian Defense, Open", "B40"),
    ("e4 c5 Nf3 d6 d4 cxd4 Nxd4 Nf6", "Sicilian Defense, Najdorf Variation", "B90"),
    ("e4 c5 Nf3 Nc6", "Sicilian Defense, Closed", "B23"),
    ("e4 c5 Nf3 Nc6 d4 cxd4 Nxd4", "Sicilian Defense, Open", "B32"),
    ("e4 c5 Nf3 e6", "Sicilian Defense, French Variation", "B40"),
    ("e4 c5 Nf3 e6 d4 cxd4 Nxd4", "Sicilian Defense, Taimanov", "B44"),
    // 法兰西防御
    ("e4 e6", "French Defense", "C00"),
    ("e4 e6 d4", "French Defense", "C00"),
    ("e4 e6 d4 d5", "French Defense", "C00"),
    ("e4 e6 d4 d5 Nc3", "French Defense", "C00"),
    ("e4 e6 d4 d5 Nc3 Nf6", "French Defense, Classical", "C14"),
    ("e4 e6 d4 d5 Nd2", "French Defense, Tarrasch", "C03"),
    ("e4 e6 d4 d5 exd5", "French Defense, Exchange", "C01"),
    // 卡罗-康防御
    ("e4 c6", "Caro-Kann Defense", "B10"),
    ("e4 c6 d4", "Caro-Kann Defense", "B10"),
    ("e4 c6 d4 d5", "Caro-Kann Defense", "B10"),
    ("e4 c6 d4 d5 Nc3", "Caro-Kann Defense, Classical", "B18"),
    ("e4 c6 d4 d5 exd5", "Caro-Kann Defense, Exchange", "B13"),
    ("e4 c6 d4 d5 Nd2", "Caro-Kann Defense, Modern", "B12"),
    // 意大利开局
    ("e4 e5 Nf3 Nc6 Bc4", "Italian Game", "C50"),
    ("e4 e5 Nf3 Nc6 Bc4 Bc5", "Italian Game, Giuoco Piano", "C53"),
    ("e4 e5 Nf3 Nc6 Bc4 Nf6", "Italian Game, Two Knights Defense", "C55"),
    ("e4 e5 Nf3 Nc6 Bc4 Bc5 c3", "Italian Game, Giuoco Piano", "C53"),
    ("e4 e5 Nf3 Nc6 Bc4 Bc5 d3", "Italian Game, Giuoco Pianissimo", "C50"),
    // 西班牙开局
    ("e4 e5 Nf3 Nc6 Bb5", "Ruy Lopez", "C60"),
    ("e4 e5 Nf3 Nc6 Bb5 a6", "Ruy Lopez, Morphy Defense", "C70"),
    ("e4 e5 Nf3 Nc6 Bb5 a6 Ba4", "Ruy Lopez, Morphy Defense", "C70"),
    ("e4 e5 Nf3 Nc6 Bb5 a6 Ba4 Nf6", "Ruy Lopez, Closed", "C84"),
    ("e4 e5 Nf3 Nc6 Bb5 Nf6", "Ruy Lopez, Berlin Defense", "C65"),
    // 后翼弃兵
    ("d4 d5 c4", "Queen's Gambit", "D06"),
    ("d4 d5 c4 e6", "Queen's Gambit Declined", "D30"),
    ("d4 d5 c4 e6 Nc3", "Queen's Gambit Declined", "D30"),
    ("d4 d5 c4 e6 Nc3 Nf6", "Queen's Gambit Declined, Orthodox", "D63"),
    ("d4 d5 c4 dxc4", "Queen's Gambit Accepted", "D20"),
    ("d4 d5 c4 c6", "Slav Defense", "D10"),
    ("d4 d5 c4 c6 Nf3", "Slav Defense", "D11"),
    // 古印度防御
    ("d4 Nf6 c4 g6", "King's Indian Defense", "E60"),
    ("d4 Nf6 c4 g6 Nc3", "King's Indian Defense", "E60"),
    ("d4 Nf6 c4 g6 Nc3 Bg7", "King's Indian Defense", "E60"),
    ("d4 Nf6 c4 g6 Nc3 Bg7 e4", "King's Indian Defense, Classical", "E90"),
    // 尼姆佐维奇防御
    ("d4 Nf6 c4 e6 Nc3 Bb4", "Nimzo-Indian Defense", "E20"),
    ("d4 Nf6 c4 e6 Nc3 Bb4 e3", "Nimzo-Indian Defense, Rubinstein", "E40"),
    ("d4 Nf6 c4 e6 Nc3 Bb4 Qc2", "Nimzo-Indian Defense, Classical", "E32"),
    // 英国式开局
    ("c4", "English Opening", "A10"),
    ("c4 e5", "English Opening, Reversed Sicilian", "A20"),
    ("c4 Nf6", "English Opening, Anglo-Indian", "A15"),
    ("c4 c5", "English Opening, Symmetrical", "A30"),
    ("c4 e6", "English Opening", "A10"),
    // 斯堪的纳维亚防御
    ("e4 d5", "Scandinavian Defense", "B01"),
    ("e4 d5 exd5", "Scandinavian Defense", "B01"),
    ("e4 d5 exd5 Qxd5", "Scandinavian Defense, Main Line", "B01"),
    ("e4 d5 exd5 Nf6", "Scandinavian Defense, Modern", "B01"),
    // 皮尔茨防御
    ("e4 d6", "Pirc Defense", "B07"),
    ("e4 d6 d4", "Pirc Defense", "B07"),
    ("e4 d6 d4 Nf6", "Pirc Defense", "B07"),
    ("e4 d6 d4 Nf6 Nc3", "Pirc Defense", "B07"),
    ("e4 d6 d4 Nf6 Nc3 g6", "Pirc Defense, Classical", "B08"),
    // 现代防御
    ("e4 g6", "Modern Defense", "B06"),
    ("e4 g6 d4", "Modern Defense", "B06"),
    ("e4 g6 d4 Bg7", "Modern Defense", "B06"),
    // 阿廖欣防御
    ("e4 Nf6", "Alekhine's Defense", "B02"),
    ("e4 Nf6 e5", "Alekhine's Defense", "B02"),
    ("e4 Nf6 e5 Nd5", "Alekhine's Defense", "B02"),
    ("e4 Nf6 e5 Nd5 d4", "Alekhine's Defense, Modern", "B04"),
    // 荷兰防御
    ("d4 f5", "Dutch Defense", "A80"),
    ("d4 f5 c4", "Dutch Defense", "A84"),
    ("d4 f5 g3", "Dutch Defense, Leningrad", "A87"),
    // 格林菲尔德防御
    ("d4 Nf6 c4 g6 Nc3 d5", "Grünfeld Defense", "D80"),
    ("d4 Nf6 c4 g6 Nc3 d5 cxd5", "Grünfeld Defense, Exchange", "D85"),
    // 布达佩斯弃兵
    ("d4 Nf6 c4 e5", "Budapest Gambit", "A51"),
    ("d4 Nf6 c4 e5 dxe5", "Budapest Gambit", "A51"),
    ("d4 Nf6 c4 e5 dxe5 Ng4", "Budapest Gambit, Adler Variation", "A52"),
    // 别诺尼防御
    ("d4 Nf6 c4 c5", "Benoni Defense", "A56"),
    ("d4 Nf6 c4 c5 d5", "Benoni Defense, Modern", "A60"),
    ("d4 Nf6 c4 c5 d5 e6", "Benoni Defense, Modern", "A61"),
    // 伏尔加弃兵
    ("d4 Nf6 c4 c5 d5 b5", "Benko Gambit", "A57"),
    ("d4 Nf6 c4 c5 d5 b5 cxb5", "Benko Gambit Accepted", "A58"),
    // 卡塔兰开局
    ("d4 d5 c4 e6 g3", "Catalan Opening", "E00"),
    ("d4 d5 c4 e6 g3 Nf6", "Catalan Opening", "E00"),
    ("d4 d5 c4 e6 g3 Nf6 Bg2", "Catalan Opening", "E04"),
    // 列蒂开局
    ("Nf3", "Réti Opening", "A04"),
    ("Nf3 d5", "Réti Opening", "A04"),
    ("Nf3 d5 c4", "Réti Opening", "A09"),
    ("Nf3 Nf6", "Réti Opening, King's Indian Attack", "A05"),
    // 四马开局
    ("e4 e5 Nf3 Nc6 Nc3", "Four Knights Game", "C44"),
    ("e4 e5 Nf3 Nc6 Nc3 Nf6", "Four Knights Game", "C47"),
    ("e4 e5 Nf3 Nc6 Nc3 Nf6 Bb5", "Four Knights Game, Spanish", "C48"),
    // 苏格兰开局
    ("e4 e5 Nf3 Nc6 d4", "Scotch Game", "C44"),
    ("e4 e5 Nf3 Nc6 d4 exd4", "Scotch Game", "C44"),
    ("e4 e5 Nf3 Nc6 d4 exd4 Nxd4", "Scotch Game", "C45"),
    // 维也纳开局
    ("e4 e5 Nc3", "Vienna Game", "C25"),
    ("e4 e5 Nc3 Nf6", "Vienna Game", "C25"),
    ("e4 e5 Nc3 Nc6", "Vienna Game", "C25"),
    // 王翼弃兵
    ("e4 e5 f4", "King's Gambit", "C30"),
    ("e4 e5 f4 exf4", "King's Gambit Accepted", "C33"),
    ("e4 e5 f4 Bc5", "King's Gambit Declined, Classical", "C30"),
    // 新印度防御
    ("d4 Nf6 c4 e6 Nf3 b6", "Queen's Indian Defense", "E12"),
    ("d4 Nf6 c4 e6 Nf3 b6 g3", "Queen's Indian Defense, Fianchetto", "E15"),
    // 伦敦体系
    ("d4 d5 Nf3 Nf6 Bf4", "London System", "D02"),
    ("d4 Nf6 Nf3 g6 Bf4", "London System vs King's Indian", "A48"),
    // 特罗姆波夫斯基进攻
    ("d4 Nf6 Bg5", "Trompowsky Attack", "A45"),
    ("d4 Nf6 Bg5 Ne4", "Trompowsky Attack, Raptor Variation", "A45"),
];

lazy_static::lazy_static! {
    static ref OPENING_BOOK: Vec<OpeningLine> = BOOK_TABLE
        .iter()
        .map(|&(moves, name, eco)| OpeningLine {
            moves: moves.split_whitespace().collect(),
            name,
            eco,
        })
        .collect();
}

/// 全部开局线
pub fn book_lines() -> &'static [OpeningLine] {
    &OPENING_BOOK
}

/// 是否仍处在开局库阶段（按已走半回合数）
#[inline]
pub fn is_in_book(ply: usize) -> bool {
    ply < BOOK_PLY_LIMIT
}

fn is_prefix<S: AsRef<str>>(prefix: &[S], line: &[&str]) -> bool {
    prefix.len() <= line.len() && prefix.iter().zip(line).all(|(a, b)| a.as_ref() == *b)
}

/// 查询开局库走法
///
/// 在比已走序列更长、且前缀完全一致的开局线中随机选一条，返回其下一步。
pub fn get_book_move<S, R>(history: &[S], rng: &mut R) -> Option<&'static str>
where
    S: AsRef<str>,
    R: Rng + ?Sized,
{
    let candidates: Vec<&OpeningLine> = OPENING_BOOK
        .iter()
        .filter(|line| line.moves.len() > history.len() && is_prefix(history, &line.moves))
        .collect();

    candidates
        .choose(rng)
        .map(|line| line.moves[history.len()])
}

/// 查询开局名称：取已走序列的最长前缀匹配，等长时取表中靠前的一条
pub fn get_opening_name<S: AsRef<str>>(history: &[S]) -> Option<OpeningInfo> {
    let mut best: Option<&OpeningLine> = None;
    for line in OPENING_BOOK.iter() {
        if line.moves.len() > history.len() {
            continue;
        }
        let matched = line.moves.iter().zip(history).all(|(a, b)| *a == b.as_ref());
        if matched && best.map_or(true, |b| line.moves.len() > b.moves.len()) {
            best = Some(line);
        }
    }
    best.map(|line| OpeningInfo {
        name: line.name,
        eco: line.eco,
    })
}
