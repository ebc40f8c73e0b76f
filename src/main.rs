//! Chess AI CLI
//!
//! 命令行界面，用于测试规则引擎和 AI
//!
//! 支持两种模式：
//! 1. 单次命令模式：每次执行一个命令
//! 2. Server 模式：长驻进程，通过 stdin/stdout 逐行交换 JSON

use chess_ai::ai::{analyze, evaluate_detail, AIConfig, AIMove, Difficulty, EvalDetail};
use chess_ai::test_positions;
use chess_ai::{
    get_opening_name, parse_fen, perft, to_fen, Color, GameResult, GameState, LegalMove, Position,
};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "chess-ai")]
#[command(about = "Chess rules engine and alpha-beta AI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 获取合法走法
    Moves {
        /// FEN 字符串或测试局面名（如 kiwipete）
        #[arg(long, default_value = "start")]
        fen: String,

        /// 只列出该格子的走法（如 e2）
        #[arg(long)]
        square: Option<String>,
    },

    /// 选择最佳走法
    Best {
        /// FEN 字符串或测试局面名
        #[arg(long, default_value = "start")]
        fen: String,

        /// 难度 (easy, medium, hard, expert)
        #[arg(long, default_value = "medium")]
        difficulty: Difficulty,

        /// 覆盖搜索深度
        #[arg(long)]
        depth: Option<u32>,

        /// 随机种子
        #[arg(long)]
        seed: Option<u64>,

        /// 时间限制（秒）
        #[arg(long)]
        time_limit: Option<f64>,

        /// 使用开局库
        #[arg(long)]
        book: bool,

        /// JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 评估局面分数
    Score {
        /// FEN 字符串或测试局面名
        #[arg(long, default_value = "start")]
        fen: String,

        /// JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 走法生成计数
    Perft {
        /// FEN 字符串或测试局面名
        #[arg(long, default_value = "start")]
        fen: String,

        /// 深度
        #[arg(long, default_value = "3")]
        depth: u32,
    },

    /// AI 自对弈
    Play {
        /// 白方难度
        #[arg(long, default_value = "easy")]
        white: Difficulty,

        /// 黑方难度
        #[arg(long, default_value = "easy")]
        black: Difficulty,

        /// 最多半回合数
        #[arg(long, default_value = "200")]
        max_plies: usize,

        /// 随机种子
        #[arg(long)]
        seed: Option<u64>,

        /// 使用开局库
        #[arg(long)]
        book: bool,
    },

    /// 启动 server 模式（stdin/stdout 通信）
    Server,
}

// Server 模式的请求和响应结构
#[derive(Serialize, Deserialize)]
struct ServerRequest {
    cmd: String,
    #[serde(default)]
    fen: Option<String>,
    #[serde(default, rename = "move")]
    mv: Option<String>,
    #[serde(default)]
    square: Option<String>,
    #[serde(default)]
    difficulty: Option<Difficulty>,
    #[serde(default)]
    depth: Option<u32>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    time_limit: Option<f64>,
    #[serde(default)]
    book: Option<bool>,
}

#[derive(Serialize, Default)]
struct ServerResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    legal_moves: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    best: Option<AIMove>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uci: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    san: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    depth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nodes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<GameResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    draw_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    eval: Option<EvalDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ServerResponse {
    fn success_legal_moves(legal_moves: Vec<String>) -> Self {
        Self {
            ok: true,
            legal_moves: Some(legal_moves),
            ..Default::default()
        }
    }

    fn success_best(best: Option<AIMove>, depth: u32, nodes: u64, elapsed_ms: f64) -> Self {
        Self {
            ok: true,
            uci: best.map(|m| m.to_string()),
            best,
            depth: Some(depth),
            nodes: Some(nodes),
            elapsed_ms: Some(elapsed_ms),
            ..Default::default()
        }
    }

    fn success_apply(state: &GameState) -> Self {
        Self {
            ok: true,
            san: state.move_history.last().map(|m| m.notation.clone()),
            fen: Some(to_fen(state)),
            result: Some(state.result()),
            draw_reason: state.draw_reason.map(|r| r.to_string()),
            ..Default::default()
        }
    }

    fn success_eval(detail: EvalDetail, relative: i32) -> Self {
        Self {
            ok: true,
            eval: Some(detail),
            score: Some(relative),
            ..Default::default()
        }
    }

    fn error(msg: &str) -> Self {
        Self {
            ok: false,
            error: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

/// 解析 FEN，也接受测试局面名
fn load_state(fen: &str) -> Result<GameState, String> {
    let fen = test_positions::by_name(fen).unwrap_or(fen);
    parse_fen(fen)
}

/// 列出走法（坐标记法），可只取一个格子
fn list_moves(state: &GameState, square: Option<&str>) -> Result<Vec<LegalMove>, String> {
    let moves = state.legal_moves();
    match square {
        Some(s) => {
            let from =
                Position::from_algebraic(s).ok_or_else(|| format!("Invalid square: {}", s))?;
            Ok(moves.into_iter().filter(|m| m.from == from).collect())
        }
        None => Ok(moves),
    }
}

/// 站在行棋方视角的分数
fn side_relative(state: &GameState, total: i32) -> i32 {
    match state.current_player {
        Color::White => total,
        Color::Black => -total,
    }
}

fn to_json_line<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| format!("{{\"ok\":false,\"error\":\"serialize: {}\"}}", e))
}

fn exit_with(e: String) -> ! {
    eprintln!("Error: {}", e);
    std::process::exit(1);
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Moves { fen, square } => {
            let state = load_state(&fen).unwrap_or_else(|e| exit_with(e));
            let moves = list_moves(&state, square.as_deref()).unwrap_or_else(|e| exit_with(e));
            println!("Legal moves ({}):", moves.len());
            for mv in &moves {
                println!("  {}", mv);
            }
        }

        Commands::Best {
            fen,
            difficulty,
            depth,
            seed,
            time_limit,
            book,
            json,
        } => {
            let state = load_state(&fen).unwrap_or_else(|e| exit_with(e));
            let config = AIConfig {
                difficulty,
                seed,
                max_depth: depth,
                time_limit,
                use_book: book,
            };

            let start = Instant::now();
            let outcome = analyze(&state, &config);
            let elapsed = start.elapsed().as_secs_f64();

            if json {
                let response = ServerResponse::success_best(
                    outcome.best,
                    outcome.depth,
                    outcome.nodes,
                    elapsed * 1000.0,
                );
                println!("{}", to_json_line(&response));
            } else {
                match outcome.best {
                    Some(best) => {
                        println!("Best move ({}): {} (score: {})", difficulty, best, best.score);
                        for sm in outcome.scored.iter().skip(1).take(4) {
                            println!("  {} (score: {})", sm.mv, sm.score);
                        }
                    }
                    None => println!("No legal moves"),
                }
                println!(
                    "\nStats: depth={}, nodes={}, time={:.3}s",
                    outcome.depth, outcome.nodes, elapsed
                );
            }
        }

        Commands::Score { fen, json } => {
            let state = load_state(&fen).unwrap_or_else(|e| exit_with(e));
            let detail = evaluate_detail(&state);
            let relative = side_relative(&state, detail.total);

            if json {
                println!(
                    "{}",
                    to_json_line(&ServerResponse::success_eval(detail, relative))
                );
            } else {
                println!("局面评估（白方为正）: {}", detail.total);
                println!("局面评估（{} 视角）: {}", state.current_player, relative);
                println!(
                    "  子力+位置: {} / {}",
                    detail.white_pieces, detail.black_pieces
                );
                println!(
                    "  机动性: {} / {}",
                    detail.white_mobility, detail.black_mobility
                );
                println!(
                    "  王安全: {} / {}",
                    detail.white_king_safety, detail.black_king_safety
                );
                println!("  中心: {}  残局: {}", detail.center, detail.is_endgame);
            }
        }

        Commands::Perft { fen, depth } => {
            let state = load_state(&fen).unwrap_or_else(|e| exit_with(e));
            let start = Instant::now();
            let nodes = perft(&state, depth);
            let elapsed = start.elapsed().as_secs_f64();
            println!("perft({}) = {} ({:.3}s)", depth, nodes, elapsed);
        }

        Commands::Play {
            white,
            black,
            max_plies,
            seed,
            book,
        } => run_self_play(white, black, max_plies, seed, book),

        Commands::Server => {
            run_server();
        }
    }
}

/// AI 自对弈，打印记谱、开局名和结果
fn run_self_play(white: Difficulty, black: Difficulty, max_plies: usize, seed: Option<u64>, book: bool) {
    let mut state = GameState::new();

    while !state.is_terminal() && state.move_history.len() < max_plies {
        let difficulty = match state.current_player {
            Color::White => white,
            Color::Black => black,
        };
        let config = AIConfig {
            difficulty,
            seed: seed.map(|s| s.wrapping_add(state.move_history.len() as u64)),
            use_book: book,
            ..Default::default()
        };

        let Some(best) = chess_ai::get_ai_move(&state, &config) else {
            break;
        };
        state = match state.apply(&best.as_legal_move()) {
            Ok(next) => next,
            Err(e) => exit_with(e.to_string()),
        };

        if let Some(last) = state.move_history.last() {
            let ply = state.move_history.len();
            if ply % 2 == 1 {
                print!("{}. {} ", state.full_move_number, last.notation);
            } else {
                println!("{}", last.notation);
            }
        }
    }
    println!();

    let history: Vec<String> = state
        .notation_history()
        .into_iter()
        .map(|n| n.trim_end_matches(|c: char| c == '+' || c == '#').to_string())
        .collect();
    if let Some(opening) = get_opening_name(&history[..]) {
        println!("Opening: {} ({})", opening.name, opening.eco);
    }
    match state.draw_reason {
        Some(reason) => println!("Result: {} ({})", state.result(), reason),
        None => println!("Result: {}", state.result()),
    }
    println!("FEN: {}", to_fen(&state));
}

/// Server 模式主循环
/// 从 stdin 读取 JSON 请求，返回 JSON 响应到 stdout
fn run_server() {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        // 空行跳过
        if line.trim().is_empty() {
            continue;
        }

        let request: ServerRequest = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                let response = ServerResponse::error(&format!("Invalid JSON: {}", e));
                println!("{}", to_json_line(&response));
                let _ = stdout.flush();
                continue;
            }
        };

        let response = match request.cmd.as_str() {
            "moves" => handle_moves_request(&request),
            "best" => handle_best_request(&request),
            "apply" => handle_apply_request(&request),
            "eval" => handle_eval_request(&request),
            "quit" => break,
            _ => ServerResponse::error(&format!("Unknown command: {}", request.cmd)),
        };

        println!("{}", to_json_line(&response));
        let _ = stdout.flush();
    }
}

fn request_state(request: &ServerRequest) -> Result<GameState, String> {
    load_state(request.fen.as_deref().unwrap_or("start"))
}

/// 处理 moves 命令
fn handle_moves_request(request: &ServerRequest) -> ServerResponse {
    let result = request_state(request)
        .and_then(|state| list_moves(&state, request.square.as_deref()));
    match result {
        Ok(moves) => {
            ServerResponse::success_legal_moves(moves.iter().map(|m| m.to_coordinate()).collect())
        }
        Err(e) => ServerResponse::error(&e),
    }
}

/// 处理 best 命令
fn handle_best_request(request: &ServerRequest) -> ServerResponse {
    let state = match request_state(request) {
        Ok(s) => s,
        Err(e) => return ServerResponse::error(&e),
    };
    let config = AIConfig {
        difficulty: request.difficulty.unwrap_or_default(),
        seed: request.seed,
        max_depth: request.depth,
        time_limit: request.time_limit,
        use_book: request.book.unwrap_or(false),
    };

    let start = Instant::now();
    let outcome = analyze(&state, &config);
    let elapsed = start.elapsed().as_secs_f64();
    ServerResponse::success_best(outcome.best, outcome.depth, outcome.nodes, elapsed * 1000.0)
}

/// 处理 apply 命令：与本地输入一样经过完整合法性校验
fn handle_apply_request(request: &ServerRequest) -> ServerResponse {
    let state = match request_state(request) {
        Ok(s) => s,
        Err(e) => return ServerResponse::error(&e),
    };
    let Some(mv_str) = request.mv.as_deref() else {
        return ServerResponse::error("Missing move");
    };
    let mv = match LegalMove::from_coordinate(mv_str) {
        Ok(mv) => mv,
        Err(e) => return ServerResponse::error(&e),
    };
    match state.apply(&mv) {
        Ok(next) => ServerResponse::success_apply(&next),
        Err(e) => ServerResponse::error(&format!("Illegal move: {}", e)),
    }
}

/// 处理 eval 命令（静态评估）
fn handle_eval_request(request: &ServerRequest) -> ServerResponse {
    match request_state(request) {
        Ok(state) => {
            let detail = evaluate_detail(&state);
            let relative = side_relative(&state, detail.total);
            ServerResponse::success_eval(detail, relative)
        }
        Err(e) => ServerResponse::error(&e),
    }
}
