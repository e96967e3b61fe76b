use std::io::{self, BufRead};
use std::time::{Duration, Instant};

use chess_arbiter::display::render_game;
use chess_arbiter::*;
use clap::Parser;
use log::info;


// Plays a game from moves typed on stdin: "e2e4", "e7e8q", "Nf3", "O-O".
// "resign" and "draw" end the game on behalf of the player to move.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Starting time per player, in seconds.
    #[arg(long, default_value_t = 300)]
    time: u64,

    /// Increment per move, in seconds.
    #[arg(long, default_value_t = 0)]
    increment: u64,

    #[arg(long)]
    rated: bool,

    /// Start from this position instead of the standard one.
    #[arg(long)]
    fen: Option<String>,

    /// Print the game in PGN when it is over.
    #[arg(long)]
    pgn: bool,
}

const WHITE_ID: &str = "white";
const BLACK_ID: &str = "black";

fn player_id(force: Force) -> &'static str {
    match force {
        Force::White => WHITE_ID,
        Force::Black => BLACK_ID,
    }
}

fn apply_line(game: &mut ChessGame, line: &str, now: GameInstant) -> Result<(), TurnError> {
    let player = player_id(game.current_turn());
    match line {
        "resign" => game.resign(player, now),
        "draw" => game.offer_draw(player, now),
        _ => match MoveInput::from_long_algebraic(line) {
            Ok(input) => game.try_turn(player, &input, now).map(|_| ()),
            Err(_) => game.try_turn_algebraic(player, line, now).map(|_| ()),
        },
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let rules = ChessRules {
        time_control: TimeControl {
            starting_time: Duration::from_secs(args.time),
            increment: Duration::from_secs(args.increment),
        },
        rated: args.rated,
        draw_rules: DrawRules::official(),
    };
    rules.verify().map_err(anyhow::Error::msg)?;

    let started = Instant::now();
    let now = || GameInstant::from_duration(started.elapsed());
    let mut game = match &args.fen {
        Some(fen) => {
            let mut game =
                ChessGame::from_fen(WHITE_ID, BLACK_ID, rules, fen).map_err(anyhow::Error::msg)?;
            game.start(now())?;
            game
        }
        None => ChessGame::new(WHITE_ID, BLACK_ID, rules),
    };

    println!("{}", render_game(&game, Force::White, now()));
    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        game.test_flag(now());
        if game.is_active() {
            if let Err(err) = apply_line(&mut game, line, now()) {
                println!("Impossible move: {} ({})", err, err.code());
                continue;
            }
        }
        println!("{}", render_game(&game, Force::White, now()));
        if !game.is_active() {
            break;
        }
    }

    let result = game.result();
    info!("Result: {} {}", result.pgn_token(), result.reason().unwrap_or("unfinished"));
    println!("{:?}", result);
    if args.pgn {
        println!("\n{}", game.to_pgn());
    }
    Ok(())
}
