use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;
use std::time::Instant;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use maze_quest::{
    args::{Args, Command},
    game::{GameSession, GameStatus, MazeGame, StatsTracker, StepOutcome},
    maze::{self, Direction},
    rating::DefaultRating,
    storage::{KeyValueStore, MemoryStore, SqliteStore, models::UNSET_TIME},
};

fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = init_logging();

    match args.command.unwrap_or(Command::Play) {
        Command::Generate { size } => {
            let maze = match args.seed {
                Some(seed) => maze::generate_with(size, &mut StdRng::seed_from_u64(seed))?,
                None => maze::generate(size)?,
            };
            print!("{maze}");
        }
        Command::Stats => {
            let store = open_store(args.db.as_deref(), args.ephemeral)?;
            print_stats(&StatsTracker::new(store));
        }
        Command::ResetStats => {
            let store = open_store(args.db.as_deref(), args.ephemeral)?;
            StatsTracker::new(store).reset_stats();
            println!("statistics cleared");
        }
        Command::Play => {
            let store = open_store(args.db.as_deref(), args.ephemeral)?;
            let mut game = match args.seed {
                Some(seed) => MazeGame::with_parts(
                    GameSession::with_rng(store.clone(), StdRng::seed_from_u64(seed)),
                    StatsTracker::new(store),
                    Box::new(DefaultRating),
                ),
                None => MazeGame::new(store),
            };
            interactive_loop(&mut game)?;
        }
    }

    Ok(())
}

fn init_logging() -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily("logs", "maze-quest.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    guard
}

fn open_store(db: Option<&Path>, ephemeral: bool) -> Result<Rc<dyn KeyValueStore>> {
    if ephemeral {
        return Ok(Rc::new(MemoryStore::new()));
    }

    let store = match db {
        Some(path) => SqliteStore::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?,
        None => SqliteStore::open_default()?,
    };
    Ok(Rc::new(store))
}

fn interactive_loop(game: &mut MazeGame) -> Result<()> {
    let stdin = io::stdin();
    let mut last_input = Instant::now();

    info!("Interactive session started");
    print_help();

    loop {
        print!("maze> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break; // EOF
        }

        game.tick(last_input.elapsed());
        last_input = Instant::now();

        match line.trim() {
            "" => continue,
            "quit" | "q" => break,
            "help" | "?" => print_help(),
            "start" => {
                report(game.start());
                show_board(game);
            }
            "next" => {
                report(game.next_level());
                show_board(game);
            }
            "retry" => {
                report(game.retry());
                show_board(game);
            }
            "give-up" => match game.lose() {
                Ok(()) => println!("level lost; 'retry' to try again"),
                Err(e) => eprintln!("{}", e),
            },
            "reset" => {
                game.reset();
                println!("back to level 1");
            }
            "show" => show_board(game),
            "hint" => print_hint(game),
            "stats" => print_stats(game.stats()),
            "mute" => {
                let muted = game.toggle_mute();
                println!("sound {}", if muted { "off" } else { "on" });
            }
            moves => play_moves(game, moves),
        }
    }

    Ok(())
}

/// Apply a run of direction keys such as `ddss`, stopping at the first wall.
fn play_moves(game: &mut MazeGame, input: &str) {
    let directions: Result<Vec<Direction>, char> =
        input.chars().map(Direction::try_from).collect();

    let directions = match directions {
        Ok(d) => d,
        Err(bad) => {
            eprintln!("unknown command or direction '{}' (try 'help')", bad);
            return;
        }
    };

    for direction in directions {
        match game.step(direction) {
            Ok(StepOutcome::Moved) => {}
            Ok(StepOutcome::Blocked) => {
                println!("bump!");
                break;
            }
            Ok(StepOutcome::Escaped) => {
                if let Some(result) = game.stats().history().first() {
                    println!(
                        "escaped level {} in {}s with {} moves: {} star(s) (par {}s)",
                        result.level, result.time, result.moves, result.stars, result.par_time
                    );
                }
                println!("'next' for the next level");
                return;
            }
            Err(e) => {
                eprintln!("{}", e);
                return;
            }
        }
    }

    show_board(game);
}

fn report<E: std::fmt::Display>(result: Result<(), E>) {
    if let Err(e) = result {
        eprintln!("{}", e);
    }
}

fn show_board(game: &MazeGame) {
    let session = game.session();
    let Some(maze) = session.maze() else {
        println!("no maze yet; type 'start'");
        return;
    };

    if session.status() == GameStatus::Playing {
        print!("{}", maze.render_with_player(session.player()));
    } else {
        print!("{}", maze);
    }
    println!(
        "level {} ({}x{}) | {} | {}s | {} moves | best {}",
        session.level(),
        session.maze_size(),
        session.maze_size(),
        session.status(),
        session.elapsed().as_secs(),
        session.moves(),
        format_time(session.best_time()),
    );
}

fn print_hint(game: &MazeGame) {
    let session = game.session();
    let path = session
        .maze()
        .filter(|_| session.status() == GameStatus::Playing)
        .and_then(|m| m.shortest_path(session.player(), m.exit()));

    match path.as_deref() {
        Some(steps @ [from, to, ..]) => {
            if let Some(direction) = Direction::between(*from, *to) {
                println!("{} steps to the exit, head {:?}", steps.len() - 1, direction);
            }
        }
        _ => println!("no hint available"),
    }
}

fn print_stats(stats: &StatsTracker) {
    let agg = stats.aggregate();
    println!("games:        {}", agg.total_games);
    println!("wins/losses:  {}/{}", agg.total_wins, agg.total_losses);
    println!("win rate:     {:.0}%", stats.win_rate());
    println!("best time:    {}", format_time(agg.best_time));
    println!("average time: {}s", stats.average_time());
    println!("streak:       {} (longest {})", agg.current_streak, agg.longest_streak);
    println!("stars:        {}", stats.total_stars());

    for result in stats.history().iter().take(5) {
        println!(
            "  {}  level {:>2} ({}x{})  {:>4}s  {:>4} moves  {}",
            result.date.format("%Y-%m-%d %H:%M"),
            result.level,
            result.size,
            result.size,
            result.time,
            result.moves,
            "*".repeat(result.stars as usize),
        );
    }
}

fn format_time(secs: u64) -> String {
    if secs == UNSET_TIME {
        "-".to_string()
    } else {
        format!("{}s", secs)
    }
}

fn print_help() {
    println!("commands: start, w/a/s/d (e.g. 'ddss'), hint, show, give-up, retry, next,");
    println!("          reset, stats, mute, help, quit");
}
