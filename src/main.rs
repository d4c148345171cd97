//! softcode - an interactive front end for the softcode engine
//!
//! Usage:
//!   softcode                      Start interactive REPL
//!   softcode -c "think add(1,2)"  Execute a single command line
//!   softcode --world db.json      Load a world snapshot first

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use softcode::{Config, Dbref, Engine, MemoryWorld, World};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Queue batches run after each input line
const QUEUE_ROUNDS: usize = 100;

fn print_help() {
    println!(
        r#"softcode-{} - command dispatch and softcode evaluation

USAGE:
    softcode                    Start interactive REPL
    softcode -c <command>       Execute a single command line and exit
    softcode --help             Show this help message
    softcode --version          Show version

OPTIONS:
    --world <file.json>         Load a world snapshot (default: Limbo and #1)
    --config <file.toml>        Load configuration (or set SOFTCODE_CONFIG)
    --player <#N>               Act as this object (default: #1)
    --save <file.json>          Write the world snapshot on exit

ENVIRONMENT:
    RUST_LOG                    Log filter (default: info)
    SOFTCODE_CONFIG             Configuration file
    SOFTCODE_CPU_TIME_MS        Per-command CPU budget

REPL:
    Every line is a command, e.g. `think [add(1,2)]` or `"hello`.
    Ctrl-C during evaluation stops the command; Ctrl-D exits."#,
        VERSION
    );
}

#[derive(Debug, Default)]
struct CliArgs {
    command: Option<String>,
    world: Option<PathBuf>,
    config: Option<PathBuf>,
    player: Option<String>,
    save: Option<PathBuf>,
    help: bool,
    version: bool,
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut cli = CliArgs::default();
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| iter.next().cloned().ok_or_else(|| format!("{} needs a value", flag));
        match arg.as_str() {
            "-c" => cli.command = Some(value("-c")?),
            "--world" => cli.world = Some(PathBuf::from(value("--world")?)),
            "--config" => cli.config = Some(PathBuf::from(value("--config")?)),
            "--player" => cli.player = Some(value("--player")?),
            "--save" => cli.save = Some(PathBuf::from(value("--save")?)),
            "-h" | "--help" => cli.help = true,
            "-V" | "--version" => cli.version = true,
            other => return Err(format!("unknown argument: {}", other)),
        }
    }
    Ok(cli)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config, String> {
    let path = path.map(Path::to_path_buf).or_else(|| env::var_os("SOFTCODE_CONFIG").map(PathBuf::from));
    match path {
        Some(path) => Config::load(&path).map_err(|e| format!("{}: {}", path.display(), e)),
        None => {
            let mut config = Config::default();
            config.apply_env().map_err(|e| e.to_string())?;
            Ok(config)
        }
    }
}

fn load_world(path: Option<&Path>) -> Result<MemoryWorld, String> {
    match path {
        Some(path) => MemoryWorld::load(path).map_err(|e| format!("{}: {}", path.display(), e)),
        None => Ok(MemoryWorld::new()),
    }
}

/// Dispatch one line as `player`, run what it queued, and print what `player` was told
fn execute_line(engine: &mut Engine<MemoryWorld>, player: Dbref, line: &str) {
    engine.process_command(player, player, player, true, line, &[]);
    engine.drain_queue(QUEUE_ROUNDS);
    for message in engine.world_mut().take_notifications(player) {
        println!("{}", message);
    }
}

fn run_repl(engine: &mut Engine<MemoryWorld>, player: Dbref) -> rustyline::Result<()> {
    let mut rl = DefaultEditor::new()?;
    let history_path = env::var_os("HOME").map(|home| PathBuf::from(home).join(".softcode_history"));
    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    let alarm = engine.alarm().handle();
    if let Err(e) = ctrlc::set_handler(move || alarm.store(true, Ordering::SeqCst)) {
        warn!("could not install Ctrl-C handler: {}", e);
    }

    let name = engine.world().name(player);
    println!("softcode-{} - acting as {}({})", VERSION, name, player);

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let line = line.trim_end();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);
                execute_line(engine, player, line);
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        let _ = rl.save_history(path);
    }
    Ok(())
}

fn run(cli: CliArgs) -> Result<(), String> {
    let config = load_config(cli.config.as_deref())?;
    let world = load_world(cli.world.as_deref())?;
    let player = match cli.player.as_deref() {
        Some(text) => Dbref::parse(text).ok_or_else(|| format!("bad player: {}", text))?,
        None => Dbref::GOD,
    };

    let mut engine = Engine::new(world, config);
    if !engine.world().is_valid(player) {
        return Err(format!("no such object: {}", player));
    }
    info!(player = %player, "engine ready");

    match cli.command {
        Some(line) => execute_line(&mut engine, player, &line),
        None => run_repl(&mut engine, player).map_err(|e| format!("REPL error: {}", e))?,
    }

    if let Some(path) = cli.save {
        let json = engine.world().to_json().map_err(|e| e.to_string())?;
        std::fs::write(&path, json).map_err(|e| format!("{}: {}", path.display(), e))?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    if cli.help {
        print_help();
        return ExitCode::SUCCESS;
    }
    if cli.version {
        println!("softcode {}", VERSION);
        return ExitCode::SUCCESS;
    }

    init_logging();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
