// ultan-cli: command-line frontend for ultan
// Argument parsing, root selection, output and exit codes

mod cli;

use clap::Parser;
use cli::{Cli, Command};
use log::debug;
use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use ultan_core::state::tail_lines;
use ultan_core::{
    Archive, ArchivePaths, Config, Engine, Error, FinalizeOutcome, HttpGenerator, QuestionOutcome,
    Result, WorldId, WorldPaths, discover_root,
};

/// Exit code when a codex rewrite was quarantined instead of applied.
const EXIT_QUARANTINED: u8 = 3;

/// Map an error to the process exit code.
fn exit_code_for(err: &Error) -> u8 {
    match err {
        Error::WorldNotFound(_) | Error::SessionNotFound(_) => 1,
        Error::InvalidIdentifier(_) | Error::Config(_) => 2,
        Error::Generation(_) => 4,
        Error::Io(_) => 5,
    }
}

/// Prompt user for confirmation (y/N). Returns true if user confirms.
/// If stdin is not a terminal (piped input), returns false.
fn confirm_action(prompt: &str) -> bool {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return false;
    }

    eprint!("{} [y/N] ", prompt);
    io::stderr().flush().ok();

    let mut input = String::new();
    if stdin.read_line(&mut input).is_err() {
        return false;
    }

    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Repository root precedence: `--root`, then `ULTAN_ROOT`, then discovery
/// from the current directory.
///
/// The result is always absolute, so printed paths do not depend on where
/// the command was run.
fn resolve_root(flag: Option<PathBuf>) -> Result<PathBuf> {
    let explicit = flag.or_else(|| {
        std::env::var_os("ULTAN_ROOT")
            .filter(|r| !r.is_empty())
            .map(PathBuf::from)
    });
    match explicit {
        // a root that does not exist yet cannot be canonicalized
        Some(root) => Ok(fs::canonicalize(&root).or_else(|_| std::path::absolute(&root))?),
        None => Ok(discover_root(&std::env::current_dir()?)),
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "warn,ultan=debug,ultan_core=debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn print_paths(paths: &WorldPaths) {
    println!("World ID:     {}", paths.world_id);
    println!("World dir:    {}", paths.world_dir.display());
    println!("Codex:        {}", paths.codex_path.display());
    println!("Sessions dir: {}", paths.sessions_dir.display());
}

/// The session to work on: explicit `--session`, else the latest one.
fn pick_session(
    archive: &Archive,
    world_id: &WorldId,
    explicit: Option<PathBuf>,
) -> Result<Option<PathBuf>> {
    match explicit {
        Some(path) if path.is_file() => Ok(Some(path)),
        Some(path) => Err(Error::SessionNotFound(path)),
        None => archive.latest_session(world_id),
    }
}

/// Like [`pick_session`], but starts a new session when the world has none.
fn session_or_new(
    archive: &Archive,
    world_id: &WorldId,
    explicit: Option<PathBuf>,
) -> Result<PathBuf> {
    match pick_session(archive, world_id, explicit)? {
        Some(path) => Ok(path),
        None => {
            let path = archive.create_session(world_id)?;
            eprintln!("Started new session: {}", path.display());
            Ok(path)
        }
    }
}

fn report_question(outcome: &QuestionOutcome) {
    println!("{}", outcome.text());
    if let QuestionOutcome::ExhaustedRetries { reason, .. } = outcome {
        eprintln!("note: question kept after failing validation ({})", reason);
    }
}

fn report_finalize(outcome: &FinalizeOutcome) -> ExitCode {
    match outcome {
        FinalizeOutcome::Accepted(path) => {
            println!("Codex updated: {}", path.display());
            ExitCode::SUCCESS
        }
        FinalizeOutcome::Quarantined { path, reason } => {
            eprintln!("Codex rewrite rejected ({}); live codex left unchanged.", reason);
            println!("Rejected output saved to: {}", path.display());
            ExitCode::from(EXIT_QUARANTINED)
        }
    }
}

/// Read answers from stdin until EOF or `/done`, one turn per line.
async fn chat_loop(engine: &Engine<'_>, world_id: &WorldId, session: &Path) -> Result<()> {
    eprintln!("Answering in {}. Type /done to stop.", session.display());
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let answer = line.trim();
        if answer.is_empty() {
            continue;
        }
        if answer == "/done" || answer == "/quit" {
            break;
        }
        match engine.process_turn(world_id, session, answer).await {
            Ok(outcome) => report_question(&outcome),
            // keep the conversation going; the answer is already recorded
            Err(Error::Generation(msg)) => eprintln!("error: generation failed: {}", msg),
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let root = resolve_root(cli.root)?;
    debug!("repository root: {}", root.display());
    let archive = Archive::new(&root);

    match cli.command {
        Command::World { name } => {
            let world_id = WorldId::parse(&name)?;
            let paths = archive.ensure_world(&world_id)?;
            println!("World {} is ready.", world_id);
            println!();
            print_paths(&paths);
        }
        Command::Worlds => {
            let worlds = archive.list_worlds()?;
            if worlds.is_empty() {
                println!("No worlds available.");
            } else {
                println!("Available worlds:");
                for world in worlds {
                    println!("  - {}", world);
                }
            }
        }
        Command::Paths { name } => {
            let world_id = WorldId::parse(&name)?;
            print_paths(&archive.ensure_world(&world_id)?);
        }
        Command::New { name } => {
            let world_id = WorldId::parse(&name)?;
            let session = archive.create_session(&world_id)?;
            println!("Session created.");
            println!("{}", session.display());
        }
        Command::Latest { name } => {
            let world_id = WorldId::parse(&name)?;
            match archive.latest_session(&world_id)? {
                Some(session) => println!("{}", session.display()),
                None => {
                    eprintln!("No sessions found for world '{}'.", world_id);
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Tail { name, lines } => {
            let world_id = WorldId::parse(&name)?;
            let Some(session) = archive.latest_session(&world_id)? else {
                eprintln!("No sessions found for world '{}'.", world_id);
                return Ok(ExitCode::FAILURE);
            };
            let file_name = session
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            println!("# Tail of: {}", file_name);
            for line in tail_lines(&session, lines as usize)? {
                println!("{}", line);
            }
        }
        Command::Codex {
            name,
            no_path,
            show,
        } => {
            let world_id = WorldId::parse(&name)?;
            let paths = archive.ensure_world(&world_id)?;
            if !no_path {
                println!("{}", paths.codex_path.display());
            }
            if show {
                if !no_path {
                    println!();
                }
                print!("{}", archive.read_codex(&world_id)?);
            }
        }
        Command::Ask {
            name,
            text,
            session,
            model,
        } => {
            let world_id = WorldId::parse(&name)?;
            let config = Config::load(&root)?;
            let generator = HttpGenerator::from_config(&config)?;
            let session = session_or_new(&archive, &world_id, session)?;
            let engine = Engine::new(&archive, &generator, config.engine.clone()).with_model(model);

            let outcome = engine
                .process_turn(&world_id, &session, &text.join(" "))
                .await?;
            report_question(&outcome);
        }
        Command::Chat {
            name,
            session,
            model,
            finalize,
        } => {
            let world_id = WorldId::parse(&name)?;
            let config = Config::load(&root)?;
            let generator = HttpGenerator::from_config(&config)?;
            let session = session_or_new(&archive, &world_id, session)?;
            let engine = Engine::new(&archive, &generator, config.engine.clone()).with_model(model);

            chat_loop(&engine, &world_id, &session).await?;
            if finalize {
                let outcome = engine.finalize_codex(&world_id, &session, None).await?;
                return Ok(report_finalize(&outcome));
            }
        }
        Command::Finalize {
            name,
            session,
            model,
        } => {
            let world_id = WorldId::parse(&name)?;
            let config = Config::load(&root)?;
            let Some(session) = pick_session(&archive, &world_id, session)? else {
                eprintln!("No sessions found for world '{}'.", world_id);
                return Ok(ExitCode::FAILURE);
            };
            let generator = HttpGenerator::from_config(&config)?;
            let engine = Engine::new(&archive, &generator, config.engine.clone());

            let outcome = engine
                .finalize_codex(&world_id, &session, model.as_deref())
                .await?;
            return Ok(report_finalize(&outcome));
        }
        Command::Delete { name, yes } => {
            let world_id = WorldId::parse(&name)?;
            let world_dir = archive.world_paths(&world_id).world_dir;
            if !world_dir.is_dir() {
                return Err(Error::WorldNotFound(world_id.to_string()));
            }
            let prompt = format!(
                "Delete world '{}' and all its sessions ({})?",
                world_id,
                world_dir.display()
            );
            if !yes && !confirm_action(&prompt) {
                eprintln!("Aborted; world '{}' kept. Pass --yes to skip confirmation.", world_id);
                return Ok(ExitCode::FAILURE);
            }
            archive.delete_world(&world_id)?;
            println!("World {} deleted.", world_id);
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}
