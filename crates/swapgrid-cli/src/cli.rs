use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;

use clap::{Args, Parser, Subcommand, ValueEnum};
use swapgrid_core::{AssetProvider, EngineConfig, ImageCatalog, ShapeAssets};
use swapgrid_runtime::{
    Driver, ExportTable, JsonFileRepository, MemoryRepository, Msg, Phase, ResultsRepository,
    RunOutcome, Session,
};
use tracing_subscriber::EnvFilter;

use crate::error::{CliError, Result};
use crate::render::render;

const LOG_ENV: &str = "SWAPGRID_LOG";
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp"];

#[derive(Debug, Parser)]
#[command(
    name = "swapgrid",
    about = "Position-change memory task: study a grid, spot the items that swapped",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run an interactive session on stdin/stdout.
    Run(RunArgs),

    /// Print the default configuration as TOML.
    Config,

    /// Print a stored session as JSON lines.
    Export(ExportArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AssetKind {
    #[default]
    Shapes,
    Images,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Engine configuration file (.toml or .json).
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = AssetKind::Shapes)]
    pub assets: AssetKind,

    /// Directory of image files, required with `--assets images`.
    #[arg(long)]
    pub image_dir: Option<PathBuf>,

    /// Write results to this JSON file as the session progresses.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Emit logs as JSON on stderr.
    #[arg(long)]
    pub log_json: bool,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// A results file written by `swapgrid run --out`.
    pub file: PathBuf,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run(args) => run_session(args),
        Commands::Config => {
            print!("{}", EngineConfig::default().to_toml_string()?);
            Ok(())
        }
        Commands::Export(args) => {
            print!("{}", export_lines(&args.file)?);
            Ok(())
        }
    }
}

/// Install the stderr subscriber. Later calls are no-ops.
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// Parse one line of interactive input.
///
/// Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Msg>> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let msg = match head {
        "t" | "toggle" => {
            let raw = words
                .next()
                .ok_or_else(|| CliError::invalid("toggle needs a position"))?;
            let position = raw
                .parse()
                .map_err(|_| CliError::invalid(format!("not a position: {raw}")))?;
            Msg::ToggleSelection(position)
        }
        "r" | "ready" => Msg::Ready,
        "s" | "submit" => Msg::Submit,
        "n" | "next" => Msg::Acknowledge,
        "q" | "quit" => Msg::Quit,
        other => return Err(CliError::invalid(format!("unknown command: {other}"))),
    };
    if let Some(extra) = words.next() {
        return Err(CliError::invalid(format!("unexpected input: {extra}")));
    }
    Ok(Some(msg))
}

/// Collect image file names from `dir`, sorted, as a catalog.
pub fn scan_images(dir: &Path) -> Result<ImageCatalog> {
    if !dir.is_dir() {
        return Err(CliError::MissingPath {
            path: dir.to_path_buf(),
        });
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
        if !is_image {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        }
    }
    names.sort();
    tracing::debug!(dir = %dir.display(), images = names.len(), "image directory scanned");
    Ok(ImageCatalog::new(names)?)
}

/// JSON lines for a stored session, complete or partial.
pub fn export_lines(file: &Path) -> Result<String> {
    let stored = JsonFileRepository::load(file)?;
    if !stored.is_complete() {
        tracing::warn!(file = %file.display(), "exporting an incomplete session");
    }
    Ok(stored.table().to_json_lines()?)
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => Ok(EngineConfig::load(path)?),
        None => Ok(EngineConfig::default()),
    }
}

fn provider(args: &RunArgs, config: &EngineConfig) -> Result<Box<dyn AssetProvider>> {
    match (args.assets, &args.image_dir) {
        (AssetKind::Shapes, None) => Ok(Box::new(ShapeAssets::new(config.max_items()))),
        (AssetKind::Shapes, Some(_)) => Err(CliError::invalid(
            "--image-dir only applies with --assets images",
        )),
        (AssetKind::Images, Some(dir)) => Ok(Box::new(scan_images(dir)?)),
        (AssetKind::Images, None) => Err(CliError::invalid("--assets images needs --image-dir")),
    }
}

fn run_session(args: RunArgs) -> Result<()> {
    init_logging(args.log_json);
    let config = load_config(args.config.as_deref())?;
    let provider = provider(&args, &config)?;
    let session = Session::new(config, provider)?;

    let repository: Box<dyn ResultsRepository> = match &args.out {
        Some(path) => Box::new(JsonFileRepository::new(path)),
        None => Box::new(MemoryRepository::new()),
    };
    let mut driver = Driver::new(session, repository);
    spawn_stdin_reader(driver.sender());

    let stdout = std::io::stdout();
    let mut shown = None;
    let outcome = driver.run(|session| {
        let key = snapshot_key(session);
        if shown.as_ref() != Some(&key) {
            let mut out = stdout.lock();
            let _ = write!(out, "{}", render(session));
            let _ = out.flush();
            shown = Some(key);
        }
    })?;

    let (session, _) = driver.into_parts();
    if outcome == RunOutcome::Quit {
        println!("quit after {} level(s)", session.results().len());
    }
    let table = ExportTable::from_results(session.results());
    println!(
        "score {} of {} moved, {} level(s) passed",
        table.summary.score, table.summary.total_moved, table.summary.passed
    );
    if let Some(path) = &args.out {
        println!("results written to {}", path.display());
    }
    Ok(())
}

/// What the terminal shows; redraw only when it changes.
fn snapshot_key<P: AssetProvider>(session: &Session<P>) -> (Phase, u8, usize, Option<u64>) {
    let selected = session.trial().map_or(0, |t| t.selected().len());
    let remaining = match session.phase() {
        Phase::Study => session.timer().map(|t| t.remaining().as_secs()),
        _ => None,
    };
    (
        session.phase(),
        session.current_level().get(),
        selected,
        remaining,
    )
}

fn spawn_stdin_reader(sender: Sender<Msg>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match parse_command(&line) {
                Ok(Some(msg)) => {
                    if sender.send(msg).is_err() {
                        return;
                    }
                }
                Ok(None) => {}
                Err(err) => eprintln!("{err}"),
            }
        }
        let _ = sender.send(Msg::Quit);
    });
}
