//! Command-line front end for quadnote context files.
//!
//! # Responsibility
//! - Map one subcommand to one session action on a context file.
//! - Import the file on start and export it again after a mutation.
//! - Exit with status 1 when the action reports failure.
//!
//! # See also
//! - `quadnote_core::EditorSession` for the action semantics.

use clap::{Parser, Subcommand};
use log::{debug, info};
use quadnote_core::{
    derive_context_id, init_logging, CellKey, EditorSession, LogLevel, LogSettings, Matrix, Rgb,
    SessionConfig,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "quadnote")]
#[command(about = "Edit layered quadtree notes from the terminal")]
#[command(version)]
struct Cli {
    /// Write rolling log files into this absolute directory instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty context file
    New {
        file: PathBuf,
        #[arg(long, default_value_t = quadnote_core::config::DEFAULT_QUADTREE_SIZE)]
        size: u32,
        #[arg(long, default_value_t = quadnote_core::config::DEFAULT_MAX_DEPTH)]
        max_depth: u32,
    },
    /// Print layer statistics and payload metadata
    Inspect { file: PathBuf },
    /// Set the color of one cell
    Paint {
        file: PathBuf,
        depth: u32,
        index: usize,
        #[arg(value_parser = parse_rgb)]
        color: Rgb,
    },
    /// Copy a cell into its four children
    Subdivide {
        file: PathBuf,
        depth: u32,
        index: usize,
    },
    /// Clear color and payload of one cell
    Reset {
        file: PathBuf,
        depth: u32,
        index: usize,
    },
    /// Attach a text label to a cell
    Text {
        file: PathBuf,
        depth: u32,
        index: usize,
        text: String,
        #[arg(long, value_parser = parse_rgb, default_value = "#000000")]
        color: Rgb,
    },
    /// Attach source code from a file to a cell
    Code {
        file: PathBuf,
        depth: u32,
        index: usize,
        source: PathBuf,
        #[arg(long, default_value = "python")]
        language: String,
    },
    /// Attach image bytes from a file to a cell
    Image {
        file: PathBuf,
        depth: u32,
        index: usize,
        image: PathBuf,
    },
    /// Execute the code attached to a cell
    Run {
        file: PathBuf,
        depth: u32,
        index: usize,
    },
    /// Execute a source file directly
    Exec {
        source: PathBuf,
        #[arg(long, default_value = "python")]
        language: String,
    },
    /// Map a position to the cell under it
    Resolve {
        file: PathBuf,
        depth: u32,
        x: f64,
        y: f64,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = start_logging(&cli) {
        eprintln!("quadnote: {err}");
        return ExitCode::FAILURE;
    }

    match run(cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("quadnote: {err}");
            ExitCode::FAILURE
        }
    }
}

fn start_logging(cli: &Cli) -> Result<(), String> {
    let settings = match &cli.log_dir {
        Some(dir) => {
            LogSettings::directory(cli.log_level.unwrap_or_else(LogLevel::build_default), dir)?
        }
        None => LogSettings::stderr(cli.log_level.unwrap_or(LogLevel::Warn)),
    };
    init_logging(&settings)
}

/// Runs one subcommand. `Ok(false)` means the action reported failure.
fn run(command: Command) -> Result<bool, String> {
    debug!(
        "event=cli_command module=cli status=start command={}",
        command_name(&command)
    );
    match command {
        Command::New {
            file,
            size,
            max_depth,
        } => {
            let config = SessionConfig {
                quadtree_size: size,
                max_depth,
                ..SessionConfig::default()
            };
            let mut session = EditorSession::new(config).map_err(|err| err.to_string())?;
            session
                .new_context(&derive_context_id(&file))
                .map_err(|err| err.to_string())?;
            Ok(report(session.export_context(&file)))
        }
        Command::Inspect { file } => {
            let session = open(&file)?;
            let matrix = session.current_matrix().map_err(|err| err.to_string())?;
            print_matrix(matrix);
            Ok(true)
        }
        Command::Paint {
            file,
            depth,
            index,
            color,
        } => mutate(&file, |session| session.paint(depth, index, color)),
        Command::Subdivide { file, depth, index } => mutate(&file, |session| {
            let children = session.subdivide(depth, index)?;
            let keys: Vec<String> = children.iter().map(CellKey::to_string).collect();
            println!("children {}", keys.join(" "));
            Ok(())
        }),
        Command::Reset { file, depth, index } => {
            mutate(&file, |session| session.reset_cell(depth, index).map(|_| ()))
        }
        Command::Text {
            file,
            depth,
            index,
            text,
            color,
        } => mutate(&file, |session| session.set_text(depth, index, text, color)),
        Command::Code {
            file,
            depth,
            index,
            source,
            language,
        } => {
            let code = read_source(&source)?;
            mutate(&file, |session| session.save_code(depth, index, code, &language))
        }
        Command::Image {
            file,
            depth,
            index,
            image,
        } => {
            let mut session = open(&file)?;
            let attached = session
                .attach_image_file(depth, index, &image)
                .map_err(|err| err.to_string())?;
            if !report(attached) {
                return Ok(false);
            }
            Ok(report(session.export_context(&file)))
        }
        Command::Run { file, depth, index } => {
            let session = open(&file)?;
            let (ok, output) = session
                .execute_cell(depth, index)
                .map_err(|err| err.to_string())?
                .into_pair();
            print_output(ok, &output);
            Ok(ok)
        }
        Command::Exec { source, language } => {
            let code = read_source(&source)?;
            let session =
                EditorSession::new(SessionConfig::default()).map_err(|err| err.to_string())?;
            let (ok, output) = session.execute_code(&code, &language).into_pair();
            print_output(ok, &output);
            Ok(ok)
        }
        Command::Resolve { file, depth, x, y } => {
            let mut session = open(&file)?;
            let applied = session.set_depth(depth);
            if applied != depth {
                return Err(format!("depth {depth} exceeds max depth {applied}"));
            }
            match session.resolve_cell(x, y) {
                Some(key) => {
                    println!("{key}");
                    Ok(true)
                }
                None => {
                    println!("outside");
                    Ok(false)
                }
            }
        }
    }
}

/// Imports `file` into a fresh session and selects it.
fn open(file: &Path) -> Result<EditorSession, String> {
    let mut session =
        EditorSession::new(SessionConfig::default()).map_err(|err| err.to_string())?;
    let imported = session.import_context(file);
    if !imported.ok {
        return Err(imported.message);
    }
    info!(
        "event=cli_open module=cli status=ok context={}",
        imported.context_id.as_deref().unwrap_or_default()
    );
    Ok(session)
}

/// Applies one mutation and writes the context back to `file`.
fn mutate<F>(file: &Path, action: F) -> Result<bool, String>
where
    F: FnOnce(&mut EditorSession) -> Result<(), quadnote_core::SessionError>,
{
    let mut session = open(file)?;
    action(&mut session).map_err(|err| err.to_string())?;
    Ok(report(session.export_context(file)))
}

fn report(response: quadnote_core::ActionResponse) -> bool {
    if response.ok {
        println!("{}", response.message);
    } else {
        eprintln!("{}", response.message);
    }
    response.ok
}

fn print_output(ok: bool, output: &str) {
    if ok {
        print!("{output}");
    } else {
        eprintln!("{output}");
    }
}

fn print_matrix(matrix: &Matrix) {
    println!(
        "version={} quadtree_size={} max_depth={}",
        matrix.format_version(),
        matrix.quadtree_size(),
        matrix.max_depth()
    );
    for (depth, painted) in matrix.painted_counts().into_iter().enumerate() {
        let cells = matrix.layer(depth as u32).map(|layer| layer.len()).unwrap_or(0);
        println!("depth {depth}: {painted}/{cells} painted");
    }
    for (key, payload) in matrix.payload_pool() {
        println!("{key} {}", payload.summary());
    }
}

fn read_source(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read `{}`: {err}", path.display()))
}

fn parse_rgb(value: &str) -> Result<Rgb, String> {
    Rgb::parse_hex(value).ok_or_else(|| format!("expected #rrggbb, got `{value}`"))
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::New { .. } => "new",
        Command::Inspect { .. } => "inspect",
        Command::Paint { .. } => "paint",
        Command::Subdivide { .. } => "subdivide",
        Command::Reset { .. } => "reset",
        Command::Text { .. } => "text",
        Command::Code { .. } => "code",
        Command::Image { .. } => "image",
        Command::Run { .. } => "run",
        Command::Exec { .. } => "exec",
        Command::Resolve { .. } => "resolve",
    }
}
