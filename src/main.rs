use clap::{Parser, Subcommand};
use gox_transpiler::runtime::Bindings;
use gox_transpiler::{CompileError, Options, parse_markup, render_document, transpile_with};
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::debug;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};
use walkdir::WalkDir;

mod watch;

#[derive(Parser)]
#[command(name = "gox")]
#[command(about = "gox - HTML-like markup inside Go, compiled to plain Go")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Go from .gox files
    Generate {
        /// Path to .gox file or directory
        #[arg(required_unless_present = "stdin")]
        path: Option<PathBuf>,

        /// Read from stdin and write the generated code to stdout
        #[arg(long)]
        stdin: bool,

        /// With --stdin, output JSON with the region map
        #[arg(long, requires = "stdin")]
        json: bool,

        /// Go package qualifier used for runtime calls
        #[arg(long, default_value = "gox")]
        runtime: String,

        /// Skip the syntax check of generated code
        #[arg(long)]
        no_verify: bool,
    },
    /// Generate once, then regenerate .gox files as they change
    Watch {
        /// Directory to watch
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Go package qualifier used for runtime calls
        #[arg(long, default_value = "gox")]
        runtime: String,

        /// Skip the syntax check of generated code
        #[arg(long)]
        no_verify: bool,
    },
    /// Render a standalone markup file to HTML
    Render {
        /// Markup file
        #[arg(required_unless_present = "stdin")]
        file: Option<PathBuf>,

        /// Read markup from stdin
        #[arg(long)]
        stdin: bool,
    },
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("could not read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("{}: {error}", path.display())]
    Compile { path: PathBuf, source_text: String, error: CompileError },
    #[error("{} does not exist", .0.display())]
    Missing(PathBuf),
    #[error("{} is not a .gox file", .0.display())]
    NotGox(PathBuf),
    #[error("no .gox files found in {}", .0.display())]
    NoSources(PathBuf),
    #[error("{0}")]
    Usage(&'static str),
    #[error("watch: {0}")]
    Watch(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate { path, stdin, json, runtime, no_verify } => {
            let options = Options { runtime, verify_output: !no_verify };
            if stdin {
                generate_stdin(json, options)
            } else if let Some(path) = path {
                generate_path(&path, &options)
            } else {
                Err(CliError::Usage("provide a file/directory or use --stdin"))
            }
        }
        Commands::Watch { path, runtime, no_verify } => {
            let options = Options { runtime, verify_output: !no_verify };
            watch::run_watch(&path, &options).map(|()| ExitCode::SUCCESS)
        }
        Commands::Render { file, stdin } => render(file.as_deref(), stdin),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr; `GOX_LOG` takes an env-filter directive (default `info`)
fn init_tracing() {
    let filter = EnvFilter::try_from_env("GOX_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr)
                .with_filter(filter),
        )
        .init();
}

fn generate_stdin(json_output: bool, options: Options) -> Result<ExitCode, CliError> {
    let mut source = String::new();
    io::stdin().read_to_string(&mut source)?;

    let result = transpile_with(&source, options).map_err(|error| CliError::Compile {
        path: PathBuf::from("<stdin>"),
        source_text: source.clone(),
        error,
    })?;

    if json_output {
        println!("{}", serde_json::to_string(&result)?);
    } else {
        print!("{}", result.code);
    }
    Ok(ExitCode::SUCCESS)
}

fn generate_path(path: &Path, options: &Options) -> Result<ExitCode, CliError> {
    if path.is_file() {
        if !is_gox(path) {
            return Err(CliError::NotGox(path.to_path_buf()));
        }
        let start = Instant::now();
        let output = generate_file(path, options)?;
        print_generated(&output.display().to_string());
        print_summary(1, 0, start.elapsed());
        Ok(ExitCode::SUCCESS)
    } else if path.is_dir() {
        generate_directory(path, options)
    } else {
        Err(CliError::Missing(path.to_path_buf()))
    }
}

fn generate_directory(dir: &Path, options: &Options) -> Result<ExitCode, CliError> {
    let start = Instant::now();
    let sources = collect_sources(dir);
    if sources.is_empty() {
        return Err(CliError::NoSources(dir.to_path_buf()));
    }

    let mut generated = 0;
    let mut failed = 0;
    for path in &sources {
        match generate_file(path, options) {
            Ok(output) => {
                generated += 1;
                print_generated(&output.display().to_string());
            }
            Err(err) => {
                failed += 1;
                report(&err);
            }
        }
    }

    print_summary(generated, failed, start.elapsed());
    Ok(if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// All `.gox` files under `dir`, sorted
pub(crate) fn collect_sources(dir: &Path) -> Vec<PathBuf> {
    let mut sources: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_gox(e.path()))
        .map(|e| e.into_path())
        .collect();
    sources.sort();
    sources
}

pub(crate) fn is_gox(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gox")
}

/// `views/page.gox` -> `views/page__gox.go`
pub(crate) fn output_path(path: &Path) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("template");
    path.with_file_name(format!("{stem}__gox.go"))
}

/// Transpile one file and write its output next to it
pub(crate) fn generate_file(path: &Path, options: &Options) -> Result<PathBuf, CliError> {
    let source = fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_path_buf(), source })?;

    let result = transpile_with(&source, options.clone()).map_err(|error| CliError::Compile {
        path: path.to_path_buf(),
        source_text: source.clone(),
        error,
    })?;

    let output = output_path(path);
    fs::write(&output, &result.code).map_err(|source| CliError::Write { path: output.clone(), source })?;
    debug!(source = %path.display(), output = %output.display(), regions = result.regions.len(), "generated");
    Ok(output)
}

/// Delete the generated file of a removed source. Returns whether one existed.
pub(crate) fn remove_generated(path: &Path) -> Result<bool, CliError> {
    let output = output_path(path);
    match fs::remove_file(&output) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(CliError::Write { path: output, source }),
    }
}

fn render(file: Option<&Path>, stdin: bool) -> Result<ExitCode, CliError> {
    let (name, source) = match file {
        Some(path) if !stdin => {
            let source = fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_path_buf(), source })?;
            (path.display().to_string(), source)
        }
        _ => {
            let mut source = String::new();
            io::stdin().read_to_string(&mut source)?;
            ("<stdin>".to_string(), source)
        }
    };

    let document = match parse_markup(&source) {
        Ok(document) => document,
        Err(err) => {
            eprint!("{}", render_error(&CompileError::Parse(err), &source, &name));
            return Ok(ExitCode::FAILURE);
        }
    };

    match render_document(&document, &Bindings::new()) {
        Ok(html) => {
            println!("{html}");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            let at = err.span().start;
            eprintln!("error: {}:{}:{}: {err}", name, at.line + 1, at.col + 1);
            Ok(ExitCode::FAILURE)
        }
    }
}

pub(crate) fn report(err: &CliError) {
    match err {
        CliError::Compile { path, source_text, error } => {
            eprint!("{}", render_error(error, source_text, &path.display().to_string()));
        }
        other => {
            if io::stderr().is_terminal() {
                eprintln!("  \x1b[31m✗\x1b[0m {other}");
            } else {
                eprintln!("  ✗ {other}");
            }
        }
    }
}

fn render_error(error: &CompileError, source: &str, filename: &str) -> String {
    if io::stderr().is_terminal() {
        error.render_color(source, filename)
    } else {
        error.render(source, filename)
    }
}

pub(crate) fn print_generated(path: &str) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("  \x1b[32m✓\x1b[0m {}", path);
    } else {
        eprintln!("  ✓ {}", path);
    }
}

fn print_summary(count: usize, failed: usize, elapsed: std::time::Duration) {
    let is_tty = io::stderr().is_terminal();
    let time_str = format_duration(elapsed);
    let files_word = if count == 1 { "file" } else { "files" };
    let failures = if failed > 0 { format!(", {failed} failed") } else { String::new() };

    if is_tty {
        eprintln!("\n\x1b[1m✨ Generated {} {} in {}{}\x1b[0m", count, files_word, time_str, failures);
    } else {
        eprintln!("\n✨ Generated {} {} in {}{}", count, files_word, time_str, failures);
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let micros = d.as_micros();
    if micros < 1000 {
        format!("{}μs", micros)
    } else if micros < 1_000_000 {
        format!("{:.1}ms", micros as f64 / 1000.0)
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}
