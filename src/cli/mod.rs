//! # CLI Module
//!
//! Command-line interface for the image transform pipeline.
//!
//! ## Usage
//! ```bash
//! # Resolve transform markers across a rendered site
//! imgmill process ./public
//!
//! # With custom asset locations
//! imgmill process ./public --output-dir dist/img --url-path /img/
//!
//! # Reprocess on change
//! imgmill watch ./public
//!
//! # Drop all materialized assets
//! imgmill clear
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use image_mill::core::config::PipelineOptions;
use image_mill::core::engine::ImageEngine;
use image_mill::core::materialize::Materializer;
use image_mill::core::watcher::{ContentEvent, ContentWatcher, WatcherConfig};
use image_mill::error::{FilesystemError, Result};
use image_mill::hooks::Hooks;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Instant;
use walkdir::WalkDir;

/// image-mill - resolve image transforms embedded in rendered content
#[derive(Parser, Debug)]
#[command(name = "imgmill")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rewrite transform markers across a rendered output tree
    Process {
        /// Root of the rendered output
        root: PathBuf,

        /// Directory that receives materialized assets
        #[arg(long, default_value = "public/assets/images")]
        output_dir: PathBuf,

        /// Public URL prefix for rewritten references
        #[arg(long, default_value = "/assets/images/")]
        url_path: String,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Process once, then reprocess files as they change
    Watch {
        /// Root of the rendered output
        root: PathBuf,

        /// Directory that receives materialized assets
        #[arg(long, default_value = "public/assets/images")]
        output_dir: PathBuf,

        /// Public URL prefix for rewritten references
        #[arg(long, default_value = "/assets/images/")]
        url_path: String,
    },

    /// Remove every materialized asset and reset the cache
    Clear {
        /// Directory that receives materialized assets
        #[arg(long, default_value = "public/assets/images")]
        output_dir: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (rewritten file paths only)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    image_mill::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            root,
            output_dir,
            url_path,
            output,
            verbose,
        } => {
            let options = PipelineOptions::default()
                .with_output_dir(output_dir)
                .with_url_path(url_path);
            run_process(&root, options, output, verbose)
        }
        Commands::Watch {
            root,
            output_dir,
            url_path,
        } => {
            let options = PipelineOptions::default()
                .with_output_dir(output_dir)
                .with_url_path(url_path);
            run_watch(&root, options)
        }
        Commands::Clear { output_dir } => {
            let options = PipelineOptions::default().with_output_dir(output_dir);
            run_clear(options)
        }
    }
}

fn run_process(
    root: &Path,
    options: PipelineOptions,
    output: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();
    let start_time = Instant::now();

    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("image-mill").bold().cyan(),
            style(env!("CARGO_PKG_VERSION")).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let hooks = Hooks::new(options, Box::new(ImageEngine::new()))?;
    let files = collect_content_files(root);

    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let mut rewritten_files = Vec::new();
    for file in &files {
        if let Some(ref pb) = progress {
            if verbose {
                pb.set_message(
                    file.file_name()
                        .unwrap_or_default()
                        .to_string_lossy()
                        .into_owned(),
                );
            }
        }

        if process_file(&hooks, file)? {
            rewritten_files.push(file.clone());
        }

        if let Some(ref pb) = progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let stats = hooks.stats();
    let duration_ms = start_time.elapsed().as_millis() as u64;

    match output {
        OutputFormat::Pretty => {
            print_pretty_results(&term, files.len(), &rewritten_files, &stats, duration_ms)
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "files_scanned": files.len(),
                "files_rewritten": rewritten_files.len(),
                "transforms_run": stats.transforms_run,
                "disk_hits": stats.disk_hits,
                "ledger_hits": stats.ledger_hits,
                "duration_ms": duration_ms,
                "rewritten": rewritten_files,
            });
            println!("{}", serde_json::to_string_pretty(&json).unwrap());
        }
        OutputFormat::Minimal => {
            for file in &rewritten_files {
                println!("{}", file.display());
            }
        }
    }

    Ok(())
}

fn run_watch(root: &Path, options: PipelineOptions) -> Result<()> {
    let term = Term::stderr();

    // Initial full pass; the hooks stay alive so the ledger keeps repeat
    // references cheap across reprocesses.
    let hooks = Hooks::new(options, Box::new(ImageEngine::new()))?;
    let files = collect_content_files(root);
    for file in &files {
        process_file(&hooks, file)?;
    }

    term.write_line(&format!(
        "{} watching {} ({} files processed)",
        style("▶").green().bold(),
        root.display(),
        files.len()
    ))
    .ok();

    let (sender, receiver) = mpsc::channel();
    let mut watcher = ContentWatcher::new(WatcherConfig::default(), move |event| {
        sender.send(event).ok();
    })?;
    watcher.watch(root)?;

    for event in receiver {
        match event {
            ContentEvent::Changed(path) => match process_file(&hooks, &path) {
                Ok(true) => {
                    term.write_line(&format!(
                        "  {} {}",
                        style("✓").green(),
                        path.display()
                    ))
                    .ok();
                }
                Ok(false) => {}
                Err(e) => {
                    term.write_line(&format!("  {} {}: {}", style("✗").red(), path.display(), e))
                        .ok();
                }
            },
            ContentEvent::Removed(_) => {}
            ContentEvent::Error(message) => {
                term.write_line(&format!("  {} {}", style("✗").red(), message))
                    .ok();
            }
        }
    }

    Ok(())
}

fn run_clear(options: PipelineOptions) -> Result<()> {
    let term = Term::stderr();

    let materializer = Materializer::new(options, Box::new(ImageEngine::new()));
    materializer.clear()?;

    term.write_line(&format!(
        "{} Output directory cleared",
        style("✓").green().bold()
    ))
    .ok();

    Ok(())
}

/// Rewrite one rendered file in place. Returns true when it changed.
fn process_file(hooks: &Hooks, path: &Path) -> Result<bool> {
    let content = fs::read_to_string(path).map_err(|source| FilesystemError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let rewritten = hooks.sharp_transform(&content, &path.to_string_lossy())?;
    if rewritten == content {
        return Ok(false);
    }

    fs::write(path, rewritten).map_err(|source| FilesystemError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(true)
}

/// All eligible content files below `root`, in walk order
fn collect_content_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("html"))
        })
        .map(|entry| entry.into_path())
        .collect()
}

fn print_pretty_results(
    term: &Term,
    files_scanned: usize,
    rewritten_files: &[PathBuf],
    stats: &image_mill::core::materialize::MaterializeStats,
    duration_ms: u64,
) {
    term.write_line("").ok();
    term.write_line(&format!("{} Pass Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} files scanned in {:.1}s",
        style(files_scanned).cyan(),
        duration_ms as f64 / 1000.0
    ))
    .ok();

    term.write_line(&format!(
        "  {} files rewritten",
        style(rewritten_files.len()).cyan()
    ))
    .ok();

    term.write_line(&format!(
        "  {} transforms run",
        style(stats.transforms_run).cyan()
    ))
    .ok();

    if stats.disk_hits > 0 {
        term.write_line(&format!(
            "  {} reused from a previous run",
            style(stats.disk_hits).dim()
        ))
        .ok();
    }

    if stats.ledger_hits > 0 {
        term.write_line(&format!(
            "  {} repeat references",
            style(stats.ledger_hits).dim()
        ))
        .ok();
    }

    term.write_line("").ok();
}
