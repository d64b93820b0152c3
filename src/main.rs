//! qldoc: generate cross-linked HTML docs for Qilletni libraries.
//!
//! - `qldoc generate --cache-dir .cache --output site std/ demo/ ext/`
//! - `qldoc index --cache-dir .cache --output site`
//! - `qldoc list --cache-dir .cache`

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use qldoc::{CacheStore, DocGenerator, Links, SpliceOutcome};

#[derive(Parser)]
#[command(
    name = "qldoc",
    about = "Generate documentation sites for Qilletni libraries"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Library that owns the native types
    #[arg(long, global = true, default_value = "std")]
    std_name: String,

    /// Base URL of the host platform's API docs, for host type links
    #[arg(long, global = true)]
    host_docs_url: Option<String>,

    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,
}

#[derive(Subcommand)]
enum Command {
    /// Parse libraries, write their pages and caches, then splice extensions
    Generate {
        /// Directory holding the library caches
        #[arg(long)]
        cache_dir: PathBuf,

        /// Site output directory
        #[arg(short = 'o', long)]
        output: PathBuf,

        /// Library roots, each with qll.info and qilletni-src/
        #[arg(required = true, value_name = "LIBRARY_DIR")]
        libraries: Vec<PathBuf>,
    },
    /// Rewrite the global index from the cache
    Index {
        #[arg(long)]
        cache_dir: PathBuf,

        #[arg(short = 'o', long)]
        output: PathBuf,
    },
    /// Print the metadata of every cached library
    List {
        #[arg(long)]
        cache_dir: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .filter_level(cli.verbose.log_level_filter())
        .init();

    let links = Links::new(cli.std_name, cli.host_docs_url);
    match cli.command {
        Command::Generate {
            cache_dir,
            output,
            libraries,
        } => {
            let generator = DocGenerator::new(CacheStore::new(cache_dir), output, links);
            let report = generator.generate(&libraries)?;

            for (library, outcome) in &report.splices {
                if let SpliceOutcome::Spliced { added } = outcome {
                    log::info!("{}: {} extension functions added", library, added);
                }
            }
            if report.has_failures() {
                for (library, err) in &report.failed {
                    eprintln!("error: {}: {}", library, err);
                }
                for (library, outcome) in &report.splices {
                    if let SpliceOutcome::Failed(err) = outcome {
                        eprintln!("error: {}: {}", library, err);
                    }
                }
                return Ok(ExitCode::FAILURE);
            }
            println!(
                "documented {} libraries into {}",
                report.processed.len(),
                generator.output().display()
            );
        }
        Command::Index { cache_dir, output } => {
            let generator = DocGenerator::new(CacheStore::new(cache_dir), output, links);
            generator.initialize_output()?;
            let count = generator.regenerate_global_index()?;
            println!("indexed {} libraries", count);
        }
        Command::List { cache_dir } => {
            let libraries = CacheStore::new(&cache_dir)
                .list_cached_libraries()
                .with_context(|| format!("failed to list caches in {}", cache_dir.display()))?;
            for meta in libraries {
                println!("{} {} by {}: {}", meta.name, meta.version, meta.author, meta.description);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
