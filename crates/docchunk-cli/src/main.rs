//! Docchunk CLI - compile documentation event streams and query artifacts

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use docchunk_core::{EntityKind, EntityRef};

mod compile;
mod query;

#[derive(Parser)]
#[command(name = "docchunk")]
#[command(version = docchunk_core::VERSION)]
#[command(about = "Structured documentation chunks for compiled modules", long_about = None)]
struct Cli {
    /// Show debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile event stream files into artifacts with a documentation chunk
    Compile {
        /// Event stream files (`{ "module": .., "events": [..] }`)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output artifact (one input) or output directory (several inputs)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file (defaults to ./docchunk.toml if present)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Documentation format for modules that declare none
        #[arg(long)]
        format: Option<String>,

        /// Check documentation but do not emit a chunk
        #[arg(long)]
        no_docs: bool,
    },

    /// Show the documentation of one entity
    Show {
        /// Artifact file
        artifact: PathBuf,

        /// Entity: `module`, `name/arity`, `type name/arity` or `callback name/arity`
        entity: EntityRef,
    },

    /// List documented entities
    List {
        /// Artifact file
        artifact: PathBuf,

        /// Only list entities of this kind
        #[arg(long)]
        kind: Option<EntityKind>,

        /// Include hidden entries
        #[arg(long)]
        all: bool,
    },

    /// Print the whole documentation chunk
    Dump {
        /// Artifact file
        artifact: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compile {
            inputs,
            output,
            config,
            format,
            no_docs,
        } => {
            let options = compile::CompileArgs {
                inputs,
                output,
                config,
                format,
                no_docs,
            };
            compile::run(options)?;
        }

        Commands::Show { artifact, entity } => {
            query::show(&artifact, &entity)?;
        }

        Commands::List { artifact, kind, all } => {
            query::list(&artifact, kind, all)?;
        }

        Commands::Dump { artifact, json } => {
            query::dump(&artifact, json)?;
        }
    }

    Ok(())
}
