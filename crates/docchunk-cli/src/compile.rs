//! Implementation of the `docchunk compile` command.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use docchunk_core::config::DocConfig;
use docchunk_core::pipeline::{compile_batch, FinishedUnit, UnitInput};
use docchunk_core::Artifact;

/// Extension of artifacts written next to their input.
const ARTIFACT_EXTENSION: &str = "beam";

/// Options for compiling event streams.
#[derive(Debug)]
pub struct CompileArgs {
    /// Event stream files.
    pub inputs: Vec<PathBuf>,
    /// Output file for a single input, output directory for several.
    pub output: Option<PathBuf>,
    /// Explicit configuration file.
    pub config: Option<PathBuf>,
    /// Overrides the configured default format.
    pub format: Option<String>,
    /// Skip chunk generation.
    pub no_docs: bool,
}

/// Compile every input, reporting failures per module.
pub fn run(args: CompileArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => DocConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DocConfig::discover(Path::new(".")).context("Failed to load docchunk.toml")?,
    };

    let mut options = config.compile_options();
    if let Some(format) = &args.format {
        if format.trim().is_empty() {
            return Err(anyhow::anyhow!("--format must not be empty"));
        }
        options.default_format.clone_from(format);
    }
    if args.no_docs {
        options.skip_chunk = true;
    }

    let total = args.inputs.len();
    let mut failed = 0;

    let mut loaded = Vec::with_capacity(total);
    for path in &args.inputs {
        match read_input(path) {
            Ok(input) => {
                debug!(
                    path = %path.display(),
                    module = %input.module,
                    events = input.events.len(),
                    "loaded event stream"
                );
                loaded.push((path.clone(), input));
            }
            Err(err) => {
                failed += 1;
                eprintln!("error: {err:#}");
            }
        }
    }

    let (paths, inputs): (Vec<PathBuf>, Vec<UnitInput>) = loaded.into_iter().unzip();
    let outcomes = compile_batch(inputs, &options);

    let mut written_paths = HashSet::new();
    for (path, outcome) in paths.iter().zip(outcomes) {
        let written = outcome
            .result
            .map_err(anyhow::Error::from)
            .and_then(|finished| {
                let out = output_path(path, &finished.module, args.output.as_deref(), total);
                if !written_paths.insert(out.clone()) {
                    return Err(anyhow::anyhow!(
                        "{} was already written by another input in this batch",
                        out.display()
                    ));
                }
                write_artifact(&finished, &config, &out).map(|()| (finished, out))
            });

        match written {
            Ok((finished, out)) => {
                info!(module = %finished.module, output = %out.display(), "wrote artifact");
                println!(
                    "Compiled {} -> {} ({} entries)",
                    finished.module,
                    out.display(),
                    finished.entries.len()
                );
            }
            Err(err) => {
                failed += 1;
                eprintln!("error: {}: {err:#}", outcome.module);
            }
        }
    }

    if failed > 0 {
        return Err(anyhow::anyhow!("{failed} of {total} modules failed to compile"));
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<UnitInput> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse event stream {}", path.display()))
}

/// Where the artifact for `input` goes.
fn output_path(input: &Path, module: &str, output: Option<&Path>, total: usize) -> PathBuf {
    match output {
        Some(out) if total == 1 => out.to_path_buf(),
        Some(dir) => dir.join(format!("{module}.{ARTIFACT_EXTENSION}")),
        None => input.with_extension(ARTIFACT_EXTENSION),
    }
}

fn write_artifact(finished: &FinishedUnit, config: &DocConfig, out: &Path) -> Result<()> {
    // With chunk generation skipped the artifact is written without one.
    let mut artifact = Artifact::new(config.form());
    finished.write_to(&mut artifact)?;

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(out, artifact.to_bytes())
        .with_context(|| format!("Failed to write {}", out.display()))
}
