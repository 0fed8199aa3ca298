use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use gtm_parser::{
    process_response, request_record, sanitize, sanitize_tabular, segment, AnthropicTransport, DocumentShape,
    LlmConfig, StructuredClient,
};

#[derive(Parser)]
#[command(name = "gtm_parser", about = "Turn research-style model output into structured GTM records")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean raw model output and print it
    Sanitize {
        /// Keep pipe tables on their own lines
        #[arg(long)]
        tabular: bool,
        /// Input file, or - for stdin
        input: String,
    },
    /// Split sanitized text into titled sections (JSON)
    Segment {
        /// Input file, or - for stdin
        input: String,
    },
    /// Extract one record from a saved response (JSON)
    Extract {
        #[arg(value_enum)]
        shape: DocumentShape,
        /// Input file, or - for stdin
        input: String,
    },
    /// Extract every *.txt in a directory, writing <name>.json next to each
    Batch {
        #[arg(value_enum)]
        shape: DocumentShape,
        dir: PathBuf,
    },
    /// Send a prompt to the model and extract the answer
    Ask {
        #[arg(value_enum)]
        shape: DocumentShape,
        /// File holding the prompt body, or - for stdin
        prompt_file: String,
        /// Ask for a JSON payload instead of parsing prose
        #[arg(long)]
        structured: bool,
        /// Fail instead of returning an empty record (with --structured)
        #[arg(long)]
        strict: bool,
        /// Model id (overrides GTM_LLM_MODEL)
        #[arg(long)]
        model: Option<String>,
        /// Disable the web-search tool and research preamble
        #[arg(long)]
        no_web_search: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sanitize { tabular, input } => {
            let raw = read_input(&input)?;
            let clean = if tabular { sanitize_tabular(&raw) } else { sanitize(&raw) };
            println!("{clean}");
            Ok(())
        }
        Commands::Segment { input } => {
            let raw = read_input(&input)?;
            let sections = segment(&sanitize(&raw));
            println!("{}", serde_json::to_string_pretty(&sections)?);
            Ok(())
        }
        Commands::Extract { shape, input } => {
            let raw = read_input(&input)?;
            let record = process_response(shape, &raw);
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Commands::Batch { shape, dir } => {
            let files = list_inputs(&dir)?;
            if files.is_empty() {
                println!("No .txt files in {}.", dir.display());
                return Ok(());
            }
            println!("Extracting {} files as {shape}...", files.len());
            let counts = process_files(shape, &files);
            counts.print();
            Ok(())
        }
        Commands::Ask {
            shape,
            prompt_file,
            structured,
            strict,
            model,
            no_web_search,
        } => {
            let prompt = read_input(&prompt_file)?;
            let mut config = LlmConfig::from_env()?;
            if let Some(m) = model {
                config.model = m;
            }
            if no_web_search {
                config.web_search = false;
            }
            info!(model = %config.model, web_search = config.web_search, %shape, "asking model");

            let web_search = config.web_search;
            let client = StructuredClient::new(AnthropicTransport::new(config), web_search);
            let record = if structured {
                request_record(&client, shape, &prompt, strict).await?
            } else {
                let text = client.request_text(&prompt).await?;
                process_response(shape, &text)
            };
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))
}

/// `*.txt` files directly under `dir`, sorted by name.
fn list_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    files.sort();
    Ok(files)
}

struct BatchCounts {
    written: usize,
    failed: usize,
}

impl BatchCounts {
    fn print(&self) {
        println!("Wrote {} records ({} failed).", self.written, self.failed);
    }
}

fn process_files(shape: DocumentShape, files: &[PathBuf]) -> BatchCounts {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(files.len() as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let results: Vec<bool> = files
        .par_iter()
        .map(|path| {
            let outcome = extract_file(shape, path);
            if let Err(e) = &outcome {
                warn!(path = %path.display(), error = %e, "extraction failed");
            }
            pb.inc(1);
            outcome.is_ok()
        })
        .collect();

    pb.finish_and_clear();
    let written = results.iter().filter(|ok| **ok).count();
    let counts = BatchCounts {
        written,
        failed: results.len() - written,
    };
    info!(written = counts.written, failed = counts.failed, "batch finished");
    counts
}

fn extract_file(shape: DocumentShape, path: &Path) -> Result<PathBuf> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let record = process_response(shape, &raw);
    let out = path.with_extension("json");
    std::fs::write(&out, serde_json::to_string_pretty(&record)?)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    Ok(out)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_writes_json_next_to_inputs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("acme.txt"), "1. Acme Close\n2. Acme AP").unwrap();
        std::fs::write(dir.path().join("beta.txt"), "").unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let files = list_inputs(dir.path()).unwrap();
        assert_eq!(files.len(), 2);

        let counts = process_files(DocumentShape::Products, &files);
        assert_eq!(counts.written, 2);
        assert_eq!(counts.failed, 0);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("acme.json")).unwrap()).unwrap();
        assert_eq!(json["shape"], "products");
        assert_eq!(json["record"][1], "Acme AP");
        assert!(!dir.path().join("notes.json").exists());
    }

    #[test]
    fn missing_input_is_an_error() {
        assert!(read_input("/definitely/not/here.txt").is_err());
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(std::time::Duration::from_secs(75)), "1m 15s");
        assert_eq!(format_duration(std::time::Duration::from_secs(3725)), "1h 2m 5s");
    }
}
