use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use paper_lens::config::{find_config_file, load_config, user_config_path, Config};
use paper_lens::linker::ReferenceLinker;
use paper_lens::models::{BibliographyEntry, LinkResponse, PageText, StructuredPaper};
use paper_lens::parsing::{extract_citation_keys, PaperStructurer};
use paper_lens::retrieval::{EmbeddingService, HttpEmbeddingBackend, HttpRerankBackend};
use paper_lens::tools::{content_paper_id, PdfPageSource, PdfParserInput, PdfParserTool, Tool};
use paper_lens::utils::{with_retry, RetryConfig};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Paper Lens - Structure scholarly papers and link citations to their references
#[derive(Parser, Debug)]
#[command(name = "paper-lens")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Structure scholarly papers and link citations to their references", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    fn resolve(self, is_terminal: bool) -> Self {
        match self {
            OutputFormat::Auto if is_terminal => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Structure a paper from a PDF or a JSON list of pages
    Parse {
        /// PDF file, or a .json file holding [{"page_number", "text"}, ...]
        input: PathBuf,

        /// JSON file with the bibliography as [{"ref_id", "full_citation"}, ...]
        #[arg(long, short)]
        bibliography: Option<PathBuf>,

        /// Identifier to assign (defaults to a hash of the page text)
        #[arg(long)]
        paper_id: Option<String>,

        /// Maximum characters per paragraph chunk
        #[arg(long)]
        max_chunk_chars: Option<usize>,

        /// Characters shared between consecutive chunks
        #[arg(long)]
        overlap: Option<usize>,
    },

    /// Print the citation markers found in a piece of text
    #[command(alias = "cite")]
    Citations {
        /// Text to scan, e.g. "as shown in [1, 2]"
        text: String,
    },

    /// Link a snippet or topic to bibliography entries of a structured paper
    Link {
        /// Structured paper JSON as produced by `parse`
        paper: PathBuf,

        /// Snippet with citation markers, or a free-text topic
        query: String,

        /// Paragraphs kept by prefilter and rerank
        #[arg(long, short = 'k')]
        top_k: Option<usize>,
    },

    /// Write the default configuration file
    InitConfig {
        /// Destination (defaults to the user config directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from file if specified or found in default locations
    let config_path = cli.config.clone().or_else(find_config_file);
    let config = load_config(config_path.as_deref())
        .with_context(|| match &config_path {
            Some(path) => format!("Failed to load config from {}", path.display()),
            None => "Failed to load configuration".to_string(),
        })?;

    // Initialize tracing based on verbosity, falling back to the configured level
    let log_level = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("paper_lens={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    let format = cli.output.resolve(std::io::stdout().is_terminal());

    match cli.command {
        Commands::Parse {
            input,
            bibliography,
            paper_id,
            max_chunk_chars,
            overlap,
        } => {
            let mut segmenter = config.segmenter.clone();
            if let Some(max_chunk_chars) = max_chunk_chars {
                segmenter.max_chunk_chars = max_chunk_chars;
            }
            if let Some(overlap) = overlap {
                segmenter.overlap = overlap;
            }
            let structurer = PaperStructurer::from_config(&segmenter);

            let bibliography = bibliography
                .as_deref()
                .map(read_json::<Vec<BibliographyEntry>>)
                .transpose()?;

            let paper = if is_json(&input) {
                let pages: Vec<PageText> = read_json(&input)?;
                let paper_id = paper_id.unwrap_or_else(|| content_paper_id(&pages));
                structurer.structure(paper_id, &pages, bibliography)?
            } else {
                let tool = PdfParserTool::new(Arc::new(PdfPageSource), structurer);
                let mut request = PdfParserInput::new(input.clone());
                request.bibliography = bibliography;
                request.paper_id = paper_id;
                tool.execute(request).await?.structured_paper
            };

            output_paper(&paper, format)?;
        }

        Commands::Citations { text } => {
            let keys = extract_citation_keys(&text);
            output_citations(&keys, format)?;
        }

        Commands::Link { paper, query, top_k } => {
            let paper: StructuredPaper = read_json(&paper)?;
            let top_k = top_k.unwrap_or(config.linker.top_k);

            let embedder = HttpEmbeddingBackend::from_config(&config.embedding)?;
            let reranker = HttpRerankBackend::from_config(&config.rerank)?;
            let linker =
                ReferenceLinker::new(EmbeddingService::new(Arc::new(embedder), Arc::new(reranker)));

            tracing::debug!("Linking {:?} against {}", query, paper.paper_id);
            let response = with_retry(RetryConfig::from(&config.retry), || {
                linker.link(&paper, &query, top_k)
            })
            .await?;

            output_links(&response, format)?;
        }

        Commands::InitConfig { path, force } => {
            let path = match path.or_else(user_config_path) {
                Some(path) => path,
                None => anyhow::bail!("No config directory available; pass --path"),
            };
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists; use --force to overwrite",
                    path.display()
                );
            }

            Config::default().save(&path)?;
            if !cli.quiet {
                println!("Wrote default configuration to {}", path.display());
            }
        }
    }

    Ok(())
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn output_paper(paper: &StructuredPaper, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Plain => {
            println!("{}", paper.paper_id);
            for section in &paper.sections {
                println!("{} {}", section.section_number, section.title);
                for paragraph in section.paragraphs() {
                    println!("  [{}] {}", paragraph.element_id, truncate(&paragraph.text, 80));
                }
            }
            println!("{} bibliography entries", paper.bibliography.len());
        }
        // The structured paper is always emitted as JSON so it can be fed to `link`
        _ => println!("{}", serde_json::to_string_pretty(paper)?),
    }
    Ok(())
}

fn output_citations(keys: &[String], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(keys)?),
        OutputFormat::Plain => {
            for key in keys {
                println!("{}", key);
            }
        }
        OutputFormat::Table => {
            use comfy_table::{Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["#", "Marker"]);
            for (i, key) in keys.iter().enumerate() {
                table.add_row(vec![Cell::new(i + 1), Cell::new(key)]);
            }
            println!("{table}");
        }
        OutputFormat::Auto => unreachable!(),
    }
    Ok(())
}

fn output_links(response: &LinkResponse, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(response)?),
        OutputFormat::Plain => {
            println!("mode: {}", response.mode);
            for reference in &response.references {
                println!("{} ({:.3})", reference.ref_id, reference.score);
                println!("  {}", reference.full_citation);
            }
        }
        OutputFormat::Table => {
            use comfy_table::{Attribute, Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Ref", "Score", "Citation"]);

            for reference in &response.references {
                table.add_row(vec![
                    Cell::new(&reference.ref_id).add_attribute(Attribute::Bold),
                    Cell::new(format!("{:.3}", reference.score)),
                    Cell::new(truncate(&reference.full_citation, 70)),
                ]);
            }
            println!("Mode: {}", response.mode);
            println!("{table}");
        }
        OutputFormat::Auto => unreachable!(),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_version() {
        let version = env!("CARGO_PKG_VERSION");
        assert!(!version.is_empty());
        let parts: Vec<&str> = version.split('.').collect();
        assert!(parts.len() >= 2);
        assert!(parts[0].parse::<u32>().is_ok());
    }

    #[test]
    fn test_output_format_resolution() {
        assert_eq!(OutputFormat::Auto.resolve(true), OutputFormat::Table);
        assert_eq!(OutputFormat::Auto.resolve(false), OutputFormat::Json);
        assert_eq!(OutputFormat::Plain.resolve(true), OutputFormat::Plain);
    }

    #[test]
    fn test_parse_link_command() {
        let cli = Cli::try_parse_from([
            "paper-lens",
            "-vv",
            "link",
            "paper.json",
            "retrieval augmented generation",
            "-k",
            "3",
            "--output",
            "plain",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.output, OutputFormat::Plain);
        match cli.command {
            Commands::Link { paper, query, top_k } => {
                assert_eq!(paper, PathBuf::from("paper.json"));
                assert_eq!(query, "retrieval augmented generation");
                assert_eq!(top_k, Some(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_command_overrides() {
        let cli = Cli::try_parse_from([
            "paper-lens",
            "parse",
            "pages.json",
            "--max-chunk-chars",
            "500",
            "--overlap",
            "50",
        ])
        .unwrap();

        match cli.command {
            Commands::Parse {
                max_chunk_chars,
                overlap,
                bibliography,
                ..
            } => {
                assert_eq!(max_chunk_chars, Some(500));
                assert_eq!(overlap, Some(50));
                assert!(bibliography.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_is_json() {
        assert!(is_json(Path::new("pages.json")));
        assert!(is_json(Path::new("PAGES.JSON")));
        assert!(!is_json(Path::new("paper.pdf")));
        assert!(!is_json(Path::new("paper")));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }
}
