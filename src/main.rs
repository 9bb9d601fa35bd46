// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use doctran::app_config::ProviderKind;
use doctran::export::{export_document, FileFormat};
use doctran::providers::{AdapterFactory, AiProvider};
use doctran::segment::aggregate_file_status;
use doctran::store::{SegmentFilter, SegmentStore, SortOrder, SqliteSegmentStore};
use doctran::translation::{TranslateOptions, TranslationOrchestrator};
use doctran::xliff::{extract_segments, ExtractOptions};

/// CLI wrapper for ProviderKind to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliProvider {
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
    Ollama,
}

impl From<CliProvider> for ProviderKind {
    fn from(cli_provider: CliProvider) -> Self {
        match cli_provider {
            CliProvider::OpenAI => ProviderKind::OpenAI,
            CliProvider::Anthropic => ProviderKind::Anthropic,
            CliProvider::Ollama => ProviderKind::Ollama,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "doctran",
    about = "AI-assisted translation of structured documents",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Segment database path
    #[arg(long, global = true, default_value = "doctran.db")]
    db: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract segments from a document into the database
    Extract {
        /// Document to extract (XLIFF)
        #[arg(short, long)]
        input: PathBuf,

        /// File id for the extracted segments (defaults to the file stem)
        #[arg(long)]
        file_id: Option<String>,

        /// Honor the vendor dialect attribute set
        #[arg(long)]
        vendor: bool,
    },

    /// Translate all pending segments of a file in batches
    Translate {
        /// File id to translate
        #[arg(long)]
        file_id: String,

        /// AI provider to use
        #[arg(long, value_enum, default_value = "openai")]
        provider: CliProvider,

        /// Source language code
        #[arg(long, default_value = "en")]
        source_lang: String,

        /// Target language code
        #[arg(long)]
        target_lang: String,

        /// Input token budget per AI call
        #[arg(long, default_value_t = 4000)]
        max_input_tokens: usize,
    },

    /// Export translated segments back into a document
    Export {
        /// File id to export
        #[arg(long)]
        file_id: String,

        /// The original document (required for XLIFF export)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Where to write the result
        #[arg(short, long)]
        output: PathBuf,

        /// Force the plain-text fallback
        #[arg(long)]
        plain: bool,
    },

    /// Show the aggregate status of a file
    Status {
        /// File id to inspect
        #[arg(long)]
        file_id: String,
    },

    /// List the models a provider currently offers
    Models {
        /// AI provider to query
        #[arg(long, value_enum, default_value = "openai")]
        provider: CliProvider,
    },

    /// Check that the configured credentials are accepted
    ValidateKey {
        /// AI provider to check
        #[arg(long, value_enum, default_value = "openai")]
        provider: CliProvider,
    },
}

fn default_file_id(input: &Path) -> String {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let store = SqliteSegmentStore::open(&cli.db)?;

    match cli.command {
        Commands::Extract { input, file_id, vendor } => {
            let file_id = file_id.unwrap_or_else(|| default_file_id(&input));
            let mut options = ExtractOptions::new(&file_id);
            if vendor {
                options = options.with_vendor_dialect();
            }
            let result = extract_segments(&input, &options)?;

            // Re-extraction resets the file's segments
            let removed = store
                .delete_many(&SegmentFilter::for_file(&file_id))
                .await?;
            if removed > 0 {
                info!("Replaced {} existing segments of file {}", removed, file_id);
            }
            store.insert_many(result.segments).await?;
            println!(
                "Extracted {} segments from {:?} as file '{}'",
                result.segment_count, input, file_id
            );
        }

        Commands::Translate {
            file_id,
            provider,
            source_lang,
            target_lang,
            max_input_tokens,
        } => {
            let orchestrator = TranslationOrchestrator::new(Arc::new(store));
            let options = TranslateOptions::new(provider.into(), source_lang, target_lang)
                .with_max_input_tokens(max_input_tokens);
            let outcome = orchestrator
                .translate_multiple_segments(&file_id, &options)
                .await?;

            println!(
                "Translated {} segments ({} failed)",
                outcome.updated_count,
                outcome.failed_segments.len()
            );
            for failed in &outcome.failed_segments {
                eprintln!("  segment {}: {}", failed.index, failed.error);
            }
            if !outcome.success {
                return Err(anyhow!("some segments failed to translate"));
            }
        }

        Commands::Export { file_id, input, output, plain } => {
            let segments = store
                .find_many(&SegmentFilter::for_file(&file_id), SortOrder::ByIndex)
                .await?;
            if segments.is_empty() {
                return Err(anyhow!("no segments found for file '{}'", file_id));
            }
            let format = if plain {
                FileFormat::PlainText
            } else {
                input
                    .as_deref()
                    .map(FileFormat::from_path)
                    .unwrap_or(FileFormat::PlainText)
            };
            export_document(&segments, format, input.as_deref(), &output)?;
            println!("Exported {} segments to {:?}", segments.len(), output);
        }

        Commands::Status { file_id } => {
            let segments = store
                .find_many(&SegmentFilter::for_file(&file_id), SortOrder::ByIndex)
                .await?;
            let status = aggregate_file_status(&segments);
            println!("file '{}': {:?} ({} segments)", file_id, status, segments.len());
            for segment in &segments {
                println!(
                    "  [{}] {} {}",
                    segment.index,
                    segment.status,
                    segment.error.as_deref().unwrap_or("")
                );
            }
        }

        Commands::Models { provider } => {
            let adapter = AdapterFactory::global().adapter(provider.into(), None)?;
            let models = adapter.list_available_models().await?;
            for model in models {
                println!("{}", model);
            }
        }

        Commands::ValidateKey { provider } => {
            let kind: ProviderKind = provider.into();
            let adapter = AdapterFactory::global().adapter(kind, None)?;
            match adapter.validate_api_key().await {
                Ok(()) => println!("{} credentials accepted", kind.display_name()),
                Err(e) => return Err(anyhow!("{} credentials rejected: {}", kind.display_name(), e)),
            }
        }
    }

    Ok(())
}
