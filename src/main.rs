//! rawpreview - extract embedded JPEG previews from camera RAW files.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rawpreview::config::{Cli, Command, ExtractConfig};
use rawpreview::{RawExtractor, RawFormat};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let extractor = RawExtractor::new();

    match cli.command {
        Command::Detect { path } => run_detect(&extractor, &path),
        Command::Extract(config) => run_extract(&extractor, &config),
        Command::List { path, json } => run_list(&extractor, &path, json),
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "rawpreview=debug"
    } else {
        "rawpreview=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

// =============================================================================
// Detect Command
// =============================================================================

fn run_detect(extractor: &RawExtractor, path: &std::path::Path) -> ExitCode {
    let format = extractor.detect_format(path);
    println!("{}", format);

    if format == RawFormat::Unknown {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

// =============================================================================
// Extract Command
// =============================================================================

fn run_extract(extractor: &RawExtractor, config: &ExtractConfig) -> ExitCode {
    let options = config.to_options();

    let preview = match extractor.extract_preview(&config.path, &options) {
        Ok(preview) => preview,
        Err(err) => {
            error!(code = err.code().name(), "{}", err);
            if err.is_retryable() {
                error!("retry with a larger --timeout-ms or --max-memory-mb");
            }
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = std::fs::write(&config.output, &preview.data) {
        error!("failed to write {}: {}", config.output.display(), err);
        return ExitCode::FAILURE;
    }

    info!(
        format = %preview.format,
        kind = %preview.kind,
        width = preview.width,
        height = preview.height,
        bytes = preview.byte_size(),
        orientation = preview.orientation,
        "wrote {}",
        config.output.display()
    );
    if let Some(metadata) = &preview.metadata {
        info!(
            make = metadata.make.as_deref().unwrap_or("-"),
            model = metadata.model.as_deref().unwrap_or("-"),
            "camera"
        );
    }

    ExitCode::SUCCESS
}

// =============================================================================
// List Command
// =============================================================================

fn run_list(extractor: &RawExtractor, path: &std::path::Path, json: bool) -> ExitCode {
    let previews = match extractor.extract_all_previews(path) {
        Ok(previews) => previews,
        Err(err) => {
            error!(code = err.code().name(), "{}", err);
            return ExitCode::FAILURE;
        }
    };

    if json {
        let entries: Vec<serde_json::Value> = previews
            .iter()
            .map(|p| {
                serde_json::json!({
                    "format": p.format.name(),
                    "kind": p.kind,
                    "width": p.width,
                    "height": p.height,
                    "quality": p.quality.name(),
                    "orientation": p.orientation,
                    "bytes": p.byte_size(),
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "previews": entries })).unwrap()
        );
        return ExitCode::SUCCESS;
    }

    if previews.is_empty() {
        println!("no previews found");
        return ExitCode::FAILURE;
    }

    println!("{:<16} {:>10} {:>6} {:>6}  quality", "kind", "bytes", "w", "h");
    for p in &previews {
        println!(
            "{:<16} {:>10} {:>6} {:>6}  {}",
            p.kind,
            p.byte_size(),
            p.width,
            p.height,
            p.quality
        );
    }

    ExitCode::SUCCESS
}
