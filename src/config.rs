//! CLI definition for the `rawpreview` binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::extract::QualityTier;
use crate::options::{
    ExtractionOptions, DEFAULT_TARGET_MAX_SIZE, DEFAULT_TARGET_MIN_SIZE,
};

/// rawpreview - extract embedded JPEG previews from camera RAW files.
#[derive(Parser, Debug)]
#[command(name = "rawpreview")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect the RAW format of a file.
    Detect {
        /// RAW file to inspect
        path: PathBuf,
    },

    /// Extract the best embedded preview to a JPEG file.
    Extract(ExtractConfig),

    /// List every embedded preview candidate of a file.
    List {
        /// RAW file to inspect
        path: PathBuf,

        /// Emit machine-readable JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

/// Options of the `extract` command, mirroring [`ExtractionOptions`].
#[derive(Args, Debug)]
pub struct ExtractConfig {
    /// RAW file to extract from
    pub path: PathBuf,

    /// Output JPEG path.
    #[arg(short, long, default_value = "preview.jpg")]
    pub output: PathBuf,

    /// Lower bound of the preferred preview size in bytes.
    #[arg(long, default_value_t = DEFAULT_TARGET_MIN_SIZE, env = "RAWPREVIEW_MIN_SIZE")]
    pub min_size: u64,

    /// Upper bound of the preferred preview size in bytes.
    #[arg(long, default_value_t = DEFAULT_TARGET_MAX_SIZE, env = "RAWPREVIEW_MAX_SIZE")]
    pub max_size: u64,

    /// Preferred quality tier: thumbnail, preview, or full.
    #[arg(long, default_value = "preview")]
    pub quality: QualityTier,

    /// Wall-clock budget in milliseconds.
    #[arg(long, default_value_t = 5000, env = "RAWPREVIEW_TIMEOUT_MS")]
    pub timeout_ms: u64,

    /// Memory ceiling in megabytes.
    #[arg(long, default_value_t = 100, env = "RAWPREVIEW_MAX_MEMORY_MB")]
    pub max_memory_mb: u64,

    /// Only check the JPEG boundary markers instead of walking the full
    /// marker chain.
    #[arg(long)]
    pub relaxed: bool,

    /// Also capture camera make/model.
    #[arg(long)]
    pub metadata: bool,
}

impl ExtractConfig {
    /// Map the CLI flags onto library options.
    pub fn to_options(&self) -> ExtractionOptions {
        ExtractionOptions {
            target_min_size: self.min_size,
            target_max_size: self.max_size,
            prefer_quality: self.quality,
            cache: false,
            timeout: Duration::from_millis(self.timeout_ms),
            max_memory: self.max_memory_mb * 1024 * 1024,
            include_metadata: self.metadata,
            strict_validation: !self.relaxed,
        }
    }
}
