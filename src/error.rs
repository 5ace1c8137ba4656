use thiserror::Error;

/// I/O errors from the byte-range readers.
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// File does not exist at the given path
    #[error("file not found: {0}")]
    NotFound(String),

    /// File exists but cannot be read
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Requested range exceeds resource bounds
    #[error("range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },

    /// Mapping or other OS-level read failure
    #[error("read failed: {0}")]
    Read(String),
}

/// Errors from parsing the TIFF-derived directory structure.
#[derive(Debug, Clone, Error)]
pub enum TiffError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Invalid byte-order marker (not II or MM)
    #[error("invalid byte-order marker: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidByteOrder(u16),

    /// Header version word is not one of the recognized magics
    #[error("unrecognized header magic: {0}")]
    UnrecognizedMagic(u16),

    /// File is too small to contain a valid header
    #[error("file too small: need at least {required} bytes, got {actual}")]
    FileTooSmall { required: u64, actual: u64 },

    /// Directory offset points outside the file
    #[error("invalid directory offset: {0}")]
    InvalidIfdOffset(u64),

    /// Entry value has a field type we cannot size
    #[error("unknown field type: {0}")]
    UnknownFieldType(u16),

    /// Entry value has the wrong type or count for the requested read
    #[error("invalid value for tag 0x{tag:04X}: {message}")]
    InvalidTagValue { tag: u16, message: String },

    /// Budget exhausted mid-parse; must unwind immediately
    #[error(transparent)]
    Budget(#[from] BudgetError),
}

/// Resource-governor aborts. Both variants are retryable with larger budgets.
#[derive(Debug, Clone, Copy, Error)]
pub enum BudgetError {
    /// Wall-clock budget exhausted
    #[error("operation timed out after {elapsed_ms}ms (budget {budget_ms}ms)")]
    TimeoutExceeded { elapsed_ms: u64, budget_ms: u64 },

    /// Cumulative allocation budget exhausted
    #[error("memory ceiling exceeded: {allocated} bytes allocated, ceiling {ceiling} bytes")]
    MemoryLimitExceeded { allocated: u64, ceiling: u64 },
}

// =============================================================================
// Public extraction error
// =============================================================================

/// Closed error taxonomy mirrored across the public boundary.
///
/// Every [`ExtractError`] maps onto exactly one non-`Success` code; callers
/// that only need coarse classification can match on this instead of the
/// full error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Success,
    FileNotFound,
    FileAccessDenied,
    InvalidFormat,
    CorruptedFile,
    TimeoutExceeded,
    MemoryLimitExceeded,
    NoPreviewsFound,
    ValidationFailed,
    UnknownError,
}

impl ErrorCode {
    /// Stable string name, matching the external contract.
    pub const fn name(self) -> &'static str {
        match self {
            ErrorCode::Success => "SUCCESS",
            ErrorCode::FileNotFound => "FILE_NOT_FOUND",
            ErrorCode::FileAccessDenied => "FILE_ACCESS_DENIED",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::CorruptedFile => "CORRUPTED_FILE",
            ErrorCode::TimeoutExceeded => "TIMEOUT_EXCEEDED",
            ErrorCode::MemoryLimitExceeded => "MEMORY_LIMIT_EXCEEDED",
            ErrorCode::NoPreviewsFound => "NO_PREVIEWS_FOUND",
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

/// Failure of a public extraction operation.
///
/// Carries a human-readable message and, where available, context such as
/// the offending path, offset, or exhausted budget. Use [`ExtractError::code`]
/// for the closed taxonomy and [`ExtractError::is_retryable`] to decide
/// whether retrying with larger budgets can help.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// File does not exist
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// File exists but is not readable
    #[error("file access denied: {path}")]
    FileAccessDenied { path: String },

    /// Input is not a recognized RAW format
    #[error("unsupported or unrecognized RAW format: {reason}")]
    InvalidFormat { reason: String },

    /// Input claims a recognized format but its structure is broken
    #[error("corrupted file: {reason}")]
    CorruptedFile { reason: String },

    /// Wall-clock budget exhausted; retryable with a larger timeout
    #[error("operation timed out after {elapsed_ms}ms (budget {budget_ms}ms)")]
    TimeoutExceeded { elapsed_ms: u64, budget_ms: u64 },

    /// Memory ceiling exceeded; retryable with a larger ceiling
    #[error("memory ceiling exceeded: {allocated} of {ceiling} bytes")]
    MemoryLimitExceeded { allocated: u64, ceiling: u64 },

    /// No embedded previews were discovered
    #[error("no previews found")]
    NoPreviewsFound,

    /// Every viable candidate failed JPEG validation
    #[error("preview validation failed: {context}")]
    ValidationFailed { context: String },

    /// Anything that does not fit the taxonomy above
    #[error("unknown error: {reason}")]
    Unknown { reason: String },
}

impl ExtractError {
    /// The closed taxonomy code for this error.
    pub const fn code(&self) -> ErrorCode {
        match self {
            ExtractError::FileNotFound { .. } => ErrorCode::FileNotFound,
            ExtractError::FileAccessDenied { .. } => ErrorCode::FileAccessDenied,
            ExtractError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            ExtractError::CorruptedFile { .. } => ErrorCode::CorruptedFile,
            ExtractError::TimeoutExceeded { .. } => ErrorCode::TimeoutExceeded,
            ExtractError::MemoryLimitExceeded { .. } => ErrorCode::MemoryLimitExceeded,
            ExtractError::NoPreviewsFound => ErrorCode::NoPreviewsFound,
            ExtractError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            ExtractError::Unknown { .. } => ErrorCode::UnknownError,
        }
    }

    /// True when retrying the same input with larger budgets can succeed.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExtractError::TimeoutExceeded { .. } | ExtractError::MemoryLimitExceeded { .. }
        )
    }
}

impl From<BudgetError> for ExtractError {
    fn from(err: BudgetError) -> Self {
        match err {
            BudgetError::TimeoutExceeded {
                elapsed_ms,
                budget_ms,
            } => ExtractError::TimeoutExceeded {
                elapsed_ms,
                budget_ms,
            },
            BudgetError::MemoryLimitExceeded { allocated, ceiling } => {
                ExtractError::MemoryLimitExceeded { allocated, ceiling }
            }
        }
    }
}

impl From<IoError> for ExtractError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::NotFound(path) => ExtractError::FileNotFound { path },
            IoError::AccessDenied(path) => ExtractError::FileAccessDenied { path },
            IoError::RangeOutOfBounds { .. } | IoError::Read(_) => ExtractError::CorruptedFile {
                reason: err.to_string(),
            },
        }
    }
}

impl From<TiffError> for ExtractError {
    fn from(err: TiffError) -> Self {
        match err {
            TiffError::Budget(b) => b.into(),
            TiffError::Io(io) => io.into(),
            other => ExtractError::CorruptedFile {
                reason: other.to_string(),
            },
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
