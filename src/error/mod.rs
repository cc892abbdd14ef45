//! Error handling for the load tester

use thiserror::Error;

/// Error taxonomy for a load test run
///
/// Only configuration, I/O and aggregation failures abort a run. Request and
/// timeout errors are folded into the metrics as failed samples and only
/// surface here when a caller asks for a single request outside of a run.
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid virtual users, duration, threshold syntax or scenario file
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed numbers, durations or JSON
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Network failure on a single request
    #[error("Request error: {0}")]
    Request(String),

    /// A single request exceeded its timeout
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// File operations (scenario file, summary export)
    #[error("I/O error: {0}")]
    Io(String),

    /// Metrics collector fault; results can no longer be trusted
    #[error("Aggregation error: {0}")]
    Aggregation(String),

    /// A threshold referenced a metric without any observations
    #[error("Threshold indeterminate: {0}")]
    ThresholdIndeterminate(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new request error
    pub fn request<S: Into<String>>(message: S) -> Self {
        Self::Request(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new aggregation error
    pub fn aggregation<S: Into<String>>(message: S) -> Self {
        Self::Aggregation(message.into())
    }

    /// Create a new indeterminate-threshold error
    pub fn threshold_indeterminate<S: Into<String>>(message: S) -> Self {
        Self::ThresholdIndeterminate(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Parse(_) => "PARSE",
            Self::Request(_) => "REQUEST",
            Self::Timeout(_) => "TIMEOUT",
            Self::Io(_) => "IO",
            Self::Aggregation(_) => "AGGREGATION",
            Self::ThresholdIndeterminate(_) => "THRESHOLD",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Whether the error is contained within a run instead of aborting it
    pub fn is_contained(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Timeout(_) | Self::ThresholdIndeterminate(_))
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check the scenario file, .env file or command line arguments.", msg)
            }
            Self::Parse(msg) => {
                format!("Failed to parse input: {}\n\nSuggestion: Durations look like '30s', '1m30s' or '500ms'; thresholds like 'p(95)<500' or 'rate<0.01'.", msg)
            }
            Self::Request(msg) => {
                format!("Request failed: {}\n\nSuggestion: Make sure the target is reachable from this machine.", msg)
            }
            Self::Timeout(msg) => {
                format!("Request timed out: {}\n\nSuggestion: Increase the request timeout with --timeout.", msg)
            }
            Self::Io(msg) => {
                format!("File operation failed: {}\n\nSuggestion: Check the file path and permissions.", msg)
            }
            Self::Aggregation(msg) => {
                format!("Metrics aggregation failed: {}\n\nThe collected metrics cannot be trusted; the run was aborted.", msg)
            }
            Self::ThresholdIndeterminate(msg) => {
                format!("Threshold could not be evaluated: {}\n\nSuggestion: The metric had no observations. Check that the target answered at least once.", msg)
            }
            Self::Internal(msg) => {
                format!("Internal error: {}\n\nThis is likely a bug. Please report this issue with the error details.", msg)
            }
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Parse(_) => 1,
            Self::Request(_) => 2,
            Self::Timeout(_) => 3,
            Self::Io(_) => 5,
            Self::Aggregation(_) => 6,
            Self::Internal(_) => 70,
            Self::ThresholdIndeterminate(_) => crate::defaults::THRESHOLDS_FAILED_EXIT_CODE,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Request(_) | Self::Timeout(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Io(_) | Self::ThresholdIndeterminate(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Aggregation(_) | Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<std::fmt::Error> for AppError {
    fn from(error: std::fmt::Error) -> Self {
        Self::internal(format!("Failed to format output: {}", error))
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(error.to_string())
        } else {
            Self::request(error.to_string())
        }
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::num::ParseFloatError> for AppError {
    fn from(error: std::num::ParseFloatError) -> Self {
        Self::parse(format!("Float parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for AppError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(error.to_string())
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error context trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error, keeping its category
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error
    fn context(self, message: &'static str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let context = f();
            match e.into() {
                AppError::Config(msg) => AppError::Config(format!("{}: {}", context, msg)),
                AppError::Parse(msg) => AppError::Parse(format!("{}: {}", context, msg)),
                AppError::Request(msg) => AppError::Request(format!("{}: {}", context, msg)),
                AppError::Timeout(msg) => AppError::Timeout(format!("{}: {}", context, msg)),
                AppError::Io(msg) => AppError::Io(format!("{}: {}", context, msg)),
                AppError::Aggregation(msg) => AppError::Aggregation(format!("{}: {}", context, msg)),
                AppError::ThresholdIndeterminate(msg) => {
                    AppError::ThresholdIndeterminate(format!("{}: {}", context, msg))
                }
                AppError::Internal(msg) => AppError::Internal(format!("{}: {}", context, msg)),
            }
        })
    }

    fn context(self, message: &'static str) -> Result<T> {
        self.with_context(|| message.to_string())
    }
}

/// Error reporter for user feedback on fatal errors
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", error.format_for_console(self.use_color));

        if self.verbose {
            eprintln!();
            eprintln!("{}", error.user_friendly_message());
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}
