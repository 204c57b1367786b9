use thiserror::Error;

#[derive(Error, Debug)]
pub enum DigestError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Title store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Catalog lookup failed: {message}")]
    CatalogError { message: String },

    #[error("Notification delivery failed: {message}")]
    NotificationError { message: String },
}

pub type Result<T> = std::result::Result<T, DigestError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Storage,
    Configuration,
    Processing,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DigestError {
    pub fn processing(message: impl Into<String>) -> Self {
        Self::ProcessingError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Http(_) | Self::CatalogError { .. } | Self::NotificationError { .. } => {
                ErrorCategory::Network
            }
            Self::Store(_) => ErrorCategory::Storage,
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::ProcessingError { .. } => ErrorCategory::Processing,
            Self::Io(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::CatalogError { .. } | Self::NotificationError { .. } => ErrorSeverity::Low,
            Self::Http(_) => ErrorSeverity::Medium,
            Self::ProcessingError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorSeverity::High,
            // the classifier cannot run without its registry
            Self::Store(_) | Self::Io(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check network connectivity and whether the site is reachable",
            ErrorCategory::Storage => {
                "Check that the title database path is writable and not locked by another run"
            }
            ErrorCategory::Configuration => "Fix the configuration file or command line flags",
            ErrorCategory::Processing => "The source data changed shape; inspect it with --verbose",
            ErrorCategory::System => "Check disk space and file permissions, then run again",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Store(_) => format!("Could not read or update the title registry: {}", self),
            Self::ConfigValidationError { field, message } => {
                format!("Setting '{}' is invalid: {}", field, message)
            }
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            Self::MissingConfigError { field } => format!("Setting '{}' is required", field),
            other => other.to_string(),
        }
    }
}
