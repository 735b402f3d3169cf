use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}: {body}")]
    HttpStatusError {
        status: u16,
        url: String,
        body: String,
    },

    #[error("GraphQL query {operation} failed: {message}")]
    GraphQlError { operation: String, message: String },

    #[error("Pagination loop detected: {url} was already fetched")]
    PaginationLoopError { url: String },

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Upstream,
    Configuration,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) => ErrorCategory::Network,
            EtlError::HttpStatusError { .. }
            | EtlError::GraphQlError { .. }
            | EtlError::PaginationLoopError { .. } => ErrorCategory::Upstream,
            EtlError::UrlError(_)
            | EtlError::ConfigValidationError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            EtlError::SerializationError(_) => ErrorCategory::Data,
            EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::ApiError(e) if e.is_timeout() || e.is_connect() => ErrorSeverity::Medium,
            EtlError::HttpStatusError { status, .. } if *status == 429 || *status >= 500 => {
                ErrorSeverity::Medium
            }
            EtlError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// HTTP 狀態碼（僅限上游錯誤）
    pub fn status(&self) -> Option<u16> {
        match self {
            EtlError::HttpStatusError { status, .. } => Some(*status),
            EtlError::ApiError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::ApiError(_) => {
                "Check network connectivity and that the site URL is reachable".to_string()
            }
            EtlError::HttpStatusError { status: 401, .. } => {
                "Check the username and API token (or admin token for user-usage)".to_string()
            }
            EtlError::HttpStatusError { status: 403, .. } => {
                "The account lacks permission for this endpoint; use a site/org admin account"
                    .to_string()
            }
            EtlError::HttpStatusError { status: 429, .. } => {
                "Rate limited by the API; wait a few minutes and re-run the job".to_string()
            }
            EtlError::HttpStatusError { status, .. } if *status >= 500 => {
                "The platform returned a server error; re-run the job later".to_string()
            }
            EtlError::HttpStatusError { .. } => {
                "Check the base URL and the identifiers passed to the job".to_string()
            }
            EtlError::GraphQlError { .. } => {
                "Check that the GraphQL endpoint (--graphql-url) belongs to the same site"
                    .to_string()
            }
            EtlError::PaginationLoopError { .. } => {
                "The API returned a cyclic next link; report the URL to the site admin".to_string()
            }
            EtlError::UrlError(_) => "Check the configured URLs".to_string(),
            EtlError::MissingConfigError { field } => {
                format!("Provide {} via flag, environment variable or config file", field)
            }
            EtlError::ConfigValidationError { .. } | EtlError::InvalidConfigValueError { .. } => {
                "Fix the configuration value and re-run".to_string()
            }
            EtlError::IoError(_) => {
                "Check that the output directory is writable and the disk is not full".to_string()
            }
            EtlError::SerializationError(_) => {
                "The API response had an unexpected shape; re-run with --verbose".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach the API: {}", self),
            ErrorCategory::Upstream => format!("The API rejected the request: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Data => format!("Could not process API data: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
