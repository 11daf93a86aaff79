//! Error types for awsmap
//!
//! All modules use `AwsmapResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for awsmap operations
pub type AwsmapResult<T> = Result<T, AwsmapError>;

/// All errors that can occur in awsmap
#[derive(Error, Debug)]
pub enum AwsmapError {
    // Remote errors
    #[error("Access denied calling {operation}: {message}")]
    RemoteAccessDenied { operation: String, message: String },

    #[error("Remote call failed: {command}, stderr: {stderr}")]
    RemoteCall { command: String, stderr: String },

    #[error("AWS CLI not found. Install from https://aws.amazon.com/cli/")]
    AwsCliNotFound,

    #[error("Response from {operation} is missing field '{field}'")]
    MalformedResponse { operation: String, field: String },

    // Cache errors
    #[error("Corrupt cache entry at {path}: {source}")]
    CacheCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid cache key segment '{segment}': {reason}")]
    CacheKeyInvalid { segment: String, reason: String },

    // Input errors
    #[error("Malformed manifest {path}: {reason}")]
    MalformedManifest { path: PathBuf, reason: String },

    // Render errors
    #[error("Graphviz not found ({binary}). Install graphviz or use --format dot")]
    GraphvizNotFound { binary: String },

    #[error("Render failed: {command}, stderr: {stderr}")]
    RenderFailed { command: String, stderr: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    User(String),
}

impl AwsmapError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a remote call error
    pub fn remote_call(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::RemoteCall {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Create a malformed manifest error
    pub fn malformed_manifest(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedManifest {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error came from a credential or permission failure
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::RemoteAccessDenied { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::RemoteAccessDenied { .. } => {
                Some("Verify credentials: aws sts get-caller-identity --profile <profile>")
            }
            Self::AwsCliNotFound => Some("Install the AWS CLI v2 and run: aws configure"),
            Self::GraphvizNotFound { .. } => {
                Some("Install graphviz (brew install graphviz / apt install graphviz)")
            }
            Self::CacheCorrupt { .. } => Some("Run: awsmap clear-cache"),
            Self::MalformedManifest { .. } => {
                Some("Check the file with: docker compose config")
            }
            _ => None,
        }
    }
}
