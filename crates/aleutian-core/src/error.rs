use thiserror::Error;

/// Error kinds surfaced across the execution core. Variants are tagged by
/// *kind*, not by call site — callers match on kind, not on message text.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Graph error: {0}")]
    Graph(String),

    #[error("Symbol index is not available")]
    SymbolIndexUnavailable,

    #[error("Symbol not found: {surface_name}")]
    SymbolNotFound {
        surface_name: String,
        /// Up to three "did you mean?" suggestions, derived from the fuzzy pool.
        suggestions: Vec<String>,
    },

    #[error("Parameter validation failed: {0}")]
    Validation(String),

    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Dependency not available: {0}")]
    NotAvailable(String),

    #[error("Tool execution error: {0}")]
    ToolExecution(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
