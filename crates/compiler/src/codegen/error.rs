//! Code generation error types.

/// Error type for C code generation.
///
/// Recoverable problems (unknown array lengths, uninferable field types)
/// are accumulated in the generator's error vector and surface as one
/// [`CodegenError::Aggregate`] when generation finishes. Hard errors
/// (unsupported ops, closures) short-circuit immediately.
#[derive(Debug)]
pub enum CodegenError {
    /// An unsupported construct; generation stops at once.
    Hard(String),
    /// Recoverable problems collected over a whole run.
    Aggregate(Vec<String>),
    /// A formatting error while writing C text.
    Format(std::fmt::Error),
}

impl std::fmt::Display for CodegenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodegenError::Hard(message) => write!(f, "{}", message),
            CodegenError::Aggregate(messages) => write!(f, "{}", messages.join("\n")),
            CodegenError::Format(e) => write!(f, "C generation error: {}", e),
        }
    }
}

impl std::error::Error for CodegenError {}

impl From<String> for CodegenError {
    fn from(message: String) -> Self {
        CodegenError::Hard(message)
    }
}

impl From<std::fmt::Error> for CodegenError {
    fn from(e: std::fmt::Error) -> Self {
        CodegenError::Format(e)
    }
}
