//! Domain error types.

/// Domain-level errors for validation of labels and values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// A classification label that none of the known vocabularies use
    #[error("unknown {kind} label: {value:?}")]
    UnknownLabel { kind: &'static str, value: String },
}
