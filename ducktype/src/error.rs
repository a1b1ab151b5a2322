// Error handling for adapter synthesis and adapter invocation

pub type DuckResult<T> = Result<T, DuckError>;

/// Errors raised while synthesising or invoking adapters.
///
/// Structural incompatibility is deliberately absent: it is only ever reported
/// as `false` from `is_compatible`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DuckError {
    /// A stand-in member of a partially compatible adapter was called.
    #[error("'{member}' is not implemented by '{adapter_type}'")]
    UnsatisfiedMemberInvoked {
        adapter_type: String,
        member: String,
    },

    /// The base type has no parameterless constructor; no adapter type was produced.
    #[error("type '{type_name}' has no parameterless constructor")]
    MissingDefaultConstructor { type_name: String },

    #[error("no member '{member}' on '{type_name}'")]
    MemberNotFound { type_name: String, member: String },

    #[error("property '{property}' has no {accessor} accessor")]
    AccessorMissing {
        property: String,
        accessor: &'static str,
    },

    #[error("'{member}' expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        member: String,
        expected: usize,
        actual: usize,
    },

    #[error("'{member}' expects {expected} type argument(s), got {actual}")]
    GenericArityMismatch {
        member: String,
        expected: usize,
        actual: usize,
    },

    #[error("argument {index} of '{member}': expected {expected}, got {actual}")]
    ArgumentTypeMismatch {
        member: String,
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("'{member}' returned {actual}, declared {expected}")]
    ReturnTypeMismatch {
        member: String,
        expected: String,
        actual: String,
    },

    #[error("adapter type for '{expected}' cannot wrap an instance of '{actual}'")]
    TargetTypeMismatch { expected: String, actual: String },

    #[error("'{adapter_type}' does not implement '{interface}'")]
    InterfaceNotImplemented {
        adapter_type: String,
        interface: String,
    },

    #[error("there must be at least one capability interface")]
    NoCapabilities,

    #[error("type '{type_name}' has no field '{field}'")]
    UnknownField { type_name: String, field: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DuckError {
    pub(crate) fn poisoned(e: impl std::fmt::Display) -> Self {
        DuckError::Internal(format!("RwLock poisoned: {}", e))
    }
}
