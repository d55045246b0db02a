use dsreg_ledger::LedgerError;

/// Errors produced while dispatching an invocation.
#[derive(Debug, thiserror::Error)]
pub enum ChaincodeError {
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("{function}: expected {expected} arguments, got {actual}")]
    ArgumentCount {
        function: &'static str,
        expected: String,
        actual: usize,
    },

    #[error("{function}: malformed {argument} JSON: {source}")]
    Json {
        function: &'static str,
        argument: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{function}: failed to encode result: {source}")]
    Encode {
        function: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub type ChaincodeResult<T> = Result<T, ChaincodeError>;
