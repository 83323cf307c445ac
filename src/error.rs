//! Errors - one closed enum per component, classified for the session's error slot.

use thiserror::Error;

/// Wallet engine failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Wallet engine unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Wallet engine error: {0}")]
    Unknown(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Fee and price oracle failures. Both oracles share this shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid server response: {0}")]
    InvalidServerResponse(String),

    #[error("Could not decode response: {0}")]
    Serialization(String),
}

pub type FeeError = OracleError;
pub type PriceError = OracleError;

/// Credential vault failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("No value stored for {0}")]
    NotFound(&'static str),

    #[error("Vault write failed: {0}")]
    WriteFailed(String),

    #[error("Vault read failed: {0}")]
    ReadFailed(String),
}

pub type VaultResult<T> = Result<T, VaultError>;

/// App settings persistence failures.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Send pipeline failures. The pipeline stays retryable after any of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SendError {
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("{operation} requires the {required} stage (pipeline is at {current})")]
    StageSkipped { operation: &'static str, required: &'static str, current: &'static str },

    #[error("Fee oracle unavailable: {0}")]
    FeeOracleUnavailable(OracleError),

    #[error("Invalid fee rate: {0}")]
    InvalidFeeRate(f32),

    #[error("No fee tier at index {0}")]
    UnknownFeeTier(usize),

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Amount plus fee overflows")]
    AmountOverflow,

    #[error("Quote is stale, rebuild before sending")]
    StaleQuote,

    #[error(transparent)]
    Engine(EngineError),
}

impl From<EngineError> for SendError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::InvalidAddress(m) => SendError::InvalidAddress(m),
            EngineError::InsufficientFunds(m) => SendError::InsufficientFunds(m),
            other => SendError::Engine(other),
        }
    }
}

/// Onboarding failures.
#[derive(Error, Debug)]
pub enum OnboardingError {
    #[error("Invalid backend URL")]
    InvalidUrl,

    #[error("Error creating wallet: {0}")]
    WalletCreationFailed(String),

    #[error("Error deleting wallet: {0}")]
    WalletDeletionFailed(String),

    #[error("A wallet is being created or deleted")]
    Busy,

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Coarse classification shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionErrorKind {
    EngineUnavailable,
    Serialization,
    Network,
    Unknown,
}

impl SessionErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionErrorKind::EngineUnavailable => "engine unavailable",
            SessionErrorKind::Serialization => "serialization",
            SessionErrorKind::Network => "network",
            SessionErrorKind::Unknown => "unknown",
        }
    }
}

/// A classified session failure: `context` names the operation, `message` the cause.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{context}: {message}")]
pub struct SessionError {
    pub kind: SessionErrorKind,
    pub context: &'static str,
    pub message: String,
}

impl SessionError {
    pub fn new(kind: SessionErrorKind, context: &'static str, message: impl Into<String>) -> Self {
        Self { kind, context, message: message.into() }
    }

    pub fn from_engine(context: &'static str, e: &EngineError) -> Self {
        let kind = match e {
            EngineError::Unavailable(_) => SessionErrorKind::EngineUnavailable,
            EngineError::Serialization(_) => SessionErrorKind::Serialization,
            EngineError::InvalidAddress(_) | EngineError::InsufficientFunds(_) | EngineError::Unknown(_) => {
                SessionErrorKind::Unknown
            }
        };
        Self::new(kind, context, e.to_string())
    }

    pub fn from_oracle(context: &'static str, e: &OracleError) -> Self {
        let kind = match e {
            OracleError::InvalidUrl(_) | OracleError::InvalidServerResponse(_) => SessionErrorKind::Network,
            OracleError::Serialization(_) => SessionErrorKind::Serialization,
        };
        Self::new(kind, context, e.to_string())
    }

    pub fn from_vault(context: &'static str, e: &VaultError) -> Self {
        let kind = match e {
            VaultError::ReadFailed(_) => SessionErrorKind::Serialization,
            VaultError::NotFound(_) | VaultError::WriteFailed(_) => SessionErrorKind::Unknown,
        };
        Self::new(kind, context, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_classify() {
        let e = SessionError::from_engine("Error getting balance", &EngineError::Unavailable("no wallet".into()));
        assert_eq!(e.kind, SessionErrorKind::EngineUnavailable);
        assert_eq!(e.to_string(), "Error getting balance: Wallet engine unavailable: no wallet");

        let e = SessionError::from_engine("x", &EngineError::InsufficientFunds("1 < 2".into()));
        assert_eq!(e.kind, SessionErrorKind::Unknown);
    }

    #[test]
    fn oracle_errors_classify() {
        let e = SessionError::from_oracle("Error getting prices", &OracleError::InvalidServerResponse("503".into()));
        assert_eq!(e.kind, SessionErrorKind::Network);
        let e = SessionError::from_oracle("Error getting prices", &OracleError::Serialization("eof".into()));
        assert_eq!(e.kind, SessionErrorKind::Serialization);
    }

    #[test]
    fn send_error_keeps_insufficient_funds_distinct() {
        let e: SendError = EngineError::InsufficientFunds("need 5000".into()).into();
        assert_eq!(e, SendError::InsufficientFunds("need 5000".into()));
        let e: SendError = EngineError::Unknown("boom".into()).into();
        assert!(matches!(e, SendError::Engine(EngineError::Unknown(_))));
    }
}
