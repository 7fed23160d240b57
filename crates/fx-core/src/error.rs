//! Engine errors.
//!
//! Everything here is cloneable so a single failure can ride on the
//! request config, the `error` event payload, and the caller's
//! outcome at the same time.

use fx_dom::DomError;
use fx_net::FetchError;

/// Errors surfaced through the `error` lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FxError {
    /// Swap token neither positional, dotted, nor a property the
    /// target has.
    #[error("invalid swap strategy: {0}")]
    InvalidSwap(String),

    /// Named mechanism missing from the registry.
    #[error("unknown swap mechanism: {0}")]
    UnknownMechanism(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Dom(#[from] DomError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_swap_names_token() {
        let err = FxError::InvalidSwap("doesNotExist".into());
        assert_eq!(err.to_string(), "invalid swap strategy: doesNotExist");
    }

    #[test]
    fn test_transparent_sources() {
        let err: FxError = FetchError::Network("refused".into()).into();
        assert_eq!(err.to_string(), "network error: refused");
        let err: FxError = DomError::DetachedTarget.into();
        assert_eq!(err.to_string(), "target has no parent");
    }
}
