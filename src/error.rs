use thiserror::Error;

use crate::config::ConfigError;
use crate::enrich::ProviderError;
use crate::parse::ParseError;
use crate::store::StoreError;
use crate::types::RuleError;

/// Unified error type covering rule validity, the store, the enrichment
/// provider, parsing, configuration and I/O.
///
/// Every variant is transparent: callers see and can match the original
/// error unchanged.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_error_is_transparent() {
        let err: EngineError = RuleError::UnsupportedActionType {
            key: "delete".into(),
        }
        .into();
        assert_eq!(err.to_string(), "unsupported action type 'delete'");
    }

    #[test]
    fn store_error_keeps_original() {
        let err: EngineError = StoreError::new("connection reset").into();
        match err {
            EngineError::Store(inner) => assert_eq!(inner.to_string(), "connection reset"),
            other => panic!("expected Store, got {other:?}"),
        }
    }
}
