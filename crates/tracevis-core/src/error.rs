use thiserror::Error;

use crate::boxes::BoxId;
use crate::config::ConfigError;
use crate::engine::EngineError;

pub type Result<T> = std::result::Result<T, VisError>;

#[derive(Debug, Error)]
pub enum VisError {
    /// Anything the engine reports other than a plain match failure.
    #[error("parsing engine failed: {0}")]
    Engine(#[source] EngineError),

    #[error("box {0} belongs to a previous tree")]
    StaleBox(BoxId),

    #[error("no box with id {0}")]
    UnknownBox(BoxId),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::VisError;
    use crate::engine::EngineError;

    #[test]
    fn engine_error_keeps_source() {
        let error = VisError::Engine(EngineError::Other("grammar has no rule Expr".into()));
        assert_eq!(
            error.to_string(),
            "parsing engine failed: engine error: grammar has no rule Expr"
        );
        assert!(std::error::Error::source(&error).is_some());
    }
}
