//! Errors raised while persisting the movement config.

/// Failure of [`Config::load_or_create`](crate::Config::load_or_create),
/// [`Config::save`](crate::Config::save) or [`Config::reload`](crate::Config::reload).
///
/// The movement core itself never fails; only config I/O does.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `config.ron` exists but could not be read.
    #[error("cannot read drift config: {0}")]
    ReadError(#[source] std::io::Error),

    /// The config directory or `config.ron` could not be written.
    #[error("cannot write drift config: {0}")]
    WriteError(#[source] std::io::Error),

    /// `config.ron` is not valid RON for [`Config`](crate::Config).
    #[error("invalid drift config: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    /// The in-memory config could not be rendered as RON.
    #[error("cannot serialize drift config: {0}")]
    SerializeError(#[source] ron::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_parse_error_names_config_and_keeps_source() {
        let parse = ron::from_str::<crate::Config>("(movement: (step_size: \"high\"))").unwrap_err();
        let err = ConfigError::ParseError(parse);

        assert!(err.to_string().starts_with("invalid drift config"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_io_errors_distinguish_read_and_write() {
        let read = ConfigError::ReadError(std::io::Error::other("denied"));
        let write = ConfigError::WriteError(std::io::Error::other("denied"));

        assert_eq!(read.to_string(), "cannot read drift config: denied");
        assert_eq!(write.to_string(), "cannot write drift config: denied");
    }
}
