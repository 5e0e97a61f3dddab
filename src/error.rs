//! Error handling for the outer surfaces of the particle kernel.
//!
//! The simulation itself never fails: empty emissions, renders before the
//! first spawn and capacity overflow are logged no-ops. Errors only come from
//! loading and assembling effects.

use std::path::PathBuf;

/// Errors raised while configuring or assembling an effect
#[derive(Debug, thiserror::Error)]
pub enum ParticleError {
    #[error("Invalid config field '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Failed to read config file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Updater '{updater}' requires {requires} to be produced by an earlier updater")]
    PipelineOrder {
        updater: &'static str,
        requires: &'static str,
    },
}

/// Result alias used by config loading and pipeline assembly
pub type ParticleResult<T> = Result<T, ParticleError>;

/// Create an invalid config error
pub fn invalid_config(field: &str, reason: impl std::fmt::Display) -> ParticleError {
    ParticleError::InvalidConfig {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = invalid_config("capacity", "must be at least 2");
        assert_eq!(
            err.to_string(),
            "Invalid config field 'capacity': must be at least 2"
        );

        let err = ParticleError::PipelineOrder {
            updater: "color",
            requires: "interpolation",
        };
        assert!(err.to_string().contains("'color'"));
        assert!(err.to_string().contains("interpolation"));
    }
}
