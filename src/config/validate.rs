//! Configuration validation.

use crate::config::{Config, PipelineSettings, XenoCantoConfig};
use crate::error::{Error, Result};

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_pipeline(&config.pipeline)?;
    validate_xenocanto(&config.xenocanto)?;
    Ok(())
}

/// Validate pipeline settings.
pub fn validate_pipeline(settings: &PipelineSettings) -> Result<()> {
    if settings.output_sample_rate == 0 {
        return Err(invalid("output_sample_rate must be greater than 0".to_string()));
    }

    if !(settings.min_duration_secs > 0.0 && settings.min_duration_secs.is_finite()) {
        return Err(invalid(format!(
            "min_duration_secs must be positive, got {}",
            settings.min_duration_secs
        )));
    }

    if !(settings.max_duration_secs >= settings.min_duration_secs
        && settings.max_duration_secs.is_finite())
    {
        return Err(invalid(format!(
            "max_duration_secs must be at least min_duration_secs ({}), got {}",
            settings.min_duration_secs, settings.max_duration_secs
        )));
    }

    if !(settings.min_duration_secs..=settings.max_duration_secs)
        .contains(&settings.segment_window_secs)
    {
        return Err(invalid(format!(
            "segment_window_secs must be between {} and {}, got {}",
            settings.min_duration_secs, settings.max_duration_secs, settings.segment_window_secs
        )));
    }

    if !settings.target_lufs.is_finite() || settings.target_lufs > 0.0 {
        return Err(invalid(format!(
            "target_lufs must be a finite value at or below 0, got {}",
            settings.target_lufs
        )));
    }

    if settings.max_segments == 0 {
        return Err(invalid("max_segments must be at least 1".to_string()));
    }

    for (name, value) in [
        ("single_step_secs", settings.single_step_secs),
        ("multi_step_secs", settings.multi_step_secs),
    ] {
        if !(value > 0.0 && value.is_finite()) {
            return Err(invalid(format!("{name} must be positive, got {value}")));
        }
    }

    Ok(())
}

/// Validate Xeno-canto settings.
fn validate_xenocanto(config: &XenoCantoConfig) -> Result<()> {
    if config.timeout_secs == 0 {
        return Err(invalid("timeout_secs must be at least 1".to_string()));
    }

    if config.min_length_secs > config.max_length_secs {
        return Err(invalid(format!(
            "min_length_secs ({}) must not exceed max_length_secs ({})",
            config.min_length_secs, config.max_length_secs
        )));
    }

    if config.max_per_species == 0 {
        return Err(invalid("max_per_species must be at least 1".to_string()));
    }

    if config.user_agent.trim().is_empty() {
        return Err(invalid("user_agent must not be empty".to_string()));
    }

    Ok(())
}

fn invalid(message: String) -> Error {
    Error::ConfigValidation { message }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_inverted_duration_bounds_rejected() {
        let mut config = Config::default();
        config.pipeline.min_duration_secs = 3.0;
        config.pipeline.max_duration_secs = 1.0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("max_duration_secs"));
    }

    #[test]
    fn test_window_outside_bounds_rejected() {
        let mut config = Config::default();
        config.pipeline.segment_window_secs = 4.0;
        let err = validate_config(&config).unwrap_err();
        assert!(
            err.to_string()
                .contains("segment_window_secs must be between 0.5 and 3, got 4")
        );
    }

    #[test]
    fn test_zero_step_rejected() {
        let mut config = Config::default();
        config.pipeline.multi_step_secs = 0.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_positive_lufs_rejected() {
        let mut config = Config::default();
        config.pipeline.target_lufs = 3.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_inverted_length_filter_rejected() {
        let mut config = Config::default();
        config.xenocanto.min_length_secs = 100;
        assert!(validate_config(&config).is_err());
    }
}
