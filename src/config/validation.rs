//! Startup validation of [`Settings`].
//!
//! Returns every problem found, not just the first. A settings value that
//! fails validation must never reach the listener.

use thiserror::Error;

use crate::config::schema::Settings;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("source file path (linuxpath) not found in configuration")]
    MissingSourcePath,

    #[error("TLS is enabled, but the certificate or key file is missing (cert: {cert}, key: {key})")]
    MissingTlsMaterial { cert: bool, key: bool },
}

pub fn validate_settings(settings: &Settings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.source_path.is_none() {
        errors.push(ValidationError::MissingSourcePath);
    }

    if settings.tls_enabled && (settings.cert_path.is_none() || settings.key_path.is_none()) {
        errors.push(ValidationError::MissingTlsMaterial {
            cert: settings.cert_path.is_some(),
            key: settings.key_path.is_some(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
