//! Startup orchestration.
//!
//! Order: load settings → validate → load TLS material → build the index →
//! bind the listener. Any failure before the bind leaves nothing listening.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{load_settings, validate_settings, ServerOptions, Settings, ValidationError};
use crate::net::{load_tls_acceptor, Listener, ListenerError, TlsError};
use crate::server::LookupServer;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {}", describe(.0))]
    InvalidSettings(Vec<ValidationError>),

    #[error("cannot load TLS material: {0}")]
    Tls(#[from] TlsError),

    #[error(transparent)]
    Listener(#[from] ListenerError),
}

fn describe(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A server ready to run, with its bound listener.
pub struct Started {
    pub server: Arc<LookupServer>,
    pub listener: Listener,
}

/// Load `config_path` and prepare the server.
pub async fn start(config_path: &Path, options: ServerOptions) -> Result<Started, StartupError> {
    let settings = load_settings(config_path);
    start_with_settings(settings, Some(config_path), options).await
}

/// Prepare the server from already-loaded settings.
///
/// `config_path`, when given, is what a later reload re-reads.
pub async fn start_with_settings(
    settings: Settings,
    config_path: Option<&Path>,
    options: ServerOptions,
) -> Result<Started, StartupError> {
    match &settings.source_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Path found in config");
            tracing::info!(reread_on_query = settings.reread_on_query, "REREAD_ON_QUERY set");
        }
        None => tracing::error!("Path not found in config, server will not start"),
    }

    if let Err(errors) = validate_settings(&settings) {
        for error in &errors {
            tracing::error!(%error, "Invalid configuration");
        }
        return Err(StartupError::InvalidSettings(errors));
    }

    let tls = match settings.tls() {
        Some(tls_config) => Some(load_tls_acceptor(&tls_config)?),
        None => None,
    };

    let bind_options = options.clone();
    let mut server = LookupServer::new(settings, options);
    if let Some(acceptor) = tls {
        server = server.with_tls(acceptor);
    }
    if let Some(path) = config_path {
        server = server.with_config_path(path);
    }

    let listener = Listener::bind(&bind_options).await?;
    Ok(Started {
        server: Arc::new(server),
        listener,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::LookupMode;
    use std::io::Write;

    fn local_options() -> ServerOptions {
        ServerOptions {
            bind_address: "127.0.0.1:0".to_string(),
            ..ServerOptions::default()
        }
    }

    #[tokio::test]
    async fn refuses_to_start_without_source_path() {
        let err = start_with_settings(Settings::default(), None, local_options())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StartupError::InvalidSettings(ref e) if e == &[ValidationError::MissingSourcePath]));
    }

    #[tokio::test]
    async fn refuses_tls_without_certificates() {
        let settings = Settings {
            source_path: Some("valid_file.txt".into()),
            reread_on_query: true,
            tls_enabled: true,
            ..Settings::default()
        };
        let err = start_with_settings(settings, None, local_options()).await.err().unwrap();
        assert!(matches!(err, StartupError::InvalidSettings(_)));
    }

    #[tokio::test]
    async fn refuses_unreadable_tls_material() {
        let settings = Settings {
            source_path: Some("valid_file.txt".into()),
            reread_on_query: true,
            tls_enabled: true,
            cert_path: Some("/nonexistent/cert.pem".into()),
            key_path: Some("/nonexistent/key.pem".into()),
        };
        let err = start_with_settings(settings, None, local_options()).await.err().unwrap();
        assert!(matches!(err, StartupError::Tls(_)));
    }

    #[tokio::test]
    async fn missing_config_file_aborts_startup() {
        let err = start(Path::new("/nonexistent/server_config.cfg"), local_options())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StartupError::InvalidSettings(_)));
    }

    #[tokio::test]
    async fn starts_from_config_file() {
        let mut lines = tempfile::NamedTempFile::new().unwrap();
        writeln!(lines, "line1").unwrap();
        let mut cfg = tempfile::NamedTempFile::new().unwrap();
        writeln!(cfg, "linuxpath={}", lines.path().display()).unwrap();
        writeln!(cfg, "REREAD_ON_QUERY=false").unwrap();

        let started = start(cfg.path(), local_options()).await.unwrap();
        assert_eq!(started.server.config_path(), Some(cfg.path()));
        assert_eq!(started.server.snapshot().index().mode(), LookupMode::Cached);
        assert!(started.server.snapshot().lookup("line1").found);
        assert_ne!(started.listener.local_addr().unwrap().port(), 0);
    }
}
