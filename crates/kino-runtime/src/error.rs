//! Error types for Kino Runtime

use crate::event::{EngineEvent, ErrorKind};
use thiserror::Error;

/// Result type alias for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Result type alias for adapter operations
pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

/// Failures reported by a backend adapter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    #[error("Network error: {message}")]
    Network { message: String, url: Option<String> },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Not supported: {message}")]
    NotSupported { message: String, codec: Option<String> },

    #[error("DRM error: {0}")]
    Drm(String),

    #[error("Operation aborted: {0}")]
    Aborted(String),

    #[error("Video surface error: {0}")]
    Surface(String),

    #[error("Adapter not mounted")]
    NotMounted,

    #[error("Adapter destroyed")]
    Destroyed,
}

impl AdapterError {
    pub fn network(message: impl Into<String>) -> Self {
        AdapterError::Network {
            message: message.into(),
            url: None,
        }
    }

    /// Category reported to the reducer
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::Network { .. } => ErrorKind::Network,
            AdapterError::Decode(_) => ErrorKind::Decode,
            AdapterError::NotSupported { .. } => ErrorKind::NotSupported,
            AdapterError::Drm(_) => ErrorKind::Drm,
            AdapterError::Aborted(_) | AdapterError::Destroyed => ErrorKind::Aborted,
            AdapterError::Surface(_) | AdapterError::NotMounted => ErrorKind::Other("surface".to_string()),
        }
    }

    /// Returns the error code for analytics
    pub fn error_code(&self) -> &'static str {
        match self {
            AdapterError::Network { .. } => "NETWORK",
            AdapterError::Decode(_) => "DECODE",
            AdapterError::NotSupported { .. } => "NOT_SUPPORTED",
            AdapterError::Drm(_) => "DRM",
            AdapterError::Aborted(_) => "ABORTED",
            AdapterError::Surface(_) => "SURFACE",
            AdapterError::NotMounted => "NOT_MOUNTED",
            AdapterError::Destroyed => "DESTROYED",
        }
    }
}

/// Engine-level failures.
///
/// These never escape the drain loop: the engine turns them into
/// [`EngineEvent::Error`] so the reducer decides what the user sees.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("No adapter available")]
    NoAdapter,

    #[error("No video element mounted")]
    NoVideoElement,

    #[error("Adapter {operation} failed: {message}")]
    AdapterFailure {
        operation: &'static str,
        message: String,
        #[source]
        source: AdapterError,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RuntimeError {
    /// Wrap an adapter failure with the operation that produced it
    pub fn adapter(operation: &'static str, source: AdapterError) -> Self {
        RuntimeError::AdapterFailure {
            operation,
            message: source.to_string(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::NoAdapter => ErrorKind::NotSupported,
            RuntimeError::NoVideoElement => ErrorKind::Aborted,
            RuntimeError::AdapterFailure { source, .. } => source.kind(),
            RuntimeError::InvalidConfig(_) => ErrorKind::Other("config".to_string()),
        }
    }

    /// Returns the error code for analytics
    pub fn error_code(&self) -> &'static str {
        match self {
            RuntimeError::NoAdapter => "NO_ADAPTER",
            RuntimeError::NoVideoElement => "NO_VIDEO_ELEMENT",
            RuntimeError::AdapterFailure { source, .. } => source.error_code(),
            RuntimeError::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }

    /// Engine event that feeds this failure back through the reducer
    pub fn to_event(&self) -> EngineEvent {
        let (url, codec) = match self {
            RuntimeError::AdapterFailure {
                source: AdapterError::Network { url, .. },
                ..
            } => (url.clone(), None),
            RuntimeError::AdapterFailure {
                source: AdapterError::NotSupported { codec, .. },
                ..
            } => (None, codec.clone()),
            _ => (None, None),
        };

        EngineEvent::Error {
            kind: self.kind(),
            message: self.to_string(),
            url,
            codec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_failure_names_operation() {
        let err = RuntimeError::adapter("load", AdapterError::network("connection reset"));
        assert_eq!(err.to_string(), "Adapter load failed: Network error: connection reset");
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(err.error_code(), "NETWORK");
    }

    #[test]
    fn test_to_event_keeps_url_and_codec() {
        let err = RuntimeError::adapter(
            "load",
            AdapterError::Network {
                message: "404".into(),
                url: Some("v.mp4".into()),
            },
        );
        match err.to_event() {
            EngineEvent::Error { kind, url, .. } => {
                assert_eq!(kind, ErrorKind::Network);
                assert_eq!(url.as_deref(), Some("v.mp4"));
            }
            other => panic!("unexpected event {other:?}"),
        }

        let err = RuntimeError::adapter(
            "mount",
            AdapterError::NotSupported {
                message: "hevc".into(),
                codec: Some("hvc1".into()),
            },
        );
        assert!(matches!(
            err.to_event(),
            EngineEvent::Error { kind: ErrorKind::NotSupported, codec: Some(_), .. }
        ));
    }

    #[test]
    fn test_engine_errors_map_to_kinds() {
        assert_eq!(RuntimeError::NoAdapter.kind(), ErrorKind::NotSupported);
        assert_eq!(RuntimeError::NoVideoElement.kind(), ErrorKind::Aborted);
    }
}
