//! Error family of player states

use crate::types::PlaybackType;
use serde::{Deserialize, Serialize};

/// User-visible error conditions.
///
/// Recoverable variants carry a retry count and the URL that failed so a
/// retry can reload it. `Abort` is recoverable but its retry count is
/// always zero. `NotSupported` and `Drm` are fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorState {
    Network {
        error: String,
        retry_count: u32,
        url: Option<String>,
    },
    HlsManifestLoad {
        error: String,
        retry_count: u32,
        url: Option<String>,
    },
    HlsSegmentLoad {
        error: String,
        retry_count: u32,
        url: Option<String>,
        segment_index: Option<u64>,
    },
    DashManifestLoad {
        error: String,
        retry_count: u32,
        url: Option<String>,
    },
    DashSegmentLoad {
        error: String,
        retry_count: u32,
        url: Option<String>,
        segment_index: Option<u64>,
    },
    /// Decode failure in the backend named by `playback_type`
    Decode {
        error: String,
        playback_type: PlaybackType,
        retry_count: u32,
        url: Option<String>,
    },
    Abort {
        error: String,
        url: Option<String>,
    },
    NotSupported {
        error: String,
        codec: Option<String>,
        url: Option<String>,
    },
    Drm {
        error: String,
        key_system: Option<String>,
    },
}

impl ErrorState {
    pub fn network(error: impl Into<String>, url: Option<String>) -> Self {
        ErrorState::Network {
            error: error.into(),
            retry_count: 0,
            url,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ErrorState::Network { error, .. }
            | ErrorState::HlsManifestLoad { error, .. }
            | ErrorState::HlsSegmentLoad { error, .. }
            | ErrorState::DashManifestLoad { error, .. }
            | ErrorState::DashSegmentLoad { error, .. }
            | ErrorState::Decode { error, .. }
            | ErrorState::Abort { error, .. }
            | ErrorState::NotSupported { error, .. }
            | ErrorState::Drm { error, .. } => error,
        }
    }

    /// Retry count, `None` for fatal errors
    pub fn retry_count(&self) -> Option<u32> {
        match self {
            ErrorState::Network { retry_count, .. }
            | ErrorState::HlsManifestLoad { retry_count, .. }
            | ErrorState::HlsSegmentLoad { retry_count, .. }
            | ErrorState::DashManifestLoad { retry_count, .. }
            | ErrorState::DashSegmentLoad { retry_count, .. }
            | ErrorState::Decode { retry_count, .. } => Some(*retry_count),
            ErrorState::Abort { .. } => Some(0),
            ErrorState::NotSupported { .. } | ErrorState::Drm { .. } => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            ErrorState::Network { url, .. }
            | ErrorState::HlsManifestLoad { url, .. }
            | ErrorState::HlsSegmentLoad { url, .. }
            | ErrorState::DashManifestLoad { url, .. }
            | ErrorState::DashSegmentLoad { url, .. }
            | ErrorState::Decode { url, .. }
            | ErrorState::Abort { url, .. }
            | ErrorState::NotSupported { url, .. } => url.as_deref(),
            ErrorState::Drm { .. } => None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorState::NotSupported { .. } | ErrorState::Drm { .. })
    }

    pub fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }

    /// Same error with a new retry count. Fatal errors and `Abort` are
    /// returned unchanged.
    pub fn with_retry_count(mut self, count: u32) -> Self {
        match &mut self {
            ErrorState::Network { retry_count, .. }
            | ErrorState::HlsManifestLoad { retry_count, .. }
            | ErrorState::HlsSegmentLoad { retry_count, .. }
            | ErrorState::DashManifestLoad { retry_count, .. }
            | ErrorState::DashSegmentLoad { retry_count, .. }
            | ErrorState::Decode { retry_count, .. } => *retry_count = count,
            ErrorState::Abort { .. } | ErrorState::NotSupported { .. } | ErrorState::Drm { .. } => {}
        }
        self
    }

    /// True when both errors are the same variant
    pub fn same_kind(&self, other: &ErrorState) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Returns the error code for analytics
    pub fn error_code(&self) -> &'static str {
        match self {
            ErrorState::Network { .. } => "NETWORK",
            ErrorState::HlsManifestLoad { .. } => "HLS_MANIFEST_LOAD",
            ErrorState::HlsSegmentLoad { .. } => "HLS_SEGMENT_LOAD",
            ErrorState::DashManifestLoad { .. } => "DASH_MANIFEST_LOAD",
            ErrorState::DashSegmentLoad { .. } => "DASH_SEGMENT_LOAD",
            ErrorState::Decode { .. } => "DECODE",
            ErrorState::Abort { .. } => "ABORTED",
            ErrorState::NotSupported { .. } => "NOT_SUPPORTED",
            ErrorState::Drm { .. } => "DRM",
        }
    }
}

impl std::fmt::Display for ErrorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors_have_no_retry_count() {
        let err = ErrorState::Drm {
            error: "license denied".into(),
            key_system: Some("com.widevine.alpha".into()),
        };
        assert!(err.is_fatal());
        assert_eq!(err.retry_count(), None);
        assert_eq!(err.clone().with_retry_count(3), err);
    }

    #[test]
    fn test_abort_retry_count_stays_zero() {
        let err = ErrorState::Abort {
            error: "aborted".into(),
            url: Some("v.mp4".into()),
        };
        assert!(err.is_recoverable());
        assert_eq!(err.with_retry_count(5).retry_count(), Some(0));
    }

    #[test]
    fn test_with_retry_count() {
        let err = ErrorState::network("timeout", Some("v.mp4".into())).with_retry_count(2);
        assert_eq!(err.retry_count(), Some(2));
        assert_eq!(err.url(), Some("v.mp4"));
        assert_eq!(err.to_string(), "NETWORK: timeout");
    }
}
