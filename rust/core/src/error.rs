// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the AR controller
//!
//! Platform calls fail with a [`PlatformError`] that mirrors the DOMException
//! name the browser raised. The controller maps those into [`Error`], whose
//! [`ErrorClass`] decides whether the next fallback is tried.

use std::fmt;
use thiserror::Error;

use crate::session::SessionMode;

/// Result type for AR operations
pub type Result<T> = std::result::Result<T, Error>;

/// DOMException names the platform layer reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformErrorKind {
    SecurityError,
    NotAllowedError,
    NotSupportedError,
    InvalidStateError,
    AbortError,
    NotFoundError,
    NotReadableError,
    Other,
}

impl PlatformErrorKind {
    /// Map a DOMException `name` to a kind
    pub fn from_name(name: &str) -> Self {
        match name {
            "SecurityError" => Self::SecurityError,
            "NotAllowedError" | "PermissionDeniedError" => Self::NotAllowedError,
            "NotSupportedError" => Self::NotSupportedError,
            "InvalidStateError" => Self::InvalidStateError,
            "AbortError" => Self::AbortError,
            "NotFoundError" | "DevicesNotFoundError" | "OverconstrainedError" => Self::NotFoundError,
            "NotReadableError" | "TrackStartError" => Self::NotReadableError,
            _ => Self::Other,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SecurityError => "SecurityError",
            Self::NotAllowedError => "NotAllowedError",
            Self::NotSupportedError => "NotSupportedError",
            Self::InvalidStateError => "InvalidStateError",
            Self::AbortError => "AbortError",
            Self::NotFoundError => "NotFoundError",
            Self::NotReadableError => "NotReadableError",
            Self::Other => "Error",
        }
    }
}

/// A rejected platform call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformError {
    pub kind: PlatformErrorKind,
    pub message: String,
}

impl PlatformError {
    pub fn new(kind: PlatformErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(PlatformErrorKind::Other, message)
    }
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.name(), self.message)
    }
}

impl std::error::Error for PlatformError {}

/// How the controller reacts to an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Expected on many devices; skip the mode silently
    CapabilityUnsupported,
    /// Terminal for the attempted mode; shown with a remediation hint
    PermissionDenied,
    /// Retry with a weaker configuration
    NegotiationFailure,
    /// Logged and surfaced as a generic failure
    Unexpected,
}

/// Errors produced by the AR controller
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("{mode} is not supported on this device")]
    Unsupported { mode: SessionMode },

    #[error("{mode} permission denied: {message}")]
    PermissionDenied { mode: SessionMode, message: String },

    #[error("AR requires a secure context (HTTPS or localhost)")]
    InsecureContext,

    #[error("session negotiation failed for {strategy}: {source}")]
    NegotiationFailed {
        strategy: &'static str,
        source: PlatformError,
    },

    #[error("camera unavailable: {0}")]
    CameraUnavailable(PlatformError),

    #[error("an AR session is already active: {0}")]
    SessionConflict(PlatformError),

    #[error("AR start aborted: {0}")]
    Aborted(PlatformError),

    #[error("unexpected platform failure: {0}")]
    Platform(PlatformError),

    #[error("no AR mode could be started")]
    NoModeAvailable,

    #[error("AR start already in progress")]
    EnterInProgress,

    #[error("invalid scale value: {0}")]
    InvalidScale(f64),

    #[error("no AR session is running")]
    NotActive,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Classify a rejection from `mode` by its DOMException kind
    pub fn from_platform(mode: SessionMode, strategy: &'static str, err: PlatformError) -> Self {
        match err.kind {
            PlatformErrorKind::SecurityError => Error::InsecureContext,
            PlatformErrorKind::NotAllowedError => Error::PermissionDenied {
                mode,
                message: err.message,
            },
            PlatformErrorKind::NotSupportedError => Error::NegotiationFailed {
                strategy,
                source: err,
            },
            PlatformErrorKind::InvalidStateError => Error::SessionConflict(err),
            PlatformErrorKind::AbortError => Error::Aborted(err),
            PlatformErrorKind::NotFoundError | PlatformErrorKind::NotReadableError
                if mode == SessionMode::PseudoAr =>
            {
                Error::CameraUnavailable(err)
            }
            _ => Error::Platform(err),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Error::Unsupported { .. } => ErrorClass::CapabilityUnsupported,
            Error::PermissionDenied { .. } | Error::InsecureContext => ErrorClass::PermissionDenied,
            Error::NegotiationFailed { .. } | Error::Aborted(_) => ErrorClass::NegotiationFailure,
            _ => ErrorClass::Unexpected,
        }
    }

    /// Text for the status area
    pub fn user_message(&self) -> String {
        match self {
            Error::Unsupported { .. } => {
                "AR is not supported on this device or browser.".to_string()
            }
            Error::PermissionDenied { mode, .. } => match mode {
                SessionMode::WebXr => "AR permission was denied. Allow camera and motion access \
                     in the browser's site settings and try again."
                    .to_string(),
                SessionMode::PseudoAr => "Camera permission was denied. Allow camera access in \
                     the browser's site settings and try again."
                    .to_string(),
            },
            Error::InsecureContext => {
                "AR needs a secure connection. Open the viewer over HTTPS or localhost.".to_string()
            }
            Error::NegotiationFailed { .. } => {
                "This device does not support the requested AR features.".to_string()
            }
            Error::CameraUnavailable(err) => match err.kind {
                PlatformErrorKind::NotReadableError => {
                    "The camera is in use by another application.".to_string()
                }
                _ => "No camera is available on this device.".to_string(),
            },
            Error::SessionConflict(_) => "Another XR session is already active.".to_string(),
            Error::Aborted(_) => "The AR session was aborted.".to_string(),
            Error::EnterInProgress => "AR is already starting.".to_string(),
            Error::InvalidScale(_) => "Scale must be a positive number.".to_string(),
            Error::NotActive => "Start AR before adjusting the model.".to_string(),
            Error::Platform(_) | Error::NoModeAvailable | Error::Config(_) => {
                "Failed to start AR. See the console for details.".to_string()
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
