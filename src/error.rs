//! Error types.

use thiserror::Error;

/// Result alias for hostswitch operations.
pub type Result<T> = std::result::Result<T, HostsError>;

/// Errors returned by hostswitch operations.
///
/// Every failure is reported as a value; no operation mutates the profile
/// store or the live hosts file after returning an error.
#[derive(Debug, Error)]
pub enum HostsError {
    /// Filesystem I/O failed (typically `PermissionDenied` on `/etc/hosts`).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The live hosts file (or a named backup) could not be read.
    #[error("failed to read {path}: {message}")]
    Read {
        /// Path that could not be read.
        path: String,
        /// Underlying I/O message.
        message: String,
    },

    /// The pre-write backup failed; the live file was not touched.
    #[error("failed to back up hosts file: {0}")]
    Backup(String),

    /// Staging rendered content to a temp file failed before elevation.
    #[error("failed to stage temporary hosts file: {0}")]
    Stage(String),

    /// The elevated commit failed (privilege prompt cancelled or the
    /// shell command exited non-zero). The live file is unmodified.
    #[error("elevated hosts update failed: {0}")]
    Elevation(String),

    /// No profile with the given id exists in the store.
    #[error("profile not found: {0}")]
    ProfileNotFound(uuid::Uuid),

    /// A profile with this name already exists.
    #[error("profile already exists: {0}")]
    ProfileExists(String),

    /// Empty, whitespace-only, or reserved profile name.
    #[error("invalid profile name: {0:?}")]
    InvalidName(String),

    /// Refused to delete the active profile or "Original Hosts".
    #[error("profile is protected from deletion: {0}")]
    ProfileProtected(String),

    /// The profile store file could not be serialized or deserialized.
    #[error("profile store error: {0}")]
    Store(#[from] serde_json::Error),
}

impl HostsError {
    /// Returns `true` if the underlying I/O error is `PermissionDenied`.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied)
    }
}
