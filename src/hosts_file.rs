//! Backed-up, privileged access to the live hosts file.
//!
//! [`HostsFile`] is the one coordination point for reads and writes of
//! `/etc/hosts`. Every mutation follows the same pipeline: snapshot the
//! current file into the backup directory, stage the new content to a temp
//! file, then hand both paths to the [`PrivilegedExecutor`] for a single
//! elevated replace. The live file is never written without a successful
//! backup first.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use uuid::Uuid;

use crate::elevate::{OsascriptExecutor, PrivilegedExecutor};
use crate::error::{HostsError, Result};

/// Default live hosts file path.
const DEFAULT_HOSTS_PATH: &str = "/etc/hosts";

/// Backup filename prefix; the timestamp follows.
const BACKUP_PREFIX: &str = "hosts_backup_";

/// Coordinates reads, backups, and privileged writes of the hosts file.
///
/// # Concurrency
///
/// Apply and restore serialize on an internal lock: a second caller blocks
/// until the pending elevated commit finishes, so two commits can never
/// race against the same live file from this process. Reads are
/// lock-free.
///
/// # Permissions
///
/// Reading `/etc/hosts` needs no privilege; writing goes through the
/// executor's elevation prompt. See [`OsascriptExecutor`].
pub struct HostsFile {
    live_path: PathBuf,
    backup_dir: PathBuf,
    temp_dir: PathBuf,
    executor: Box<dyn PrivilegedExecutor>,
    apply_lock: Mutex<()>,
}

impl HostsFile {
    /// Creates a service targeting `/etc/hosts` with backups under the
    /// user's Application Support directory.
    #[must_use]
    pub fn new() -> Self {
        let backup_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hostswitch")
            .join("Backups");
        Self::with_paths(DEFAULT_HOSTS_PATH, backup_dir)
    }

    /// Creates a service targeting custom paths (useful for testing).
    #[must_use]
    pub fn with_paths(live_path: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            live_path: live_path.into(),
            backup_dir: backup_dir.into(),
            temp_dir: std::env::temp_dir(),
            executor: Box::new(OsascriptExecutor),
            apply_lock: Mutex::new(()),
        }
    }

    /// Overrides the privileged executor.
    #[must_use]
    pub fn executor(mut self, executor: Box<dyn PrivilegedExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Overrides the staging directory for temp files.
    #[must_use]
    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    /// Returns the live hosts file path.
    #[must_use]
    pub fn live_path(&self) -> &Path {
        &self.live_path
    }

    /// Returns the backup directory path.
    #[must_use]
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Reads the live hosts file as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`HostsError::Read`] if the file is missing or unreadable.
    /// Callers treating a missing file as "nothing to parse" match on this
    /// variant rather than aborting.
    pub fn read(&self) -> Result<String> {
        fs::read_to_string(&self.live_path).map_err(|e| HostsError::Read {
            path: self.live_path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Copies the current live file into a timestamped backup.
    ///
    /// The backup directory is created lazily. Returns the backup path.
    ///
    /// # Errors
    ///
    /// Returns [`HostsError::Backup`] if the live file cannot be read or
    /// the backup cannot be written. Callers must not touch the live file
    /// after this fails.
    pub fn backup(&self) -> Result<PathBuf> {
        let content = self
            .read()
            .map_err(|e| HostsError::Backup(e.to_string()))?;

        if !self.backup_dir.exists() {
            fs::create_dir_all(&self.backup_dir)
                .map_err(|e| HostsError::Backup(e.to_string()))?;
        }

        let timestamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
        let mut path = self.backup_dir.join(format!("{BACKUP_PREFIX}{timestamp}.txt"));
        // Second-resolution timestamps can collide; a suffix keeps every
        // backup a distinct file and sorts after the plain name.
        let mut n = 1;
        while path.exists() {
            n += 1;
            path = self
                .backup_dir
                .join(format!("{BACKUP_PREFIX}{timestamp}_{n}.txt"));
        }
        fs::write(&path, content).map_err(|e| HostsError::Backup(e.to_string()))?;

        tracing::info!(path = %path.display(), "Backed up hosts file");
        Ok(path)
    }

    /// Lists backup files, newest first.
    ///
    /// Backup filenames embed their creation time in a lexicographically
    /// sortable form, so ordering is by filename. Returns an empty vec if
    /// the directory does not exist or cannot be read.
    #[must_use]
    pub fn list_backups(&self) -> Vec<PathBuf> {
        let Ok(dir) = fs::read_dir(&self.backup_dir) else {
            return Vec::new();
        };

        let mut backups: Vec<PathBuf> = dir
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(BACKUP_PREFIX))
            })
            .collect();
        backups.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
        backups
    }

    /// Replaces the live hosts file with `content`.
    ///
    /// Pipeline: backup, stage to a temp file, elevated commit
    /// (copy + chmod, plus resolver-cache flush when `flush_cache` is
    /// set), temp cleanup. The temp file is removed whatever the commit
    /// outcome.
    ///
    /// # Errors
    ///
    /// [`HostsError::Backup`] aborts before anything else happens;
    /// [`HostsError::Stage`] aborts before elevation;
    /// [`HostsError::Elevation`] means the prompt was cancelled or the
    /// command failed — the live file is unmodified in every error case.
    pub fn apply(&self, content: &str, flush_cache: bool) -> Result<()> {
        let _guard = self
            .apply_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        self.backup()?;
        let staged = self.stage(content, "hosts_temp")?;
        let result = self
            .executor
            .replace_file(&staged, &self.live_path, flush_cache);
        let _ = fs::remove_file(&staged);
        result
    }

    /// Restores the live hosts file from a named backup.
    ///
    /// The current live file is snapshotted through the same backup step
    /// first, so a restore is itself undoable. No cache flush.
    ///
    /// # Errors
    ///
    /// Returns [`HostsError::Read`] if the backup file cannot be read,
    /// otherwise the same taxonomy as [`apply`](Self::apply).
    pub fn restore(&self, backup: &Path) -> Result<()> {
        let _guard = self
            .apply_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let content = fs::read_to_string(backup).map_err(|e| HostsError::Read {
            path: backup.display().to_string(),
            message: e.to_string(),
        })?;

        self.backup()?;
        let staged = self.stage(&content, "hosts_restore")?;
        let result = self.executor.replace_file(&staged, &self.live_path, false);
        let _ = fs::remove_file(&staged);

        if result.is_ok() {
            tracing::info!(backup = %backup.display(), "Restored hosts file from backup");
        }
        result
    }

    fn stage(&self, content: &str, prefix: &str) -> Result<PathBuf> {
        let path = self.temp_dir.join(format!("{prefix}_{}", Uuid::new_v4()));
        fs::write(&path, content).map_err(|e| HostsError::Stage(e.to_string()))?;
        Ok(path)
    }
}

impl Default for HostsFile {
    fn default() -> Self {
        Self::new()
    }
}
