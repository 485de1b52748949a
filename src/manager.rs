//! High-level profile switching.
//!
//! [`HostsSwitcher`] ties the profile store, the hosts-file service, and
//! the reconciliation steps together behind the handful of operations a
//! frontend calls. Activation flags only ever change after the privileged
//! commit has reported success.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{HostsError, Result};
use crate::hosts_file::HostsFile;
use crate::reconcile;
use crate::store::ProfileStore;

/// Facade over the profile store and the live hosts file.
pub struct HostsSwitcher {
    store: ProfileStore,
    hosts: HostsFile,
}

impl HostsSwitcher {
    /// Opens the default store and targets the system hosts file.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the profile store cannot be opened.
    pub fn new() -> Result<Self> {
        Ok(Self {
            store: ProfileStore::open()?,
            hosts: HostsFile::new(),
        })
    }

    /// Builds a switcher from preconfigured parts (useful for testing).
    #[must_use]
    pub const fn with_parts(store: ProfileStore, hosts: HostsFile) -> Self {
        Self { store, hosts }
    }

    /// The profile store.
    #[must_use]
    pub const fn store(&self) -> &ProfileStore {
        &self.store
    }

    /// Mutable access to the profile store, for entry editing.
    pub const fn store_mut(&mut self) -> &mut ProfileStore {
        &mut self.store
    }

    /// The hosts-file service.
    #[must_use]
    pub const fn hosts(&self) -> &HostsFile {
        &self.hosts
    }

    /// Launch-time reconciliation: create or reactivate "Original Hosts",
    /// then resync the active profile from the live file.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if the store cannot be written.
    pub fn startup(&mut self) -> Result<()> {
        reconcile::bootstrap(&mut self.store, &self.hosts)?;
        reconcile::sync_active_profile(&mut self.store, &self.hosts)
    }

    /// Renders a profile and makes it the live hosts file.
    ///
    /// On success the profile becomes the single active one and its system
    /// entries are resynced from the freshly written file. On any failure
    /// the store is exactly as it was: no activation flag moves before the
    /// elevated commit reports success.
    ///
    /// # Errors
    ///
    /// [`HostsError::ProfileNotFound`] for unknown ids, otherwise the
    /// [`HostsFile::apply`] taxonomy.
    pub fn apply_profile(&mut self, id: Uuid, flush_cache: bool) -> Result<()> {
        let profile = self.store.get(id).ok_or(HostsError::ProfileNotFound(id))?;
        let name = profile.name.clone();
        let content = profile.render();

        self.hosts.apply(&content, flush_cache)?;

        self.store.set_active(id)?;
        reconcile::resync_system_entries(&mut self.store, &self.hosts)?;

        tracing::info!(profile = %name, flush_cache, "Applied profile");
        Ok(())
    }

    /// Backs up the live hosts file on demand. Returns the backup path.
    ///
    /// # Errors
    ///
    /// Returns [`HostsError::Backup`] if the live file cannot be read or
    /// the backup cannot be written.
    pub fn backup_hosts_file(&self) -> Result<PathBuf> {
        self.hosts.backup()
    }

    /// Lists backups, newest first.
    #[must_use]
    pub fn backups(&self) -> Vec<PathBuf> {
        self.hosts.list_backups()
    }

    /// Restores the live hosts file from a backup, snapshotting the
    /// current file first.
    ///
    /// Restoring bypasses profiles entirely; run [`startup`](Self::startup)
    /// afterwards if the model should pick up the restored content.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`HostsFile::restore`].
    pub fn restore_backup(&self, backup: &Path) -> Result<()> {
        self.hosts.restore(backup)
    }

    /// Reads the live hosts file.
    ///
    /// # Errors
    ///
    /// Returns [`HostsError::Read`] if the file is missing or unreadable.
    pub fn read_hosts_file(&self) -> Result<String> {
        self.hosts.read()
    }
}
