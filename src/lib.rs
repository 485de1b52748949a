//! # hostswitch
//!
//! Manage named `/etc/hosts` profiles on macOS with backed-up, privileged
//! switching.
//!
//! A profile is an ordered list of hosts-file entries. One profile at a
//! time is active — its rendered content *is* the live hosts file. Every
//! switch backs up the current file first, stages the new content, and
//! commits through a single elevated shell invocation (copy + chmod +
//! resolver-cache flush), so the user sees at most one privilege prompt
//! and the live file is never half-written.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use hostswitch::HostsSwitcher;
//!
//! let mut switcher = HostsSwitcher::new()?;
//!
//! // First launch snapshots the pre-app hosts file as "Original Hosts"
//! // and resyncs the active profile against out-of-band edits.
//! switcher.startup()?;
//!
//! // Create a profile and make it the live hosts file.
//! let id = switcher.store_mut().create("Staging")?;
//! switcher.store_mut().add_entry(id, HostEntry::new("192.168.1.5", ["my.app"]))?;
//! switcher.apply_profile(id, true)?;
//!
//! // Undo: restore the newest backup.
//! let backups = switcher.backups();
//! switcher.restore_backup(&backups[0])?;
//! ```
//!
//! ## Backups
//!
//! Every mutation of the live file is preceded by a timestamped snapshot
//! (`hosts_backup_<YYYY-MM-DD_HH-mm-ss>.txt`) in an Application
//! Support-scoped directory. Restores snapshot the current file too, so a
//! restore is itself undoable.
//!
//! ## System entries
//!
//! The loopback and broadcast mappings macOS depends on
//! (`127.0.0.1 localhost`, `255.255.255.255 broadcasthost`,
//! `::1 localhost`) are flagged and re-synced from the live file after
//! every successful apply instead of being hand-edited.
//!
//! ## Verification
//!
//! Changes take effect after the cache flush bundled into the commit.
//! Verify with:
//!
//! ```bash
//! dscacheutil -q host -a name my.app
//! ping -c1 my.app
//! ```
//!
//! ## Permissions
//!
//! Reading `/etc/hosts` needs no privilege. Writing prompts for
//! administrator credentials through `osascript`; a cancelled prompt
//! surfaces as [`HostsError::Elevation`] and leaves the file untouched.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod elevate;
pub mod entry;
pub mod error;
pub mod hosts_file;
pub mod manager;
pub mod profile;
pub mod reconcile;
pub mod store;

pub use elevate::{OsascriptExecutor, PrivilegedExecutor};
pub use entry::{HostEntry, parse_hosts_content};
pub use error::{HostsError, Result};
pub use hosts_file::HostsFile;
pub use manager::HostsSwitcher;
pub use profile::{HostProfile, ORIGINAL_PROFILE_NAME};
pub use store::ProfileStore;
