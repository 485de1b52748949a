//! Reconciliation between the live hosts file and the profile store.
//!
//! The live file can change underneath the app (manual edits, other
//! tools). These operations re-derive model state from disk at the
//! moments that matter: first launch, every startup, and right after a
//! successful apply. A read failure is never fatal here — reconciliation
//! is best-effort and leaves the store as it was.

use crate::entry::{HostEntry, parse_hosts_content};
use crate::error::Result;
use crate::hosts_file::HostsFile;
use crate::profile::{HostProfile, ORIGINAL_PROFILE_NAME};
use crate::store::ProfileStore;

/// First-launch snapshot of whatever hosts file predates the app.
///
/// Creates the "Original Hosts" profile from the live file, active iff no
/// profile is currently active. If the profile already exists it is never
/// recreated; it is reactivated instead when nothing else is active.
///
/// # Errors
///
/// Returns a persistence error if the store cannot be written. An
/// unreadable hosts file is not an error — the snapshot is created empty.
pub fn bootstrap(store: &mut ProfileStore, hosts: &HostsFile) -> Result<()> {
    if let Some(original) = store.find_by_name(ORIGINAL_PROFILE_NAME) {
        let id = original.id;
        if store.active().is_none() {
            tracing::info!("No active profile, reactivating \"{ORIGINAL_PROFILE_NAME}\"");
            store.set_active(id)?;
        }
        return Ok(());
    }

    let mut profile = HostProfile::new(ORIGINAL_PROFILE_NAME);
    profile.is_active = store.active().is_none();

    match hosts.read() {
        Ok(content) => profile.entries = parse_hosts_content(&content),
        Err(e) => {
            tracing::warn!(error = %e, "Hosts file unreadable, snapshotting empty profile");
        }
    }

    tracing::info!(
        entries = profile.entries.len(),
        active = profile.is_active,
        "Created \"{ORIGINAL_PROFILE_NAME}\" from live hosts file"
    );
    store.insert(profile)
}

/// Startup resync of the active profile against the live file.
///
/// If a profile other than "Original Hosts" is active, its entries are
/// discarded and replaced wholesale with a fresh parse of the live file,
/// so out-of-band edits made between sessions show up in the model.
/// Skipped for "Original Hosts" — that profile stays a snapshot of the
/// pre-app state.
///
/// # Errors
///
/// Returns a persistence error if the store cannot be written.
pub fn sync_active_profile(store: &mut ProfileStore, hosts: &HostsFile) -> Result<()> {
    let Some(active) = store.active() else {
        return Ok(());
    };
    if active.is_original() {
        tracing::debug!("Active profile is \"{ORIGINAL_PROFILE_NAME}\", skipping sync");
        return Ok(());
    }
    let id = active.id;

    let content = match hosts.read() {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(error = %e, "Hosts file unreadable, skipping active-profile sync");
            return Ok(());
        }
    };

    let entries = parse_hosts_content(&content);
    tracing::info!(profile = %active.name, entries = entries.len(), "Synced active profile from live hosts file");
    store.replace_entries(id, entries)
}

/// Post-apply resync of system entries on the active profile.
///
/// Drops only the entries flagged as system entries, re-reads the live
/// file, and re-attaches the lines classified as system entries.
/// User-defined entries are left untouched.
///
/// # Errors
///
/// Returns a persistence error if the store cannot be written.
pub fn resync_system_entries(store: &mut ProfileStore, hosts: &HostsFile) -> Result<()> {
    let Some(active) = store.active() else {
        return Ok(());
    };
    let id = active.id;

    let content = match hosts.read() {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(error = %e, "Hosts file unreadable, skipping system-entry resync");
            return Ok(());
        }
    };

    let mut entries: Vec<HostEntry> = active
        .entries
        .iter()
        .filter(|e| !e.is_system_entry)
        .cloned()
        .collect();
    let system: Vec<HostEntry> = parse_hosts_content(&content)
        .into_iter()
        .filter(|e| e.is_system_entry)
        .collect();

    tracing::debug!(
        kept = entries.len(),
        system = system.len(),
        "Resynced system entries on active profile"
    );
    entries.extend(system);
    store.replace_entries(id, entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    const LIVE: &str = "127.0.0.1 localhost\n192.168.1.5 my.app # staging\n";

    struct Fixture {
        _dir: tempfile::TempDir,
        live: PathBuf,
        store: ProfileStore,
        hosts: HostsFile,
    }

    fn fixture(live_content: Option<&str>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let live = dir.path().join("hosts");
        if let Some(content) = live_content {
            fs::write(&live, content).unwrap();
        }
        let store = ProfileStore::with_dir(dir.path().join("store")).unwrap();
        let hosts = HostsFile::with_paths(&live, dir.path().join("Backups"));
        Fixture { _dir: dir, live, store, hosts }
    }

    #[test]
    fn bootstrap_snapshots_live_file_and_activates() {
        let mut f = fixture(Some(LIVE));
        bootstrap(&mut f.store, &f.hosts).unwrap();

        let original = f.store.find_by_name(ORIGINAL_PROFILE_NAME).unwrap();
        assert!(original.is_active);
        assert_eq!(original.entries.len(), 2);
        assert!(original.entries[0].is_system_entry);
        assert_eq!(original.entries[1].comment, "staging");
        assert!(!original.entries[1].is_system_entry);
    }

    #[test]
    fn bootstrap_stays_inactive_when_another_profile_is_active() {
        let mut f = fixture(Some(LIVE));
        let work = f.store.create("Work").unwrap();
        f.store.set_active(work).unwrap();

        bootstrap(&mut f.store, &f.hosts).unwrap();

        let original = f.store.find_by_name(ORIGINAL_PROFILE_NAME).unwrap();
        assert!(!original.is_active);
        assert_eq!(f.store.active().unwrap().id, work);
    }

    #[test]
    fn bootstrap_never_creates_a_second_original() {
        let mut f = fixture(Some(LIVE));
        bootstrap(&mut f.store, &f.hosts).unwrap();
        bootstrap(&mut f.store, &f.hosts).unwrap();

        let originals = f
            .store
            .profiles()
            .iter()
            .filter(|p| p.is_original())
            .count();
        assert_eq!(originals, 1);
    }

    #[test]
    fn bootstrap_reactivates_existing_original_when_none_active() {
        let mut f = fixture(Some(LIVE));
        bootstrap(&mut f.store, &f.hosts).unwrap();

        // Simulate a store where nothing ended up active.
        f.store.clear_active_for_test();

        assert!(f.store.active().is_none());
        bootstrap(&mut f.store, &f.hosts).unwrap();
        assert!(f.store.find_by_name(ORIGINAL_PROFILE_NAME).unwrap().is_active);
    }

    #[test]
    fn bootstrap_with_unreadable_file_snapshots_empty() {
        let mut f = fixture(None);
        bootstrap(&mut f.store, &f.hosts).unwrap();

        let original = f.store.find_by_name(ORIGINAL_PROFILE_NAME).unwrap();
        assert!(original.is_active);
        assert!(original.entries.is_empty());
    }

    #[test]
    fn sync_replaces_entries_of_active_profile() {
        let mut f = fixture(Some(LIVE));
        let work = f.store.create("Work").unwrap();
        f.store
            .add_entry(work, HostEntry::new("10.9.9.9", ["stale.test"]))
            .unwrap();
        f.store.set_active(work).unwrap();

        sync_active_profile(&mut f.store, &f.hosts).unwrap();

        let entries = &f.store.get(work).unwrap().entries;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].ip_address, "127.0.0.1");
        assert_eq!(entries[1].ip_address, "192.168.1.5");
        assert!(!entries.iter().any(|e| e.ip_address == "10.9.9.9"));
    }

    #[test]
    fn sync_skips_original_profile() {
        let mut f = fixture(Some(LIVE));
        bootstrap(&mut f.store, &f.hosts).unwrap();

        // The live file changes out of band.
        fs::write(&f.live, "10.0.0.1 changed.test\n").unwrap();
        sync_active_profile(&mut f.store, &f.hosts).unwrap();

        let original = f.store.find_by_name(ORIGINAL_PROFILE_NAME).unwrap();
        assert_eq!(original.entries.len(), 2);
        assert_eq!(original.entries[0].ip_address, "127.0.0.1");
    }

    #[test]
    fn sync_without_active_profile_is_a_noop() {
        let mut f = fixture(Some(LIVE));
        f.store.create("Work").unwrap();
        sync_active_profile(&mut f.store, &f.hosts).unwrap();
        assert!(f.store.get(f.store.profiles()[0].id).unwrap().entries.is_empty());
    }

    #[test]
    fn resync_touches_only_system_entries() {
        let mut f = fixture(Some(LIVE));
        let work = f.store.create("Work").unwrap();
        f.store
            .add_entry(work, HostEntry::new("127.0.0.1", ["localhost"]))
            .unwrap();
        f.store
            .add_entry(work, HostEntry::new("10.0.0.1", ["mine.test"]).with_comment("keep"))
            .unwrap();
        f.store.set_active(work).unwrap();
        let user_entry_id = f.store.get(work).unwrap().entries[1].id;

        // Live file now carries different system entries plus a user line
        // that must NOT be pulled in.
        fs::write(
            &f.live,
            "127.0.0.1 localhost\n::1 localhost\n172.16.0.1 other.test\n",
        )
        .unwrap();

        resync_system_entries(&mut f.store, &f.hosts).unwrap();

        let entries = &f.store.get(work).unwrap().entries;
        assert_eq!(entries.len(), 3);
        // User entry survives with identity intact.
        assert_eq!(entries[0].id, user_entry_id);
        assert_eq!(entries[0].comment, "keep");
        // Fresh system entries from the live file, nothing else.
        assert!(entries[1].is_system_entry && entries[1].ip_address == "127.0.0.1");
        assert!(entries[2].is_system_entry && entries[2].ip_address == "::1");
        assert!(!entries.iter().any(|e| e.ip_address == "172.16.0.1"));
    }

    #[test]
    fn resync_without_active_profile_is_a_noop() {
        let mut f = fixture(Some(LIVE));
        resync_system_entries(&mut f.store, &f.hosts).unwrap();
        assert!(f.store.profiles().is_empty());
    }
}
