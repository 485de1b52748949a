//! JSON-persisted profile collection.
//!
//! The store keeps every profile in memory and writes the whole collection
//! to `profiles.json` after each mutation. Mutations that span several
//! profiles (clearing the active flag everywhere, then setting one) happen
//! in memory first and persist as a single write, so a crash can never
//! leave two active profiles on disk.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::entry::HostEntry;
use crate::error::{HostsError, Result};
use crate::profile::{HostProfile, ORIGINAL_PROFILE_NAME};

/// Directory name under the user's Application Support directory.
const STORE_DIR_NAME: &str = "hostswitch";

/// Store filename inside the store directory.
const STORE_FILE_NAME: &str = "profiles.json";

/// The persisted collection of named profiles.
pub struct ProfileStore {
    store_file: PathBuf,
    profiles: Vec<HostProfile>,
}

impl ProfileStore {
    /// Opens the store in the default Application Support directory.
    ///
    /// # Errors
    ///
    /// Returns [`HostsError::Io`] if the directory cannot be created or the
    /// store file cannot be read, and [`HostsError::Store`] if an existing
    /// store file does not parse.
    pub fn open() -> Result<Self> {
        let dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(STORE_DIR_NAME);
        Self::with_dir(dir)
    }

    /// Opens the store in a specific directory (useful for testing).
    ///
    /// # Errors
    ///
    /// Same as [`open`](Self::open).
    pub fn with_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&dir, fs::Permissions::from_mode(0o700));
        }

        let store_file = dir.join(STORE_FILE_NAME);
        let mut profiles: Vec<HostProfile> = if store_file.exists() {
            let reader = BufReader::new(File::open(&store_file)?);
            serde_json::from_reader(reader)?
        } else {
            Vec::new()
        };

        // A hand-edited store file could carry two active flags; keep the
        // first and drop the rest so the invariant holds from load on.
        let mut seen_active = false;
        for profile in &mut profiles {
            if profile.is_active && seen_active {
                tracing::warn!(
                    profile = %profile.name,
                    "Multiple active profiles in store, clearing extra flag"
                );
                profile.is_active = false;
            }
            seen_active |= profile.is_active;
        }

        tracing::debug!(
            count = profiles.len(),
            path = %store_file.display(),
            "Loaded profile store"
        );
        Ok(Self { store_file, profiles })
    }

    /// Returns the path of the store file.
    #[must_use]
    pub fn store_file(&self) -> &Path {
        &self.store_file
    }

    /// All profiles, in creation order.
    #[must_use]
    pub fn profiles(&self) -> &[HostProfile] {
        &self.profiles
    }

    /// Looks up a profile by id.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&HostProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// Looks up a profile by display name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&HostProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// The currently active profile, if any.
    #[must_use]
    pub fn active(&self) -> Option<&HostProfile> {
        self.profiles.iter().find(|p| p.is_active)
    }

    /// The `limit` most recently updated profiles, newest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<&HostProfile> {
        let mut sorted: Vec<&HostProfile> = self.profiles.iter().collect();
        sorted.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sorted.truncate(limit);
        sorted
    }

    /// Creates a new empty, inactive profile.
    ///
    /// The name is trimmed. Empty names, the reserved
    /// [`ORIGINAL_PROFILE_NAME`], and names already in the store are
    /// refused.
    ///
    /// # Errors
    ///
    /// Returns [`HostsError::InvalidName`], [`HostsError::ProfileExists`],
    /// or a persistence error.
    pub fn create(&mut self, name: &str) -> Result<Uuid> {
        let name = name.trim();
        if name.is_empty() || name == ORIGINAL_PROFILE_NAME {
            return Err(HostsError::InvalidName(name.to_string()));
        }
        if self.find_by_name(name).is_some() {
            return Err(HostsError::ProfileExists(name.to_string()));
        }

        let profile = HostProfile::new(name);
        let id = profile.id;
        self.profiles.push(profile);
        self.save()?;

        tracing::info!(profile = %name, "Created profile");
        Ok(id)
    }

    /// Returns `true` if the profile may be deleted: it exists, is not
    /// active, and is not "Original Hosts".
    #[must_use]
    pub fn can_delete(&self, id: Uuid) -> bool {
        self.get(id).is_some_and(|p| !p.is_active && !p.is_original())
    }

    /// Deletes a profile and its entries.
    ///
    /// # Errors
    ///
    /// Returns [`HostsError::ProfileNotFound`] for unknown ids and
    /// [`HostsError::ProfileProtected`] for the active profile or
    /// "Original Hosts".
    pub fn delete(&mut self, id: Uuid) -> Result<()> {
        let profile = self.get(id).ok_or(HostsError::ProfileNotFound(id))?;
        if profile.is_active || profile.is_original() {
            tracing::warn!(profile = %profile.name, "Refusing to delete protected profile");
            return Err(HostsError::ProfileProtected(profile.name.clone()));
        }

        let name = profile.name.clone();
        self.profiles.retain(|p| p.id != id);
        self.save()?;

        tracing::info!(profile = %name, "Deleted profile");
        Ok(())
    }

    /// Marks one profile active, clearing every other flag first, and
    /// persists the whole transition as a single write.
    ///
    /// Callers flip activation only after a successful apply; this method
    /// does not touch the live hosts file.
    ///
    /// # Errors
    ///
    /// Returns [`HostsError::ProfileNotFound`] or a persistence error.
    pub fn set_active(&mut self, id: Uuid) -> Result<()> {
        if self.get(id).is_none() {
            return Err(HostsError::ProfileNotFound(id));
        }

        for profile in &mut self.profiles {
            profile.is_active = profile.id == id;
        }
        self.save()?;

        let name = self.get(id).map_or_else(String::new, |p| p.name.clone());
        tracing::info!(profile = %name, "Activated profile");
        Ok(())
    }

    /// Replaces a profile's entries wholesale and bumps `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`HostsError::ProfileNotFound`] or a persistence error.
    pub fn replace_entries(&mut self, id: Uuid, entries: Vec<HostEntry>) -> Result<()> {
        let profile = self.get_mut(id).ok_or(HostsError::ProfileNotFound(id))?;
        profile.entries = entries;
        profile.touch();
        self.save()
    }

    /// Appends an entry to a profile and bumps `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`HostsError::ProfileNotFound`] or a persistence error.
    pub fn add_entry(&mut self, id: Uuid, entry: HostEntry) -> Result<()> {
        let profile = self.get_mut(id).ok_or(HostsError::ProfileNotFound(id))?;
        profile.entries.push(entry);
        profile.touch();
        self.save()
    }

    /// Removes an entry from a profile and bumps `updated_at`.
    ///
    /// Unknown entry ids are a no-op apart from the timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`HostsError::ProfileNotFound`] or a persistence error.
    pub fn remove_entry(&mut self, id: Uuid, entry_id: Uuid) -> Result<()> {
        let profile = self.get_mut(id).ok_or(HostsError::ProfileNotFound(id))?;
        profile.entries.retain(|e| e.id != entry_id);
        profile.touch();
        self.save()
    }

    /// Toggles an entry's enabled flag and bumps `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`HostsError::ProfileNotFound`] or a persistence error.
    pub fn set_entry_enabled(&mut self, id: Uuid, entry_id: Uuid, enabled: bool) -> Result<()> {
        let profile = self.get_mut(id).ok_or(HostsError::ProfileNotFound(id))?;
        if let Some(entry) = profile.entries.iter_mut().find(|e| e.id == entry_id) {
            entry.is_enabled = enabled;
        }
        profile.touch();
        self.save()
    }

    /// Inserts a fully-formed profile. Bootstrap only; user-facing creation
    /// goes through [`create`](Self::create).
    pub(crate) fn insert(&mut self, profile: HostProfile) -> Result<()> {
        self.profiles.push(profile);
        self.save()
    }

    /// Clears every active flag without persisting, to set up states the
    /// public API refuses to produce (e.g. no active profile at all).
    #[cfg(test)]
    pub(crate) fn clear_active_for_test(&mut self) {
        for profile in &mut self.profiles {
            profile.is_active = false;
        }
    }

    fn get_mut(&mut self, id: Uuid) -> Option<&mut HostProfile> {
        self.profiles.iter_mut().find(|p| p.id == id)
    }

    fn save(&self) -> Result<()> {
        let file = File::create(&self.store_file)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&self.store_file, fs::Permissions::from_mode(0o600));
        }
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &self.profiles)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ProfileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::with_dir(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn create_and_list() {
        let (_dir, mut store) = store();
        let id = store.create("Work").unwrap();
        assert_eq!(store.profiles().len(), 1);
        let p = store.get(id).unwrap();
        assert_eq!(p.name, "Work");
        assert!(!p.is_active);
        assert!(p.entries.is_empty());
    }

    #[test]
    fn create_trims_and_rejects_bad_names() {
        let (_dir, mut store) = store();
        assert!(matches!(store.create(""), Err(HostsError::InvalidName(_))));
        assert!(matches!(store.create("   "), Err(HostsError::InvalidName(_))));
        assert!(matches!(
            store.create(ORIGINAL_PROFILE_NAME),
            Err(HostsError::InvalidName(_))
        ));

        let id = store.create("  Work  ").unwrap();
        assert_eq!(store.get(id).unwrap().name, "Work");
        assert!(matches!(store.create("Work"), Err(HostsError::ProfileExists(_))));
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let mut store = ProfileStore::with_dir(dir.path()).unwrap();
            let id = store.create("Work").unwrap();
            store
                .add_entry(id, HostEntry::new("10.0.0.1", ["x.test"]))
                .unwrap();
            id
        };

        let store = ProfileStore::with_dir(dir.path()).unwrap();
        let p = store.get(id).unwrap();
        assert_eq!(p.name, "Work");
        assert_eq!(p.entries.len(), 1);
        assert_eq!(p.entries[0].domains, vec!["x.test"]);
    }

    #[test]
    fn set_active_is_exclusive() {
        let (_dir, mut store) = store();
        let a = store.create("A").unwrap();
        let b = store.create("B").unwrap();

        store.set_active(a).unwrap();
        store.set_active(b).unwrap();

        let active: Vec<_> = store.profiles().iter().filter(|p| p.is_active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, b);
    }

    #[test]
    fn load_clears_duplicate_active_flags() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = ProfileStore::with_dir(dir.path()).unwrap();
            let a = store.create("A").unwrap();
            store.create("B").unwrap();
            store.set_active(a).unwrap();
        }
        // Corrupt the invariant by hand.
        let path = dir.path().join(STORE_FILE_NAME);
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, text.replace("\"is_active\": false", "\"is_active\": true")).unwrap();

        let store = ProfileStore::with_dir(dir.path()).unwrap();
        assert_eq!(store.profiles().iter().filter(|p| p.is_active).count(), 1);
    }

    #[test]
    fn delete_refuses_active_and_original() {
        let (_dir, mut store) = store();
        store
            .insert(HostProfile::new(ORIGINAL_PROFILE_NAME))
            .unwrap();
        let original = store.find_by_name(ORIGINAL_PROFILE_NAME).unwrap().id;
        let work = store.create("Work").unwrap();
        store.set_active(work).unwrap();

        assert!(!store.can_delete(original));
        assert!(!store.can_delete(work));
        assert!(matches!(
            store.delete(original),
            Err(HostsError::ProfileProtected(_))
        ));
        assert!(matches!(store.delete(work), Err(HostsError::ProfileProtected(_))));

        let spare = store.create("Spare").unwrap();
        assert!(store.can_delete(spare));
        store.delete(spare).unwrap();
        assert!(store.get(spare).is_none());
    }

    #[test]
    fn delete_unknown_id_errors() {
        let (_dir, mut store) = store();
        assert!(matches!(
            store.delete(Uuid::new_v4()),
            Err(HostsError::ProfileNotFound(_))
        ));
    }

    #[test]
    fn entry_mutations_bump_updated_at() {
        let (_dir, mut store) = store();
        let id = store.create("Work").unwrap();
        let before = store.get(id).unwrap().updated_at;

        let entry = HostEntry::new("10.0.0.1", ["x.test"]);
        let entry_id = entry.id;
        store.add_entry(id, entry).unwrap();
        assert!(store.get(id).unwrap().updated_at >= before);
        assert_eq!(store.get(id).unwrap().entries.len(), 1);

        store.set_entry_enabled(id, entry_id, false).unwrap();
        assert!(!store.get(id).unwrap().entries[0].is_enabled);

        store.remove_entry(id, entry_id).unwrap();
        assert!(store.get(id).unwrap().entries.is_empty());
    }

    #[test]
    fn recent_orders_by_updated_at() {
        let (_dir, mut store) = store();
        let a = store.create("A").unwrap();
        let b = store.create("B").unwrap();
        // Touch A after B was created.
        store
            .add_entry(a, HostEntry::new("10.0.0.1", ["x.test"]))
            .unwrap();

        let recent = store.recent(5);
        assert_eq!(recent[0].id, a);
        assert_eq!(recent[1].id, b);

        assert_eq!(store.recent(1).len(), 1);
    }
}
