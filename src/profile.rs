//! Named host profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entry::HostEntry;

/// Reserved name of the profile snapshotted from the hosts file that
/// existed before the app first ran. Created once, never deleted.
pub const ORIGINAL_PROFILE_NAME: &str = "Original Hosts";

/// A named, user-managed version of the hosts file contents.
///
/// Profiles own their entries; deleting a profile drops them. At most one
/// profile in a store is active at a time — the flag is only flipped by
/// [`ProfileStore::set_active`](crate::ProfileStore::set_active) after a
/// successful apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostProfile {
    /// Unique identifier.
    pub id: Uuid,
    /// Display name. [`ORIGINAL_PROFILE_NAME`] is reserved.
    pub name: String,
    /// Whether this profile currently backs the live hosts file.
    pub is_active: bool,
    /// Owned entries, in file order.
    pub entries: Vec<HostEntry>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Bumped on every entry mutation or reconciliation.
    pub updated_at: DateTime<Utc>,
}

impl HostProfile {
    /// Creates an empty, inactive profile.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            is_active: false,
            entries: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` for the reserved bootstrap profile.
    #[must_use]
    pub fn is_original(&self) -> bool {
        self.name == ORIGINAL_PROFILE_NAME
    }

    /// Renders the profile as hosts-file text: one line per entry, joined
    /// by newlines. Disabled entries come out commented; nothing is
    /// filtered.
    #[must_use]
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(HostEntry::formatted)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Bumps `updated_at`.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_profile_is_empty_and_inactive() {
        let p = HostProfile::new("Work");
        assert_eq!(p.name, "Work");
        assert!(!p.is_active);
        assert!(p.entries.is_empty());
        assert_eq!(p.created_at, p.updated_at);
    }

    #[test]
    fn render_joins_lines() {
        let mut p = HostProfile::new("Work");
        p.entries.push(HostEntry::new("127.0.0.1", ["localhost"]));
        p.entries
            .push(HostEntry::new("10.0.0.1", ["x.test"]).disabled());
        assert_eq!(p.render(), "127.0.0.1\tlocalhost\n# 10.0.0.1\tx.test");
    }

    #[test]
    fn render_empty_profile_is_empty() {
        assert_eq!(HostProfile::new("Empty").render(), "");
    }

    #[test]
    fn original_name_is_recognized() {
        assert!(HostProfile::new(ORIGINAL_PROFILE_NAME).is_original());
        assert!(!HostProfile::new("Work").is_original());
    }

    #[test]
    fn touch_advances_updated_at() {
        let mut p = HostProfile::new("Work");
        let before = p.updated_at;
        p.touch();
        assert!(p.updated_at >= before);
    }
}
