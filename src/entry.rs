//! Host entry model, line parsing, and line rendering.
//!
//! A [`HostEntry`] is one logical line of a hosts file: an IP literal, the
//! hostnames mapped to it, an optional trailing comment, and an
//! enabled/disabled toggle. Disabled entries render as commented-out lines.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single hosts-file mapping.
///
/// # Example
///
/// ```
/// use hostswitch::HostEntry;
///
/// let entry = HostEntry::new("192.168.1.5", ["my.app"]).with_comment("staging");
/// assert_eq!(entry.formatted(), "192.168.1.5\tmy.app # staging");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostEntry {
    /// Opaque identifier, assigned at creation.
    pub id: Uuid,

    /// IP literal (IPv4 or IPv6 textual form). Not validated beyond
    /// non-emptiness; the hosts file itself is the arbiter.
    pub ip_address: String,

    /// Hostnames sharing this IP, in file order. Duplicates within a line
    /// are preserved as written.
    pub domains: Vec<String>,

    /// Disabled entries are rendered as commented-out lines.
    pub is_enabled: bool,

    /// Trailing annotation. Empty string means none.
    pub comment: String,

    /// Entries the OS depends on for local resolution (loopback and
    /// broadcast aliases). Editing surfaces treat these as read-only; they
    /// are re-synced from the live file rather than hand-edited.
    pub is_system_entry: bool,
}

impl HostEntry {
    /// Creates an enabled, uncommented entry.
    ///
    /// The system flag is derived from the address and domains, so parsed
    /// and hand-built entries classify identically.
    #[must_use]
    pub fn new<I, D>(ip_address: impl Into<String>, domains: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<String>,
    {
        let ip_address = ip_address.into();
        let domains: Vec<String> = domains.into_iter().map(Into::into).collect();
        let is_system_entry = is_system_mapping(&ip_address, &domains);
        Self {
            id: Uuid::new_v4(),
            ip_address,
            domains,
            is_enabled: true,
            comment: String::new(),
            is_system_entry,
        }
    }

    /// Attaches a trailing comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Marks the entry disabled.
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.is_enabled = false;
        self
    }

    /// Parses one hosts-file line into an entry.
    ///
    /// Returns `None` for lines that carry no entry: blank lines, pure
    /// comments (any line whose first character is `#`), and lines with
    /// fewer than two tokens. Parsing is best-effort and never fails a
    /// whole-file read.
    ///
    /// Note that a disabled entry written by [`formatted`](Self::formatted)
    /// starts with `#` and therefore parses back as `None`, not as a
    /// disabled entry. The profile store, not the live file, is the source
    /// of truth for disabled entries.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        let (working, comment) = match trimmed.find('#') {
            Some(idx) => (
                trimmed[..idx].trim_end(),
                trimmed[idx..].trim_start_matches('#').trim().to_string(),
            ),
            None => (trimmed, String::new()),
        };

        let tokens: Vec<&str> = working.split_whitespace().collect();
        if tokens.len() < 2 {
            return None;
        }

        Some(Self::new(tokens[0], tokens[1..].iter().copied()).with_comment(comment))
    }

    /// Renders the entry as a hosts-file line.
    ///
    /// Domains are joined by single spaces; disabled entries are prefixed
    /// with `"# "`. Every entry renders — rendering never filters, unlike
    /// [`parse`](Self::parse).
    #[must_use]
    pub fn formatted(&self) -> String {
        let domains = self.domains.join(" ");
        let base = if self.is_enabled {
            format!("{}\t{domains}", self.ip_address)
        } else {
            format!("# {}\t{domains}", self.ip_address)
        };
        if self.comment.is_empty() {
            base
        } else {
            format!("{base} # {}", self.comment)
        }
    }
}

/// Parses a whole hosts file, skipping lines that carry no entry.
///
/// Order is preserved. Malformed lines are dropped silently; a read of a
/// hand-edited file always produces whatever entries it can.
#[must_use]
pub fn parse_hosts_content(content: &str) -> Vec<HostEntry> {
    content.lines().filter_map(HostEntry::parse).collect()
}

/// The exact mappings macOS relies on for local resolution.
///
/// No other address qualifies.
fn is_system_mapping(ip_address: &str, domains: &[String]) -> bool {
    let has = |d: &str| domains.iter().any(|x| x == d);
    (ip_address == "127.0.0.1" && has("localhost"))
        || (ip_address == "255.255.255.255" && has("broadcasthost"))
        || (ip_address == "::1" && has("localhost"))
}
