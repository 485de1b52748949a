//! Elevated commit of staged hosts content.
//!
//! The live hosts file is only ever written through a single privileged
//! shell invocation: copy, chmod 644, and (for apply) resolver-cache flush
//! run as one unit so the user sees at most one elevation prompt.

use std::path::Path;
use std::process::Command;

use crate::error::{HostsError, Result};

/// Executes the privileged file-replacement unit.
///
/// Tests substitute this boundary with an in-process fake; production uses
/// [`OsascriptExecutor`].
pub trait PrivilegedExecutor: Send + Sync {
    /// Replaces `dest` with `staged`, fixes its permission bits to
    /// world-readable, and — when `flush_cache` is set — flushes the
    /// resolver cache and signals the multicast responder.
    ///
    /// The whole unit passes or fails as one; a failure means `dest` was
    /// not modified.
    ///
    /// # Errors
    ///
    /// Returns [`HostsError::Elevation`] when the prompt is cancelled or
    /// the shell command exits non-zero.
    fn replace_file(&self, staged: &Path, dest: &Path, flush_cache: bool) -> Result<()>;
}

/// Default executor.
///
/// Runs the commit through `osascript`'s
/// `do shell script … with administrator privileges`, which is what raises
/// the system elevation prompt. When the process is already root the
/// prompt is pointless, so the command runs through `sh -c` directly.
pub struct OsascriptExecutor;

impl PrivilegedExecutor for OsascriptExecutor {
    fn replace_file(&self, staged: &Path, dest: &Path, flush_cache: bool) -> Result<()> {
        let command = commit_command(staged, dest, flush_cache);

        let output = if is_root() {
            tracing::debug!("Running as root, skipping elevation prompt");
            Command::new("sh").args(["-c", &command]).output()
        } else {
            let script = format!(
                "do shell script \"{}\" with administrator privileges",
                command.replace('\\', "\\\\").replace('"', "\\\"")
            );
            Command::new("osascript").args(["-e", &script]).output()
        }
        .map_err(|e| HostsError::Elevation(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = if stderr.trim().is_empty() {
                output.status.to_string()
            } else {
                stderr.trim().to_string()
            };
            tracing::warn!(dest = %dest.display(), error = %message, "Elevated commit failed");
            return Err(HostsError::Elevation(message));
        }

        tracing::info!(
            dest = %dest.display(),
            flush_cache,
            "Committed hosts file"
        );
        Ok(())
    }
}

/// Builds the single shell unit executed under elevation.
///
/// ```text
/// cp '/tmp/hosts_temp_…' '/etc/hosts' && chmod 644 '/etc/hosts' \
///     && dscacheutil -flushcache && killall -HUP mDNSResponder
/// ```
fn commit_command(staged: &Path, dest: &Path, flush_cache: bool) -> String {
    let mut command = format!(
        "cp {staged} {dest} && chmod 644 {dest}",
        staged = shell_quote(staged),
        dest = shell_quote(dest),
    );
    if flush_cache {
        command.push_str(" && dscacheutil -flushcache && killall -HUP mDNSResponder");
    }
    command
}

/// Single-quotes a path for the shell, escaping embedded single quotes.
fn shell_quote(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', r"'\''"))
}

/// Checks whether the process already runs with root privileges.
fn is_root() -> bool {
    // SAFETY: `geteuid` reads the effective UID and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_command_without_flush() {
        let cmd = commit_command(Path::new("/tmp/staged"), Path::new("/etc/hosts"), false);
        assert_eq!(cmd, "cp '/tmp/staged' '/etc/hosts' && chmod 644 '/etc/hosts'");
    }

    #[test]
    fn commit_command_with_flush() {
        let cmd = commit_command(Path::new("/tmp/staged"), Path::new("/etc/hosts"), true);
        assert!(cmd.starts_with("cp '/tmp/staged' '/etc/hosts' && chmod 644 '/etc/hosts'"));
        assert!(cmd.ends_with("&& dscacheutil -flushcache && killall -HUP mDNSResponder"));
    }

    #[test]
    fn shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote(Path::new("/tmp/a b")), "'/tmp/a b'");
        assert_eq!(shell_quote(Path::new("/tmp/o'brien")), r"'/tmp/o'\''brien'");
    }

    #[test]
    fn is_root_matches_euid() {
        // SAFETY: same check the implementation performs.
        assert_eq!(is_root(), unsafe { libc::geteuid() } == 0);
    }
}
