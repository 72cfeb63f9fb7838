//! REPL session management for persistent state across evaluations.
//!
//! `ReplSession` owns an isolated interpreter context and a persistent
//! interactive global frame. The rustyline editor helper (completion,
//! validation, highlighting) lives behind the `repl` cargo feature so the
//! library builds without a terminal dependency.

mod session;

pub use session::{ReplResult, ReplSession};

#[cfg(feature = "repl")]
pub mod editor;

#[cfg(feature = "repl")]
pub use editor::BraidHelper;

use std::path::PathBuf;

/// Resolve the history file location.
///
/// `BRAID_HISTORY` overrides; otherwise the platform config directory
/// (`$XDG_CONFIG_HOME`/`$HOME/.config` or `%APPDATA%`) under `braid/`.
pub fn history_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("BRAID_HISTORY") {
        return Some(PathBuf::from(path));
    }
    config_dir().map(|dir| dir.join("history.txt"))
}

fn config_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg).join("braid"));
    }
    if let Some(home) = std::env::var_os("HOME") {
        return Some(PathBuf::from(home).join(".config").join("braid"));
    }
    if let Some(appdata) = std::env::var_os("APPDATA") {
        return Some(PathBuf::from(appdata).join("braid"));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_path_env_override() {
        // Env mutation is process-global; restore afterwards.
        let saved = std::env::var_os("BRAID_HISTORY");
        std::env::set_var("BRAID_HISTORY", "/tmp/braid-test-history");
        assert_eq!(
            history_path(),
            Some(PathBuf::from("/tmp/braid-test-history"))
        );
        match saved {
            Some(v) => std::env::set_var("BRAID_HISTORY", v),
            None => std::env::remove_var("BRAID_HISTORY"),
        }
    }
}
