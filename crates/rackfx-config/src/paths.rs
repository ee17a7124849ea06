//! Platform-specific paths for saved chains.
//!
//! # Directory Structure
//!
//! - **User config**: `~/.config/rackfx/` (Linux), `~/Library/Application Support/rackfx/` (macOS), `%APPDATA%\rackfx\` (Windows)
//! - **User chains**: the `chains/` subdirectory of the user config directory
//!
//! # Example
//!
//! ```rust,no_run
//! use rackfx_config::paths;
//!
//! let chains_dir = paths::user_chains_dir();
//! println!("Saved chains: {:?}", chains_dir);
//!
//! if let Some(path) = paths::find_chain("live_set") {
//!     println!("Found chain at: {:?}", path);
//! }
//! ```

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Application name used for directory paths.
const APP_NAME: &str = "rackfx";

/// Subdirectory name for saved chains.
const CHAINS_SUBDIR: &str = "chains";

/// Extensions recognised as chain documents, in lookup order.
const CHAIN_EXTENSIONS: [&str; 2] = ["toml", "json"];

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the directory saved chains live in.
pub fn user_chains_dir() -> PathBuf {
    user_config_dir().join(CHAINS_SUBDIR)
}

/// Ensure the user chains directory exists.
///
/// Creates the directory and any parent directories if they don't exist.
pub fn ensure_user_chains_dir() -> Result<PathBuf, ConfigError> {
    let dir = user_chains_dir();

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }

    Ok(dir)
}

/// Find a saved chain by name or path.
///
/// Searches in the following order:
/// 1. `name` as a path to an existing file
/// 2. The user chains directory, trying `.toml` then `.json`
pub fn find_chain(name: &str) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Some(path);
    }
    find_chain_in_dir(&user_chains_dir(), name)
}

fn find_chain_in_dir(dir: &Path, name: &str) -> Option<PathBuf> {
    let direct = dir.join(name);
    if direct.is_file() {
        return Some(direct);
    }
    CHAIN_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{name}.{ext}")))
        .find(|candidate| candidate.is_file())
}

/// List saved chain files in the user chains directory, sorted by path.
///
/// Returns an empty vector if the directory doesn't exist or can't be read.
pub fn list_user_chains() -> Vec<PathBuf> {
    list_chains_in_dir(&user_chains_dir())
}

/// List chain documents (`.toml` or `.json`) in `dir`, sorted by path.
pub fn list_chains_in_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut chains: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| CHAIN_EXTENSIONS.contains(&ext))
        })
        .collect();
    chains.sort();
    chains
}

/// Get the chain name from a file path (the file stem).
///
/// # Example
///
/// ```rust
/// use rackfx_config::paths::chain_name_from_path;
/// use std::path::Path;
///
/// let name = chain_name_from_path(Path::new("/path/to/live_set.toml"));
/// assert_eq!(name, Some("live_set".to_string()));
/// ```
pub fn chain_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_user_dirs_mention_app() {
        assert!(user_config_dir().to_string_lossy().contains("rackfx"));
        assert!(user_chains_dir().ends_with("chains"));
    }

    #[test]
    fn test_find_chain_by_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("set.toml");
        fs::write(&path, "version = 1").unwrap();

        assert_eq!(find_chain(path.to_str().unwrap()), Some(path));
    }

    #[test]
    fn test_find_chain_tries_extensions_in_order() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("set.json"), "{}").unwrap();
        assert_eq!(
            find_chain_in_dir(temp_dir.path(), "set"),
            Some(temp_dir.path().join("set.json"))
        );

        fs::write(temp_dir.path().join("set.toml"), "").unwrap();
        assert_eq!(
            find_chain_in_dir(temp_dir.path(), "set"),
            Some(temp_dir.path().join("set.toml"))
        );
    }

    #[test]
    fn test_find_chain_not_found() {
        assert!(find_chain("nonexistent_chain_12345").is_none());
    }

    #[test]
    fn test_list_chains_in_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.toml"), "").unwrap();
        fs::write(temp_dir.path().join("a.json"), "").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "").unwrap();

        let chains = list_chains_in_dir(temp_dir.path());
        assert_eq!(
            chains,
            vec![temp_dir.path().join("a.json"), temp_dir.path().join("b.toml")]
        );
    }

    #[test]
    fn test_list_chains_nonexistent_dir() {
        assert!(list_chains_in_dir(Path::new("/nonexistent/path/12345")).is_empty());
    }

    #[test]
    fn test_chain_name_from_path() {
        assert_eq!(
            chain_name_from_path(Path::new("simple.json")),
            Some("simple".to_string())
        );
    }
}
