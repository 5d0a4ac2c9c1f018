//! Config path resolution
//!
//! All paths hang off the warden base directory: `$WARDEN_HOME` when set,
//! otherwise the working directory of the process.

use std::path::{Path, PathBuf};

use super::{ConfigError, ConfigResult};

/// Environment variable overriding the base directory
pub const HOME_ENV: &str = "WARDEN_HOME";

/// Returns the warden base directory.
pub fn warden_base_dir() -> ConfigResult<PathBuf> {
    match std::env::var_os(HOME_ENV) {
        Some(home) if !home.is_empty() => Ok(PathBuf::from(home)),
        _ => std::env::current_dir().map_err(|_| ConfigError::NoConfigDirectory),
    }
}

/// Returns the base configs directory.
///
/// Path: `{base}/configs/`
pub fn configs_dir() -> ConfigResult<PathBuf> {
    Ok(warden_base_dir()?.join("configs"))
}

/// Returns the core config path.
///
/// Path: `{base}/configs/core.toml`
pub fn core_config_path() -> ConfigResult<PathBuf> {
    Ok(configs_dir()?.join("core.toml"))
}

/// Anchor a relative data path at `base`; absolute paths pass through
pub fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_paths_anchor_at_base() {
        let base = PathBuf::from("/srv/warden");

        assert_eq!(
            resolve_against(&base, Path::new("data")),
            PathBuf::from("/srv/warden/data")
        );
        assert_eq!(
            resolve_against(&base, Path::new("/var/lib/warden")),
            PathBuf::from("/var/lib/warden")
        );
    }

    #[test]
    fn test_core_config_path_format() {
        let path = core_config_path().unwrap();
        assert!(path.ends_with("configs/core.toml"));
    }
}
