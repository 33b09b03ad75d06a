//! Filesystem locations used by the toolchain manager.

use std::path::{Path, PathBuf};

/// Per-user product directory under the home directory.
pub const PRODUCT_DIR: &str = ".simpleiot";

/// Toolchain root inside the product directory. The leading underscore keeps
/// it apart from team directories that live next to it.
pub const TOOLCHAIN_DIR: &str = "_toolchain";

/// Current user's home directory.
pub fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

/// Default toolchain base: `~/.simpleiot/_toolchain`.
pub fn default_toolchain_base() -> Option<PathBuf> {
    home_dir().map(|home| toolchain_base_in(&home))
}

/// Toolchain base rooted at an explicit home directory.
pub fn toolchain_base_in(home: &Path) -> PathBuf {
    home.join(PRODUCT_DIR).join(TOOLCHAIN_DIR)
}

/// Expand a leading `~` to `home`. Other paths are returned unchanged.
pub fn expand_home(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) if rest.as_os_str().is_empty() => home.to_path_buf(),
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}
