pub mod show;
pub mod start;

use std::io;
use std::path::Path;

/// Create the parent directory of an output path when it has one.
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
