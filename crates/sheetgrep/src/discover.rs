//! Spreadsheet file discovery

use std::env;
use std::io;
use std::path::{Component, Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::error::{Result, SearchError};

/// File extensions searched, matched case-sensitively
pub const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xls", "xlsx", "xlsm", "xlt", "xltx"];

/// Whether the file name ends in one of [`SPREADSHEET_EXTENSIONS`].
///
/// The extension is everything after the last `.`, so a bare `.xlsx` counts.
pub fn is_spreadsheet_file(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .and_then(|name| {
            name.rsplit_once('.')
                .map(|(_, ext)| SPREADSHEET_EXTENSIONS.contains(&ext))
        })
        .unwrap_or(false)
}

/// Make `path` absolute against the working directory and drop `.`/`..`
/// components lexically.
///
/// Symbolic links are not resolved: a file reached through a linked
/// directory keeps the path it was walked under.
pub fn absolute_path(path: &Path) -> io::Result<PathBuf> {
    let joined;
    let path = if path.is_absolute() {
        path
    } else {
        joined = env::current_dir()?.join(path);
        &joined
    };

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if normalized.parent().is_some() {
                    normalized.pop();
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

/// Expand `roots` into absolute spreadsheet file paths.
///
/// Directories are read one level deep, or fully when `recursive` is set.
/// Symbolic links are followed. Roots are walked in the order given and the
/// result is not sorted or deduplicated. Any walk error aborts discovery.
pub fn discover_files<P: AsRef<Path>>(roots: &[P], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for root in roots {
        let root = root.as_ref();
        debug!("walking {} (recursive: {})", root.display(), recursive);

        let mut walker = WalkDir::new(root).follow_links(true);
        if !recursive {
            walker = walker.max_depth(1);
        }

        for entry in walker {
            let entry = entry.map_err(|source| SearchError::Discovery {
                root: root.to_path_buf(),
                source,
            })?;

            if !entry.file_type().is_file() || !is_spreadsheet_file(entry.path()) {
                continue;
            }

            let path = absolute_path(entry.path()).map_err(|source| SearchError::Absolute {
                path: entry.path().to_path_buf(),
                source,
            })?;
            files.push(path);
        }
    }

    debug!("discovered {} spreadsheet file(s)", files.len());
    Ok(files)
}
