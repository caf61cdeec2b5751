//! Executable lookup over the directories listed in `PATH`.

use anyhow::{Context, Result};
use log::{debug, trace};
use lru::LruCache;
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Resolves command names to executables, remembering what it has seen.
///
/// Two bounded LRU caches back the lookup: one holds the entry names of every
/// listed directory, the other maps command names to the executable found for
/// them. Cached entries live for the whole session; a program removed after
/// it was first resolved keeps resolving to its old path.
pub struct PathResolver {
    directories: Vec<PathBuf>,
    listings: LruCache<PathBuf, HashSet<OsString>>,
    resolved: LruCache<String, PathBuf>,
}

impl PathResolver {
    /// Build a resolver for a `PATH`-style value, split with the platform separator.
    ///
    /// Empty entries are ignored.
    pub fn new(
        search_paths: &OsStr,
        dir_capacity: NonZeroUsize,
        name_capacity: NonZeroUsize,
    ) -> Self {
        Self {
            directories: std::env::split_paths(search_paths)
                .filter(|dir| !dir.as_os_str().is_empty())
                .collect(),
            listings: LruCache::new(dir_capacity),
            resolved: LruCache::new(name_capacity),
        }
    }

    /// Directories searched, in `PATH` order.
    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// Resolve a command name the way a typical shell would.
    ///
    /// - Empty name: `None`.
    /// - Name with a path separator (`/bin/sh`, `./run`, `bin/tool`): taken as
    ///   a path relative to `current_dir` (or as-is when absolute) and returned
    ///   if it is an executable file. Not cached.
    /// - Bare name: the first `PATH` directory holding an executable file of
    ///   that name wins; earlier directories shadow later ones.
    ///
    /// Missing `PATH` directories count as empty. Any other failure to list a
    /// directory is returned as an error.
    pub fn resolve(&mut self, name: &str, current_dir: &Path) -> Result<Option<PathBuf>> {
        if name.is_empty() {
            return Ok(None);
        }

        if name.contains(std::path::MAIN_SEPARATOR) {
            let candidate = current_dir.join(name);
            return Ok(is_executable(&candidate).then_some(candidate));
        }

        if let Some(path) = self.resolved.get(name) {
            trace!("path cache hit: {} -> {}", name, path.display());
            return Ok(Some(path.clone()));
        }

        for dir in &self.directories {
            let dir = current_dir.join(dir);
            let entries = self
                .listings
                .try_get_or_insert(dir.clone(), || read_listing(&dir))
                .with_context(|| format!("cannot list PATH directory {}", dir.display()))?;

            if !entries.contains(OsStr::new(name)) {
                continue;
            }

            let candidate = dir.join(name);
            if is_executable(&candidate) {
                debug!("resolved {} to {}", name, candidate.display());
                self.resolved.put(name.to_string(), candidate.clone());
                return Ok(Some(candidate));
            }
        }

        Ok(None)
    }
}

fn read_listing(dir: &Path) -> io::Result<HashSet<OsString>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            trace!("skipping missing PATH directory {}", dir.display());
            return Ok(HashSet::new());
        }
        Err(e) => return Err(e),
    };
    entries.map(|entry| entry.map(|e| e.file_name())).collect()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match fs::metadata(path) {
        Ok(metadata) => metadata.is_file() && metadata.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
