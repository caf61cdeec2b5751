use crate::config::ShellConfig;
use crate::path::PathResolver;
use anyhow::Result;
use log::warn;
use std::collections::HashMap;
use std::env as stdenv;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Mutable, per-session state shared by every command the shell runs.
///
/// The environment contains:
/// - `vars`: a snapshot of environment variables, handed to spawned programs.
///   Values need not be valid UTF-8.
/// - the current working directory, changed only through [`Environment::change_dir`]
///   or [`Environment::set_current_dir`]. The process-wide working directory is
///   never touched.
/// - the [`PathResolver`] used to find external programs, built from `PATH`.
pub struct Environment {
    vars: HashMap<OsString, OsString>,
    current_dir: PathBuf,
    resolver: PathResolver,
    config: ShellConfig,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    pub fn new(config: ShellConfig) -> Self {
        let vars = stdenv::vars_os();
        let current_dir = startup_dir(stdenv::current_dir());
        Self::from_parts(vars, current_dir, config)
    }

    /// Build an environment from explicit variables and working directory.
    pub fn from_parts<K, V>(
        vars: impl IntoIterator<Item = (K, V)>,
        current_dir: PathBuf,
        config: ShellConfig,
    ) -> Self
    where
        K: Into<OsString>,
        V: Into<OsString>,
    {
        let vars: HashMap<OsString, OsString> = vars
            .into_iter()
            .map(|(key, val)| (key.into(), val.into()))
            .collect();
        let resolver = build_resolver(&vars, &config);
        Self {
            vars,
            current_dir,
            resolver,
            config,
        }
    }

    /// Get the value of an environment variable.
    pub fn get_var(&self, key: &str) -> Option<&OsStr> {
        self.vars.get(OsStr::new(key)).map(OsString::as_os_str)
    }

    /// Set or override an environment variable.
    ///
    /// Changing `PATH` starts over with a fresh resolver and empty caches.
    pub fn set_var(&mut self, key: impl Into<OsString>, val: impl Into<OsString>) {
        let key = key.into();
        let rebuild = key == "PATH";
        self.vars.insert(key, val.into());
        if rebuild {
            self.resolver = build_resolver(&self.vars, &self.config);
        }
    }

    /// All variables, as passed to spawned programs.
    pub fn vars(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    pub fn set_current_dir(&mut self, dir: PathBuf) {
        self.current_dir = dir;
    }

    /// The user's home directory: `HOME`, or the platform default when unset.
    pub fn home_dir(&self) -> Option<PathBuf> {
        match self.get_var("HOME") {
            Some(home) if !home.is_empty() => Some(PathBuf::from(home)),
            _ => dirs::home_dir(),
        }
    }

    /// Change the working directory the way `cd` does.
    ///
    /// A leading `~` is replaced by the home directory. Relative targets are
    /// resolved against the current directory, then symlinks are resolved.
    /// Fails with `NotFound` for a missing target and `NotADirectory` for a
    /// target that is not a directory; the current directory is left as is.
    pub fn change_dir(&mut self, target: &str) -> io::Result<()> {
        let target = self.expand_tilde(target)?;
        let canonical = fs::canonicalize(self.current_dir.join(target))?;
        if !canonical.is_dir() {
            return Err(io::Error::from(io::ErrorKind::NotADirectory));
        }
        self.current_dir = canonical;
        Ok(())
    }

    /// Look up an external program by the name the user typed.
    pub fn find_executable(&mut self, name: &str) -> Result<Option<PathBuf>> {
        self.resolver.resolve(name, &self.current_dir)
    }

    fn expand_tilde(&self, target: &str) -> io::Result<PathBuf> {
        let Some(rest) = target.strip_prefix('~') else {
            return Ok(PathBuf::from(target));
        };
        let home = self
            .home_dir()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "HOME not set"))?;
        let mut expanded = OsString::from(home);
        expanded.push(rest);
        Ok(PathBuf::from(expanded))
    }
}

/// Working directory to start in; an unreadable one falls back to the root.
fn startup_dir(current: io::Result<PathBuf>) -> PathBuf {
    current.unwrap_or_else(|err| {
        warn!("cannot read the working directory ({}), starting in /", err);
        PathBuf::from("/")
    })
}

fn build_resolver(vars: &HashMap<OsString, OsString>, config: &ShellConfig) -> PathResolver {
    let search_paths = vars
        .get(OsStr::new("PATH"))
        .map(OsString::as_os_str)
        .unwrap_or_default();
    PathResolver::new(
        search_paths,
        config.dir_cache_capacity,
        config.name_cache_capacity,
    )
}
