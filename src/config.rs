use std::num::NonZeroUsize;

/// Default number of directory listings kept by the resolver.
pub const DEFAULT_DIR_CACHE_CAPACITY: NonZeroUsize = NonZeroUsize::new(64).unwrap();
/// Default number of resolved command names kept by the resolver.
pub const DEFAULT_NAME_CACHE_CAPACITY: NonZeroUsize = NonZeroUsize::new(256).unwrap();

/// Startup settings of a shell session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellConfig {
    /// How many `PATH` directory listings the resolver remembers.
    pub dir_cache_capacity: NonZeroUsize,
    /// How many command name lookups the resolver remembers.
    pub name_cache_capacity: NonZeroUsize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            dir_cache_capacity: DEFAULT_DIR_CACHE_CAPACITY,
            name_cache_capacity: DEFAULT_NAME_CACHE_CAPACITY,
        }
    }
}
