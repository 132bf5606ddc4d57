//! Process-wide memoized hostname.

use std::sync::OnceLock;

use thiserror::Error;

/// Why the hostname could not be resolved.
#[derive(Debug, Error)]
pub enum HostnameError {
    #[error("hostname lookup failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("hostname is not valid UTF-8: {0}")]
    NotUtf8(String),
}

type Resolver = Box<dyn Fn() -> Result<String, HostnameError> + Send + Sync>;

/// Resolves the hostname on first use and hands out the cached value after.
///
/// Concurrent first callers block on a single resolution, so the resolver
/// runs at most once. A failed resolution is logged and cached as an empty
/// string.
pub struct HostnameCache {
    value: OnceLock<String>,
    resolver: Resolver,
}

impl HostnameCache {
    /// Cache backed by the system hostname.
    pub fn new() -> Self {
        Self::with_resolver(resolve_system_hostname)
    }

    /// Cache backed by a custom resolver.
    pub fn with_resolver<F>(resolver: F) -> Self
    where
        F: Fn() -> Result<String, HostnameError> + Send + Sync + 'static,
    {
        Self {
            value: OnceLock::new(),
            resolver: Box::new(resolver),
        }
    }

    /// The hostname, resolving it if this is the first call.
    pub fn get(&self) -> &str {
        self.value.get_or_init(|| match (self.resolver)() {
            Ok(name) => {
                tracing::debug!(hostname = %name, "Resolved hostname");
                name
            }
            Err(e) => {
                tracing::warn!(error = %e, "Hostname resolution failed, reporting empty hostname");
                String::new()
            }
        })
    }

    /// Whether the first resolution already happened.
    pub fn is_resolved(&self) -> bool {
        self.value.get().is_some()
    }
}

impl Default for HostnameCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HostnameCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostnameCache")
            .field("value", &self.value.get())
            .finish_non_exhaustive()
    }
}

/// Look up the hostname of this machine.
pub fn resolve_system_hostname() -> Result<String, HostnameError> {
    ::hostname::get()?
        .into_string()
        .map_err(|raw| HostnameError::NotUtf8(raw.to_string_lossy().into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_resolves_once_across_threads() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let cache = Arc::new(HostnameCache::with_resolver(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            Ok("node-1".to_string())
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || cache.get().to_string())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), "node-1");
        }
        assert_eq!(cache.get(), "node-1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failure_yields_empty_hostname() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let cache = HostnameCache::with_resolver(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(HostnameError::NotUtf8("\u{fffd}".to_string()))
        });

        assert!(!cache.is_resolved());
        assert_eq!(cache.get(), "");
        assert_eq!(cache.get(), "");
        assert!(cache.is_resolved());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn system_hostname_is_cached() {
        let cache = HostnameCache::new();
        let first = cache.get().to_string();
        assert_eq!(cache.get(), first);
    }
}
