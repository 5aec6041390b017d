//! Backend registry - registration, probing and auto-detection
//!
//! The registry is an explicit object constructed once at process start and
//! passed by reference to any code that needs to create or query backends.
//! There is no hidden global: one-registry-per-process is a convention of
//! the caller, not of this module.

use rustc_hash::FxHashMap;

use crate::backend::RenderBackend;
use crate::render_info;

/// Constructor for a registered backend
///
/// Construction is infallible at the registry level: the constructor
/// returns an uninitialized backend, and failure to set up the native API
/// is reported later via `is_initialized() == false`.
pub type BackendConstructor = Box<dyn Fn() -> Box<dyn RenderBackend>>;

/// Probe deciding whether a backend can run on this machine
pub type AvailabilityProbe = Box<dyn Fn() -> bool>;

/// Identifier returned when no registered probe succeeds (the most
/// portable backend)
pub const DEFAULT_BACKEND: &str = "opengl";

struct RegistryEntry {
    id: &'static str,
    constructor: BackendConstructor,
    probe: AvailabilityProbe,
    priority: i32,
}

/// Registry of backend constructors and availability probes
pub struct BackendRegistry {
    /// Entries in registration order (the documented tie-breaker)
    entries: Vec<RegistryEntry>,
    /// Id lookup into `entries`
    index: FxHashMap<&'static str, usize>,
}

impl BackendRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Register a backend
    ///
    /// Re-registering an existing id replaces its entry but keeps its
    /// original position in the tie-break order.
    pub fn register<C, P>(&mut self, id: &'static str, constructor: C, probe: P, priority: i32)
    where
        C: Fn() -> Box<dyn RenderBackend> + 'static,
        P: Fn() -> bool + 'static,
    {
        let entry = RegistryEntry {
            id,
            constructor: Box::new(constructor),
            probe: Box::new(probe),
            priority,
        };
        if let Some(&pos) = self.index.get(id) {
            self.entries[pos] = entry;
        } else {
            self.index.insert(id, self.entries.len());
            self.entries.push(entry);
        }
        render_info!("helios::registry", "Registered backend '{}' (priority {})", id, priority);
    }

    /// Construct the backend registered under `id`
    ///
    /// Returns `None` for an unregistered id; never panics. The returned
    /// backend is uninitialized.
    pub fn create(&self, id: &str) -> Option<Box<dyn RenderBackend>> {
        self.index.get(id).map(|&pos| (self.entries[pos].constructor)())
    }

    /// Whether `id` is registered and its probe succeeds
    pub fn is_backend_available(&self, id: &str) -> bool {
        self.index
            .get(id)
            .map(|&pos| (self.entries[pos].probe)())
            .unwrap_or(false)
    }

    /// Ids of all registered backends whose probe succeeds
    pub fn available_backends(&self) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|e| (e.probe)())
            .map(|e| e.id)
            .collect()
    }

    /// Highest-priority backend whose probe succeeds
    ///
    /// Ties are broken by registration order. When no probe succeeds the
    /// fixed default is returned rather than failing, so callers always
    /// get a usable identifier.
    pub fn detect_best_backend(&self) -> &'static str {
        let mut best: Option<&RegistryEntry> = None;
        for entry in &self.entries {
            if !(entry.probe)() {
                continue;
            }
            match best {
                Some(b) if b.priority >= entry.priority => {}
                _ => best = Some(entry),
            }
        }
        best.map(|e| e.id).unwrap_or(DEFAULT_BACKEND)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Startup input from the configuration collaborator
///
/// Consumed once, before `BackendRegistry::create` or
/// `detect_best_backend` is called.
#[derive(Debug, Clone, Default)]
pub struct BackendSelection {
    /// Preferred backend identifier, if the user expressed one
    pub preferred: Option<String>,
    /// Use the preferred backend even when its probe fails
    pub force: bool,
}

/// Resolve the configured selection against the registry
pub fn select_backend(registry: &BackendRegistry, selection: &BackendSelection) -> String {
    if let Some(preferred) = &selection.preferred {
        if selection.force {
            render_info!("helios::registry", "Backend '{}' forced by configuration", preferred);
            return preferred.clone();
        }
        if registry.is_backend_available(preferred) {
            return preferred.clone();
        }
        render_info!(
            "helios::registry",
            "Preferred backend '{}' unavailable, falling back to auto-detection",
            preferred
        );
    }
    registry.detect_best_backend().to_string()
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
