//! Type-keyed service locator

use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Registry of shared auxiliary services, keyed by their type
///
/// Used to reach target-finder stores and collection type resolvers both
/// while compiling and while executing mappings. Reads take a shared lock;
/// registration is expected at startup.
#[derive(Default)]
pub struct InstanceRegistry {
    services: RwLock<HashMap<TypeId, Vec<Arc<dyn Any + Send + Sync>>>>,
}

impl InstanceRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an instance of `T`; later registrations shadow earlier ones
    /// for [`resolve`](Self::resolve)
    pub fn register<T: Any + Send + Sync>(&self, instance: Arc<T>) {
        self.services
            .write()
            .entry(TypeId::of::<T>())
            .or_default()
            .push(instance);
    }

    /// Most recently registered instance of `T`
    #[must_use]
    pub fn resolve<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let services = self.services.read();
        let latest = services.get(&TypeId::of::<T>())?.last()?.clone();
        latest.downcast::<T>().ok()
    }

    /// Every registered instance of `T`, in registration order
    #[must_use]
    pub fn resolve_all<T: Any + Send + Sync>(&self) -> Vec<Arc<T>> {
        self.services
            .read()
            .get(&TypeId::of::<T>())
            .map(|all| {
                all.iter()
                    .filter_map(|s| Arc::clone(s).downcast::<T>().ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether any instance of `T` is registered
    #[must_use]
    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.services
            .read()
            .get(&TypeId::of::<T>())
            .is_some_and(|all| !all.is_empty())
    }
}

impl fmt::Debug for InstanceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let services = self.services.read();
        f.debug_struct("InstanceRegistry")
            .field("service_types", &services.len())
            .finish()
    }
}
