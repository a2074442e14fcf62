use crate::engine::EngineInstance;

use models::InstanceId;

use std::collections::HashMap;
use std::fmt::{Debug, Formatter, Result as FormatResult};
use std::sync::{Arc, PoisonError, RwLock};

pub type SharedInstance = Arc<dyn EngineInstance>;

/// Id to engine instance map shared between the host and the engine.
///
/// Clones point at the same map. The host is the only writer; the engine
/// reads it to resolve ids it receives on its own, without going through
/// the host API.
#[derive(Clone, Default)]
pub struct InstanceRegistry {
    servers: Arc<RwLock<HashMap<InstanceId, SharedInstance>>>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the instance previously stored under `id`, if any.
    pub fn insert(&self, id: InstanceId, instance: SharedInstance) -> Option<SharedInstance> {
        self.servers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, instance)
    }

    pub fn remove(&self, id: InstanceId) -> Option<SharedInstance> {
        self.servers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
    }

    pub fn get(&self, id: InstanceId) -> Option<SharedInstance> {
        self.servers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.servers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.servers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> Vec<InstanceId> {
        let mut ids: Vec<InstanceId> = self
            .servers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        ids.sort();
        ids
    }

    /// Every registered instance, ordered by id.
    pub fn snapshot(&self) -> Vec<SharedInstance> {
        self.ids()
            .into_iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    pub fn clear(&self) {
        self.servers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// True if both handles point at the same map.
    pub fn same_map(&self, other: &InstanceRegistry) -> bool {
        Arc::ptr_eq(&self.servers, &other.servers)
    }
}

impl Debug for InstanceRegistry {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter
            .debug_struct("InstanceRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}
