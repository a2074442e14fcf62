// Unit tests for the shared id -> instance map

use crate::engine::local::LocalInstance;
use crate::registry::InstanceRegistry;

use models::InstanceId;

use std::sync::Arc;

fn id(value: i64) -> InstanceId {
    InstanceId::new(value).unwrap()
}

/// **VALUE**: Verifies that clones share one map.
///
/// **WHY THIS MATTERS**: The engine gets a clone at startup and resolves ids
/// through it later. If clones were deep copies, the engine would never see
/// servers created after startup.
#[test]
fn given_cloned_registry_when_inserting_through_host_side_then_clone_sees_it() {
    // GIVEN: A registry and a clone handed to "the engine"
    let registry = InstanceRegistry::new();
    let engine_view = registry.clone();

    // WHEN: Inserting through the host side
    registry.insert(id(1), Arc::new(LocalInstance::new(id(1))));

    // THEN: The clone resolves the id
    assert!(engine_view.contains(id(1)));
    assert_eq!(engine_view.get(id(1)).unwrap().id(), id(1));
    assert!(registry.same_map(&engine_view));
    assert!(!registry.same_map(&InstanceRegistry::new()));
}

/// **VALUE**: Verifies removal, ordering of ids and clearing.
#[test]
fn given_several_instances_when_removing_and_clearing_then_contents_track() {
    let registry = InstanceRegistry::new();
    for value in [3, 1, 2] {
        registry.insert(id(value), Arc::new(LocalInstance::new(id(value))));
    }

    assert_eq!(registry.ids(), vec![id(1), id(2), id(3)]);
    assert_eq!(
        registry
            .snapshot()
            .iter()
            .map(|instance| instance.id())
            .collect::<Vec<_>>(),
        vec![id(1), id(2), id(3)]
    );

    let removed = registry.remove(id(2)).unwrap();
    assert_eq!(removed.id(), id(2));
    assert!(registry.remove(id(2)).is_none());
    assert_eq!(registry.len(), 2);

    registry.clear();
    assert!(registry.is_empty());
}
