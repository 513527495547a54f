use std::fmt::Write as _;

use crate::component::ComponentTypeId;
use crate::entity::Entity;
use crate::world::World;

/// World inspector for debugging
pub struct WorldInspector;

impl WorldInspector {
    /// Get live entity count
    pub fn entity_count(world: &World) -> usize {
        world.live_entity_count()
    }

    /// One entry per component store that has been created, in id order
    pub fn store_summary(world: &World) -> Vec<StoreInfo> {
        world
            .erased_stores()
            .map(|(id, store)| StoreInfo {
                id,
                type_name: store.type_name(),
                len: store.len(),
            })
            .collect()
    }

    /// Render the world summary as text
    pub fn summary(world: &World) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== World Summary ===");
        let _ = writeln!(
            out,
            "Entities: {} live / {} allocated / {} max",
            world.live_entity_count(),
            world.entity_count(),
            world.config().max_entities
        );
        let _ = writeln!(
            out,
            "Component types: {} / {}",
            world.registry().len(),
            world.config().max_components
        );
        for info in Self::store_summary(world) {
            let _ = writeln!(out, "  [{}] {}: {} values", info.id, info.type_name, info.len);
        }
        out
    }

    /// Print world summary to console
    pub fn print_summary(world: &World) {
        print!("{}", Self::summary(world));
    }

    /// Names of the component types an entity carries
    pub fn component_names(world: &World, entity: Entity) -> Vec<&'static str> {
        let Some(mask) = world.mask_of(entity) else {
            return Vec::new();
        };
        mask.ones()
            .filter_map(|id| world.registry().info(id))
            .map(|info| info.type_name)
            .collect()
    }
}

/// Store information for debugging
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreInfo {
    pub id: ComponentTypeId,
    pub type_name: &'static str,
    pub len: usize,
}
