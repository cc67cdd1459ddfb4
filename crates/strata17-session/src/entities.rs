use std::collections::HashMap;
use strata17_types::Entity;

/// Sparse map from server-assigned entity id to the client's local record. Entity
/// ids are allocated by the server and have no relation to array indices, so a
/// hash map is the natural fit rather than a dense `Vec`.
#[derive(Debug, Default)]
pub struct EntityTable {
    entities: HashMap<i32, Entity>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: Entity) {
        self.entities.insert(entity.eid, entity);
    }

    pub fn get(&self, eid: i32) -> Option<&Entity> {
        self.entities.get(&eid)
    }

    pub fn get_mut(&mut self, eid: i32) -> Option<&mut Entity> {
        self.entities.get_mut(&eid)
    }

    pub fn remove(&mut self, eid: i32) -> Option<Entity> {
        self.entities.remove(&eid)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata17_types::EntityKind;

    #[test]
    fn insert_and_fetch() {
        let mut table = EntityTable::new();
        table.insert(Entity::new(7, EntityKind::Mob, 1.0, 2.0, 3.0));
        assert_eq!(table.get(7).unwrap().kind, EntityKind::Mob);
        assert!(table.get(8).is_none());
    }

    #[test]
    fn destroy_removes() {
        let mut table = EntityTable::new();
        table.insert(Entity::new(1, EntityKind::Player, 0.0, 0.0, 0.0));
        assert_eq!(table.len(), 1);
        table.remove(1);
        assert!(table.is_empty());
    }

    #[test]
    fn relative_move_applies_through_get_mut() {
        let mut table = EntityTable::new();
        table.insert(Entity::new(2, EntityKind::Pickup, 0.0, 0.0, 0.0));
        table.get_mut(2).unwrap().apply_rel_move(32, 0, 0);
        assert_eq!(table.get(2).unwrap().x, 1.0);
    }
}
