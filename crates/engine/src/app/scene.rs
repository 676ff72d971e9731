use super::clock::SimClock;
use super::feedback::FeedbackRequest;
use super::input::InputSnapshot;
use super::transform::Transform;
use crate::collision::Collider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    /// Tear the level down and build it again from scratch.
    HardReset,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub transform: Transform,
    pub collider: Option<Collider>,
    /// Disabled entities stay registered but are invisible to collision queries.
    pub enabled: bool,
    pub debug_name: &'static str,
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Registry of every live entity in a level.
///
/// Spawns and despawns are deferred until `apply_pending`, so systems running
/// inside a tick all see the same set of entities. Ids are never reused, even
/// across `clear`.
#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    pending_despawns: Vec<EntityId>,
}

impl SceneWorld {
    pub fn spawn(
        &mut self,
        transform: Transform,
        collider: Option<Collider>,
        debug_name: &'static str,
    ) -> EntityId {
        self.spawn_internal(transform, collider, debug_name, true)
    }

    pub fn spawn_disabled(
        &mut self,
        transform: Transform,
        collider: Option<Collider>,
        debug_name: &'static str,
    ) -> EntityId {
        self.spawn_internal(transform, collider, debug_name, false)
    }

    fn spawn_internal(
        &mut self,
        transform: Transform,
        collider: Option<Collider>,
        debug_name: &'static str,
        enabled: bool,
    ) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            transform,
            collider,
            enabled,
            debug_name,
        });
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let exists_now = self.entities.iter().any(|entity| entity.id == id);
        let pending_spawn = self.pending_spawns.iter().any(|entity| entity.id == id);
        if !exists_now && !pending_spawn {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    /// Commits queued spawns in spawn order, then queued despawns.
    pub fn apply_pending(&mut self) {
        self.entities.append(&mut self.pending_spawns);
        if self.pending_despawns.is_empty() {
            return;
        }
        self.pending_despawns.sort_unstable();
        self.pending_despawns.dedup();
        let doomed = std::mem::take(&mut self.pending_despawns);
        self.entities
            .retain(|entity| doomed.binary_search(&entity.id).is_err());
    }

    /// Drops every entity, applied or pending. The id allocator keeps counting.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending_spawns.clear();
        self.pending_despawns.clear();
    }

    /// True while the entity exists and has not been scheduled for despawn.
    pub fn is_alive(&self, id: EntityId) -> bool {
        if self.pending_despawns.contains(&id) {
            return false;
        }
        self.entities.iter().any(|entity| entity.id == id)
            || self.pending_spawns.iter().any(|entity| entity.id == id)
    }

    pub fn set_enabled(&mut self, id: EntityId, enabled: bool) -> bool {
        match self.find_entity_mut(id) {
            Some(entity) => {
                entity.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn transform_of(&self, id: EntityId) -> Option<Transform> {
        self.find_entity(id).map(|entity| entity.transform)
    }

    pub fn set_transform(&mut self, id: EntityId, transform: Transform) -> bool {
        match self.find_entity_mut(id) {
            Some(entity) => {
                entity.transform = transform;
                true
            }
            None => false,
        }
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(
        &mut self,
        clock: &SimClock,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn unload(&mut self, world: &mut SceneWorld);
    /// Hands over side-effect requests queued during the last tick.
    fn drain_feedback(&mut self, _out: &mut Vec<FeedbackRequest>) {}
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

/// Owns one scene and its world, and knows how to rebuild both.
pub struct SceneRuntime {
    scene: Box<dyn Scene>,
    world: SceneWorld,
    is_loaded: bool,
}

impl SceneRuntime {
    pub fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            world: SceneWorld::default(),
            is_loaded: false,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.is_loaded
    }

    pub fn load(&mut self) {
        if self.is_loaded {
            return;
        }
        self.scene.load(&mut self.world);
        self.world.apply_pending();
        self.is_loaded = true;
    }

    pub fn update(&mut self, clock: &SimClock, input: &InputSnapshot) -> SceneCommand {
        let command = self.scene.update(clock, input, &mut self.world);
        self.world.apply_pending();
        command
    }

    pub fn hard_reset(&mut self) {
        if self.is_loaded {
            self.scene.unload(&mut self.world);
        }
        self.world.clear();
        self.scene.load(&mut self.world);
        self.world.apply_pending();
        self.is_loaded = true;
    }

    pub fn shutdown(&mut self) {
        if self.is_loaded {
            self.scene.unload(&mut self.world);
            self.world.clear();
            self.is_loaded = false;
        }
    }

    pub fn drain_feedback(&mut self, out: &mut Vec<FeedbackRequest>) {
        self.scene.drain_feedback(out);
    }

    pub fn debug_title(&self) -> Option<String> {
        self.scene.debug_title(&self.world)
    }

    pub fn world(&self) -> &SceneWorld {
        &self.world
    }
}
