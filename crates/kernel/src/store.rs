use crate::instance::RuntimeInstance;
use gamma_project::Scene;

/// Live instances of the running scene with a deferred spawn/destroy buffer.
///
/// The instance list is stable for the whole event pass; queued changes
/// become visible only after [`InstanceStore::apply_pending`].
#[derive(Debug, Clone, Default)]
pub struct InstanceStore {
    instances: Vec<RuntimeInstance>,
    pending_spawns: Vec<RuntimeInstance>,
    pending_destroys: Vec<String>,
}

impl InstanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything with fresh copies of the scene's templates.
    pub fn initialize(&mut self, scene: &Scene) {
        self.instances = scene
            .objects
            .iter()
            .map(RuntimeInstance::from_template)
            .collect();
        self.discard_pending();
    }

    /// Replace the live set wholesale (used by load).
    pub fn replace(&mut self, instances: Vec<RuntimeInstance>) {
        self.instances = instances;
        self.discard_pending();
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RuntimeInstance> {
        self.instances.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, RuntimeInstance> {
        self.instances.iter_mut()
    }

    pub fn as_slice(&self) -> &[RuntimeInstance] {
        &self.instances
    }

    pub fn get(&self, id: &str) -> Option<&RuntimeInstance> {
        self.instances.iter().find(|i| i.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut RuntimeInstance> {
        self.instances.iter_mut().find(|i| i.id() == id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.instances.iter().position(|i| i.id() == id)
    }

    /// Live instances sharing `name`, in store order.
    pub fn with_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a RuntimeInstance> {
        self.instances.iter().filter(move |i| i.name() == name)
    }

    pub fn queue_spawn(&mut self, instance: RuntimeInstance) {
        self.pending_spawns.push(instance);
    }

    pub fn queue_destroy(&mut self, id: impl Into<String>) {
        self.pending_destroys.push(id.into());
    }

    pub fn pending_spawn_count(&self) -> usize {
        self.pending_spawns.len()
    }

    pub fn pending_destroy_count(&self) -> usize {
        self.pending_destroys.len()
    }

    /// Apply queued destroys (deduplicated) then append queued spawns.
    /// Returns `(spawned, destroyed)`.
    pub fn apply_pending(&mut self) -> (usize, usize) {
        let mut destroyed = 0;
        if !self.pending_destroys.is_empty() {
            self.pending_destroys.sort();
            self.pending_destroys.dedup();
            let before = self.instances.len();
            let pending = &self.pending_destroys;
            self.instances
                .retain(|i| pending.binary_search_by(|id| id.as_str().cmp(i.id())).is_err());
            destroyed = before - self.instances.len();
            self.pending_destroys.clear();
        }

        let spawned = self.pending_spawns.len();
        self.instances.append(&mut self.pending_spawns);

        if spawned > 0 || destroyed > 0 {
            tracing::debug!(spawned, destroyed, live = self.instances.len(), "pending ops applied");
        }
        (spawned, destroyed)
    }

    pub fn discard_pending(&mut self) {
        self.pending_spawns.clear();
        self.pending_destroys.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scene() -> Scene {
        serde_json::from_value(json!({
            "id": "s",
            "objects": [
                {"id": "a", "name": "Rock", "type": "sprite"},
                {"id": "b", "name": "Rock", "type": "sprite"},
                {"id": "c", "name": "Ship", "type": "sprite"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn initialize_copies_templates() {
        let mut store = InstanceStore::new();
        store.initialize(&scene());
        assert_eq!(store.len(), 3);
        assert_eq!(store.with_name("Rock").count(), 2);
        assert_eq!(store.index_of("c"), Some(2));
    }

    #[test]
    fn queued_ops_wait_for_apply() {
        let s = scene();
        let mut store = InstanceStore::new();
        store.initialize(&s);
        store.queue_destroy("a");
        store.queue_destroy("a");
        store.queue_spawn(RuntimeInstance::spawn(&s.objects[2]));
        assert_eq!(store.len(), 3);
        assert!(store.get("a").is_some());
        assert_eq!(store.pending_spawn_count(), 1);
        assert_eq!(store.pending_destroy_count(), 2);

        let (spawned, destroyed) = store.apply_pending();
        assert_eq!((spawned, destroyed), (1, 1));
        assert_eq!(store.len(), 3);
        assert!(store.get("a").is_none());
        assert_eq!(store.with_name("Ship").count(), 2);
        assert_eq!(store.pending_destroy_count(), 0);
        assert_eq!(store.pending_spawn_count(), 0);
    }

    #[test]
    fn destroying_unknown_id_is_harmless() {
        let mut store = InstanceStore::new();
        store.initialize(&scene());
        store.queue_destroy("ghost");
        assert_eq!(store.apply_pending(), (0, 0));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn discard_drops_everything_queued() {
        let s = scene();
        let mut store = InstanceStore::new();
        store.initialize(&s);
        store.queue_destroy("a");
        store.queue_spawn(RuntimeInstance::spawn(&s.objects[0]));
        store.discard_pending();
        assert_eq!(store.apply_pending(), (0, 0));
        assert!(store.get("a").is_some());
    }
}
