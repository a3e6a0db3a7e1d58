use gamma_project::{Behavior, BehaviorKind, GameObject};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Playback cursor of the current sprite animation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationState {
    pub frame_index: usize,
    pub frame_time: f64,
}

/// Per-instance mutable state of one attached behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum BehaviorState {
    TopDownMovement { vx: f64, vy: f64 },
    Bullet { elapsed: f64 },
    Turret { cooldown: f64 },
    Health { current: f64 },
}

impl BehaviorState {
    /// Fresh state for a behavior; `None` for stateless behaviors.
    pub fn fresh(behavior: &Behavior) -> Option<Self> {
        match behavior {
            Behavior::TopDownMovement { .. } => Some(Self::TopDownMovement { vx: 0.0, vy: 0.0 }),
            Behavior::Bullet { .. } => Some(Self::Bullet { elapsed: 0.0 }),
            Behavior::Turret { .. } => Some(Self::Turret { cooldown: 0.0 }),
            Behavior::Health { max_health, .. } => Some(Self::Health {
                current: *max_health,
            }),
            Behavior::RotateTowardsMouse { .. } | Behavior::Button => None,
        }
    }
}

/// A live object in the running scene: a private copy of its template plus
/// runtime state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeInstance {
    pub object: GameObject,
    #[serde(default)]
    pub animation: AnimationState,
    #[serde(default)]
    pub behavior_state: BTreeMap<BehaviorKind, BehaviorState>,
}

impl RuntimeInstance {
    /// Deep-copy a template with fresh behavior state.
    pub fn from_template(template: &GameObject) -> Self {
        let behavior_state = template
            .behaviors
            .iter()
            .filter_map(|b| BehaviorState::fresh(b).map(|s| (b.kind(), s)))
            .collect();
        Self {
            object: template.clone(),
            animation: AnimationState::default(),
            behavior_state,
        }
    }

    /// Spawn a copy of `template` under a fresh `runtime_<name>_<uuid>` id.
    pub fn spawn(template: &GameObject) -> Self {
        let mut instance = Self::from_template(template);
        instance.object.id = format!(
            "runtime_{}_{}",
            template.name,
            uuid::Uuid::new_v4().simple()
        );
        instance
    }

    pub fn id(&self) -> &str {
        &self.object.id
    }

    pub fn name(&self) -> &str {
        &self.object.name
    }

    pub fn center(&self) -> DVec2 {
        self.object.center()
    }

    /// Current health, if the instance has a health behavior.
    pub fn health(&self) -> Option<f64> {
        match self.behavior_state.get(&BehaviorKind::Health) {
            Some(BehaviorState::Health { current }) => Some(*current),
            _ => None,
        }
    }

    pub fn health_mut(&mut self) -> Option<&mut f64> {
        match self.behavior_state.get_mut(&BehaviorKind::Health) {
            Some(BehaviorState::Health { current }) => Some(current),
            _ => None,
        }
    }

    /// Bring behavior state in line with the attached behaviors: add fresh
    /// state for any behavior that has none. Existing state is kept.
    pub fn ensure_behavior_state(&mut self) {
        for behavior in &self.object.behaviors {
            if let Some(fresh) = BehaviorState::fresh(behavior) {
                self.behavior_state.entry(behavior.kind()).or_insert(fresh);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template() -> GameObject {
        serde_json::from_value(json!({
            "id": "obj_tank", "name": "Tank", "type": "sprite",
            "size": {"width": 32, "height": 32},
            "behaviors": [
                {"type": "health", "maxHealth": 50, "currentHealth": 10},
                {"type": "turret", "fireRate": 2, "bulletObjectName": "Bullet"},
                {"type": "button"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn fresh_state_starts_health_at_max() {
        let inst = RuntimeInstance::from_template(&template());
        assert_eq!(inst.health(), Some(50.0));
        assert_eq!(
            inst.behavior_state.get(&BehaviorKind::Turret),
            Some(&BehaviorState::Turret { cooldown: 0.0 })
        );
        assert!(!inst.behavior_state.contains_key(&BehaviorKind::Button));
    }

    #[test]
    fn spawned_ids_are_unique() {
        let t = template();
        let a = RuntimeInstance::spawn(&t);
        let b = RuntimeInstance::spawn(&t);
        assert!(a.id().starts_with("runtime_Tank_"));
        assert_ne!(a.id(), b.id());
        assert_eq!(a.name(), "Tank");
    }

    #[test]
    fn instance_round_trips_through_json() {
        let mut inst = RuntimeInstance::from_template(&template());
        *inst.health_mut().unwrap() = 7.5;
        inst.animation.frame_index = 3;
        let text = serde_json::to_string(&inst).unwrap();
        let back: RuntimeInstance = serde_json::from_str(&text).unwrap();
        assert_eq!(back, inst);
    }

    #[test]
    fn ensure_state_keeps_existing() {
        let mut inst = RuntimeInstance::from_template(&template());
        *inst.health_mut().unwrap() = 1.0;
        inst.behavior_state.remove(&BehaviorKind::Turret);
        inst.ensure_behavior_state();
        assert_eq!(inst.health(), Some(1.0));
        assert!(inst.behavior_state.contains_key(&BehaviorKind::Turret));
    }
}
