//! Per-tick behavior simulation, bar sync and animation playback.

use crate::instance::{BehaviorState, RuntimeInstance};
use crate::store::InstanceStore;
use gamma_common::VariableMap;
use gamma_input::InputTracker;
use gamma_project::{BarSource, Behavior, GameObject, Scene};
use glam::DVec2;

/// Spawn a bullet copy of `template` centered on `firer`'s named point,
/// facing the firer's rotation.
pub fn spawn_projectile(firer: &GameObject, template: &GameObject, point: &str) -> RuntimeInstance {
    let origin = firer.world_point(point);
    let mut bullet = RuntimeInstance::spawn(template);
    let half = bullet.object.scaled_size().to_vec() * 0.5;
    bullet.object.position = (origin - half).into();
    bullet.object.rotation = firer.rotation;
    bullet
}

/// Run every attached behavior on every live instance.
///
/// Spawns and destroys are queued on the store, not applied.
pub fn step_behaviors(store: &mut InstanceStore, scene: &Scene, input: &InputTracker, dt: f64) {
    let mut spawns = Vec::new();
    let mut destroys = Vec::new();

    for inst in store.iter_mut() {
        if let Some(current) = inst.health() {
            inst.object
                .variables
                .insert("health".to_string(), current.into());
        }

        let RuntimeInstance {
            object,
            behavior_state,
            ..
        } = inst;
        let behaviors = std::mem::take(&mut object.behaviors);
        for behavior in &behaviors {
            let state = behavior_state.get_mut(&behavior.kind());
            match (behavior, state) {
                (
                    Behavior::TopDownMovement {
                        speed,
                        acceleration,
                        deceleration,
                        allow_diagonals,
                        control_scheme,
                    },
                    Some(BehaviorState::TopDownMovement { vx, vy }),
                ) => {
                    let [up, down, left, right] = control_scheme.keys();
                    let mut dir = DVec2::ZERO;
                    if input.is_key_down(up) {
                        dir.y = -1.0;
                    }
                    if input.is_key_down(down) {
                        dir.y = 1.0;
                    }
                    if input.is_key_down(left) {
                        dir.x = -1.0;
                    }
                    if input.is_key_down(right) {
                        dir.x = 1.0;
                    }
                    let diagonal = dir.x != 0.0 && dir.y != 0.0;
                    if diagonal && !allow_diagonals {
                        dir.y = 0.0;
                    }
                    let mut target = dir * *speed;
                    if diagonal && *allow_diagonals {
                        target *= std::f64::consts::FRAC_1_SQRT_2;
                    }
                    *vx = approach(*vx, target.x, acceleration * dt, deceleration * dt);
                    *vy = approach(*vy, target.y, acceleration * dt, deceleration * dt);
                    object.position.x += *vx * dt;
                    object.position.y += *vy * dt;
                }
                (Behavior::RotateTowardsMouse { offset, .. }, _) => {
                    let d = input.pointer() - object.center();
                    object.rotation = d.y.atan2(d.x).to_degrees() + offset;
                }
                (
                    Behavior::Bullet {
                        speed, lifespan, ..
                    },
                    Some(BehaviorState::Bullet { elapsed }),
                ) => {
                    *elapsed += dt;
                    if *elapsed > *lifespan {
                        destroys.push(object.id.clone());
                        continue;
                    }
                    let step = object.heading() * *speed * dt;
                    object.position.x += step.x;
                    object.position.y += step.y;
                }
                (
                    Behavior::Turret {
                        fire_rate,
                        bullet_object_name,
                        spawn_point,
                        auto_fire,
                    },
                    Some(BehaviorState::Turret { cooldown }),
                ) => {
                    *cooldown -= dt;
                    if *auto_fire && *cooldown <= 0.0 {
                        if let Some(template) = scene.template_by_name(bullet_object_name) {
                            spawns.push(spawn_projectile(object, template, spawn_point));
                            *cooldown = 1.0 / fire_rate;
                        }
                    }
                }
                // Health is mirrored above; buttons are pointer-driven.
                (Behavior::Health { .. } | Behavior::Button, _) => {}
                (behavior, None) => {
                    tracing::debug!(object = %object.id, kind = ?behavior.kind(), "behavior has no state");
                }
                (_, Some(_)) => {}
            }
        }
        object.behaviors = behaviors;
    }

    for spawn in spawns {
        store.queue_spawn(spawn);
    }
    for id in destroys {
        store.queue_destroy(id);
    }
}

/// Velocity step toward `target` on one axis.
fn approach(v: f64, target: f64, accel: f64, decel: f64) -> f64 {
    if target != 0.0 {
        let s = target.signum();
        target.abs().min((v + s * accel).abs()) * s
    } else {
        signum0(v) * (v.abs() - decel).max(0.0)
    }
}

fn signum0(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v.signum() }
}

/// Overwrite variable-driven bar values from their sources.
pub fn sync_bars(store: &mut InstanceStore, globals: &VariableMap) {
    let updates: Vec<(usize, f64)> = store
        .iter()
        .enumerate()
        .filter_map(|(index, inst)| {
            let source = inst.object.bar()?.value_from_variable.as_ref()?;
            let value = match source.source {
                BarSource::Manual => return None,
                BarSource::GlobalVariable => globals.get(&source.variable_name),
                BarSource::ObjectVariable => {
                    let owner = store.get(source.object_id.as_deref()?);
                    owner.and_then(|o| o.object.variables.get(&source.variable_name))
                }
            };
            Some((index, value.and_then(|v| v.as_number()).unwrap_or(0.0)))
        })
        .collect();

    for (index, value) in updates {
        if let Some(bar) = store
            .iter_mut()
            .nth(index)
            .and_then(|inst| inst.object.bar_mut())
        {
            bar.current_value = value;
        }
    }
}

/// Advance sprite animation cursors by `dt`.
pub fn advance_animations(store: &mut InstanceStore, dt: f64) {
    for inst in store.iter_mut() {
        let RuntimeInstance {
            object, animation, ..
        } = inst;
        let Some(sprite) = object.animated_sprite_mut() else {
            continue;
        };
        let Some(current) = sprite.current_animation.as_deref() else {
            continue;
        };
        let Some(anim) = sprite.animation(current) else {
            continue;
        };
        if anim.frames.is_empty() || anim.speed <= 0.0 {
            continue;
        }
        let frame_duration = 1.0 / anim.speed;
        let frame_count = anim.frames.len();
        let looping = anim.r#loop;

        animation.frame_time += dt;
        if animation.frame_time >= frame_duration {
            animation.frame_time -= frame_duration;
            let mut next = animation.frame_index + 1;
            if next >= frame_count {
                if looping {
                    next = 0;
                } else {
                    next = frame_count - 1;
                    sprite.current_animation = None;
                }
            }
            animation.frame_index = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamma_input::InputEvent;
    use serde_json::json;

    fn scene(objects: serde_json::Value) -> Scene {
        serde_json::from_value(json!({"id": "s", "objects": objects})).unwrap()
    }

    fn store_for(scene: &Scene) -> InstanceStore {
        let mut store = InstanceStore::new();
        store.initialize(scene);
        store
    }

    #[test]
    fn movement_accelerates_and_caps() {
        let s = scene(json!([{
            "id": "p", "name": "P", "type": "sprite",
            "behaviors": [{"type": "top_down_movement", "speed": 100, "acceleration": 400, "deceleration": 400}]
        }]));
        let mut store = store_for(&s);
        let mut input = InputTracker::new();
        input.apply(InputEvent::key_down("d"));
        step_behaviors(&mut store, &s, &input, 0.1);
        // 400 * 0.1 = 40 px/s after one tick
        assert!((store.get("p").unwrap().object.position.x - 4.0).abs() < 1e-9);
        for _ in 0..10 {
            step_behaviors(&mut store, &s, &input, 0.1);
        }
        match store.get("p").unwrap().behavior_state.values().next() {
            Some(BehaviorState::TopDownMovement { vx, .. }) => assert_eq!(*vx, 100.0),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn diagonals_normalized_or_dropped() {
        let s = scene(json!([
            {"id": "a", "name": "A", "type": "sprite",
             "behaviors": [{"type": "top_down_movement", "speed": 100, "acceleration": 1e9, "deceleration": 0}]},
            {"id": "b", "name": "B", "type": "sprite",
             "behaviors": [{"type": "top_down_movement", "speed": 100, "acceleration": 1e9, "deceleration": 0,
                            "allowDiagonals": false, "controlScheme": "arrows"}]}
        ]));
        let mut store = store_for(&s);
        let mut input = InputTracker::new();
        for k in ["w", "d", "ArrowUp", "ArrowRight"] {
            input.apply(InputEvent::key_down(k));
        }
        step_behaviors(&mut store, &s, &input, 1.0);
        let a = store.get("a").unwrap().object.position;
        assert!((a.x - 100.0 / 2f64.sqrt()).abs() < 1e-6);
        assert!((a.y + 100.0 / 2f64.sqrt()).abs() < 1e-6);
        let b = store.get("b").unwrap().object.position;
        assert_eq!((b.x, b.y), (100.0, 0.0));
    }

    #[test]
    fn deceleration_stops_at_zero() {
        assert_eq!(approach(10.0, 0.0, 0.0, 25.0), 0.0);
        assert_eq!(approach(-10.0, 0.0, 0.0, 4.0), -6.0);
        assert_eq!(approach(0.0, 0.0, 0.0, 4.0), 0.0);
    }

    #[test]
    fn rotate_towards_mouse_snaps_and_ignores_speed() {
        let s = scene(json!([{
            "id": "t", "name": "T", "type": "sprite",
            "size": {"width": 10, "height": 10},
            "behaviors": [{"type": "rotate_towards_mouse", "rotationSpeed": 0.001, "offset": 90}]
        }]));
        let mut store = store_for(&s);
        let mut input = InputTracker::new();
        input.set_pointer(DVec2::new(5.0, 100.0));
        step_behaviors(&mut store, &s, &input, 0.016);
        assert!((store.get("t").unwrap().object.rotation - 180.0).abs() < 1e-9);
    }

    #[test]
    fn bullet_expires_without_moving() {
        let s = scene(json!([{
            "id": "b", "name": "Bullet", "type": "sprite",
            "behaviors": [{"type": "bullet", "speed": 100, "lifespan": 0.15}]
        }]));
        let mut store = store_for(&s);
        let input = InputTracker::new();
        step_behaviors(&mut store, &s, &input, 0.1);
        assert_eq!(store.get("b").unwrap().object.position.x, 10.0);
        step_behaviors(&mut store, &s, &input, 0.1);
        assert_eq!(store.get("b").unwrap().object.position.x, 10.0);
        assert_eq!(store.pending_destroy_count(), 1);
    }

    #[test]
    fn health_mirrors_into_variable() {
        let s = scene(json!([{
            "id": "h", "name": "H", "type": "sprite",
            "behaviors": [{"type": "health", "maxHealth": 30}]
        }]));
        let mut store = store_for(&s);
        step_behaviors(&mut store, &s, &InputTracker::new(), 0.016);
        assert_eq!(
            store.get("h").unwrap().object.variables["health"],
            gamma_common::Value::Number(30.0)
        );
    }

    #[test]
    fn projectile_centered_on_rotated_point() {
        let s = scene(json!([
            {"id": "g", "name": "Gun", "type": "sprite", "position": {"x": 0, "y": 0},
             "size": {"width": 40, "height": 20}, "rotation": 90,
             "points": {"muzzle": {"x": 40, "y": 10}}},
            {"id": "b", "name": "Bullet", "type": "sprite", "size": {"width": 4, "height": 4}}
        ]));
        let bullet = spawn_projectile(&s.objects[0], &s.objects[1], "muzzle");
        assert!((bullet.object.position.x - 18.0).abs() < 1e-9);
        assert!((bullet.object.position.y - 28.0).abs() < 1e-9);
        assert_eq!(bullet.object.rotation, 90.0);
    }

    #[test]
    fn bars_follow_sources() {
        let s = scene(json!([
            {"id": "p", "name": "P", "type": "sprite", "variables": {"mana": "40"}},
            {"id": "g", "name": "G", "type": "bar", "currentValue": 5,
             "valueFromVariable": {"source": "global_variable", "variableName": "hp"}},
            {"id": "o", "name": "O", "type": "bar", "currentValue": 5,
             "valueFromVariable": {"source": "object_variable", "variableName": "mana", "objectId": "p"}},
            {"id": "m", "name": "M", "type": "bar", "currentValue": 5,
             "valueFromVariable": {"source": "global_variable", "variableName": "missing"}},
            {"id": "k", "name": "K", "type": "bar", "currentValue": 5}
        ]));
        let mut store = store_for(&s);
        let mut globals = VariableMap::new();
        globals.insert("hp".into(), 75.0.into());
        sync_bars(&mut store, &globals);
        let value = |id: &str| store.get(id).unwrap().object.bar().unwrap().current_value;
        assert_eq!(value("g"), 75.0);
        assert_eq!(value("o"), 40.0);
        assert_eq!(value("m"), 0.0);
        assert_eq!(value("k"), 5.0);
    }

    #[test]
    fn one_shot_animation_freezes_on_last_frame() {
        let s = scene(json!([{
            "id": "a", "name": "A", "type": "sprite", "currentAnimation": "pop",
            "animations": [{"name": "pop", "frames": ["f0", "f1"], "speed": 10, "loop": false}]
        }]));
        let mut store = store_for(&s);
        advance_animations(&mut store, 0.1);
        assert_eq!(store.get("a").unwrap().animation.frame_index, 1);
        advance_animations(&mut store, 0.1);
        let inst = store.get("a").unwrap();
        assert_eq!(inst.animation.frame_index, 1);
        assert!(inst.object.sprite().unwrap().current_animation.is_none());
    }

    #[test]
    fn looping_animation_wraps() {
        let s = scene(json!([{
            "id": "a", "name": "A", "type": "sprite", "currentAnimation": "spin",
            "animations": [{"name": "spin", "frames": ["f0", "f1"], "speed": 4, "loop": true}]
        }]));
        let mut store = store_for(&s);
        for _ in 0..2 {
            advance_animations(&mut store, 0.25);
        }
        let inst = store.get("a").unwrap();
        assert_eq!(inst.animation.frame_index, 0);
        assert_eq!(inst.object.sprite().unwrap().current_animation.as_deref(), Some("spin"));
    }
}
