//! Action execution.
//!
//! Actions mutate the session directly except for spawns, destroys, scene
//! changes and loads, which are deferred to the end of the event pass.

use crate::behaviors::spawn_projectile;
use crate::camera::CameraBounds;
use crate::conditions::{Binding, bind};
use crate::instance::RuntimeInstance;
use crate::session::{Popup, Session};
use gamma_assets::AssetKind;
use gamma_common::{Size, Value, VariableMap};
use gamma_project::{Action, ActionKind, PositionType, SettableProperty};
use glam::DVec2;
use regex::Regex;
use std::sync::LazyLock;

static GLOBAL_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{global\.(\w+)\}").expect("valid pattern"));

/// Replace `${global.NAME}` with the global's display form. Unknown names
/// are left as written.
pub fn substitute_globals(text: &str, globals: &VariableMap) -> String {
    GLOBAL_REF
        .replace_all(text, |caps: &regex::Captures<'_>| match globals.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Step from `from` toward `to` by at most `step`. Within one unit the
/// mover is considered arrived.
fn seek(from: DVec2, to: DVec2, step: f64) -> DVec2 {
    let delta = to - from;
    let dist = delta.length();
    if dist > 1.0 {
        from + delta / dist * step.min(dist)
    } else {
        from
    }
}

impl Session {
    fn target_mut(&mut self, id: &str, action: &Action) -> Option<&mut RuntimeInstance> {
        let found = self.store.get_mut(id);
        if found.is_none() {
            tracing::warn!(action = %action.id, object = id, "object not found, action skipped");
        }
        found
    }

    /// Top-left for a new position. Relative placement anchors on another
    /// instance's named point (its center when no point is given).
    fn placement(
        &self,
        action: &Action,
        position_type: PositionType,
        offset: DVec2,
        relative_to: Option<&str>,
        point: Option<&str>,
    ) -> Option<DVec2> {
        match position_type {
            PositionType::Absolute => Some(offset),
            PositionType::Relative => {
                let Some(anchor_id) = relative_to.filter(|id| !id.is_empty()) else {
                    tracing::warn!(action = %action.id, "relative placement without an anchor");
                    return None;
                };
                let Some(anchor) = self.store.get(anchor_id) else {
                    tracing::warn!(action = %action.id, object = anchor_id, "placement anchor not found");
                    return None;
                };
                let origin = match point {
                    Some(p) if !p.is_empty() => anchor.object.world_point(p),
                    _ => anchor.center(),
                };
                Some(origin + offset)
            }
        }
    }

    pub(crate) fn execute(&mut self, action: &Action, binding: Option<Binding<'_>>, dt: f64) {
        match &action.kind {
            ActionKind::MoveObject { object_id, dx, dy } => {
                if let Some(inst) = self.target_mut(bind(binding, object_id), action) {
                    inst.object.position.x += dx;
                    inst.object.position.y += dy;
                }
            }
            ActionKind::ChangeVariable {
                object_id,
                variable,
                operation,
                value,
            } => {
                let Some(inst) = self.target_mut(bind(binding, object_id), action) else {
                    return;
                };
                let current = match inst.object.variables.get(variable) {
                    None | Some(Value::Null) => Some(0.0),
                    Some(v) => v.as_strict_number(),
                };
                match (current, value.as_number()) {
                    (Some(current), Some(operand)) => {
                        inst.object
                            .variables
                            .insert(variable.clone(), operation.apply(current, operand).into());
                    }
                    _ => tracing::warn!(
                        action = %action.id,
                        variable,
                        "non-numeric variable arithmetic skipped"
                    ),
                }
            }
            ActionKind::DestroyObject { object_id } => {
                let id = bind(binding, object_id);
                if self.store.get(id).is_some() {
                    self.store.queue_destroy(id);
                } else {
                    tracing::warn!(action = %action.id, object = id, "object not found, action skipped");
                }
            }
            ActionKind::CameraFollowObject { object_id } => {
                let target = object_id.as_deref().map(|id| bind(binding, id).to_string());
                self.camera.follow(target);
            }
            ActionKind::CameraSetPosition { x, y } => {
                self.camera.set_position(DVec2::new(*x, *y));
            }
            ActionKind::CameraShake {
                intensity,
                duration,
            } => self.camera.start_shake(*intensity, *duration),
            ActionKind::CreateObject {
                name,
                sprite,
                layer,
                position_type,
                x,
                y,
                relative_to_object_id,
                relative_to_point,
            } => {
                let Some(template) = self.scene.template_by_name(name) else {
                    tracing::warn!(action = %action.id, name, "no template with that name");
                    return;
                };
                let relative_to = relative_to_object_id.as_deref().map(|id| bind(binding, id));
                let Some(position) = self.placement(
                    action,
                    *position_type,
                    DVec2::new(*x, *y),
                    relative_to,
                    relative_to_point.as_deref(),
                ) else {
                    return;
                };
                let mut instance = RuntimeInstance::spawn(template);
                instance.object.position = position.into();
                if !layer.is_empty() {
                    instance.object.layer = layer.clone();
                }
                if !sprite.is_empty() {
                    if let Some(data) = instance.object.sprite_mut() {
                        data.sprite = Some(sprite.clone());
                        self.assets.request(AssetKind::Image, sprite);
                    }
                }
                self.store.queue_spawn(instance);
            }
            ActionKind::ChangeScene { scene_id } => {
                self.pending_scene = Some(scene_id.clone());
            }
            ActionKind::PlaySound { sound } => {
                let clip = self.sound_clip(sound);
                self.mixer.play(sound, clip.as_ref());
            }
            ActionKind::SetGlobalVariable { variable, value } => {
                self.globals.insert(variable.clone(), value.coerced());
            }
            ActionKind::ChangeGlobalVariable {
                variable,
                operation,
                value,
            } => {
                let current = self.globals.get(variable).and_then(Value::as_strict_number);
                match (current, value.as_number()) {
                    (Some(current), Some(operand)) => {
                        self.globals
                            .insert(variable.clone(), operation.apply(current, operand).into());
                    }
                    _ => tracing::warn!(
                        action = %action.id,
                        variable,
                        "non-numeric global arithmetic skipped"
                    ),
                }
            }
            ActionKind::SetObjectPosition {
                object_id,
                position_type,
                x,
                y,
                relative_to_object_id,
                relative_to_point,
            } => {
                let relative_to = relative_to_object_id.as_deref().map(|id| bind(binding, id));
                let Some(position) = self.placement(
                    action,
                    *position_type,
                    DVec2::new(*x, *y),
                    relative_to,
                    relative_to_point.as_deref(),
                ) else {
                    return;
                };
                if let Some(inst) = self.target_mut(bind(binding, object_id), action) {
                    inst.object.position = position.into();
                }
            }
            ActionKind::SetObjectRotation {
                object_id,
                rotation,
            } => {
                if let Some(inst) = self.target_mut(bind(binding, object_id), action) {
                    inst.object.rotation = *rotation;
                }
            }
            ActionKind::SetObjectSprite { object_id, sprite } => {
                let applied = self
                    .target_mut(bind(binding, object_id), action)
                    .and_then(|inst| inst.object.sprite_mut())
                    .map(|data| data.sprite = Some(sprite.clone()))
                    .is_some();
                if applied {
                    self.assets.request(AssetKind::Image, sprite);
                }
            }
            ActionKind::ToggleObjectVisibility { object_id, visible } => {
                if let Some(inst) = self.target_mut(bind(binding, object_id), action) {
                    inst.object.visible = *visible;
                }
            }
            ActionKind::ChangeCameraZoom { zoom, operation } => {
                self.camera.change_zoom(*operation, *zoom);
            }
            ActionKind::SetObjectSize {
                object_id,
                width,
                height,
            } => {
                if let Some(inst) = self.target_mut(bind(binding, object_id), action) {
                    inst.object.size = Size::new(*width, *height);
                }
            }
            ActionKind::ShowPopup {
                title,
                content,
                button_text,
            } => {
                tracing::debug!(title, "popup shown");
                self.popup = Some(Popup {
                    title: title.clone(),
                    content: content.clone(),
                    button_text: button_text.clone(),
                });
            }
            ActionKind::PlayAnimation {
                object_id,
                animation_name,
            } => {
                let Some(inst) = self.target_mut(bind(binding, object_id), action) else {
                    return;
                };
                if let Some(sprite) = inst.object.animated_sprite_mut() {
                    sprite.current_animation = Some(animation_name.clone());
                    inst.animation = Default::default();
                }
            }
            ActionKind::StopAnimation { object_id } => {
                if let Some(inst) = self.target_mut(bind(binding, object_id), action) {
                    if let Some(sprite) = inst.object.animated_sprite_mut() {
                        sprite.current_animation = None;
                    }
                }
            }
            ActionKind::MoveObjectTo {
                object_id,
                x,
                y,
                speed,
            } => {
                if let Some(inst) = self.target_mut(bind(binding, object_id), action) {
                    let from = inst.object.position.to_vec();
                    inst.object.position = seek(from, DVec2::new(*x, *y), speed * dt).into();
                }
            }
            ActionKind::ChangeAnimationSpeed {
                object_id,
                animation_name,
                speed,
            } => {
                let Some(inst) = self.target_mut(bind(binding, object_id), action) else {
                    return;
                };
                let animation = inst
                    .object
                    .sprite_mut()
                    .and_then(|s| s.animations.iter_mut().find(|a| &a.name == animation_name));
                match animation {
                    Some(animation) => animation.speed = *speed,
                    None => tracing::warn!(
                        action = %action.id,
                        animation = animation_name,
                        "animation not found"
                    ),
                }
            }
            ActionKind::MoveObjectTowardsObject {
                object_id,
                target_object_id,
                speed,
            } => {
                let Some(target) = self
                    .store
                    .get(bind(binding, target_object_id))
                    .map(|t| t.object.position.to_vec())
                else {
                    tracing::warn!(action = %action.id, object = %target_object_id, "target not found");
                    return;
                };
                if let Some(inst) = self.target_mut(bind(binding, object_id), action) {
                    let from = inst.object.position.to_vec();
                    inst.object.position = seek(from, target, speed * dt).into();
                }
            }
            ActionKind::MoveObjectAtAngle { object_id, speed } => {
                if let Some(inst) = self.target_mut(bind(binding, object_id), action) {
                    let step = inst.object.heading() * *speed * dt;
                    inst.object.position.x += step.x;
                    inst.object.position.y += step.y;
                }
            }
            ActionKind::StartOrResetTimer { name } => {
                self.timers.insert(name.clone(), self.clock);
            }
            ActionKind::SaveGameState { slot_name } => {
                if let Err(e) = self.save(slot_name) {
                    tracing::warn!(action = %action.id, slot = slot_name, error = %e, "save failed");
                }
            }
            ActionKind::LoadGameState { slot_name } => {
                self.pending_load = Some(slot_name.clone());
            }
            ActionKind::ClearGameSave { slot_name } => {
                if let Err(e) = self.clear_save(slot_name) {
                    tracing::warn!(action = %action.id, slot = slot_name, error = %e, "clear failed");
                }
            }
            ActionKind::DamageObject { object_id, amount } => {
                let Some(inst) = self.target_mut(bind(binding, object_id), action) else {
                    return;
                };
                match inst.health_mut() {
                    Some(current) => *current -= amount,
                    None => tracing::warn!(action = %action.id, "object has no health"),
                }
            }
            ActionKind::SetHealth { object_id, amount } => {
                let Some(inst) = self.target_mut(bind(binding, object_id), action) else {
                    return;
                };
                match inst.health_mut() {
                    Some(current) => *current = *amount,
                    None => tracing::warn!(action = %action.id, "object has no health"),
                }
            }
            ActionKind::FireBullet {
                object_id,
                bullet_object_name,
                spawn_point,
            } => {
                let Some(template) = self.scene.template_by_name(bullet_object_name) else {
                    tracing::warn!(action = %action.id, name = bullet_object_name, "no bullet template");
                    return;
                };
                let id = bind(binding, object_id);
                let Some(firer) = self.store.get(id) else {
                    tracing::warn!(action = %action.id, object = id, "object not found, action skipped");
                    return;
                };
                let bullet = spawn_projectile(&firer.object, template, spawn_point);
                self.store.queue_spawn(bullet);
            }
            ActionKind::SetText { object_id, text } => {
                let rendered = substitute_globals(text, &self.globals);
                let Some(inst) = self.target_mut(bind(binding, object_id), action) else {
                    return;
                };
                match inst.object.text_mut() {
                    Some(data) => data.text = rendered,
                    None => tracing::warn!(action = %action.id, "set_text on a non-text object"),
                }
            }
            ActionKind::SetBarValue { object_id, value } => {
                let Some(inst) = self.target_mut(bind(binding, object_id), action) else {
                    return;
                };
                match inst.object.bar_mut() {
                    Some(bar) => bar.current_value = *value,
                    None => tracing::warn!(action = %action.id, "set_bar_value on a non-bar object"),
                }
            }
            ActionKind::CameraZoomToFitObjects {
                object_ids,
                padding,
            } => {
                let area = object_ids
                    .iter()
                    .filter_map(|id| self.store.get(bind(binding, id)))
                    .map(|i| i.object.bounds())
                    .reduce(|a, b| a.union(&b));
                match area {
                    Some(area) => self.camera.zoom_to_fit(area, *padding, self.config.viewport),
                    None => tracing::warn!(action = %action.id, "no live objects to frame"),
                }
            }
            ActionKind::CameraLerpToPosition { x, y, duration } => {
                self.camera.lerp_to(DVec2::new(*x, *y), *duration);
            }
            ActionKind::CameraSetBounds {
                min_x,
                min_y,
                max_x,
                max_y,
            } => self.camera.set_bounds(CameraBounds {
                min_x: *min_x,
                min_y: *min_y,
                max_x: *max_x,
                max_y: *max_y,
            }),
            ActionKind::CameraClearBounds => self.camera.clear_bounds(),
            ActionKind::SetObjectProperty {
                object_id,
                property,
                value,
            } => {
                let Some(inst) = self.target_mut(bind(binding, object_id), action) else {
                    return;
                };
                set_property(inst, *property, value, &action.id);
            }
            ActionKind::StopSound { sound } => self.mixer.stop(sound),
            ActionKind::PlayMusic { sound } => {
                let clip = self.sound_clip(sound);
                self.mixer.play_music(sound, clip.as_ref());
            }
            ActionKind::StopMusic => self.mixer.stop_music(),
            ActionKind::SetVolume { volume } => self.mixer.set_volume(volume.clamp(0.0, 1.0)),
        }
    }
}

fn set_property(inst: &mut RuntimeInstance, property: SettableProperty, value: &Value, action: &str) {
    match property {
        SettableProperty::Scale | SettableProperty::Rotation => {
            let Some(n) = value.as_number() else {
                tracing::warn!(action, ?property, "non-numeric property value skipped");
                return;
            };
            if property == SettableProperty::Scale {
                inst.object.scale = n;
            } else {
                inst.object.rotation = n;
            }
        }
        SettableProperty::Color => match inst.object.text_mut() {
            Some(text) => text.color = value.to_string(),
            None => tracing::warn!(action, "color applies to text objects only"),
        },
        SettableProperty::FontSize => match (inst.object.text_mut(), value.as_number()) {
            (Some(text), Some(size)) => text.font_size = size,
            (None, _) => tracing::warn!(action, "fontSize applies to text objects only"),
            (Some(_), None) => tracing::warn!(action, "non-numeric fontSize skipped"),
        },
    }
}
