//! Condition evaluation and `for_each_object` expansion.

use crate::instance::RuntimeInstance;
use crate::session::Session;
use gamma_common::{MouseButton, Rect, Value};
use gamma_project::{Condition, ConditionKind, GameEvent, ObjectProperty};

/// Active `for_each_object` iteration: references to `from` mean `to`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Binding<'a> {
    pub from: &'a str,
    pub to: &'a str,
}

/// Resolve an object reference under an optional iteration binding.
pub(crate) fn bind<'a>(binding: Option<Binding<'a>>, id: &'a str) -> &'a str {
    match binding {
        Some(b) if b.from == id => b.to,
        _ => id,
    }
}

impl Session {
    /// Evaluate every active event of the current scene in order, running
    /// actions where all conditions hold.
    pub(crate) fn run_events(&mut self, dt: f64) {
        let scene = std::sync::Arc::clone(&self.scene);
        for event in scene.events_in_order() {
            let for_each = event.conditions.iter().find_map(|c| match &c.kind {
                ConditionKind::ForEachObject { object_id } => Some(object_id.as_str()),
                _ => None,
            });
            match for_each {
                None => self.run_event(event, None, dt),
                Some(from) => {
                    let members = self.group_members(from);
                    for to in &members {
                        self.run_event(event, Some(Binding { from, to }), dt);
                    }
                }
            }
        }
    }

    fn run_event(&mut self, event: &GameEvent, binding: Option<Binding<'_>>, dt: f64) {
        let holds = event
            .conditions
            .iter()
            .all(|c| self.condition_holds(&event.id, c, binding));
        if holds {
            for action in &event.actions {
                self.execute(action, binding, dt);
            }
        }
    }

    /// Name shared by the group `id` belongs to: the live instance's name,
    /// falling back to the scene template.
    fn group_name(&self, id: &str) -> Option<String> {
        self.store
            .get(id)
            .map(|i| i.name().to_string())
            .or_else(|| self.scene.object(id).map(|o| o.name.clone()))
    }

    /// Ids of every live instance in the same name group as `id`.
    fn group_members(&self, id: &str) -> Vec<String> {
        match self.group_name(id) {
            Some(name) => self
                .store
                .with_name(&name)
                .map(|i| i.id().to_string())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Instances a collision side stands for: exactly the bound instance
    /// when the id was substituted, otherwise the whole name group.
    fn collision_side(&self, id: &str, bound: bool) -> Vec<&RuntimeInstance> {
        if bound {
            return self.store.get(id).into_iter().collect();
        }
        match self.group_name(id) {
            Some(name) => self.store.iter().filter(|i| i.name() == name).collect(),
            None => Vec::new(),
        }
    }

    fn collides(&self, a: &str, a_bound: bool, b: &str, b_bound: bool) -> bool {
        let left = self.collision_side(a, a_bound);
        let right = self.collision_side(b, b_bound);
        left.iter().any(|x| {
            right.iter().any(|y| {
                x.id() != y.id()
                    && x.object.visible
                    && y.object.visible
                    && x.object.bounds().overlaps(&y.object.bounds())
            })
        })
    }

    fn pointer_over(&self, id: &str) -> bool {
        self.store
            .get(id)
            .is_some_and(|i| i.object.visible && i.object.bounds().contains(self.input.pointer()))
    }

    pub(crate) fn condition_holds(
        &mut self,
        event_id: &str,
        condition: &Condition,
        binding: Option<Binding<'_>>,
    ) -> bool {
        let is_bound = |id: &str| binding.is_some_and(|b| b.from == id);
        match &condition.kind {
            ConditionKind::KeyPressed { key } => self.input.is_key_down(key),
            ConditionKind::KeyReleased { key } => self.input.key_released(key),
            ConditionKind::MouseButtonPressed { .. } => {
                self.input.is_button_down(MouseButton::Left)
            }
            ConditionKind::MouseButtonReleased { .. } => {
                self.input.button_released(MouseButton::Left)
            }
            ConditionKind::Collision {
                object_id1,
                object_id2,
            } => self.collides(
                bind(binding, object_id1),
                is_bound(object_id1),
                bind(binding, object_id2),
                is_bound(object_id2),
            ),
            ConditionKind::VariableComparison {
                object_id,
                variable,
                operator,
                value,
            } => match self.store.get(bind(binding, object_id)) {
                Some(inst) => {
                    let current = inst.object.variables.get(variable).unwrap_or(&Value::Null);
                    operator.compare(current, value)
                }
                None => false,
            },
            ConditionKind::TimerGreaterThan { name, seconds } => self
                .timers
                .get(name)
                .is_some_and(|start| self.clock - start >= *seconds),
            ConditionKind::EveryXSeconds { seconds } => {
                let last = self
                    .every_x
                    .get(&condition.id)
                    .copied()
                    .unwrap_or(self.scene_started_at);
                if self.clock - last >= *seconds {
                    self.every_x.insert(condition.id.clone(), self.clock);
                    true
                } else {
                    false
                }
            }
            ConditionKind::MouseClickObject { object_id } => {
                self.input.clicked() == Some(bind(binding, object_id))
            }
            ConditionKind::CompareGlobalVariable {
                variable,
                operator,
                value,
            } => {
                let current = self.globals.get(variable).unwrap_or(&Value::Null);
                operator.compare(current, value)
            }
            ConditionKind::SceneStart => self.scene_start_fired.insert(event_id.to_string()),
            ConditionKind::ObjectProperty {
                object_id,
                property,
                operator,
                value,
            } => match self.store.get(bind(binding, object_id)) {
                Some(inst) => {
                    let (current, expected) = property_value(inst, *property, value);
                    operator.compare(&current, &expected)
                }
                None => false,
            },
            ConditionKind::ForEachObject { .. } => true,
            ConditionKind::MouseOverObject { object_id, invert } => {
                match self.store.get(bind(binding, object_id)) {
                    Some(inst) if inst.object.visible => {
                        inst.object.bounds().contains(self.input.pointer()) != *invert
                    }
                    _ => false,
                }
            }
            ConditionKind::DistanceBetweenObjects {
                object_id1,
                object_id2,
                operator,
                distance,
            } => {
                let a = self.store.get(bind(binding, object_id1));
                let b = self.store.get(bind(binding, object_id2));
                match (a, b) {
                    (Some(a), Some(b)) => operator.test(a.center().distance(b.center()), *distance),
                    _ => false,
                }
            }
            ConditionKind::NumberOfObjects {
                object_id,
                operator,
                count,
            } => match self.group_name(bind(binding, object_id)) {
                Some(name) => operator.test(self.store.with_name(&name).count() as f64, *count),
                None => false,
            },
            ConditionKind::AnimationIsPlaying {
                object_id,
                animation_name,
                invert,
            } => match self
                .store
                .get(bind(binding, object_id))
                .and_then(|i| i.object.sprite())
            {
                Some(sprite) => {
                    (sprite.current_animation.as_deref() == Some(animation_name.as_str())) != *invert
                }
                None => *invert,
            },
            ConditionKind::SaveExists { slot_name, invert } => {
                self.save_exists(slot_name) != *invert
            }
            ConditionKind::CompareHealth {
                object_id,
                operator,
                value,
            } => self
                .store
                .get(bind(binding, object_id))
                .and_then(RuntimeInstance::health)
                .is_some_and(|health| operator.test(health, *value)),
            ConditionKind::CameraIsMoving => self.camera.is_moving(),
            ConditionKind::CameraInBounds {
                x,
                y,
                width,
                height,
            } => {
                let area = Rect::from_origin_size(
                    glam::DVec2::new(*x, *y),
                    gamma_common::Size::new(*width, *height),
                );
                self.camera.in_bounds(&area)
            }
            ConditionKind::ObjectIsPressed { object_id } => {
                self.input.is_button_down(MouseButton::Left)
                    && self.pointer_over(bind(binding, object_id))
            }
            ConditionKind::IsSoundPlaying { sound, invert } => {
                self.mixer.is_playing(sound) != *invert
            }
        }
    }
}

/// Current value of an object property and the authored operand, shaped so
/// the two compare meaningfully.
fn property_value(inst: &RuntimeInstance, property: ObjectProperty, operand: &Value) -> (Value, Value) {
    let o = &inst.object;
    let current = match property {
        ObjectProperty::PositionX => o.position.x,
        ObjectProperty::PositionY => o.position.y,
        ObjectProperty::Rotation => o.rotation,
        ObjectProperty::Width => o.size.width,
        ObjectProperty::Height => o.size.height,
        ObjectProperty::Scale => o.effective_scale(),
        ObjectProperty::Visible => {
            // Only a literal true/"true" operand means visible.
            let expected = operand.as_bool().unwrap_or(false);
            return (Value::Bool(o.visible), Value::Bool(expected));
        }
    };
    (Value::Number(current), operand.clone())
}
