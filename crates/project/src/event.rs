//! The condition/action vocabulary of the event language.
//!
//! Both sets are closed: adding a kind means adding a variant here and a
//! match arm in the kernel evaluator, which the compiler enforces.

use gamma_common::{ArithmeticOp, CompareOp, MouseButton, Value};
use serde::{Deserialize, Serialize};

/// Object fields readable by `object_property`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectProperty {
    #[serde(rename = "position.x")]
    PositionX,
    #[serde(rename = "position.y")]
    PositionY,
    #[serde(rename = "rotation")]
    Rotation,
    #[serde(rename = "size.width")]
    Width,
    #[serde(rename = "size.height")]
    Height,
    #[serde(rename = "scale")]
    Scale,
    #[serde(rename = "visible")]
    Visible,
}

/// Object fields writable by `set_object_property`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SettableProperty {
    Scale,
    Rotation,
    Color,
    FontSize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionType {
    #[default]
    Absolute,
    Relative,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoomOp {
    #[default]
    #[serde(rename = "=")]
    Set,
    #[serde(rename = "+")]
    Add,
}

/// A condition entry: its own id plus the kind-specific parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: String,
    #[serde(flatten)]
    pub kind: ConditionKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ConditionKind {
    KeyPressed {
        key: String,
    },
    KeyReleased {
        key: String,
    },
    MouseButtonPressed {
        #[serde(default)]
        button: MouseButton,
    },
    MouseButtonReleased {
        #[serde(default)]
        button: MouseButton,
    },
    Collision {
        object_id1: String,
        object_id2: String,
    },
    VariableComparison {
        object_id: String,
        variable: String,
        operator: CompareOp,
        value: Value,
    },
    TimerGreaterThan {
        name: String,
        seconds: f64,
    },
    EveryXSeconds {
        seconds: f64,
    },
    MouseClickObject {
        object_id: String,
    },
    CompareGlobalVariable {
        variable: String,
        operator: CompareOp,
        value: Value,
    },
    SceneStart,
    ObjectProperty {
        object_id: String,
        property: ObjectProperty,
        operator: CompareOp,
        value: Value,
    },
    ForEachObject {
        object_id: String,
    },
    MouseOverObject {
        object_id: String,
        #[serde(default)]
        invert: bool,
    },
    DistanceBetweenObjects {
        object_id1: String,
        object_id2: String,
        operator: CompareOp,
        distance: f64,
    },
    NumberOfObjects {
        object_id: String,
        operator: CompareOp,
        count: f64,
    },
    AnimationIsPlaying {
        object_id: String,
        animation_name: String,
        #[serde(default)]
        invert: bool,
    },
    SaveExists {
        slot_name: String,
        #[serde(default)]
        invert: bool,
    },
    CompareHealth {
        object_id: String,
        operator: CompareOp,
        value: f64,
    },
    CameraIsMoving,
    CameraInBounds {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    ObjectIsPressed {
        object_id: String,
    },
    IsSoundPlaying {
        sound: String,
        #[serde(default)]
        invert: bool,
    },
}

/// An action entry: its own id plus the kind-specific parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    #[serde(flatten)]
    pub kind: ActionKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ActionKind {
    MoveObject {
        object_id: String,
        dx: f64,
        dy: f64,
    },
    ChangeVariable {
        object_id: String,
        variable: String,
        operation: ArithmeticOp,
        value: Value,
    },
    DestroyObject {
        object_id: String,
    },
    CameraFollowObject {
        #[serde(default)]
        object_id: Option<String>,
    },
    CameraSetPosition {
        x: f64,
        y: f64,
    },
    CameraShake {
        intensity: f64,
        duration: f64,
    },
    CreateObject {
        name: String,
        #[serde(default)]
        sprite: String,
        #[serde(default)]
        layer: String,
        #[serde(default)]
        position_type: PositionType,
        x: f64,
        y: f64,
        #[serde(default)]
        relative_to_object_id: Option<String>,
        #[serde(default)]
        relative_to_point: Option<String>,
    },
    ChangeScene {
        scene_id: String,
    },
    PlaySound {
        sound: String,
    },
    SetGlobalVariable {
        variable: String,
        value: Value,
    },
    ChangeGlobalVariable {
        variable: String,
        operation: ArithmeticOp,
        value: Value,
    },
    SetObjectPosition {
        object_id: String,
        #[serde(default)]
        position_type: PositionType,
        x: f64,
        y: f64,
        #[serde(default)]
        relative_to_object_id: Option<String>,
        #[serde(default)]
        relative_to_point: Option<String>,
    },
    SetObjectRotation {
        object_id: String,
        rotation: f64,
    },
    SetObjectSprite {
        object_id: String,
        sprite: String,
    },
    ToggleObjectVisibility {
        object_id: String,
        visible: bool,
    },
    ChangeCameraZoom {
        zoom: f64,
        #[serde(default)]
        operation: ZoomOp,
    },
    SetObjectSize {
        object_id: String,
        width: f64,
        height: f64,
    },
    ShowPopup {
        #[serde(default)]
        title: String,
        #[serde(default)]
        content: String,
        #[serde(default)]
        button_text: String,
    },
    PlayAnimation {
        object_id: String,
        animation_name: String,
    },
    StopAnimation {
        object_id: String,
    },
    MoveObjectTo {
        object_id: String,
        x: f64,
        y: f64,
        speed: f64,
    },
    ChangeAnimationSpeed {
        object_id: String,
        animation_name: String,
        speed: f64,
    },
    MoveObjectTowardsObject {
        object_id: String,
        target_object_id: String,
        speed: f64,
    },
    MoveObjectAtAngle {
        object_id: String,
        speed: f64,
    },
    StartOrResetTimer {
        name: String,
    },
    SaveGameState {
        slot_name: String,
    },
    LoadGameState {
        slot_name: String,
    },
    ClearGameSave {
        slot_name: String,
    },
    DamageObject {
        object_id: String,
        amount: f64,
    },
    SetHealth {
        object_id: String,
        amount: f64,
    },
    FireBullet {
        object_id: String,
        bullet_object_name: String,
        #[serde(default)]
        spawn_point: String,
    },
    SetText {
        object_id: String,
        text: String,
    },
    SetBarValue {
        object_id: String,
        value: f64,
    },
    CameraZoomToFitObjects {
        object_ids: Vec<String>,
        #[serde(default)]
        padding: f64,
    },
    CameraLerpToPosition {
        x: f64,
        y: f64,
        duration: f64,
    },
    CameraSetBounds {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    },
    CameraClearBounds,
    SetObjectProperty {
        object_id: String,
        property: SettableProperty,
        value: Value,
    },
    StopSound {
        sound: String,
    },
    PlayMusic {
        sound: String,
    },
    StopMusic,
    SetVolume {
        volume: f64,
    },
}

impl ConditionKind {
    /// Every object id this condition refers to.
    pub fn object_refs(&self) -> Vec<&str> {
        match self {
            Self::Collision {
                object_id1,
                object_id2,
            }
            | Self::DistanceBetweenObjects {
                object_id1,
                object_id2,
                ..
            } => vec![object_id1.as_str(), object_id2.as_str()],
            Self::VariableComparison { object_id, .. }
            | Self::MouseClickObject { object_id }
            | Self::ObjectProperty { object_id, .. }
            | Self::ForEachObject { object_id }
            | Self::MouseOverObject { object_id, .. }
            | Self::NumberOfObjects { object_id, .. }
            | Self::AnimationIsPlaying { object_id, .. }
            | Self::CompareHealth { object_id, .. }
            | Self::ObjectIsPressed { object_id } => vec![object_id.as_str()],
            Self::KeyPressed { .. }
            | Self::KeyReleased { .. }
            | Self::MouseButtonPressed { .. }
            | Self::MouseButtonReleased { .. }
            | Self::TimerGreaterThan { .. }
            | Self::EveryXSeconds { .. }
            | Self::CompareGlobalVariable { .. }
            | Self::SceneStart
            | Self::SaveExists { .. }
            | Self::CameraIsMoving
            | Self::CameraInBounds { .. }
            | Self::IsSoundPlaying { .. } => Vec::new(),
        }
    }
}

impl ActionKind {
    /// Every object id this action refers to.
    pub fn object_refs(&self) -> Vec<&str> {
        match self {
            Self::MoveObject { object_id, .. }
            | Self::ChangeVariable { object_id, .. }
            | Self::DestroyObject { object_id }
            | Self::SetObjectRotation { object_id, .. }
            | Self::SetObjectSprite { object_id, .. }
            | Self::ToggleObjectVisibility { object_id, .. }
            | Self::SetObjectSize { object_id, .. }
            | Self::PlayAnimation { object_id, .. }
            | Self::StopAnimation { object_id }
            | Self::MoveObjectTo { object_id, .. }
            | Self::ChangeAnimationSpeed { object_id, .. }
            | Self::MoveObjectAtAngle { object_id, .. }
            | Self::DamageObject { object_id, .. }
            | Self::SetHealth { object_id, .. }
            | Self::FireBullet { object_id, .. }
            | Self::SetText { object_id, .. }
            | Self::SetBarValue { object_id, .. }
            | Self::SetObjectProperty { object_id, .. } => vec![object_id.as_str()],
            Self::MoveObjectTowardsObject {
                object_id,
                target_object_id,
                ..
            } => vec![object_id.as_str(), target_object_id.as_str()],
            Self::SetObjectPosition {
                object_id,
                relative_to_object_id,
                ..
            } => {
                let mut refs = vec![object_id.as_str()];
                refs.extend(relative_to_object_id.as_deref());
                refs
            }
            Self::CreateObject {
                relative_to_object_id,
                ..
            } => relative_to_object_id.as_deref().into_iter().collect(),
            Self::CameraFollowObject { object_id } => object_id.as_deref().into_iter().collect(),
            Self::CameraZoomToFitObjects { object_ids, .. } => {
                object_ids.iter().map(String::as_str).collect()
            }
            Self::CameraSetPosition { .. }
            | Self::CameraShake { .. }
            | Self::ChangeScene { .. }
            | Self::PlaySound { .. }
            | Self::SetGlobalVariable { .. }
            | Self::ChangeGlobalVariable { .. }
            | Self::ChangeCameraZoom { .. }
            | Self::ShowPopup { .. }
            | Self::StartOrResetTimer { .. }
            | Self::SaveGameState { .. }
            | Self::LoadGameState { .. }
            | Self::ClearGameSave { .. }
            | Self::CameraLerpToPosition { .. }
            | Self::CameraSetBounds { .. }
            | Self::CameraClearBounds
            | Self::StopSound { .. }
            | Self::PlayMusic { .. }
            | Self::StopMusic
            | Self::SetVolume { .. } => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collision_condition_field_names() {
        let c: Condition = serde_json::from_str(
            r#"{"id":"c1","type":"collision","objectId1":"a","objectId2":"b"}"#,
        )
        .unwrap();
        assert_eq!(c.id, "c1");
        assert_eq!(c.kind.object_refs(), vec!["a", "b"]);
    }

    #[test]
    fn unit_conditions_parse() {
        let c: Condition = serde_json::from_str(r#"{"id":"c2","type":"scene_start"}"#).unwrap();
        assert_eq!(c.kind, ConditionKind::SceneStart);
        let c: Condition =
            serde_json::from_str(r#"{"id":"c3","type":"camera_is_moving"}"#).unwrap();
        assert_eq!(c.kind, ConditionKind::CameraIsMoving);
    }

    #[test]
    fn object_property_names() {
        let c: Condition = serde_json::from_str(
            r#"{"id":"c","type":"object_property","objectId":"o","property":"position.x","operator":">","value":"100"}"#,
        )
        .unwrap();
        match c.kind {
            ConditionKind::ObjectProperty {
                property, value, ..
            } => {
                assert_eq!(property, ObjectProperty::PositionX);
                assert_eq!(value, Value::Text("100".into()));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn camera_bounds_action_field_names() {
        let a: Action = serde_json::from_str(
            r#"{"id":"a","type":"camera_set_bounds","minX":0,"minY":0,"maxX":2000,"maxY":1000}"#,
        )
        .unwrap();
        assert_eq!(
            a.kind,
            ActionKind::CameraSetBounds {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 2000.0,
                max_y: 1000.0
            }
        );
    }

    #[test]
    fn follow_null_stops_following() {
        let a: Action = serde_json::from_str(
            r#"{"id":"a","type":"camera_follow_object","objectId":null}"#,
        )
        .unwrap();
        assert_eq!(a.kind, ActionKind::CameraFollowObject { object_id: None });
        assert!(a.kind.object_refs().is_empty());
    }

    #[test]
    fn zoom_operation_symbols() {
        let a: Action = serde_json::from_str(
            r#"{"id":"a","type":"change_camera_zoom","zoom":0.5,"operation":"+"}"#,
        )
        .unwrap();
        assert_eq!(
            a.kind,
            ActionKind::ChangeCameraZoom {
                zoom: 0.5,
                operation: ZoomOp::Add
            }
        );
    }

    #[test]
    fn set_object_property_accepts_font_size() {
        let a: Action = serde_json::from_str(
            r#"{"id":"a","type":"set_object_property","objectId":"t","property":"fontSize","value":24}"#,
        )
        .unwrap();
        match a.kind {
            ActionKind::SetObjectProperty { property, .. } => {
                assert_eq!(property, SettableProperty::FontSize)
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn action_refs_include_relative_anchor() {
        let a: Action = serde_json::from_str(
            r#"{"id":"a","type":"set_object_position","objectId":"o","positionType":"relative","x":0,"y":0,"relativeToObjectId":"p"}"#,
        )
        .unwrap();
        assert_eq!(a.kind.object_refs(), vec!["o", "p"]);
    }
}
