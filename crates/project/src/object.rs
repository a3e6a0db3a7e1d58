use crate::behavior::{Behavior, BehaviorKind};
use gamma_common::{Point, Rect, Size, VariableMap};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A frame-based sprite animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animation {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub frames: Vec<String>,
    /// Frames per second.
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub r#loop: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpriteData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprite: Option<String>,
    #[serde(default)]
    pub animations: Vec<Animation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_animation: Option<String>,
}

impl SpriteData {
    pub fn animation(&self, name: &str) -> Option<&Animation> {
        self.animations.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextBaseline {
    #[default]
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextData {
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_text_color")]
    pub color: String,
    #[serde(default)]
    pub align: TextAlign,
    #[serde(default)]
    pub baseline: TextBaseline,
}

/// Where a bar reads its displayed value from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarSource {
    #[default]
    Manual,
    GlobalVariable,
    ObjectVariable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarValueSource {
    #[serde(default)]
    pub source: BarSource,
    #[serde(default)]
    pub variable_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarData {
    #[serde(default = "default_bar_max")]
    pub max_value: f64,
    #[serde(default)]
    pub current_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from_variable: Option<BarValueSource>,
    #[serde(default)]
    pub foreground_color: String,
    #[serde(default)]
    pub background_color: String,
    #[serde(default)]
    pub border_color: String,
    #[serde(default)]
    pub border_width: f64,
    #[serde(default)]
    pub show_label: bool,
    #[serde(default = "default_font")]
    pub label_font: String,
    #[serde(default = "default_text_color")]
    pub label_color: String,
    #[serde(default = "default_font_size")]
    pub label_size: f64,
}

impl BarData {
    /// Fill fraction clamped to `[0, 1]`. A non-positive max reads as empty.
    pub fn fill_ratio(&self) -> f64 {
        if self.max_value <= 0.0 {
            return 0.0;
        }
        (self.current_value / self.max_value).clamp(0.0, 1.0)
    }
}

/// Type-specific payload of a game object, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectKind {
    Sprite(SpriteData),
    TiledSprite(SpriteData),
    Text(TextData),
    Bar(BarData),
}

/// An authored object template. Never mutated by the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameObject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub position: Point,
    #[serde(default)]
    pub size: Size,
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Degrees.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub variables: VariableMap,
    #[serde(default)]
    pub layer: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub points: BTreeMap<String, Point>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collision_mask: Vec<Point>,
    #[serde(default)]
    pub behaviors: Vec<Behavior>,
    #[serde(flatten)]
    pub kind: ObjectKind,
}

impl GameObject {
    /// Authored scale with the "unset means 1" rule applied.
    pub fn effective_scale(&self) -> f64 {
        if self.scale == 0.0 || !self.scale.is_finite() {
            1.0
        } else {
            self.scale
        }
    }

    pub fn scaled_size(&self) -> Size {
        self.size.scaled(self.effective_scale())
    }

    /// Scaled bounding box anchored at the top-left position.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position.to_vec(), self.scaled_size())
    }

    pub fn center(&self) -> DVec2 {
        self.position.to_vec() + self.scaled_size().to_vec() * 0.5
    }

    /// World position of a named attachment point under this object's
    /// rotation and scale. A missing point resolves to the center.
    pub fn world_point(&self, name: &str) -> DVec2 {
        let half = self.size.to_vec() * 0.5;
        let local = self.points.get(name).map(|p| p.to_vec()).unwrap_or(half);
        let offset = (local - half) * self.effective_scale();
        let rotated = DVec2::from_angle(self.rotation.to_radians()).rotate(offset);
        self.center() + rotated
    }

    /// Unit vector along the current rotation.
    pub fn heading(&self) -> DVec2 {
        DVec2::from_angle(self.rotation.to_radians())
    }

    pub fn behavior(&self, kind: BehaviorKind) -> Option<&Behavior> {
        self.behaviors.iter().find(|b| b.kind() == kind)
    }

    pub fn sprite(&self) -> Option<&SpriteData> {
        match &self.kind {
            ObjectKind::Sprite(s) | ObjectKind::TiledSprite(s) => Some(s),
            _ => None,
        }
    }

    pub fn sprite_mut(&mut self) -> Option<&mut SpriteData> {
        match &mut self.kind {
            ObjectKind::Sprite(s) | ObjectKind::TiledSprite(s) => Some(s),
            _ => None,
        }
    }

    /// Animated sprite data; tiled sprites never animate.
    pub fn animated_sprite_mut(&mut self) -> Option<&mut SpriteData> {
        match &mut self.kind {
            ObjectKind::Sprite(s) => Some(s),
            _ => None,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut TextData> {
        match &mut self.kind {
            ObjectKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn bar(&self) -> Option<&BarData> {
        match &self.kind {
            ObjectKind::Bar(b) => Some(b),
            _ => None,
        }
    }

    pub fn bar_mut(&mut self) -> Option<&mut BarData> {
        match &mut self.kind {
            ObjectKind::Bar(b) => Some(b),
            _ => None,
        }
    }
}

fn default_scale() -> f64 {
    1.0
}

fn default_visible() -> bool {
    true
}

fn default_font() -> String {
    "Arial".into()
}

fn default_font_size() -> f64 {
    16.0
}

fn default_text_color() -> String {
    "#FFFFFF".into()
}

fn default_bar_max() -> f64 {
    100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sprite_json() -> &'static str {
        r#"{
            "id": "obj_1", "name": "Player", "type": "sprite",
            "position": {"x": 10, "y": 20}, "size": {"width": 40, "height": 20},
            "scale": 2, "rotation": 0, "layer": "Main", "visible": true,
            "variables": {"score": 0},
            "points": {"muzzle": {"x": 40, "y": 10}},
            "sprite": "data:image/png;base64,AAAA",
            "animations": [{"id": "a1", "name": "run", "frames": ["f1", "f2"], "speed": 8, "loop": true}]
        }"#
    }

    #[test]
    fn sprite_object_parses_flattened_kind() {
        let obj: GameObject = serde_json::from_str(sprite_json()).unwrap();
        assert_eq!(obj.name, "Player");
        let sprite = obj.sprite().unwrap();
        assert_eq!(sprite.animation("run").unwrap().frames.len(), 2);
        assert!(sprite.animation("run").unwrap().r#loop);
    }

    #[test]
    fn bounds_use_scale() {
        let obj: GameObject = serde_json::from_str(sprite_json()).unwrap();
        let b = obj.bounds();
        assert_eq!(b.width(), 80.0);
        assert_eq!(b.height(), 40.0);
        assert_eq!(obj.center(), DVec2::new(50.0, 40.0));
    }

    #[test]
    fn zero_scale_reads_as_one() {
        let mut obj: GameObject = serde_json::from_str(sprite_json()).unwrap();
        obj.scale = 0.0;
        assert_eq!(obj.effective_scale(), 1.0);
    }

    #[test]
    fn world_point_rotates_with_object() {
        let mut obj: GameObject = serde_json::from_str(sprite_json()).unwrap();
        obj.scale = 1.0;
        obj.position = Point::new(0.0, 0.0);
        // Unrotated: muzzle sits on the right edge, vertically centered.
        let p = obj.world_point("muzzle");
        assert!((p - DVec2::new(40.0, 10.0)).length() < 1e-9);
        // Rotated 90 degrees: muzzle swings below the center.
        obj.rotation = 90.0;
        let p = obj.world_point("muzzle");
        assert!((p - DVec2::new(20.0, 30.0)).length() < 1e-9);
    }

    #[test]
    fn missing_point_is_center() {
        let obj: GameObject = serde_json::from_str(sprite_json()).unwrap();
        assert_eq!(obj.world_point("nope"), obj.center());
    }

    #[test]
    fn bar_fill_ratio_clamps() {
        let mut bar = BarData {
            max_value: 50.0,
            current_value: 75.0,
            value_from_variable: None,
            foreground_color: String::new(),
            background_color: String::new(),
            border_color: String::new(),
            border_width: 0.0,
            show_label: false,
            label_font: default_font(),
            label_color: default_text_color(),
            label_size: default_font_size(),
        };
        assert_eq!(bar.fill_ratio(), 1.0);
        bar.current_value = -5.0;
        assert_eq!(bar.fill_ratio(), 0.0);
        bar.max_value = 0.0;
        assert_eq!(bar.fill_ratio(), 0.0);
    }

    #[test]
    fn text_defaults() {
        let obj: GameObject = serde_json::from_str(
            r#"{"id":"t","name":"Label","type":"text","text":"hi"}"#,
        )
        .unwrap();
        match obj.kind {
            ObjectKind::Text(t) => {
                assert_eq!(t.font_size, 16.0);
                assert_eq!(t.align, TextAlign::Left);
            }
            other => panic!("unexpected kind {other:?}"),
        }
        assert!(obj.visible);
        assert_eq!(obj.scale, 1.0);
    }
}
