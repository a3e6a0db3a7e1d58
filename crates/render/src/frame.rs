use gamma_assets::{AssetHandle, AssetStatus};
use gamma_common::{Size, value::format_number};
use gamma_kernel::{RuntimeInstance, Session};
use gamma_project::{BarData, ObjectKind, SpriteData, TextAlign, TextBaseline};
use glam::DVec2;
use serde::Serialize;

/// View parameters shared by every drawable in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraTransform {
    pub viewport: Size,
    pub center: DVec2,
    pub zoom: f64,
    /// Draw-time jitter added to the camera center.
    pub shake: DVec2,
}

impl CameraTransform {
    /// Map a world point to viewport pixels.
    ///
    /// Parallax scales how far the camera has moved from its home position
    /// (the viewport center): 1 tracks the camera, 0 stays fixed on screen.
    pub fn world_to_screen(&self, world: DVec2, parallax: DVec2) -> DVec2 {
        let home = self.viewport.to_vec() * 0.5;
        let eye = home + (self.center + self.shake - home) * parallax;
        (world - eye) * self.zoom + home
    }
}

/// What to draw for one instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Paint {
    Sprite {
        asset: AssetHandle,
    },
    TiledSprite {
        asset: AssetHandle,
    },
    /// Image not (yet) available: draw a box instead.
    Placeholder {
        pending: bool,
    },
    Text {
        text: String,
        font: String,
        font_size: f64,
        color: String,
        align: TextAlign,
        baseline: TextBaseline,
    },
    Bar {
        fill_ratio: f64,
        foreground_color: String,
        background_color: String,
        border_color: String,
        border_width: f64,
        label: Option<String>,
        label_font: String,
        label_color: String,
        label_size: f64,
    },
}

/// One instance resolved for drawing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Drawable {
    pub instance_id: String,
    pub layer: usize,
    /// Top-left in world space.
    pub position: DVec2,
    /// Size with scale applied.
    pub size: Size,
    /// Degrees about the center.
    pub rotation: f64,
    pub parallax: DVec2,
    pub paint: Paint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupView {
    pub title: String,
    pub content: String,
    pub button_text: String,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderFrame {
    pub camera: CameraTransform,
    pub drawables: Vec<Drawable>,
    pub popup: Option<PopupView>,
}

impl RenderFrame {
    /// Snapshot the session's current state.
    pub fn build(session: &Session) -> Self {
        let camera = session.camera();
        let transform = CameraTransform {
            viewport: session.config().viewport,
            center: camera.position(),
            zoom: camera.zoom(),
            shake: camera.shake_offset(),
        };

        let scene = session.scene();
        let mut drawables = Vec::new();
        for (index, layer) in scene.layers.iter().enumerate() {
            let parallax = DVec2::new(layer.parallax_x, layer.parallax_y);
            for inst in session.instances() {
                let o = &inst.object;
                if !o.visible || o.layer != layer.name {
                    continue;
                }
                drawables.push(Drawable {
                    instance_id: o.id.clone(),
                    layer: index,
                    position: o.position.to_vec(),
                    size: o.scaled_size(),
                    rotation: o.rotation,
                    parallax,
                    paint: paint_for(session, inst),
                });
            }
        }
        let skipped = session
            .instances()
            .iter()
            .filter(|i| i.object.visible && scene.layer(&i.object.layer).is_none())
            .count();
        if skipped > 0 {
            tracing::debug!(skipped, "instances on unknown layers not drawn");
        }

        Self {
            camera: transform,
            drawables,
            popup: session.popup().map(|p| PopupView {
                title: p.title.clone(),
                content: p.content.clone(),
                button_text: p.button_text.clone(),
            }),
        }
    }
}

/// Bar label text: the rounded value over the maximum.
pub fn bar_label(bar: &BarData) -> String {
    format!(
        "{} / {}",
        format_number(bar.current_value.round()),
        format_number(bar.max_value)
    )
}

/// Image source to show for a sprite: the current animation frame when one
/// is playing, otherwise the still image.
fn sprite_source<'a>(sprite: &'a SpriteData, inst: &RuntimeInstance) -> Option<&'a str> {
    let frame = sprite
        .current_animation
        .as_deref()
        .and_then(|name| sprite.animation(name))
        .filter(|a| !a.frames.is_empty())
        .map(|a| a.frames[inst.animation.frame_index.min(a.frames.len() - 1)].as_str());
    frame.or(sprite.sprite.as_deref()).filter(|s| !s.is_empty())
}

fn image_paint(session: &Session, source: Option<&str>, tiled: bool) -> Paint {
    let Some(source) = source else {
        return Paint::Placeholder { pending: false };
    };
    match session.assets().lookup_source(source) {
        AssetStatus::Ready(asset) if tiled => Paint::TiledSprite { asset },
        AssetStatus::Ready(asset) => Paint::Sprite { asset },
        AssetStatus::Pending => Paint::Placeholder { pending: true },
        AssetStatus::Failed => Paint::Placeholder { pending: false },
    }
}

fn paint_for(session: &Session, inst: &RuntimeInstance) -> Paint {
    match &inst.object.kind {
        ObjectKind::Sprite(sprite) => image_paint(session, sprite_source(sprite, inst), false),
        ObjectKind::TiledSprite(sprite) => {
            image_paint(session, sprite.sprite.as_deref().filter(|s| !s.is_empty()), true)
        }
        ObjectKind::Text(text) => Paint::Text {
            text: text.text.clone(),
            font: text.font.clone(),
            font_size: text.font_size,
            color: text.color.clone(),
            align: text.align,
            baseline: text.baseline,
        },
        ObjectKind::Bar(bar) => Paint::Bar {
            fill_ratio: bar.fill_ratio(),
            foreground_color: bar.foreground_color.clone(),
            background_color: bar.background_color.clone(),
            border_color: bar.border_color.clone(),
            border_width: bar.border_width,
            label: bar.show_label.then(|| bar_label(bar)),
            label_font: bar.label_font.clone(),
            label_color: bar.label_color.clone(),
            label_size: bar.label_size,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamma_assets::DecodeMode;
    use gamma_kernel::SessionConfig;
    use gamma_project::Project;
    use serde_json::json;

    const PNG: &str = "data:image/png;base64,AAAA";

    fn session() -> Session {
        let project: Project = serde_json::from_value(json!({
            "scenes": [{
                "id": "s1",
                "layers": [{"name": "Back", "parallaxX": 0.5, "parallaxY": 0.5}, {"name": "Main"}],
                "objects": [
                    {"id": "hud", "name": "Hud", "type": "bar", "layer": "Main",
                     "maxValue": 50, "currentValue": 80.4, "showLabel": true},
                    {"id": "bg", "name": "Bg", "type": "tiled_sprite", "layer": "Back", "sprite": PNG,
                     "size": {"width": 10, "height": 10}, "scale": 2},
                    {"id": "lost", "name": "Lost", "type": "sprite", "layer": "Nowhere", "sprite": PNG},
                    {"id": "gone", "name": "Gone", "type": "sprite", "layer": "Main", "visible": false},
                    {"id": "broken", "name": "Broken", "type": "sprite", "layer": "Main", "sprite": "not-a-url"}
                ]
            }]
        }))
        .unwrap();
        let config = SessionConfig::from_settings(&project.settings).with_decode_mode(DecodeMode::Inline);
        let mut s = Session::new(project, config).unwrap();
        s.initialize(None).unwrap();
        s
    }

    #[test]
    fn drawables_follow_layer_order_and_skip_hidden() {
        let frame = RenderFrame::build(&session());
        let ids: Vec<_> = frame.drawables.iter().map(|d| d.instance_id.as_str()).collect();
        assert_eq!(ids, ["bg", "hud", "broken"]);
        assert_eq!(frame.drawables[0].size, Size::new(20.0, 20.0));
        assert_eq!(frame.drawables[0].parallax, DVec2::splat(0.5));
        assert!(matches!(frame.drawables[0].paint, Paint::TiledSprite { .. }));
        assert_eq!(frame.drawables[2].paint, Paint::Placeholder { pending: false });
    }

    #[test]
    fn bar_fill_is_clamped_and_labelled() {
        let frame = RenderFrame::build(&session());
        match &frame.drawables[1].paint {
            Paint::Bar {
                fill_ratio, label, ..
            } => {
                assert_eq!(*fill_ratio, 1.0);
                assert_eq!(label.as_deref(), Some("80 / 50"));
            }
            other => panic!("unexpected paint {other:?}"),
        }
    }

    #[test]
    fn parallax_zero_ignores_camera_motion() {
        let t = CameraTransform {
            viewport: Size::new(800.0, 600.0),
            center: DVec2::new(1400.0, 300.0),
            zoom: 1.0,
            shake: DVec2::ZERO,
        };
        let p = DVec2::new(10.0, 10.0);
        assert_eq!(t.world_to_screen(p, DVec2::ZERO), p);
        assert_eq!(t.world_to_screen(p, DVec2::ONE), DVec2::new(-990.0, 10.0));
    }
}
