use crate::frame::{Paint, RenderFrame};

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer only ever sees a [`RenderFrame`]; it cannot reach the
/// session that produced it.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    fn render(&self, frame: &RenderFrame) -> Self::Output;
}

/// Produces a human-readable description of a frame. Used by the CLI and
/// in tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, frame: &RenderFrame) -> String {
        let mut out = String::new();
        let cam = &frame.camera;
        out.push_str(&format!(
            "=== Frame ({} drawables) ===\ncamera=({:.1}, {:.1}) zoom={:.2} viewport={}x{}\n",
            frame.drawables.len(),
            cam.center.x,
            cam.center.y,
            cam.zoom,
            cam.viewport.width,
            cam.viewport.height
        ));
        if let Some(popup) = &frame.popup {
            out.push_str(&format!("popup: {:?} [{}]\n", popup.title, popup.button_text));
        }
        for d in &frame.drawables {
            let paint = match &d.paint {
                Paint::Sprite { asset } => format!("sprite {}", asset.mime),
                Paint::TiledSprite { asset } => format!("tiled {}", asset.mime),
                Paint::Placeholder { pending: true } => "placeholder (loading)".to_string(),
                Paint::Placeholder { pending: false } => "placeholder".to_string(),
                Paint::Text { text, .. } => format!("text {text:?}"),
                Paint::Bar {
                    fill_ratio, label, ..
                } => match label {
                    Some(label) => format!("bar {:.0}% {label:?}", fill_ratio * 100.0),
                    None => format!("bar {:.0}%", fill_ratio * 100.0),
                },
            };
            out.push_str(&format!(
                "  L{} {} pos=({:.1}, {:.1}) size={}x{} rot={:.1} {}\n",
                d.layer,
                d.instance_id,
                d.position.x,
                d.position.y,
                d.size.width,
                d.size.height,
                d.rotation,
                paint
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{CameraTransform, Drawable};
    use gamma_common::Size;
    use glam::DVec2;

    fn frame(drawables: Vec<Drawable>) -> RenderFrame {
        RenderFrame {
            camera: CameraTransform {
                viewport: Size::new(800.0, 600.0),
                center: DVec2::new(400.0, 300.0),
                zoom: 1.0,
                shake: DVec2::ZERO,
            },
            drawables,
            popup: None,
        }
    }

    #[test]
    fn empty_frame() {
        let out = DebugTextRenderer::new().render(&frame(Vec::new()));
        assert!(out.contains("0 drawables"));
        assert!(out.contains("camera=(400.0, 300.0)"));
    }

    #[test]
    fn lists_each_drawable() {
        let out = DebugTextRenderer::new().render(&frame(vec![Drawable {
            instance_id: "score".into(),
            layer: 2,
            position: DVec2::new(1.0, 2.0),
            size: Size::new(10.0, 5.0),
            rotation: 0.0,
            parallax: DVec2::ONE,
            paint: Paint::Text {
                text: "Score: 3".into(),
                font: "Arial".into(),
                font_size: 16.0,
                color: "#fff".into(),
                align: Default::default(),
                baseline: Default::default(),
            },
        }]));
        assert!(out.contains("L2 score pos=(1.0, 2.0)"));
        assert!(out.contains("text \"Score: 3\""));
    }
}
