use crate::ProjectError;
use crate::object::ObjectKind;
use crate::scene::Scene;
use gamma_common::{Size, VariableMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
}

/// Project-wide presentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loading_screen_image: Option<String>,
    #[serde(default = "default_resolution")]
    pub resolution: Size,
    #[serde(default)]
    pub orientation: Orientation,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            version: String::new(),
            icon: None,
            loading_screen_image: None,
            resolution: default_resolution(),
            orientation: Orientation::default(),
        }
    }
}

fn default_resolution() -> Size {
    Size::new(800.0, 600.0)
}

/// A named audio clip. `data_url` is the encoded source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundAsset {
    pub name: String,
    pub data_url: String,
    /// 0..1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_music: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectAssets {
    #[serde(default)]
    pub sounds: Vec<SoundAsset>,
}

/// The root project document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub settings: GameSettings,
    #[serde(default)]
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub assets: ProjectAssets,
    #[serde(default)]
    pub global_variables: VariableMap,
}

impl Project {
    pub fn from_json_str(json: &str) -> Result<Self, ProjectError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a project document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let project: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        tracing::debug!(
            path = %path.display(),
            scenes = project.scenes.len(),
            "project loaded"
        );
        Ok(project)
    }

    /// Write the project document as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProjectError> {
        let file = std::fs::File::create(path.as_ref())?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn scene(&self, id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    pub fn first_scene(&self) -> Option<&Scene> {
        self.scenes.first()
    }

    pub fn sound(&self, name: &str) -> Option<&SoundAsset> {
        self.assets.sounds.iter().find(|s| s.name == name)
    }

    /// Every distinct image source referenced anywhere in the project:
    /// sprite images and animation frames across all scenes.
    pub fn sprite_sources(&self) -> BTreeSet<&str> {
        let mut sources = BTreeSet::new();
        for object in self.scenes.iter().flat_map(|s| &s.objects) {
            let sprite = match &object.kind {
                ObjectKind::Sprite(s) | ObjectKind::TiledSprite(s) => s,
                ObjectKind::Text(_) | ObjectKind::Bar(_) => continue,
            };
            sources.extend(sprite.sprite.as_deref().filter(|s| !s.is_empty()));
            for animation in &sprite.animations {
                sources.extend(animation.frames.iter().map(String::as_str));
            }
        }
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project_json() -> serde_json::Value {
        json!({
            "settings": {
                "title": "Demo", "description": "", "version": "1.0",
                "resolution": {"width": 1280, "height": 720}, "orientation": "landscape"
            },
            "scenes": [{
                "id": "s1", "name": "Level",
                "layers": [{"name": "Main", "visibleInEditor": true, "parallaxX": 1, "parallaxY": 1}],
                "objects": [
                    {"id": "o1", "name": "Hero", "type": "sprite", "layer": "Main",
                     "sprite": "data:image/png;base64,AAA",
                     "animations": [{"id": "a", "name": "walk", "frames": ["data:image/png;base64,AAA", "data:image/png;base64,BBB"], "speed": 4, "loop": true}]},
                    {"id": "o2", "name": "Score", "type": "text", "layer": "Main", "text": "0"}
                ],
                "events": []
            }],
            "assets": {"sounds": [{"name": "shot", "dataUrl": "data:audio/wav;base64,AAA", "isMusic": false}]},
            "globalVariables": {"score": 0}
        })
    }

    #[test]
    fn parses_full_document() {
        let p: Project = serde_json::from_value(project_json()).unwrap();
        assert_eq!(p.settings.resolution, Size::new(1280.0, 720.0));
        assert_eq!(p.scene("s1").unwrap().objects.len(), 2);
        assert_eq!(p.sound("shot").unwrap().is_music, Some(false));
        assert!(p.scene("missing").is_none());
    }

    #[test]
    fn sprite_sources_are_deduplicated() {
        let p: Project = serde_json::from_value(project_json()).unwrap();
        let sources = p.sprite_sources();
        assert_eq!(sources.len(), 2);
        assert!(sources.contains("data:image/png;base64,BBB"));
    }

    #[test]
    fn save_and_load_through_disk() {
        let p: Project = serde_json::from_value(project_json()).unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("game.json");
        p.save(&path).unwrap();
        let loaded = Project::load(&path).unwrap();
        assert_eq!(loaded, p);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            Project::from_json_str("{ not json"),
            Err(ProjectError::Json(_))
        ));
    }

    #[test]
    fn empty_document_uses_defaults() {
        let p = Project::from_json_str("{}").unwrap();
        assert!(p.scenes.is_empty());
        assert_eq!(p.settings.resolution.width, 800.0);
    }
}
