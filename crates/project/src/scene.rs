use crate::event::{Action, Condition};
use crate::object::GameObject;
use serde::{Deserialize, Serialize};

/// A named draw layer. Scene layer order is draw order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub name: String,
    #[serde(default = "default_visible")]
    pub visible_in_editor: bool,
    #[serde(default = "default_parallax_factor")]
    pub parallax_x: f64,
    #[serde(default = "default_parallax_factor")]
    pub parallax_y: f64,
}

fn default_visible() -> bool {
    true
}

fn default_parallax_factor() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEvent {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum EventTreeNode {
    Event(GameEvent),
    Group {
        id: String,
        #[serde(default)]
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
        #[serde(default)]
        is_collapsed: bool,
        #[serde(default)]
        events: Vec<EventTreeNode>,
    },
    Comment {
        id: String,
        #[serde(default)]
        comment: String,
    },
}

impl EventTreeNode {
    pub fn id(&self) -> &str {
        match self {
            Self::Event(e) => &e.id,
            Self::Group { id, .. } | Self::Comment { id, .. } => id,
        }
    }
}

/// A scene template. Never mutated while a session runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub objects: Vec<GameObject>,
    #[serde(default)]
    pub events: Vec<EventTreeNode>,
}

impl Scene {
    /// Active events in depth-first declaration order. Collapsed groups and
    /// everything below them are skipped.
    pub fn events_in_order(&self) -> Vec<&GameEvent> {
        fn walk<'a>(nodes: &'a [EventTreeNode], out: &mut Vec<&'a GameEvent>) {
            for node in nodes {
                match node {
                    EventTreeNode::Event(event) => out.push(event),
                    EventTreeNode::Group {
                        is_collapsed: false,
                        events,
                        ..
                    } => walk(events, out),
                    EventTreeNode::Group { .. } | EventTreeNode::Comment { .. } => {}
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.events, &mut out);
        out
    }

    /// Every event, including those inside collapsed groups.
    pub fn all_events(&self) -> Vec<&GameEvent> {
        fn walk<'a>(nodes: &'a [EventTreeNode], out: &mut Vec<&'a GameEvent>) {
            for node in nodes {
                match node {
                    EventTreeNode::Event(event) => out.push(event),
                    EventTreeNode::Group { events, .. } => walk(events, out),
                    EventTreeNode::Comment { .. } => {}
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.events, &mut out);
        out
    }

    pub fn object(&self, id: &str) -> Option<&GameObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// First template with the given name; spawns copy from it.
    pub fn template_by_name(&self, name: &str) -> Option<&GameObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn layer_index(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.name == name)
    }
}
