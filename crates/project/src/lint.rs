//! Static checks over a loaded project.
//!
//! None of these are fatal at runtime: dangling references simply evaluate
//! false or skip. The checks exist so tooling can surface authoring mistakes.

use crate::project::Project;
use crate::scene::Scene;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectIssue {
    NoScenes,
    DuplicateSceneId {
        scene_id: String,
    },
    DuplicateObjectId {
        scene_id: String,
        object_id: String,
    },
    DuplicateEventId {
        scene_id: String,
        event_id: String,
    },
    UnknownLayer {
        scene_id: String,
        object_id: String,
        layer: String,
    },
    DanglingObjectRef {
        scene_id: String,
        event_id: String,
        object_id: String,
    },
    UnknownScene {
        scene_id: String,
        event_id: String,
        target: String,
    },
    UnknownSound {
        scene_id: String,
        event_id: String,
        sound: String,
    },
}

impl fmt::Display for ProjectIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoScenes => write!(f, "project has no scenes"),
            Self::DuplicateSceneId { scene_id } => write!(f, "duplicate scene id {scene_id}"),
            Self::DuplicateObjectId {
                scene_id,
                object_id,
            } => write!(f, "[{scene_id}] duplicate object id {object_id}"),
            Self::DuplicateEventId { scene_id, event_id } => {
                write!(f, "[{scene_id}] duplicate event id {event_id}")
            }
            Self::UnknownLayer {
                scene_id,
                object_id,
                layer,
            } => write!(f, "[{scene_id}] object {object_id} is on unknown layer {layer:?}"),
            Self::DanglingObjectRef {
                scene_id,
                event_id,
                object_id,
            } => write!(
                f,
                "[{scene_id}] event {event_id} references missing object {object_id}"
            ),
            Self::UnknownScene {
                scene_id,
                event_id,
                target,
            } => write!(
                f,
                "[{scene_id}] event {event_id} changes to unknown scene {target}"
            ),
            Self::UnknownSound {
                scene_id,
                event_id,
                sound,
            } => write!(f, "[{scene_id}] event {event_id} uses unknown sound {sound:?}"),
        }
    }
}

/// Run every check and return the issues in a stable order.
pub fn lint(project: &Project) -> Vec<ProjectIssue> {
    let mut issues = Vec::new();
    if project.scenes.is_empty() {
        issues.push(ProjectIssue::NoScenes);
    }
    let mut scene_ids = BTreeSet::new();
    for scene in &project.scenes {
        if !scene_ids.insert(scene.id.as_str()) {
            issues.push(ProjectIssue::DuplicateSceneId {
                scene_id: scene.id.clone(),
            });
        }
        lint_scene(project, scene, &mut issues);
    }
    issues
}

fn lint_scene(project: &Project, scene: &Scene, issues: &mut Vec<ProjectIssue>) {
    use crate::event::ActionKind;

    let mut object_ids = BTreeSet::new();
    for object in &scene.objects {
        if !object_ids.insert(object.id.as_str()) {
            issues.push(ProjectIssue::DuplicateObjectId {
                scene_id: scene.id.clone(),
                object_id: object.id.clone(),
            });
        }
        if scene.layer(&object.layer).is_none() {
            issues.push(ProjectIssue::UnknownLayer {
                scene_id: scene.id.clone(),
                object_id: object.id.clone(),
                layer: object.layer.clone(),
            });
        }
    }

    let mut event_ids = BTreeSet::new();
    for event in scene.all_events() {
        if !event_ids.insert(event.id.as_str()) {
            issues.push(ProjectIssue::DuplicateEventId {
                scene_id: scene.id.clone(),
                event_id: event.id.clone(),
            });
        }
        let refs = event
            .conditions
            .iter()
            .flat_map(|c| c.kind.object_refs())
            .chain(event.actions.iter().flat_map(|a| a.kind.object_refs()));
        for object_id in refs {
            if !object_ids.contains(object_id) {
                issues.push(ProjectIssue::DanglingObjectRef {
                    scene_id: scene.id.clone(),
                    event_id: event.id.clone(),
                    object_id: object_id.to_string(),
                });
            }
        }
        for action in &event.actions {
            match &action.kind {
                ActionKind::ChangeScene { scene_id } if project.scene(scene_id).is_none() => {
                    issues.push(ProjectIssue::UnknownScene {
                        scene_id: scene.id.clone(),
                        event_id: event.id.clone(),
                        target: scene_id.clone(),
                    });
                }
                ActionKind::PlaySound { sound }
                | ActionKind::StopSound { sound }
                | ActionKind::PlayMusic { sound }
                    if project.sound(sound).is_none() =>
                {
                    issues.push(ProjectIssue::UnknownSound {
                        scene_id: scene.id.clone(),
                        event_id: event.id.clone(),
                        sound: sound.clone(),
                    });
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clean_project_has_no_issues() {
        let p: Project = serde_json::from_value(json!({
            "scenes": [{
                "id": "s1",
                "layers": [{"name": "Main"}],
                "objects": [{"id": "o1", "name": "A", "type": "sprite", "layer": "Main"}],
                "events": [{"type": "event", "id": "e1", "conditions": [],
                            "actions": [{"id": "a1", "type": "move_object", "objectId": "o1", "dx": 1, "dy": 0}]}]
            }]
        }))
        .unwrap();
        assert!(lint(&p).is_empty());
    }

    #[test]
    fn reports_dangling_and_unknown_refs() {
        let p: Project = serde_json::from_value(json!({
            "scenes": [{
                "id": "s1",
                "layers": [{"name": "Main"}],
                "objects": [{"id": "o1", "name": "A", "type": "sprite", "layer": "UI"}],
                "events": [
                    {"type": "event", "id": "e1", "conditions": [
                        {"id": "c1", "type": "collision", "objectId1": "o1", "objectId2": "ghost"}
                    ], "actions": [
                        {"id": "a1", "type": "change_scene", "sceneId": "nowhere"},
                        {"id": "a2", "type": "play_sound", "sound": "boom"}
                    ]},
                    {"type": "group", "id": "g", "isCollapsed": true, "events": [
                        {"type": "event", "id": "e1", "conditions": [], "actions": []}
                    ]}
                ]
            }]
        }))
        .unwrap();
        let issues = lint(&p);
        assert_eq!(issues.len(), 5, "{issues:?}");
        assert!(issues.contains(&ProjectIssue::DanglingObjectRef {
            scene_id: "s1".into(),
            event_id: "e1".into(),
            object_id: "ghost".into(),
        }));
        assert!(issues.iter().any(|i| matches!(i, ProjectIssue::UnknownLayer { .. })));
        assert!(issues.iter().any(|i| matches!(i, ProjectIssue::DuplicateEventId { .. })));
        assert!(issues.iter().any(|i| matches!(i, ProjectIssue::UnknownScene { .. })));
        assert!(issues.iter().any(|i| matches!(i, ProjectIssue::UnknownSound { .. })));
    }

    #[test]
    fn empty_project_is_flagged() {
        assert_eq!(lint(&Project::default()), vec![ProjectIssue::NoScenes]);
    }
}
