//! Save snapshots: what a slot holds and how the session reads and writes
//! it.

use crate::camera::CameraState;
use crate::instance::RuntimeInstance;
use crate::session::Session;
use gamma_common::VariableMap;
use gamma_persist::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Contents of one save slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveState {
    /// Milliseconds since the Unix epoch when the save was taken.
    pub timestamp: u64,
    pub current_scene_id: String,
    pub instances: Vec<RuntimeInstance>,
    #[serde(default)]
    pub global_variables: VariableMap,
    pub camera: CameraState,
    /// Timer name -> seconds elapsed at save time.
    #[serde(default)]
    pub timers: BTreeMap<String, f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no save in slot {0:?}")]
    Missing(String),
    #[error("save refers to unknown scene {0:?}")]
    UnknownScene(String),
    /// The snapshot would not read back as taken, e.g. a variable holds a
    /// non-finite number. Nothing is written.
    #[error("state for slot {0:?} does not survive a save and load")]
    Unrepresentable(String),
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl Session {
    /// Store key for a slot name.
    pub fn slot_key(&self, slot: &str) -> String {
        format!("{}{}", self.config.save_prefix, slot)
    }

    /// Capture the current state. Pending spawns and destroys are not part
    /// of it.
    pub fn snapshot(&self) -> SaveState {
        SaveState {
            timestamp: now_millis(),
            current_scene_id: self.scene.id.clone(),
            instances: self.store.as_slice().to_vec(),
            global_variables: self.globals.clone(),
            camera: self.camera.state().clone(),
            timers: self
                .timers
                .iter()
                .map(|(name, start)| (name.clone(), self.clock - start))
                .collect(),
        }
    }

    /// Write a snapshot to `slot`. Refused when the snapshot would not load
    /// back exactly.
    pub fn save(&mut self, slot: &str) -> Result<(), SaveError> {
        let key = self.slot_key(slot);
        let state = self.snapshot();
        let text = serde_json::to_string(&state)?;
        let reread: SaveState = serde_json::from_str(&text)?;
        if reread != state {
            tracing::warn!(slot, "state holds values JSON cannot carry, not saved");
            return Err(SaveError::Unrepresentable(slot.to_string()));
        }
        self.slots.set(&key, &text)?;
        tracing::debug!(slot, instances = state.instances.len(), "game saved");
        Ok(())
    }

    /// Replace live state with a slot's contents. On any error nothing is
    /// changed.
    pub fn load(&mut self, slot: &str) -> Result<(), SaveError> {
        let key = self.slot_key(slot);
        let text = self
            .slots
            .get(&key)?
            .ok_or_else(|| SaveError::Missing(slot.to_string()))?;
        let state: SaveState = serde_json::from_str(&text)?;
        let scene = self
            .project
            .scene(&state.current_scene_id)
            .ok_or_else(|| SaveError::UnknownScene(state.current_scene_id.clone()))?;
        self.scene = Arc::new(scene.clone());

        let mut instances = state.instances;
        for inst in &mut instances {
            inst.ensure_behavior_state();
        }
        self.store.replace(instances);
        self.globals = state.global_variables;
        self.camera.restore(state.camera);
        self.timers = state
            .timers
            .into_iter()
            .map(|(name, elapsed)| (name, self.clock - elapsed))
            .collect();
        self.scene_start_fired.clear();
        self.every_x.clear();
        self.scene_started_at = self.clock;
        self.pending_scene = None;
        self.pending_load = None;
        tracing::debug!(slot, scene = %self.scene.id, instances = self.store.len(), "game loaded");
        Ok(())
    }

    pub fn clear_save(&mut self, slot: &str) -> Result<(), SaveError> {
        let key = self.slot_key(slot);
        self.slots.remove(&key)?;
        tracing::debug!(slot, "save cleared");
        Ok(())
    }

    pub fn save_exists(&self, slot: &str) -> bool {
        self.slots.contains(&self.slot_key(slot))
    }
}
