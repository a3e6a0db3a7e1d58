//! The running game: one project, one active scene, and all mutable
//! simulation state.

use crate::audio::{AudioBackend, Mixer};
use crate::behaviors;
use crate::camera::{Camera, CameraState};
use crate::save::SaveError;
use crate::store::InstanceStore;
use crate::instance::RuntimeInstance;
use gamma_assets::{AssetBridge, AssetHandle, AssetId, AssetKind, DecodeMode};
use gamma_common::{Size, VariableMap};
use gamma_input::{InputEvent, InputTracker};
use gamma_persist::{MemorySlotStore, SlotStore};
use gamma_project::{GameSettings, Project, Scene};
use glam::DVec2;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Tunables for a session. Defaults come from the project settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub viewport: Size,
    /// Fraction of the remaining distance the follow camera closes per tick.
    pub follow_smoothing: f64,
    pub save_prefix: String,
    pub shake_seed: u64,
    pub decode_mode: DecodeMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_settings(&GameSettings::default())
    }
}

impl SessionConfig {
    pub fn from_settings(settings: &GameSettings) -> Self {
        Self {
            viewport: settings.resolution,
            follow_smoothing: 0.1,
            save_prefix: "gamma_save_".to_string(),
            shake_seed: 0x5eed,
            decode_mode: DecodeMode::default(),
        }
    }

    pub fn with_viewport(mut self, viewport: Size) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_follow_smoothing(mut self, smoothing: f64) -> Self {
        self.follow_smoothing = smoothing;
        self
    }

    pub fn with_save_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.save_prefix = prefix.into();
        self
    }

    pub fn with_shake_seed(mut self, seed: u64) -> Self {
        self.shake_seed = seed;
        self
    }

    pub fn with_decode_mode(mut self, mode: DecodeMode) -> Self {
        self.decode_mode = mode;
        self
    }
}

/// Modal message raised by `show_popup`. Gameplay is suspended while one is
/// open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popup {
    pub title: String,
    pub content: String,
    pub button_text: String,
}

/// What a call to [`Session::tick`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Normal gameplay tick.
    Advanced,
    /// A popup is open; only input history moved.
    Paused,
    /// The event pass requested a scene change and it was applied.
    SceneChanged(String),
    /// A save slot was loaded; the rest of the tick was skipped.
    Loaded(String),
    /// The session has been torn down.
    Closed,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("project has no scenes")]
    NoScenes,
    #[error("unknown scene {0:?}")]
    UnknownScene(String),
    #[error(transparent)]
    Save(#[from] SaveError),
}

/// A running game session.
///
/// All mutable runtime state lives here; templates in the project are never
/// touched.
pub struct Session {
    pub(crate) project: Arc<Project>,
    pub(crate) config: SessionConfig,
    pub(crate) scene: Arc<Scene>,
    pub(crate) store: InstanceStore,
    pub(crate) globals: VariableMap,
    pub(crate) camera: Camera,
    pub(crate) input: InputTracker,
    pub(crate) assets: AssetBridge,
    pub(crate) mixer: Mixer,
    pub(crate) slots: Box<dyn SlotStore>,
    /// Seconds of processed gameplay.
    pub(crate) clock: f64,
    pub(crate) scene_started_at: f64,
    /// Timer name -> clock value when started.
    pub(crate) timers: BTreeMap<String, f64>,
    /// `every_x_seconds` condition id -> clock value when it last fired.
    pub(crate) every_x: BTreeMap<String, f64>,
    pub(crate) scene_start_fired: BTreeSet<String>,
    pub(crate) popup: Option<Popup>,
    pub(crate) pending_scene: Option<String>,
    pub(crate) pending_load: Option<String>,
    /// Sound name -> asset id of its source.
    pub(crate) sounds: BTreeMap<String, AssetId>,
    assets_registered: bool,
    closed: bool,
    tick_count: u64,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("scene", &self.scene.id)
            .field("instances", &self.store.len())
            .field("clock", &self.clock)
            .field("tick_count", &self.tick_count)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Build a session on the project's first scene. Call
    /// [`Session::initialize`] before ticking.
    pub fn new(project: Project, config: SessionConfig) -> Result<Self, SessionError> {
        let scene = project.first_scene().cloned().ok_or(SessionError::NoScenes)?;
        let globals = project.global_variables.clone();
        let camera = Camera::new(config.viewport.to_vec() * 0.5, config.shake_seed);
        let assets = AssetBridge::new(gamma_assets::DataUrlDecoder, config.decode_mode);
        Ok(Self {
            project: Arc::new(project),
            scene: Arc::new(scene),
            store: InstanceStore::new(),
            globals,
            camera,
            input: InputTracker::new(),
            assets,
            mixer: Mixer::default(),
            slots: Box::new(MemorySlotStore::new()),
            clock: 0.0,
            scene_started_at: 0.0,
            timers: BTreeMap::new(),
            every_x: BTreeMap::new(),
            scene_start_fired: BTreeSet::new(),
            popup: None,
            pending_scene: None,
            pending_load: None,
            sounds: BTreeMap::new(),
            assets_registered: false,
            closed: false,
            tick_count: 0,
            config,
        })
    }

    pub fn with_slot_store(mut self, slots: Box<dyn SlotStore>) -> Self {
        self.slots = slots;
        self
    }

    pub fn with_audio(mut self, backend: Box<dyn AudioBackend>) -> Self {
        self.mixer = Mixer::new(backend);
        self
    }

    pub fn with_assets(mut self, assets: AssetBridge) -> Self {
        self.assets = assets;
        self
    }

    /// Register project assets and activate a scene (the first one when
    /// `scene_id` is `None`).
    pub fn initialize(&mut self, scene_id: Option<&str>) -> Result<(), SessionError> {
        self.register_assets();
        let scene = match scene_id {
            Some(id) => self
                .project
                .scene(id)
                .ok_or_else(|| SessionError::UnknownScene(id.to_string()))?,
            None => self.project.first_scene().ok_or(SessionError::NoScenes)?,
        };
        let scene = Arc::new(scene.clone());
        self.activate(scene);
        self.closed = false;
        Ok(())
    }

    fn register_assets(&mut self) {
        if self.assets_registered {
            return;
        }
        let project = Arc::clone(&self.project);
        let mut images = 0usize;
        for source in project.sprite_sources() {
            self.assets.request(AssetKind::Image, source);
            images += 1;
        }
        for sound in &project.assets.sounds {
            let id = self.assets.request(AssetKind::Audio, &sound.data_url);
            self.sounds.insert(sound.name.clone(), id);
        }
        tracing::debug!(images, sounds = self.sounds.len(), "project assets registered");
        self.assets_registered = true;
    }

    /// Make `scene` the active scene with fresh instances, camera and
    /// per-activation bookkeeping. Globals and timers carry over.
    pub(crate) fn activate(&mut self, scene: Arc<Scene>) {
        self.store.initialize(&scene);
        self.camera.reset(self.config.viewport.to_vec() * 0.5);
        self.scene_start_fired.clear();
        self.every_x.clear();
        self.scene_started_at = self.clock;
        self.pending_scene = None;
        self.pending_load = None;
        tracing::debug!(scene = %scene.id, instances = self.store.len(), "scene activated");
        self.scene = scene;
    }

    /// Stop all playback and close the session. Later ticks do nothing.
    pub fn teardown(&mut self) {
        if self.closed {
            return;
        }
        self.mixer.stop_all();
        self.popup = None;
        self.closed = true;
        tracing::debug!(ticks = self.tick_count, "session torn down");
    }

    /// Feed one host input event.
    pub fn handle_input(&mut self, event: InputEvent) {
        self.input.apply(event);
    }

    /// Pointer moved to `screen` (viewport pixels).
    pub fn pointer_moved(&mut self, screen: DVec2) {
        let world = self.camera.screen_to_world(screen, self.config.viewport);
        self.input.set_pointer(world);
    }

    /// Primary click at `screen`. The top-most visible instance under the
    /// pointer becomes this tick's clicked object. Ignored while a popup is
    /// open.
    pub fn click(&mut self, screen: DVec2) {
        if self.popup.is_some() {
            tracing::debug!("click ignored while popup is open");
            return;
        }
        self.pointer_moved(screen);
        let hit = self.hit_test(self.input.pointer()).map(str::to_string);
        self.input.set_clicked(hit);
    }

    /// Top-most visible instance containing `world`: later layers first,
    /// later instances first within a layer.
    pub fn hit_test(&self, world: DVec2) -> Option<&str> {
        self.scene.layers.iter().rev().find_map(|layer| {
            self.store
                .iter()
                .rev()
                .filter(|i| i.object.layer == layer.name && i.object.visible)
                .find(|i| i.object.bounds().contains(world))
                .map(RuntimeInstance::id)
        })
    }

    pub fn dismiss_popup(&mut self) {
        if self.popup.take().is_some() {
            tracing::debug!("popup dismissed");
        }
    }

    /// Advance the simulation by `dt` seconds.
    pub fn tick(&mut self, dt: f64) -> TickOutcome {
        if self.closed {
            return TickOutcome::Closed;
        }
        let _span = tracing::info_span!("tick", n = self.tick_count).entered();
        self.tick_count += 1;

        if self.popup.is_some() {
            self.input.rotate();
            return TickOutcome::Paused;
        }

        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.clock += dt;
        self.mixer.reap();
        self.camera.begin_tick();

        let scene = Arc::clone(&self.scene);
        behaviors::step_behaviors(&mut self.store, &scene, &self.input, dt);
        behaviors::sync_bars(&mut self.store, &self.globals);
        behaviors::advance_animations(&mut self.store, dt);

        self.run_events(dt);

        let outcome = self.reconcile();
        if !matches!(outcome, TickOutcome::Loaded(_)) {
            let store = &self.store;
            self.camera.update(
                dt,
                self.config.viewport,
                self.config.follow_smoothing,
                |id| store.get(id).map(RuntimeInstance::center),
            );
        }
        self.input.rotate();
        outcome
    }

    /// Apply whatever the event pass deferred: a load wins over a scene
    /// change, which wins over queued spawns and destroys.
    fn reconcile(&mut self) -> TickOutcome {
        if let Some(slot) = self.pending_load.take() {
            match self.load(&slot) {
                Ok(()) => return TickOutcome::Loaded(slot),
                Err(e) => tracing::warn!(slot, error = %e, "load ignored"),
            }
        }
        if let Some(id) = self.pending_scene.take() {
            match self.project.scene(&id) {
                Some(scene) => {
                    let scene = Arc::new(scene.clone());
                    self.activate(scene);
                    return TickOutcome::SceneChanged(id);
                }
                None => tracing::warn!(scene = id, "change to unknown scene dropped"),
            }
        }
        self.store.apply_pending();
        TickOutcome::Advanced
    }

    /// Decoded clip for a named sound, if it is ready.
    pub(crate) fn sound_clip(&self, name: &str) -> Option<AssetHandle> {
        let id = self.sounds.get(name)?;
        self.assets.lookup(*id).ready().cloned()
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn instances(&self) -> &[RuntimeInstance] {
        self.store.as_slice()
    }

    pub fn instance(&self, id: &str) -> Option<&RuntimeInstance> {
        self.store.get(id)
    }

    pub fn globals(&self) -> &VariableMap {
        &self.globals
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_state(&self) -> &CameraState {
        self.camera.state()
    }

    pub fn assets(&self) -> &AssetBridge {
        &self.assets
    }

    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }

    pub fn input(&self) -> &InputTracker {
        &self.input
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    /// Seconds of processed gameplay since the session started.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
