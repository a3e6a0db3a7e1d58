//! Audio mixer over a pluggable playback backend.

use gamma_assets::AssetHandle;
use std::collections::{BTreeMap, BTreeSet};

/// Opaque id of one playback started by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaybackId(pub u64);

/// Host audio output.
pub trait AudioBackend {
    /// Start playing a decoded clip. `None` if the backend could not start it.
    fn start(&mut self, clip: &AssetHandle, looped: bool) -> Option<PlaybackId>;
    fn stop(&mut self, id: PlaybackId);
    /// Master volume, 0..1.
    fn set_volume(&mut self, volume: f64);
    /// Playbacks that ended on their own since the last call.
    fn drain_finished(&mut self) -> Vec<PlaybackId>;
}

/// Backend that plays nothing. Non-looped clips finish on the next drain.
#[derive(Debug, Default)]
pub struct NullAudio {
    next: u64,
    finished: Vec<PlaybackId>,
    volume: f64,
}

impl NullAudio {
    pub fn volume(&self) -> f64 {
        self.volume
    }
}

impl AudioBackend for NullAudio {
    fn start(&mut self, _clip: &AssetHandle, looped: bool) -> Option<PlaybackId> {
        self.next += 1;
        let id = PlaybackId(self.next);
        if !looped {
            self.finished.push(id);
        }
        Some(id)
    }

    fn stop(&mut self, id: PlaybackId) {
        self.finished.retain(|f| *f != id);
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    fn drain_finished(&mut self) -> Vec<PlaybackId> {
        std::mem::take(&mut self.finished)
    }
}

/// Tracks which named sounds are playing and owns the exclusive music slot.
pub struct Mixer {
    backend: Box<dyn AudioBackend>,
    playing: BTreeMap<String, BTreeSet<PlaybackId>>,
    music: Option<(String, PlaybackId)>,
}

impl std::fmt::Debug for Mixer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mixer")
            .field("playing", &self.playing)
            .field("music", &self.music)
            .finish_non_exhaustive()
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new(Box::new(NullAudio::default()))
    }
}

impl Mixer {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            playing: BTreeMap::new(),
            music: None,
        }
    }

    /// One-shot playback. A clip that is not ready is a silent no-op.
    pub fn play(&mut self, name: &str, clip: Option<&AssetHandle>) {
        let Some(clip) = clip else {
            tracing::debug!(sound = name, "sound not ready");
            return;
        };
        if let Some(id) = self.backend.start(clip, false) {
            self.playing.entry(name.to_string()).or_default().insert(id);
        }
    }

    /// Stop every playback of `name`.
    pub fn stop(&mut self, name: &str) {
        if let Some(ids) = self.playing.remove(name) {
            for id in ids {
                self.backend.stop(id);
            }
        }
    }

    /// Replace the music track. The old track stops even if the new one is
    /// not ready.
    pub fn play_music(&mut self, name: &str, clip: Option<&AssetHandle>) {
        self.stop_music();
        let Some(clip) = clip else {
            tracing::debug!(sound = name, "music not ready");
            return;
        };
        if let Some(id) = self.backend.start(clip, true) {
            self.music = Some((name.to_string(), id));
        }
    }

    pub fn stop_music(&mut self) {
        if let Some((_, id)) = self.music.take() {
            self.backend.stop(id);
        }
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.backend.set_volume(volume);
    }

    /// At least one playback of `name` is active, music included.
    pub fn is_playing(&self, name: &str) -> bool {
        self.playing.get(name).is_some_and(|ids| !ids.is_empty()) || self.music() == Some(name)
    }

    pub fn music(&self) -> Option<&str> {
        self.music.as_ref().map(|(name, _)| name.as_str())
    }

    /// Forget playbacks the backend reports as finished.
    pub fn reap(&mut self) {
        let finished = self.backend.drain_finished();
        if finished.is_empty() {
            return;
        }
        for ids in self.playing.values_mut() {
            ids.retain(|id| !finished.contains(id));
        }
        self.playing.retain(|_, ids| !ids.is_empty());
    }

    /// Stop everything.
    pub fn stop_all(&mut self) {
        let names: Vec<String> = self.playing.keys().cloned().collect();
        for name in names {
            self.stop(&name);
        }
        self.stop_music();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamma_assets::{AssetId, AssetKind};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn clip() -> AssetHandle {
        AssetHandle {
            id: AssetId(1),
            kind: AssetKind::Audio,
            mime: "audio/wav".into(),
            byte_len: 4,
        }
    }

    #[derive(Default)]
    struct Log {
        started: Vec<(u64, bool)>,
        stopped: Vec<u64>,
    }

    struct Recording(Rc<RefCell<Log>>, u64);

    impl AudioBackend for Recording {
        fn start(&mut self, _clip: &AssetHandle, looped: bool) -> Option<PlaybackId> {
            self.1 += 1;
            self.0.borrow_mut().started.push((self.1, looped));
            Some(PlaybackId(self.1))
        }
        fn stop(&mut self, id: PlaybackId) {
            self.0.borrow_mut().stopped.push(id.0);
        }
        fn set_volume(&mut self, _volume: f64) {}
        fn drain_finished(&mut self) -> Vec<PlaybackId> {
            Vec::new()
        }
    }

    #[test]
    fn null_backend_one_shots_finish_on_reap() {
        let mut mixer = Mixer::default();
        mixer.play("shot", Some(&clip()));
        assert!(mixer.is_playing("shot"));
        mixer.reap();
        assert!(!mixer.is_playing("shot"));
    }

    #[test]
    fn not_ready_is_silent() {
        let mut mixer = Mixer::default();
        mixer.play("shot", None);
        assert!(!mixer.is_playing("shot"));
    }

    #[test]
    fn music_is_exclusive_and_looped() {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut mixer = Mixer::new(Box::new(Recording(Rc::clone(&log), 0)));
        mixer.play_music("theme", Some(&clip()));
        mixer.play_music("boss", Some(&clip()));
        assert_eq!(mixer.music(), Some("boss"));
        assert_eq!(log.borrow().started, vec![(1, true), (2, true)]);
        assert_eq!(log.borrow().stopped, vec![1]);

        // A missing track still stops the current one.
        mixer.play_music("missing", None);
        assert_eq!(mixer.music(), None);
        assert_eq!(log.borrow().stopped, vec![1, 2]);
    }

    #[test]
    fn stop_all_stops_sounds_and_music() {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut mixer = Mixer::new(Box::new(Recording(Rc::clone(&log), 0)));
        mixer.play("a", Some(&clip()));
        mixer.play("a", Some(&clip()));
        mixer.play_music("m", Some(&clip()));
        mixer.stop_all();
        assert_eq!(log.borrow().stopped.len(), 3);
        assert!(!mixer.is_playing("a"));
        assert_eq!(mixer.music(), None);
    }
}
