//! Sound effect playback
//!
//! Plays the release and impact sounds from the loaded asset store. Absent
//! assets and rejected `play()` promises (autoplay policies) are skipped
//! quietly; audio can never take a frame down.

use crate::assets::{AssetKey, AssetStore};
use crate::sim::GameEvent;

/// Play the sound for a single game event, if it has one
pub fn cue_for_event(store: &AssetStore, event: &GameEvent, volume: f32) {
    match event {
        GameEvent::ArrowFired => play(store, AssetKey::ReleaseSound, volume),
        GameEvent::Hit { .. } => play(store, AssetKey::ImpactSound, volume),
        _ => {}
    }
}

fn play(store: &AssetStore, key: AssetKey, volume: f32) {
    let Some(audio) = store.audio(key) else {
        return;
    };
    audio.set_volume(f64::from(volume.clamp(0.0, 1.0)));
    audio.set_current_time(0.0);
    if let Err(err) = audio.play() {
        log::debug!("sfx {key:?} did not play: {err:?}");
    }
}
