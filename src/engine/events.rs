// Edge-triggered frame events and the audio boundary.
//
// Each frame records a TriggerState; comparing it with the previous frame's
// yields a short list of named transitions. Audio only ever hears about
// transitions, never about held state, so every cue fires once per edge.

use std::path::PathBuf;

use rand::seq::SliceRandom;

use crate::scene::AudioConfig;

/// Per-frame flags that events are derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriggerState {
    pub walking: bool,
    pub bob_rising: bool,
    /// The bob touched resting height during this frame.
    pub bob_at_rest: bool,
    pub overlay_visible: bool,
    pub content_index: usize,
    pub music_key_held: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEvent {
    /// Bob turned upward at resting height.
    Footstep,
    OverlayOpened { content_index: usize },
    /// Card stayed up but now shows a different painting.
    OverlaySwitched { content_index: usize },
    OverlayDismissed,
    MusicToggled,
}

pub fn detect_transitions(prev: &TriggerState, curr: &TriggerState) -> Vec<FrameEvent> {
    let mut events = Vec::new();

    if prev.walking && curr.walking && !prev.bob_rising && curr.bob_rising && curr.bob_at_rest {
        events.push(FrameEvent::Footstep);
    }

    match (prev.overlay_visible, curr.overlay_visible) {
        (false, true) => events.push(FrameEvent::OverlayOpened {
            content_index: curr.content_index,
        }),
        (true, true) if prev.content_index != curr.content_index => {
            events.push(FrameEvent::OverlaySwitched {
                content_index: curr.content_index,
            })
        }
        (true, false) => events.push(FrameEvent::OverlayDismissed),
        // Content changing while the card is hidden is silent on purpose.
        _ => {}
    }

    if !prev.music_key_held && curr.music_key_held {
        events.push(FrameEvent::MusicToggled);
    }

    events
}

// ============================================================================
// AUDIO BOUNDARY
// ============================================================================

/// Fire-and-forget audio. Nothing is returned to the frame logic.
pub trait AudioSink {
    fn play_effect(&mut self, index: usize);
    fn play_music(&mut self, track: usize);
    fn toggle_pause_music(&mut self);
}

/// Route this frame's events to the audio sink.
pub fn dispatch_events(events: &[FrameEvent], audio: &mut dyn AudioSink, config: &AudioConfig) {
    for event in events {
        match event {
            FrameEvent::Footstep => {
                if let Some(&effect) = config.footsteps.choose(&mut rand::thread_rng()) {
                    audio.play_effect(effect);
                }
            }
            FrameEvent::OverlayOpened { content_index }
            | FrameEvent::OverlaySwitched { content_index } => {
                log::debug!("card shows content {}", content_index);
                audio.play_effect(config.card);
            }
            FrameEvent::OverlayDismissed => {
                log::debug!("card dismissed");
                audio.play_effect(config.card);
            }
            FrameEvent::MusicToggled => audio.toggle_pause_music(),
        }
    }
}

/// Audio backend that logs requests and tracks music transport state.
/// Used when no output device can be opened.
#[derive(Debug, Default)]
pub struct LoggingAudio {
    effects: Vec<PathBuf>,
    tracks: Vec<PathBuf>,
    playing: bool,
    paused: bool,
}

impl LoggingAudio {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            effects: config.effects.clone(),
            tracks: config.music.clone(),
            playing: false,
            paused: false,
        }
    }

    pub fn is_playing(&self) -> bool { self.playing }
    pub fn is_paused(&self) -> bool { self.paused }
}

impl AudioSink for LoggingAudio {
    fn play_effect(&mut self, index: usize) {
        match self.effects.get(index) {
            Some(name) => log::debug!("effect {} ({})", index, name.display()),
            None => log::warn!("no sound effect at index {}", index),
        }
    }

    fn play_music(&mut self, track: usize) {
        let Some(name) = self.tracks.get(track) else {
            log::warn!("no music track at index {}", track);
            return;
        };
        log::info!("music track {} ({}) looping", track, name.display());
        self.playing = true;
        self.paused = false;
    }

    fn toggle_pause_music(&mut self) {
        if !self.playing {
            return;
        }
        self.paused = !self.paused;
        log::debug!("music {}", if self.paused { "paused" } else { "resumed" });
    }
}
