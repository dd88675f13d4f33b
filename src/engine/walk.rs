// Walk cycle: head bob while moving plus a free-running scene clock.
//
// The bob is amplitude * |sin(phase)|, so it touches the resting eye height
// twice per period, at phase 0 and pi. Each touch is a footstep. The touch is
// detected from the phase itself, so a step is never skipped at low frame rates
// (see events.rs for the edge detection).

use std::f32::consts::{PI, TAU};

use crate::scene::WalkConfig;

#[derive(Debug, Clone, Copy)]
pub struct WalkParams {
    pub amplitude: f32,
    /// Phase advance in radians per second.
    pub frequency: f32,
}

impl From<&WalkConfig> for WalkParams {
    fn from(config: &WalkConfig) -> Self {
        Self {
            amplitude: config.bob_amplitude,
            frequency: config.bob_frequency,
        }
    }
}

/// Animation state advanced once per frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnimationState {
    /// Seconds since the walkthrough started. Drives statues.
    pub clock: f32,
    /// Walk-cycle phase in radians; reset when the player stops.
    pub phase: f32,
    /// Current vertical offset above eye height.
    pub bob: f32,
    /// True while the bob is moving upward.
    pub rising: bool,
    /// The phase passed a multiple of pi this frame: the bob touched rest.
    pub crossed_rest: bool,
}

impl AnimationState {
    pub fn advance(&mut self, dt: f32, moving: bool, params: &WalkParams) {
        self.clock += dt;

        if !moving {
            self.phase = 0.0;
            self.bob = 0.0;
            self.rising = false;
            self.crossed_rest = false;
            return;
        }

        let next = self.phase + dt * params.frequency;
        self.crossed_rest = (next / PI).floor() > (self.phase / PI).floor();
        self.phase = next % TAU;
        self.bob = params.amplitude * self.phase.sin().abs();
        // d/dphase |sin| has the sign of sin * cos.
        self.rising = (2.0 * self.phase).sin() > 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> WalkParams {
        WalkParams { amplitude: 0.04, frequency: 9.0 }
    }

    #[test]
    fn idle_keeps_eye_at_rest() {
        let mut anim = AnimationState::default();
        anim.advance(0.5, false, &params());
        assert_eq!(anim.bob, 0.0);
        assert!((anim.clock - 0.5).abs() < 1e-6);
    }

    #[test]
    fn bob_stays_within_amplitude() {
        let mut anim = AnimationState::default();
        for _ in 0..200 {
            anim.advance(1.0 / 60.0, true, &params());
            assert!(anim.bob >= 0.0 && anim.bob <= 0.04 + 1e-6);
        }
    }

    #[test]
    fn stopping_resets_phase() {
        let mut anim = AnimationState::default();
        anim.advance(0.1, true, &params());
        assert!(anim.bob > 0.0);
        anim.advance(0.1, false, &params());
        assert_eq!(anim.phase, 0.0);
        assert_eq!(anim.bob, 0.0);
    }

    #[test]
    fn rises_then_falls_within_half_period() {
        let p = params();
        let mut anim = AnimationState::default();
        // Quarter period in: still rising.
        anim.advance(0.1, true, &p);
        assert!(anim.rising);
        // Past the crest (phase just over pi/2): falling.
        anim.advance(0.1, true, &p);
        assert!(!anim.rising);
    }

    #[test]
    fn rest_crossings_do_not_depend_on_frame_rate() {
        let p = params();
        // 10 s of walking is 90 rad of phase: 28 touches of rest.
        for fps in [144.0, 60.0, 30.0, 20.0] {
            let mut anim = AnimationState::default();
            let frames = (10.0 * fps) as usize;
            let touches = (0..frames)
                .filter(|_| {
                    anim.advance(1.0 / fps, true, &p);
                    anim.crossed_rest
                })
                .count();
            assert_eq!(touches, 28, "fps {}", fps);
        }
    }

    #[test]
    fn starting_to_walk_is_not_a_touch() {
        let mut anim = AnimationState::default();
        anim.advance(1.0 / 60.0, true, &params());
        assert!(!anim.crossed_rest);
        // Half a period later the bob is back at rest.
        anim.advance(PI / 9.0, true, &params());
        assert!(anim.crossed_rest);
        assert!(anim.rising);
    }
}
