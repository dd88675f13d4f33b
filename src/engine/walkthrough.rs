// One simulation frame, start to finish.
//
//   input snapshot -> NavigationController (probe + rollback)
//                  -> single-point probe under the camera -> ContentResolver
//                  -> animation + ECS statues
//                  -> transitions vs last frame -> FrameUniforms
//
// Owns every piece of mutable game state. No GPU or window types in here,
// so the whole chain runs in unit tests.

use std::path::Path;

use bevy_ecs::world::World;
use glam::Vec3;

use super::camera::{CameraState, NavigationController, Viewport};
use super::content::{ContentLookup, ContentResolver, OverlayState};
use super::events::{detect_transitions, FrameEvent, TriggerState};
use super::input::{Action, InputSnapshot};
use super::navigation::{CollisionProber, MapScale, WalkabilityMap};
use super::systems::{collect_models, spawn_drawables, spin_system};
use super::uniforms::{publish, FrameInputs, FrameUniforms};
use super::walk::{AnimationState, WalkParams};
use crate::scene::{AssetLoadError, SceneConfig};

/// Result of one step, consumed by the renderer and the audio dispatcher.
pub struct FrameOutput {
    pub uniforms: FrameUniforms,
    pub events: Vec<FrameEvent>,
    pub overlay: OverlayState,
}

pub struct Walkthrough {
    map: WalkabilityMap,
    prober: CollisionProber,
    lookup: ContentLookup,
    nav: NavigationController,
    resolver: ContentResolver,

    camera: CameraState,
    anim: AnimationState,
    triggers: TriggerState,

    scene: World,
    drawable_count: usize,
}

impl Walkthrough {
    /// Load the walkability map named by the scene and build the walkthrough.
    pub fn load(config: &SceneConfig) -> Result<Self, AssetLoadError> {
        let map = WalkabilityMap::load(&config.map.path, MapScale::from(&config.map))?;
        Ok(Self::new(config, map))
    }

    pub fn new(config: &SceneConfig, map: WalkabilityMap) -> Self {
        let mut scene = World::new();
        spawn_drawables(&mut scene, &config.drawables);

        let start = Vec3::from_array(config.camera.start_position);
        let prober = CollisionProber::from(&config.probe);
        if !prober.can_occupy(&map, start.x, start.z) {
            log::warn!("start position {:?} is not walkable", start);
        }

        Self {
            prober,
            lookup: ContentLookup::from(&config.content),
            nav: NavigationController::new(&config.camera, WalkParams::from(&config.walk)),
            resolver: ContentResolver::new(),
            camera: CameraState::at(start),
            anim: AnimationState::default(),
            triggers: TriggerState::default(),
            scene,
            drawable_count: config.drawables.len(),
            map,
        }
    }

    pub fn camera(&self) -> &CameraState { &self.camera }
    pub fn camera_mut(&mut self) -> &mut CameraState { &mut self.camera }
    pub fn drawable_count(&self) -> usize { self.drawable_count }

    /// Raster value under the camera.
    pub fn sample_under_camera(&self) -> u8 {
        self.prober
            .probe_point(&self.map, self.camera.position.x, self.camera.position.z)
            .value
    }

    /// Advance one frame. `dt` comes from the caller's FrameClock.
    pub fn step(&mut self, input: &InputSnapshot, viewport: Viewport, dt: f32) -> FrameOutput {
        let outcome = self.nav.update(
            &mut self.camera,
            &mut self.anim,
            input,
            dt,
            &self.map,
            &self.prober,
        );

        // Content comes from where the camera actually is, after any rollback.
        let under = self
            .prober
            .probe_point(&self.map, self.camera.position.x, self.camera.position.z);
        let overlay = self
            .resolver
            .update(self.lookup.classify(under.value), input.is_held(Action::Inspect));

        spin_system(&mut self.scene, self.anim.clock);
        let models = collect_models(&mut self.scene);

        let triggers = TriggerState {
            walking: outcome.walking,
            bob_rising: self.anim.rising,
            bob_at_rest: self.anim.crossed_rest,
            overlay_visible: overlay.visible,
            content_index: overlay.content_index,
            music_key_held: input.is_held(Action::ToggleMusic),
        };
        let events = detect_transitions(&self.triggers, &triggers);
        self.triggers = triggers;

        let uniforms = publish(&FrameInputs {
            view: self.camera.view_matrix(self.anim.bob),
            proj: self.nav.projection_matrix(viewport),
            models: &models,
            card_visible: overlay.visible,
            card_texture: overlay.content_index,
            aspect: viewport.aspect(),
        });

        FrameOutput { uniforms, events, overlay }
    }
}

/// Build a walkthrough from a scene file on disk.
pub fn load_scene(path: &Path) -> Result<(SceneConfig, Walkthrough), AssetLoadError> {
    let config = SceneConfig::load(path)?;
    let walkthrough = Walkthrough::load(&config)?;
    Ok((config, walkthrough))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::events::dispatch_events;
    use crate::engine::events::tests::RecordingAudio;
    use crate::engine::navigation::tests::{open_map, set_pixel};
    use crate::engine::navigation::OBSTACLE;
    use crate::engine::uniforms::card_model;

    fn scene() -> SceneConfig {
        SceneConfig::parse(
            r#"(
                camera: (start_position: (-4.5, 1.0, 2.5)),
                content: (triggers: [(value: 42, content: 2)], reserved: [253]),
                drawables: [
                    (name: "floor", position: (-4.5, 0.0, 2.5), scale: (9.0, 0.05, 5.0), kind: Static),
                    (name: "bust", position: (-2.0, 0.5, 1.0), scale: (0.3, 1.0, 0.3), kind: Statue(spin_speed: 1.0)),
                ],
                audio: (footsteps: [0], card: 2),
            )"#,
        )
        .unwrap()
    }

    fn viewport() -> Viewport {
        Viewport::new(1700, 1200)
    }

    #[test]
    fn inspecting_a_trigger_opens_card_once() {
        // Whole floor carries trigger value 42.
        let mut walk = Walkthrough::new(&scene(), open_map(42));
        let inspect = InputSnapshot::new((0.0, 0.0), [Action::Inspect]);

        let first = walk.step(&inspect, viewport(), 0.0);
        assert_eq!(first.overlay.content_index, 2);
        assert!(first.overlay.visible);
        assert_eq!(first.events, vec![FrameEvent::OverlayOpened { content_index: 2 }]);
        assert_eq!(first.uniforms.card.texture_id, 2);
        assert_eq!(first.uniforms.card.model, card_model(true).to_cols_array_2d());

        let mut audio = RecordingAudio::default();
        dispatch_events(&first.events, &mut audio, &scene().audio);
        assert_eq!(audio.effects, vec![2]);

        for _ in 0..5 {
            let held = walk.step(&inspect, viewport(), 1.0 / 60.0);
            assert!(held.overlay.visible);
            assert!(held.events.is_empty());
        }

        let released = walk.step(&InputSnapshot::default(), viewport(), 1.0 / 60.0);
        assert!(!released.overlay.visible);
        assert_eq!(released.events, vec![FrameEvent::OverlayDismissed]);
        assert_eq!(released.uniforms.card.model, card_model(false).to_cols_array_2d());
    }

    #[test]
    fn blocked_ring_point_reverts_whole_move() {
        let map = set_pixel(open_map(128), 46, 25, OBSTACLE);
        let mut walk = Walkthrough::new(&scene(), map);
        walk.camera_mut().position = Vec3::new(-4.7, 1.0, 2.5);
        let before = walk.camera().position;

        let input = InputSnapshot::new((0.0, 0.0), [Action::MoveRight, Action::MoveUp]);
        walk.step(&input, viewport(), 0.2);
        assert_eq!(walk.camera().position, before);

        // Moving away from the wall is still allowed.
        let input = InputSnapshot::new((0.0, 0.0), [Action::MoveLeft]);
        walk.step(&input, viewport(), 0.2);
        assert!(walk.camera().position.x < before.x);
    }

    #[test]
    fn degenerate_viewport_still_publishes() {
        let mut walk = Walkthrough::new(&scene(), open_map(128));
        let idle = InputSnapshot::default();

        let normal = walk.step(&idle, Viewport::new(1700, 1200), 0.0);
        let squashed = walk.step(&idle, Viewport::new(800, 0), 0.0);

        let proj = squashed.uniforms.drawables[0].1.proj;
        assert!(proj.iter().flatten().all(|v| v.is_finite()));
        assert_ne!(proj, normal.uniforms.drawables[0].1.proj);
        assert!(squashed.uniforms.card.proj.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn sentinel_under_camera_keeps_index_but_hides_card() {
        // Trigger floor with a reserved patch around pixel (25, 25) = world (-6.5, 2.5).
        let mut map = open_map(42);
        for y in 20..=30 {
            for x in 20..=30 {
                map = set_pixel(map, x, y, 253);
            }
        }
        let mut walk = Walkthrough::new(&scene(), map);
        let inspect = InputSnapshot::new((0.0, 0.0), [Action::Inspect]);
        assert!(walk.step(&inspect, viewport(), 0.0).overlay.visible);

        walk.camera_mut().position = Vec3::new(-6.5, 1.0, 2.5);
        let out = walk.step(&inspect, viewport(), 0.0);
        assert_eq!(walk.sample_under_camera(), 253);
        assert!(!out.overlay.visible);
        assert_eq!(out.overlay.content_index, 2);
        assert_eq!(out.events, vec![FrameEvent::OverlayDismissed]);
    }

    #[test]
    fn walking_produces_footsteps() {
        let mut walk = Walkthrough::new(&scene(), open_map(128));
        let forward = InputSnapshot::new((0.0, 0.0), [Action::MoveForward]);

        let mut steps = 0;
        for _ in 0..120 {
            let out = walk.step(&forward, viewport(), 1.0 / 60.0);
            steps += out.events.iter().filter(|e| **e == FrameEvent::Footstep).count();
            // Keep the player inside the room.
            if walk.camera().position.z < 1.0 {
                walk.camera_mut().position.z = 2.5;
            }
        }
        // 9 rad/s over 2 s crosses pi five times.
        assert!(steps >= 4 && steps <= 6, "got {} footsteps", steps);
    }

    #[test]
    fn footstep_count_does_not_depend_on_frame_rate() {
        let forward = InputSnapshot::new((0.0, 0.0), [Action::MoveForward]);
        for fps in [144.0, 60.0, 30.0, 20.0] {
            // Open raster: clamped positions stay walkable for the whole walk.
            let mut walk = Walkthrough::new(&scene(), open_map(128));
            let mut steps = 0;
            for _ in 0..(10.0 * fps) as usize {
                let out = walk.step(&forward, viewport(), 1.0 / fps);
                steps += out.events.iter().filter(|e| **e == FrameEvent::Footstep).count();
            }
            assert_eq!(steps, 28, "fps {}", fps);
        }
    }

    #[test]
    fn statues_turn_with_the_clock() {
        let mut walk = Walkthrough::new(&scene(), open_map(128));
        let idle = InputSnapshot::default();
        let a = walk.step(&idle, viewport(), 0.0);
        let b = walk.step(&idle, viewport(), 0.5);

        assert_eq!(walk.drawable_count(), 2);
        assert_eq!(a.uniforms.drawables[0].1.model, b.uniforms.drawables[0].1.model);
        assert_ne!(a.uniforms.drawables[1].1.model, b.uniforms.drawables[1].1.model);
    }

    #[test]
    fn music_key_toggles_on_press() {
        let mut walk = Walkthrough::new(&scene(), open_map(128));
        let held = InputSnapshot::new((0.0, 0.0), [Action::ToggleMusic]);
        assert_eq!(walk.step(&held, viewport(), 0.0).events, vec![FrameEvent::MusicToggled]);
        assert!(walk.step(&held, viewport(), 0.1).events.is_empty());
    }

    #[test]
    fn shipped_scene_loads() {
        let (config, walk) = load_scene(Path::new("assets/museum.ron")).unwrap();
        assert_eq!(walk.drawable_count(), config.drawables.len());
        assert_eq!(walk.sample_under_camera(), 128);
        for trigger in &config.content.triggers {
            assert!(trigger.content < config.paintings.len());
        }
    }

    #[test]
    fn load_scene_reports_missing_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.ron");
        std::fs::write(&path, "(map: (path: \"missing.png\"))").unwrap();
        let err = load_scene(&path).err().unwrap();
        assert!(matches!(err, AssetLoadError::Image { .. }));
    }
}
