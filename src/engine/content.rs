// Raster value -> painting card.
//
// The walkability raster doubles as a trigger map: floor pixels in front of
// an artwork carry a value that the scene's trigger table maps to a content
// index. Classification happens in one place so the sentinels and any
// per-scene exclusions never leak into the frame logic as bare numbers.

use std::collections::{HashMap, HashSet};

use super::navigation::{OBSTACLE, OUTSIDE};
use crate::scene::ContentConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterClass {
    /// Wall pixel.
    Obstacle,
    /// Outside the building footprint.
    OutsideBounds,
    /// Excluded by the scene (asset fixes), treated like a sentinel.
    Reserved,
    /// Opens the card for this content index.
    ContentTrigger(usize),
    /// Plain floor: no trigger, keep whatever was last shown.
    Unmapped,
}

/// Immutable trigger table built once from the scene.
#[derive(Debug, Clone, Default)]
pub struct ContentLookup {
    triggers: HashMap<u8, usize>,
    reserved: HashSet<u8>,
}

impl ContentLookup {
    pub fn new(triggers: impl IntoIterator<Item = (u8, usize)>, reserved: impl IntoIterator<Item = u8>) -> Self {
        Self {
            triggers: triggers.into_iter().collect(),
            reserved: reserved.into_iter().collect(),
        }
    }

    pub fn classify(&self, value: u8) -> RasterClass {
        match value {
            OBSTACLE => RasterClass::Obstacle,
            OUTSIDE => RasterClass::OutsideBounds,
            v if self.reserved.contains(&v) => RasterClass::Reserved,
            v => match self.triggers.get(&v) {
                Some(&index) => RasterClass::ContentTrigger(index),
                None => RasterClass::Unmapped,
            },
        }
    }
}

impl From<&ContentConfig> for ContentLookup {
    fn from(config: &ContentConfig) -> Self {
        Self::new(
            config.triggers.iter().map(|t| (t.value, t.content)),
            config.reserved.iter().copied(),
        )
    }
}

/// What the overlay shows this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverlayState {
    /// Last resolved content index. Sticky across unmapped floor and sentinels.
    pub content_index: usize,
    /// The player stands on a trigger (or on floor reached from one).
    pub in_range: bool,
    /// Card on screen: in range and the inspect key is held.
    pub visible: bool,
}

/// Tracks the sticky content index and range flag between frames.
#[derive(Debug, Default)]
pub struct ContentResolver {
    state: OverlayState,
}

impl ContentResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, class: RasterClass, inspect_held: bool) -> OverlayState {
        match class {
            RasterClass::Obstacle | RasterClass::OutsideBounds | RasterClass::Reserved => {
                self.state.in_range = false;
            }
            RasterClass::ContentTrigger(index) => {
                self.state.content_index = index;
                self.state.in_range = true;
            }
            RasterClass::Unmapped => {}
        }
        self.state.visible = inspect_held && self.state.in_range;
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup() -> ContentLookup {
        ContentLookup::new([(42, 2), (60, 0), (90, 5)], [253])
    }

    #[test]
    fn classifies_sentinels_and_exclusions() {
        let l = lookup();
        assert_eq!(l.classify(0), RasterClass::Obstacle);
        assert_eq!(l.classify(255), RasterClass::OutsideBounds);
        assert_eq!(l.classify(253), RasterClass::Reserved);
        assert_eq!(l.classify(42), RasterClass::ContentTrigger(2));
        assert_eq!(l.classify(128), RasterClass::Unmapped);
    }

    #[test]
    fn triggers_resolve_deterministically() {
        let l = lookup();
        let mut resolver = ContentResolver::new();
        for _ in 0..3 {
            assert_eq!(resolver.update(l.classify(90), false).content_index, 5);
        }
    }

    #[test]
    fn unmapped_and_sentinels_keep_previous_index() {
        let l = lookup();
        let mut resolver = ContentResolver::new();
        resolver.update(l.classify(42), false);

        for value in [128, 0, 255, 253] {
            assert_eq!(resolver.update(l.classify(value), false).content_index, 2);
        }
    }

    #[test]
    fn sentinels_force_dormant_card() {
        let l = lookup();
        let mut resolver = ContentResolver::new();
        assert!(resolver.update(l.classify(42), true).visible);
        // Unmapped floor keeps the card.
        assert!(resolver.update(l.classify(128), true).visible);
        assert!(!resolver.update(l.classify(255), true).visible);
        assert!(!resolver.update(l.classify(128), true).visible);
    }

    #[test]
    fn card_only_visible_while_inspecting() {
        let l = lookup();
        let mut resolver = ContentResolver::new();
        let state = resolver.update(l.classify(60), false);
        assert!(state.in_range && !state.visible);
        assert!(resolver.update(l.classify(60), true).visible);
        assert!(!resolver.update(l.classify(60), false).visible);
    }

    #[test]
    fn builds_from_scene_config() {
        let config = crate::scene::SceneConfig::parse(
            "(content: (triggers: [(value: 42, content: 2)], reserved: [253]))",
        )
        .unwrap();
        let l = ContentLookup::from(&config.content);
        assert_eq!(l.classify(42), RasterClass::ContentTrigger(2));
        assert_eq!(l.classify(253), RasterClass::Reserved);
    }
}
