// Walkability raster and ring-probe collision.
//
// Layer 1: WalkabilityMap — single-channel image, one byte per pixel.
//          0 = hard wall, 255 = outside the building, anything else is floor
//          (and possibly a content trigger, see content.rs).
// Layer 2: CollisionProber — samples the map on a ring around a candidate
//          position and approves the move only if every sample is floor.

use std::cell::Cell;
use std::f32::consts::TAU;
use std::path::Path;

use glam::{UVec2, Vec2};

use crate::scene::{AssetLoadError, MapConfig, ProbeConfig};

/// Raster value for an impassable pixel.
pub const OBSTACLE: u8 = 0;
/// Raster value for pixels outside the building footprint.
pub const OUTSIDE: u8 = 255;

// ============================================================================
// WALKABILITY MAP
// ============================================================================

/// World extents the raster was authored against.
///
/// X is inverted: world x = 0 lands on the right edge and x = -extent_x on the left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapScale {
    pub extent_x: f32,
    pub extent_z: f32,
}

impl From<&MapConfig> for MapScale {
    fn from(config: &MapConfig) -> Self {
        Self {
            extent_x: config.extent_x,
            extent_z: config.extent_z,
        }
    }
}

/// Immutable after load. Read-only for the rest of the session.
pub struct WalkabilityMap {
    samples: Vec<u8>,
    width: u32,
    height: u32,
    scale: MapScale,
    // Last pixel reported in trace logs, so the log only fires on change.
    last_logged: Cell<Option<UVec2>>,
}

/// One pixel read from the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionSample {
    pub pixel: UVec2,
    pub value: u8,
}

impl WalkabilityMap {
    /// Decode an image file to 8-bit luma. Fatal at startup if it fails.
    pub fn load(path: &Path, scale: MapScale) -> Result<Self, AssetLoadError> {
        let img = image::open(path).map_err(|source| AssetLoadError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        let luma = img.to_luma8();
        let (width, height) = luma.dimensions();
        log::info!("Walkability map {} -> size: {}x{}", path.display(), width, height);
        Self::from_raw(width, height, luma.into_raw(), scale)
    }

    /// Build from row-major samples. `samples.len()` must equal `width * height`.
    pub fn from_raw(
        width: u32,
        height: u32,
        samples: Vec<u8>,
        scale: MapScale,
    ) -> Result<Self, AssetLoadError> {
        if width == 0 || height == 0 {
            return Err(AssetLoadError::Invalid(format!(
                "walkability map has zero size ({}x{})",
                width, height
            )));
        }
        if samples.len() != (width as usize) * (height as usize) {
            return Err(AssetLoadError::Invalid(format!(
                "walkability map is {}x{} but holds {} samples",
                width,
                height,
                samples.len()
            )));
        }
        Ok(Self {
            samples,
            width,
            height,
            scale,
            last_logged: Cell::new(None),
        })
    }

    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }

    /// Convert a world-space XZ position to the pixel that covers it.
    /// Always lands inside the raster: out-of-range positions clamp to the border.
    pub fn world_to_pixel(&self, world_x: f32, world_z: f32) -> UVec2 {
        let w = self.width as f32;
        let h = self.height as f32;

        let u = ((-world_x / self.scale.extent_x) * w).clamp(0.0, w - 1.0).round() as u32;
        let v = ((world_z / self.scale.extent_z) * h).clamp(0.0, h - 1.0).round() as u32;

        // X is mirrored. u = 0 would land one past the last column, so pin it.
        let px = (self.width - u).min(self.width - 1);
        UVec2::new(px, v.min(self.height - 1))
    }

    #[inline]
    pub fn value_at(&self, pixel: UVec2) -> u8 {
        self.samples[(pixel.y * self.width + pixel.x) as usize]
    }

    /// Raw byte under a world position. Pure function of the raster.
    pub fn sample(&self, world_x: f32, world_z: f32) -> u8 {
        self.sample_detailed(world_x, world_z).value
    }

    pub fn sample_detailed(&self, world_x: f32, world_z: f32) -> CollisionSample {
        let pixel = self.world_to_pixel(world_x, world_z);
        let value = self.value_at(pixel);

        if self.last_logged.get() != Some(pixel) {
            log::trace!(
                "map pixel ({}, {}) at world ({:.3}, {:.3}) = {}",
                pixel.x, pixel.y, world_x, world_z, value
            );
            if value == OBSTACLE {
                log::trace!("blocked");
            }
            self.last_logged.set(Some(pixel));
        }

        CollisionSample { pixel, value }
    }
}

// ============================================================================
// COLLISION PROBER
// ============================================================================

/// Outcome of a ring probe. `last` is the final sample taken: the blocking
/// pixel on rejection, otherwise the last ring point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    pub walkable: bool,
    pub last: CollisionSample,
}

#[derive(Debug, Clone, Copy)]
pub struct CollisionProber {
    pub radius: f32,
    pub steps: u32,
}

impl From<&ProbeConfig> for CollisionProber {
    fn from(config: &ProbeConfig) -> Self {
        Self {
            radius: config.radius,
            steps: config.steps.max(1),
        }
    }
}

impl Default for CollisionProber {
    fn default() -> Self {
        Self { radius: 0.1, steps: 12 }
    }
}

impl CollisionProber {
    /// Sample `steps` points on a circle of `radius` around the centre.
    /// Rejects on the first point that lands on an obstacle pixel.
    pub fn probe(&self, map: &WalkabilityMap, center_x: f32, center_z: f32) -> ProbeResult {
        let mut last = None;
        for p in ring_points(Vec2::new(center_x, center_z), self.radius, self.steps) {
            let sample = map.sample_detailed(p.x, p.y);
            if sample.value == OBSTACLE {
                return ProbeResult { walkable: false, last: sample };
            }
            last = Some(sample);
        }
        // steps == 0 only if constructed by hand; fall back to the centre.
        let last = last.unwrap_or_else(|| map.sample_detailed(center_x, center_z));
        ProbeResult { walkable: true, last }
    }

    pub fn can_occupy(&self, map: &WalkabilityMap, center_x: f32, center_z: f32) -> bool {
        self.probe(map, center_x, center_z).walkable
    }

    /// One sample directly under the position. Used for content lookup,
    /// never for movement approval.
    pub fn probe_point(&self, map: &WalkabilityMap, x: f32, z: f32) -> CollisionSample {
        map.sample_detailed(x, z)
    }
}

/// Equally spaced points on a circle, starting at +X and turning toward +Z.
fn ring_points(center: Vec2, radius: f32, steps: u32) -> impl Iterator<Item = Vec2> {
    (0..steps).map(move |i| {
        let angle = TAU * i as f32 / steps as f32;
        center + Vec2::new(angle.cos(), angle.sin()) * radius
    })
}
