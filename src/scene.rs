// Scene configuration and startup asset loading.
//
// Everything that is specific to one authored museum lives here: the raster
// that bounds navigation, its world-to-pixel divisors, the trigger table that
// links raster values to paintings, and the drawables placed in the room.
// Loaded once before the frame loop; any failure is fatal.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

// ============================================================================
// ERRORS
// ============================================================================

/// Startup failure while reading an asset. There is no recovery path:
/// the caller reports it and exits.
#[derive(Debug)]
pub enum AssetLoadError {
    /// File missing or unreadable.
    Io { path: PathBuf, source: std::io::Error },
    /// Raster could not be decoded.
    Image { path: PathBuf, source: image::ImageError },
    /// Sound file could not be decoded.
    Audio { path: PathBuf, source: rodio::decoder::DecoderError },
    /// Scene file is not valid RON for `SceneConfig`.
    Config { path: PathBuf, source: ron::error::SpannedError },
    /// Parsed fine but the values cannot drive a scene.
    Invalid(String),
}

impl std::fmt::Display for AssetLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetLoadError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            AssetLoadError::Image { path, source } => {
                write!(f, "failed to load map image {}: {}", path.display(), source)
            }
            AssetLoadError::Audio { path, source } => {
                write!(f, "failed to decode audio {}: {}", path.display(), source)
            }
            AssetLoadError::Config { path, source } => {
                write!(f, "failed to parse scene {}: {}", path.display(), source)
            }
            AssetLoadError::Invalid(msg) => write!(f, "invalid scene: {}", msg),
        }
    }
}

impl std::error::Error for AssetLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetLoadError::Io { source, .. } => Some(source),
            AssetLoadError::Image { source, .. } => Some(source),
            AssetLoadError::Audio { source, .. } => Some(source),
            AssetLoadError::Config { source, .. } => Some(source),
            AssetLoadError::Invalid(_) => None,
        }
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Root of the RON scene file. Every section falls back to its defaults,
/// so a file only has to name what differs from the stock museum.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub map: MapConfig,
    pub probe: ProbeConfig,
    pub camera: CameraConfig,
    pub walk: WalkConfig,
    pub content: ContentConfig,
    pub paintings: Vec<Painting>,
    pub drawables: Vec<DrawableConfig>,
    pub audio: AudioConfig,
}

/// Walkability raster and how world X/Z map onto it.
///
/// The divisors are the world extents the raster was authored against.
/// They cannot be derived from the pixel dimensions, so each scene carries its own.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub path: PathBuf,
    /// World units covered along X. X runs from 0 down to -extent_x (inverted).
    pub extent_x: f32,
    /// World units covered along Z, from 0 up to extent_z.
    pub extent_z: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("assets/museum_map.png"),
            extent_x: 9.0,
            extent_z: 5.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Ring radius in world units.
    pub radius: f32,
    /// Number of equally spaced samples on the ring.
    pub steps: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { radius: 0.1, steps: 12 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub start_position: [f32; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// World units per second.
    pub move_speed: f32,
    pub sprint_multiplier: f32,
    /// Key rotation rate in degrees per second; also scales pointer drag.
    pub rotation_speed_degrees: f32,
    /// Pointer pixels per `rotation_speed` radians of drag.
    pub mouse_resolution: f32,
    /// Negate the projection's Y scale (y-down clip space).
    pub flip_y: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            start_position: [-4.5, 1.0, 2.5],
            fov_degrees: 90.0,
            near: 0.1,
            far: 100.0,
            move_speed: 1.0,
            sprint_multiplier: 2.0,
            rotation_speed_degrees: 60.0,
            mouse_resolution: 500.0,
            flip_y: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Peak height of the bob above eye height, in world units.
    pub bob_amplitude: f32,
    /// Walk phase advance in radians per second.
    pub bob_frequency: f32,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            bob_amplitude: 0.04,
            bob_frequency: 9.0,
        }
    }
}

/// One raster value that opens a painting card.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TriggerEntry {
    pub value: u8,
    pub content: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub triggers: Vec<TriggerEntry>,
    /// Raster values excluded from lookup on top of the 0/255 sentinels.
    pub reserved: Vec<u8>,
}

/// Metadata shown on the overlay card.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Painting {
    pub title: String,
    pub artist: String,
    pub year: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub enum DrawableKind {
    Static,
    /// Turns about the vertical axis at `spin_speed` radians per second.
    Statue { spin_speed: f32 },
}

#[derive(Debug, Clone, Deserialize)]
pub struct DrawableConfig {
    pub name: String,
    pub position: [f32; 3],
    pub scale: [f32; 3],
    pub kind: DrawableKind,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Effect indices cycled at random for footsteps.
    pub footsteps: Vec<usize>,
    /// Effect played when the card opens, switches or is dismissed.
    pub card: usize,
    /// Music track paths, index 0 starts at launch.
    pub music: Vec<PathBuf>,
    pub effects: Vec<PathBuf>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            footsteps: vec![0, 1],
            card: 2,
            music: vec![PathBuf::from("audio/gallery.wav")],
            effects: vec![
                PathBuf::from("audio/step_a.wav"),
                PathBuf::from("audio/step_b.wav"),
                PathBuf::from("audio/card.wav"),
            ],
        }
    }
}

// ============================================================================
// LOADING
// ============================================================================

impl SceneConfig {
    /// Read and validate a RON scene file. Relative asset paths are resolved
    /// against the scene file's directory.
    pub fn load(path: &Path) -> Result<Self, AssetLoadError> {
        let text = fs::read_to_string(path).map_err(|source| AssetLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&text).map_err(|source| AssetLoadError::Config {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(dir) = path.parent() {
            let audio = &mut config.audio;
            for asset in std::iter::once(&mut config.map.path)
                .chain(audio.music.iter_mut())
                .chain(audio.effects.iter_mut())
            {
                if asset.is_relative() {
                    *asset = dir.join(&*asset);
                }
            }
        }

        config.validate()?;
        log::info!(
            "Scene {} -> {} paintings, {} drawables, {} triggers",
            path.display(),
            config.paintings.len(),
            config.drawables.len(),
            config.content.triggers.len()
        );
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    pub fn validate(&self) -> Result<(), AssetLoadError> {
        if self.probe.steps == 0 {
            return Err(AssetLoadError::Invalid("probe.steps must be at least 1".into()));
        }
        if !(self.probe.radius > 0.0) {
            return Err(AssetLoadError::Invalid(format!(
                "probe.radius must be positive, got {}",
                self.probe.radius
            )));
        }
        if !(self.map.extent_x > 0.0) || !(self.map.extent_z > 0.0) {
            return Err(AssetLoadError::Invalid(format!(
                "map extents must be positive, got {} x {}",
                self.map.extent_x, self.map.extent_z
            )));
        }

        let mut seen = HashSet::new();
        for entry in &self.content.triggers {
            if !seen.insert(entry.value) {
                return Err(AssetLoadError::Invalid(format!(
                    "duplicate trigger for raster value {}",
                    entry.value
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_scene_uses_defaults() {
        let config = SceneConfig::parse("()").unwrap();
        assert_eq!(config.probe.steps, 12);
        assert!((config.probe.radius - 0.1).abs() < 1e-6);
        assert!((config.map.extent_x - 9.0).abs() < 1e-6);
        assert!((config.camera.fov_degrees - 90.0).abs() < 1e-6);
        assert!(config.camera.flip_y);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_triggers_and_drawables() {
        let text = r#"(
            content: (
                triggers: [(value: 42, content: 2), (value: 60, content: 0)],
                reserved: [253],
            ),
            drawables: [
                (name: "venus", position: (1.0, 0.0, 2.0), scale: (0.5, 1.8, 0.5), kind: Statue(spin_speed: 0.3)),
                (name: "floor", position: (0.0, 0.0, 0.0), scale: (9.0, 0.1, 5.0), kind: Static),
            ],
        )"#;
        let config = SceneConfig::parse(text).unwrap();
        assert_eq!(config.content.triggers.len(), 2);
        assert_eq!(config.content.reserved, vec![253]);
        assert!(matches!(config.drawables[0].kind, DrawableKind::Statue { .. }));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_duplicate_triggers() {
        let text = "(content: (triggers: [(value: 7, content: 0), (value: 7, content: 1)]))";
        let config = SceneConfig::parse(text).unwrap();
        assert!(matches!(config.validate(), Err(AssetLoadError::Invalid(_))));
    }

    #[test]
    fn rejects_zero_probe_steps() {
        let config = SceneConfig::parse("(probe: (radius: 0.1, steps: 0))").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_scene_file_is_io_error() {
        let err = SceneConfig::load(Path::new("definitely/not/here.ron")).unwrap_err();
        assert!(matches!(err, AssetLoadError::Io { .. }));
    }

    #[test]
    fn load_resolves_map_path_next_to_scene() {
        let dir = tempfile::tempdir().unwrap();
        let scene_path = dir.path().join("scene.ron");
        let mut file = fs::File::create(&scene_path).unwrap();
        writeln!(file, "(map: (path: \"map.png\", extent_x: 9.0, extent_z: 5.0))").unwrap();

        let config = SceneConfig::load(&scene_path).unwrap();
        assert_eq!(config.map.path, dir.path().join("map.png"));
        assert_eq!(config.audio.music[0], dir.path().join("audio/gallery.wav"));
        assert_eq!(config.audio.effects[2], dir.path().join("audio/card.wav"));
    }

    #[test]
    fn malformed_scene_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let scene_path = dir.path().join("scene.ron");
        fs::write(&scene_path, "(probe: (steps: \"twelve\"))").unwrap();
        let err = SceneConfig::load(&scene_path).unwrap_err();
        assert!(matches!(err, AssetLoadError::Config { .. }));
    }
}
