// Engine module - per-frame walkthrough logic plus the GPU-side helpers
// The renderer only sees FrameUniforms; audio only sees FrameEvents

pub mod audio;
pub mod camera;
pub mod components;
pub mod content;
pub mod events;
pub mod hud;
pub mod input;
pub mod mesh;
pub mod navigation;
pub mod systems;
pub mod uniforms;
pub mod walk;
pub mod walkthrough;

// Re-export commonly used items
pub use audio::RodioAudio;
pub use camera::{FrameClock, Viewport};
pub use events::{dispatch_events, AudioSink, LoggingAudio};
pub use input::InputState;
pub use uniforms::{UniformSink, UniformTarget};
pub use walkthrough::{load_scene, Walkthrough};
