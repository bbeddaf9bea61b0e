// src/background/mod.rs
//! Ambient animated backdrop: particles, proximity links, outline, ripples.
//! Purely decorative; no application data flows through here.

pub mod animator;
pub mod canvas;
pub mod effects;
pub mod grid;
pub mod outline;
pub mod particle;
pub mod scene;

pub use animator::{spawn_background, BackgroundHandle, Frame};
pub use particle::Viewport;
pub use scene::{FrameStats, Scene, SceneConfig};
