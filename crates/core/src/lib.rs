//! Core library for the spectrum visualiser application.
//!
//! The crate owns the real-time analysis-and-playback scheduler: a sample
//! store with bounds-checked windowed reads, a spectral engine whose
//! transform plan is rebuilt on demand when the resolution changes at
//! runtime, a look-ahead playback feeder, a deadline-based pacing clock and
//! the frame scheduler that drives them each tick. Decoding, rendering,
//! audio output and input polling are collaborators reached through traits;
//! the application crate supplies the concrete backends.

pub mod config;
pub mod error;
pub mod playback;
pub mod render;
pub mod scheduler;
pub mod spectral;
pub mod store;
pub mod timeline;

pub use config::{ControlEvent, HorizontalScale, SpectralConfig, TimingConfig};
pub use error::{Result, SpectrumVizError};
pub use playback::{PlaybackFeeder, PlaybackSink};
pub use render::Renderer;
pub use scheduler::{FrameScheduler, InputSource, LoopState, StopReason};
pub use spectral::SpectralEngine;
pub use store::{AudioBuffer, SampleStore};
pub use timeline::FrameClock;
