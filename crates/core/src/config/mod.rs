use serde::{Deserialize, Serialize};

/// Smallest transform size a resize request may reach.
pub const MIN_FFT_SIZE: usize = 1;
/// Largest transform size a resize request may reach.
pub const MAX_FFT_SIZE: usize = 1 << 31;

/// Multiplicative step applied per amplitude-scale increase request.
pub const SCALE_STEP_UP: f32 = 1.2;
/// Multiplicative step applied per amplitude-scale decrease request.
pub const SCALE_STEP_DOWN: f32 = 0.8;

/// How magnitude bins are spread across the horizontal axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HorizontalScale {
    Linear,
    Logarithmic,
}

impl HorizontalScale {
    /// Returns the next mode in the cycle.
    pub fn cycled(self) -> Self {
        match self {
            Self::Linear => Self::Logarithmic,
            Self::Logarithmic => Self::Linear,
        }
    }
}

/// Runtime control requests produced by input polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    CycleHorizontal,
    IncreaseScale,
    DecreaseScale,
    DoubleFftSize,
    HalveFftSize,
    Close,
}

/// Runtime-adjustable analysis settings.
///
/// Mutated by input events between ticks and observed by the scheduler at
/// the top of the next tick. `recalculate` marks that `fft_size` changed and
/// the engine must rebuild its plan before the next analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectralConfig {
    pub fft_size: usize,
    pub scale: f32,
    pub horiz_mode: HorizontalScale,
    #[serde(skip)]
    pub recalculate: bool,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            fft_size: 4096,
            scale: 15.0,
            horiz_mode: HorizontalScale::Logarithmic,
            recalculate: false,
        }
    }
}

impl SpectralConfig {
    /// Applies a single control event. Resize requests that would leave the
    /// `[MIN_FFT_SIZE, MAX_FFT_SIZE]` range are ignored; [`ControlEvent::Close`]
    /// is the scheduler's concern and leaves the configuration untouched.
    pub fn apply(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::CycleHorizontal => self.horiz_mode = self.horiz_mode.cycled(),
            ControlEvent::IncreaseScale => self.scale *= SCALE_STEP_UP,
            ControlEvent::DecreaseScale => self.scale *= SCALE_STEP_DOWN,
            ControlEvent::DoubleFftSize => {
                if self.fft_size < MAX_FFT_SIZE {
                    self.fft_size *= 2;
                    self.recalculate = true;
                }
            }
            ControlEvent::HalveFftSize => {
                if self.fft_size > MIN_FFT_SIZE {
                    self.fft_size /= 2;
                    self.recalculate = true;
                }
            }
            ControlEvent::Close => {}
        }
    }

    /// Returns the dirty flag and clears it.
    pub fn take_recalculate(&mut self) -> bool {
        std::mem::take(&mut self.recalculate)
    }
}

/// Fixed timing parameters chosen at startup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Analysis samples consumed per video frame.
    pub frame_offset: usize,
    /// Number of video frames covered by one playback submission.
    pub chunks_per_submit: usize,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            frame_offset: 1024,
            chunks_per_submit: 32,
        }
    }
}
