use std::{fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};

use crate::Result;

/// Forward real-to-complex transform with scratch buffers reused across
/// frames.
///
/// The plan and every buffer are keyed to a single `fft_size`; a resize
/// request replaces them all at once, so the plan is never executed against
/// buffers of a stale size. Plan construction is the expensive part and only
/// happens when the size actually changes.
pub struct SpectralEngine {
    planner: RealFftPlanner<f32>,
    fft: FftResources,
}

struct FftResources {
    size: usize,
    plan: Arc<dyn RealToComplex<f32>>,
    input: Vec<f32>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    magnitudes: Vec<f32>,
}

impl SpectralEngine {
    pub fn new(fft_size: usize) -> Self {
        let mut planner = RealFftPlanner::new();
        let fft = FftResources::build(&mut planner, fft_size);
        Self { planner, fft }
    }

    /// Transform size the engine is currently planned for.
    pub fn fft_size(&self) -> usize {
        self.fft.size
    }

    /// Number of magnitude bins produced per frame, `fft_size / 2`.
    pub fn magnitude_len(&self) -> usize {
        self.fft.magnitudes.len()
    }

    /// Rebuilds the plan and all scratch buffers for `fft_size`. A no-op
    /// when the size is unchanged. The previous resources stay alive until
    /// the replacement set is fully constructed and are then released
    /// together.
    pub fn configure(&mut self, fft_size: usize) {
        if self.fft.size == fft_size {
            return;
        }
        self.fft = FftResources::build(&mut self.planner, fft_size);
    }

    /// Computes the magnitude spectrum of one window.
    ///
    /// The window is copied into the input scratch, zero-padded at the tail
    /// if it ran short, and has its arithmetic mean subtracted so a DC
    /// offset cannot show up as a zero-frequency spike. Each returned bin is
    /// `|spectrum[k]| / fft_size * scale` for `k` in `[0, fft_size / 2)`;
    /// the Nyquist term is not emitted.
    pub fn analyze(&mut self, window: &[f32], scale: f32) -> Result<&[f32]> {
        let fft = &mut self.fft;

        let copied = window.len().min(fft.size);
        fft.input[..copied].copy_from_slice(&window[..copied]);
        fft.input[copied..].fill(0.0);

        subtract_mean(&mut fft.input);

        // fft_size == 1 produces no bins; nothing to transform.
        if fft.magnitudes.is_empty() {
            return Ok(&fft.magnitudes);
        }

        fft.plan
            .process_with_scratch(&mut fft.input, &mut fft.spectrum, &mut fft.scratch)?;

        let norm = 1.0 / fft.size as f32;
        for (magnitude, bin) in fft.magnitudes.iter_mut().zip(fft.spectrum.iter()) {
            *magnitude = bin.norm() * norm * scale;
        }

        Ok(&fft.magnitudes)
    }
}

/// DC-offset removal: a constant bias would otherwise land in bin 0 and
/// dwarf every real component of the visualization.
fn subtract_mean(samples: &mut [f32]) {
    let mean = samples.iter().sum::<f32>() / samples.len() as f32;
    for sample in samples.iter_mut() {
        *sample -= mean;
    }
}

impl FftResources {
    fn build(planner: &mut RealFftPlanner<f32>, size: usize) -> Self {
        let plan = planner.plan_fft_forward(size);
        let input = plan.make_input_vec();
        let scratch = plan.make_scratch_vec();
        let spectrum = plan.make_output_vec();
        Self {
            size,
            plan,
            input,
            scratch,
            spectrum,
            magnitudes: vec![0.0; size / 2],
        }
    }
}

impl fmt::Debug for SpectralEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectralEngine")
            .field("fft_size", &self.fft.size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    #[test]
    fn dc_offset_is_removed_before_transform() {
        let mut engine = SpectralEngine::new(256);
        let window = vec![0.75; 256];
        let magnitudes = engine.analyze(&window, 1.0).unwrap();

        // A constant signal is pure DC; after mean subtraction every bin,
        // including bin 0, should be essentially empty.
        assert!(magnitudes.iter().all(|&m| m.abs() < 1e-5));
    }

    #[test]
    fn mean_is_zero_after_dc_removal() {
        let mut samples: Vec<f32> = (0..128).map(|i| 0.3 + (i as f32 * 0.11).sin()).collect();
        subtract_mean(&mut samples);

        let mean = samples.iter().sum::<f32>() / 128.0;
        assert!(mean.abs() < 1e-5);
    }

    #[test]
    fn pure_tone_peaks_at_its_bin() {
        let size = 64;
        let cycles = 4;
        let mut engine = SpectralEngine::new(size);
        let window: Vec<f32> = (0..size)
            .map(|i| (TAU * cycles as f32 * i as f32 / size as f32).sin())
            .collect();

        let magnitudes = engine.analyze(&window, 1.0).unwrap();
        let peak = magnitudes
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(k, _)| k)
            .unwrap();
        assert_eq!(peak, cycles);
    }

    #[test]
    fn reconfigure_resizes_every_buffer_consistently() {
        let mut engine = SpectralEngine::new(4096);
        assert_eq!(engine.magnitude_len(), 2048);

        engine.configure(1024);
        assert_eq!(engine.fft_size(), 1024);
        assert_eq!(engine.magnitude_len(), 512);

        let magnitudes = engine.analyze(&vec![0.5; 1024], 2.0).unwrap();
        assert_eq!(magnitudes.len(), 512);
    }

    #[test]
    fn reconfigure_same_size_is_a_no_op() {
        let mut engine = SpectralEngine::new(512);
        let plan_before = Arc::as_ptr(&engine.fft.plan) as *const ();
        engine.configure(512);
        assert_eq!(Arc::as_ptr(&engine.fft.plan) as *const (), plan_before);
    }

    #[test]
    fn short_window_is_zero_padded() {
        let mut engine = SpectralEngine::new(64);
        let magnitudes = engine.analyze(&[1.0, -1.0, 1.0, -1.0], 1.0).unwrap();
        assert_eq!(magnitudes.len(), 32);
        assert!(magnitudes.iter().all(|m| m.is_finite()));
    }

    #[test]
    fn degenerate_single_sample_transform_does_not_panic() {
        let mut engine = SpectralEngine::new(1);
        let magnitudes = engine.analyze(&[0.25], 15.0).unwrap();
        assert!(magnitudes.is_empty());
    }

    #[test]
    fn magnitudes_scale_linearly_with_amplitude_multiplier() {
        let size = 128;
        let window: Vec<f32> = (0..size).map(|i| (TAU * 3.0 * i as f32 / size as f32).cos()).collect();

        let mut engine = SpectralEngine::new(size);
        let base: Vec<f32> = engine.analyze(&window, 1.0).unwrap().to_vec();
        let scaled = engine.analyze(&window, 2.0).unwrap();

        for (b, s) in base.iter().zip(scaled.iter()) {
            assert!((s - 2.0 * b).abs() < 1e-5);
        }
    }
}
