use std::borrow::Cow;

/// Decoded audio, immutable for the lifetime of a run.
///
/// `analysis` carries one mono float sample per logical audio frame and
/// `playback` the matching interleaved stereo pair, time-aligned, both at
/// `sample_rate`.
#[derive(Debug, Clone, Default)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub analysis: Vec<f32>,
    pub playback: Vec<[i16; 2]>,
}

impl AudioBuffer {
    /// Number of logical audio frames in the buffer.
    pub fn num_samples(&self) -> usize {
        self.analysis.len()
    }
}

/// Owner of the decoded buffers, exposing bounds-checked windowed reads.
#[derive(Debug)]
pub struct SampleStore {
    buffer: AudioBuffer,
}

impl SampleStore {
    pub fn new(buffer: AudioBuffer) -> Self {
        debug_assert_eq!(buffer.analysis.len(), buffer.playback.len());
        Self { buffer }
    }

    pub fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate
    }

    pub fn num_samples(&self) -> usize {
        self.buffer.num_samples()
    }

    /// Returns exactly `len` analysis samples starting at `index`. Positions
    /// at or beyond the end of the buffer read as silence, so the final
    /// partial window near end-of-file needs no special casing by callers.
    /// Fully in-range windows borrow straight from the buffer; only windows
    /// crossing the end allocate a zero-padded copy.
    pub fn window_at(&self, index: usize, len: usize) -> Cow<'_, [f32]> {
        let analysis = &self.buffer.analysis;
        if index.saturating_add(len) <= analysis.len() {
            return Cow::Borrowed(&analysis[index..index + len]);
        }

        let mut window = vec![0.0; len];
        if index < analysis.len() {
            let available = analysis.len() - index;
            window[..available].copy_from_slice(&analysis[index..]);
        }
        Cow::Owned(window)
    }

    /// Returns up to `len` playback frames starting at `index`, clamped to
    /// the buffer. The slice is shorter than `len` when end-of-file falls
    /// inside the requested range and empty once `index` is past the end.
    pub fn playback_slice(&self, index: usize, len: usize) -> &[[i16; 2]] {
        let playback = &self.buffer.playback;
        let start = index.min(playback.len());
        let end = index.saturating_add(len).min(playback.len());
        &playback[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(num_samples: usize) -> SampleStore {
        let analysis: Vec<f32> = (0..num_samples).map(|i| i as f32).collect();
        let playback = (0..num_samples).map(|i| [i as i16, -(i as i16)]).collect();
        SampleStore::new(AudioBuffer {
            sample_rate: 44_100,
            analysis,
            playback,
        })
    }

    #[test]
    fn in_range_window_borrows_without_padding() {
        let store = store_with(64);
        let window = store.window_at(8, 16);
        assert!(matches!(window, Cow::Borrowed(_)));
        assert_eq!(window.len(), 16);
        assert_eq!(window[0], 8.0);
        assert_eq!(window[15], 23.0);
    }

    #[test]
    fn tail_window_is_zero_padded_to_full_length() {
        let store = store_with(10_000);
        let window = store.window_at(9_000, 4_096);

        assert_eq!(window.len(), 4_096);
        assert!(window[..1_000].iter().enumerate().all(|(i, &s)| s == (9_000 + i) as f32));
        assert!(window[1_000..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn window_past_end_is_all_silence() {
        let store = store_with(32);
        let window = store.window_at(100, 8);
        assert_eq!(window.len(), 8);
        assert!(window.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn playback_slice_clamps_to_buffer() {
        let store = store_with(100);

        assert_eq!(store.playback_slice(0, 40).len(), 40);
        assert_eq!(store.playback_slice(80, 40).len(), 20);
        assert!(store.playback_slice(100, 40).is_empty());
        assert!(store.playback_slice(200, 40).is_empty());
    }

    #[test]
    fn empty_buffer_reads_as_silence() {
        let store = store_with(0);
        let window = store.window_at(0, 4);
        assert!(window.iter().all(|&s| s == 0.0));
        assert!(store.playback_slice(0, 4).is_empty());
    }
}
