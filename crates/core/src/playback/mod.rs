use crate::{store::SampleStore, Result};

/// Device abstraction accepting interleaved stereo frames without blocking.
///
/// Opening belongs to the implementation's constructor and closing to its
/// `Drop`. Errors from [`write_nonblocking`](Self::write_nonblocking) are
/// expected to be recoverable through [`recover`](Self::recover); the core
/// loop treats both the error and a failed recovery as non-fatal.
pub trait PlaybackSink {
    /// Queues up to `frames.len()` frames and returns how many were
    /// accepted. Accepting fewer than requested is not an error.
    fn write_nonblocking(&mut self, frames: &[[i16; 2]]) -> Result<usize>;

    /// Suspends or resumes output. While paused the device plays silence
    /// and queued frames stay queued.
    fn pause(&mut self, paused: bool) -> Result<()>;

    /// Attempts to bring the sink back to a writable state after a write
    /// error, typically an underrun.
    fn recover(&mut self) -> Result<()>;

    /// Throws away queued audio immediately. Used when the user closes the
    /// window mid-stream.
    fn discard(&mut self) -> Result<()>;

    /// Plays out queued audio before returning. Used when the stream ends
    /// naturally.
    fn drain(&mut self) -> Result<()>;
}

/// Advances a look-ahead cursor into the playback buffer and submits chunks
/// to the sink.
///
/// Submission happens once per audio-chunk boundary, not every analysis
/// tick, and always one `audio_offset` ahead of the analysis cursor so the
/// sink keeps playing while an expensive analysis step runs.
#[derive(Debug)]
pub struct PlaybackFeeder {
    audio_offset: usize,
    write_pos: usize,
}

impl PlaybackFeeder {
    pub fn new(audio_offset: usize) -> Self {
        Self {
            audio_offset: audio_offset.max(1),
            write_pos: 0,
        }
    }

    pub fn audio_offset(&self) -> usize {
        self.audio_offset
    }

    /// Next sample index that will be handed to the sink. Monotonically
    /// non-decreasing and bounded by the store's sample count.
    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Queues the first chunk before the loop starts, so the sink has a
    /// full `audio_offset` of audio buffered by the time it is unpaused.
    pub fn prefill<S: PlaybackSink>(&mut self, store: &SampleStore, sink: &mut S) {
        self.submit(store, sink, 0);
    }

    /// Submits the next look-ahead chunk when `index` sits exactly on an
    /// audio-chunk boundary. Past end-of-file the call is a no-op; a short
    /// final chunk is clamped to the frames that remain.
    pub fn maybe_submit<S: PlaybackSink>(
        &mut self,
        index: usize,
        store: &SampleStore,
        sink: &mut S,
    ) {
        if index % self.audio_offset != 0 {
            return;
        }
        let frame_start = index + self.audio_offset;
        if frame_start >= store.num_samples() {
            return;
        }
        self.submit(store, sink, frame_start);
    }

    fn submit<S: PlaybackSink>(&mut self, store: &SampleStore, sink: &mut S, frame_start: usize) {
        let chunk = store.playback_slice(frame_start, self.audio_offset);
        if chunk.is_empty() {
            return;
        }

        match sink.write_nonblocking(chunk) {
            Ok(written) => {
                if written < chunk.len() {
                    tracing::debug!(written, requested = chunk.len(), "short playback write");
                }
                self.write_pos = self.write_pos.max(frame_start + chunk.len());
            }
            Err(error) => {
                tracing::warn!(%error, "playback write failed, trying to recover the sink");
                if let Err(error) = sink.recover() {
                    tracing::warn!(%error, "sink recovery failed, continuing without audio");
                }
            }
        }
    }
}
