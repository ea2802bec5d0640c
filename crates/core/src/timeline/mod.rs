use std::thread;
use std::time::{Duration, Instant};

use crate::config::TimingConfig;

/// Wall-clock pacer for frame production.
///
/// Each tick has an absolute deadline. The next deadline is always computed
/// by adding one frame period to the previous deadline, never from "now", so
/// a transiently slow tick (a transform rebuild, for instance) leaves no
/// permanent lag: the following ticks return from the wait immediately until
/// the clock has caught back up. Deadlines are compared as single monotonic
/// [`Instant`] values.
#[derive(Debug, Clone)]
pub struct FrameClock {
    frame_offset: usize,
    audio_offset: usize,
    frame_period: Duration,
    next_deadline: Instant,
}

impl FrameClock {
    pub fn new(sample_rate: u32, timing: TimingConfig) -> Self {
        let frame_offset = timing.frame_offset.max(1);
        let chunks = timing.chunks_per_submit.max(1);
        let frame_period =
            Duration::from_secs_f64(frame_offset as f64 / f64::from(sample_rate.max(1)));
        Self {
            frame_offset,
            audio_offset: frame_offset * chunks,
            frame_period,
            next_deadline: Instant::now() + frame_period,
        }
    }

    /// Analysis samples consumed per video frame.
    pub fn frame_offset(&self) -> usize {
        self.frame_offset
    }

    /// Playback samples covered by one submission, a multiple of
    /// [`frame_offset`](Self::frame_offset).
    pub fn audio_offset(&self) -> usize {
        self.audio_offset
    }

    pub fn frame_period(&self) -> Duration {
        self.frame_period
    }

    pub fn next_deadline(&self) -> Instant {
        self.next_deadline
    }

    /// Re-anchors the first deadline one period from now. Called once when
    /// the loop starts so setup time is not counted against the first frame.
    pub fn restart(&mut self) {
        self.next_deadline = Instant::now() + self.frame_period;
    }

    /// Spins, yielding the processor between checks, until the deadline has
    /// passed. Busy-waiting with a voluntary yield keeps latency below what
    /// coarse-grained sleeps offer.
    pub fn wait_for_deadline(&self) {
        while Instant::now() < self.next_deadline {
            thread::yield_now();
        }
    }

    /// Moves the deadline forward by exactly one frame period.
    pub fn advance(&mut self) {
        self.next_deadline += self.frame_period;
    }

    /// Blocks until the current deadline, then schedules the next one.
    pub fn pace(&mut self) {
        self.wait_for_deadline();
        self.advance();
    }
}
