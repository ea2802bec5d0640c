use crate::{
    config::{ControlEvent, SpectralConfig, TimingConfig},
    playback::{PlaybackFeeder, PlaybackSink},
    render::Renderer,
    spectral::SpectralEngine,
    store::SampleStore,
    timeline::FrameClock,
    Result,
};

/// Non-blocking source of runtime control events, polled once per tick.
pub trait InputSource {
    fn poll(&mut self) -> Result<Vec<ControlEvent>>;
}

/// Scheduler state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Resizing,
    Stopped,
}

/// Why the loop stopped. End-of-stream drains queued audio; a user close
/// discards it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    Closed,
}

/// Drives one tick after another: advance the window, rebuild the engine if
/// the configuration went dirty, compute the spectrum, keep the sink fed
/// ahead of the cursor, hand magnitudes to the renderer, pace against the
/// wall clock, poll input.
///
/// All of the mutable state lives in this context struct; input events are
/// applied at a single point per tick, so the resize check at the top of
/// the next tick always observes a fully-applied configuration.
pub struct FrameScheduler<R, S, I> {
    store: SampleStore,
    engine: SpectralEngine,
    config: SpectralConfig,
    feeder: PlaybackFeeder,
    clock: FrameClock,
    renderer: R,
    sink: S,
    input: I,
    cursor: usize,
    state: LoopState,
    playing: bool,
}

impl<R, S, I> FrameScheduler<R, S, I>
where
    R: Renderer,
    S: PlaybackSink,
    I: InputSource,
{
    pub fn new(
        store: SampleStore,
        config: SpectralConfig,
        timing: TimingConfig,
        renderer: R,
        sink: S,
        input: I,
    ) -> Self {
        let engine = SpectralEngine::new(config.fft_size);
        let clock = FrameClock::new(store.sample_rate(), timing);
        let feeder = PlaybackFeeder::new(clock.audio_offset());
        Self {
            store,
            engine,
            config,
            feeder,
            clock,
            renderer,
            sink,
            input,
            cursor: 0,
            state: LoopState::Running,
            playing: false,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Analysis read position, in samples.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Runs until the file ends or the user asks to close, then tears the
    /// sink down accordingly and reports which of the two happened.
    pub fn run(&mut self) -> Result<StopReason> {
        self.feeder.prefill(&self.store, &mut self.sink);
        // Hold playback until the first spectrum is on screen, so audio and
        // visuals start on the same frame.
        self.pause_sink(true);
        self.clock.restart();

        while self.cursor < self.store.num_samples() {
            if let Some(reason) = self.tick()? {
                return Ok(self.stop(reason));
            }
            self.cursor += self.clock.frame_offset();
        }

        Ok(self.stop(StopReason::EndOfStream))
    }

    fn tick(&mut self) -> Result<Option<StopReason>> {
        if self.config.take_recalculate() {
            self.resize_engine();
        }

        let window = self.store.window_at(self.cursor, self.config.fft_size);
        let magnitudes = self.engine.analyze(&window, self.config.scale)?;

        self.feeder
            .maybe_submit(self.cursor, &self.store, &mut self.sink);

        self.renderer.render(magnitudes, self.config.horiz_mode)?;

        if !self.playing {
            self.playing = true;
            self.pause_sink(false);
        }

        self.clock.pace();

        for event in self.input.poll()? {
            if event == ControlEvent::Close {
                return Ok(Some(StopReason::Closed));
            }
            self.config.apply(event);
        }

        Ok(None)
    }

    /// RUNNING -> RESIZING -> RUNNING within a single tick. The sink is
    /// paused across the plan rebuild; the tick simply costs more wall-clock
    /// time and the pacer absorbs it over the following frames.
    fn resize_engine(&mut self) {
        self.state = LoopState::Resizing;
        tracing::debug!(fft_size = self.config.fft_size, "rebuilding transform plan");
        self.pause_sink(true);
        self.engine.configure(self.config.fft_size);
        if self.playing {
            self.pause_sink(false);
        }
        self.state = LoopState::Running;
    }

    fn stop(&mut self, reason: StopReason) -> StopReason {
        self.state = LoopState::Stopped;
        let outcome = match reason {
            StopReason::Closed => self.sink.discard(),
            StopReason::EndOfStream => self.sink.drain(),
        };
        if let Err(error) = outcome {
            tracing::warn!(%error, ?reason, "sink teardown failed");
        }
        reason
    }

    fn pause_sink(&mut self, paused: bool) {
        if let Err(error) = self.sink.pause(paused) {
            tracing::warn!(%error, paused, "sink pause request failed");
        }
    }
}
