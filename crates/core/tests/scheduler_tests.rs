use std::sync::{Arc, Mutex};

use spectrum_visualiser_core::{
    AudioBuffer, ControlEvent, FrameScheduler, HorizontalScale, InputSource, LoopState,
    PlaybackSink, Renderer, Result, SampleStore, SpectralConfig, StopReason, TimingConfig,
};

#[derive(Debug, Default)]
struct SinkLog {
    writes: Vec<usize>,
    pauses: Vec<bool>,
    drained: bool,
    discarded: bool,
}

#[derive(Clone)]
struct FakeSink {
    log: Arc<Mutex<SinkLog>>,
}

impl FakeSink {
    fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(SinkLog::default())),
        }
    }
}

impl PlaybackSink for FakeSink {
    fn write_nonblocking(&mut self, frames: &[[i16; 2]]) -> Result<usize> {
        self.log.lock().unwrap().writes.push(frames.len());
        Ok(frames.len())
    }

    fn pause(&mut self, paused: bool) -> Result<()> {
        self.log.lock().unwrap().pauses.push(paused);
        Ok(())
    }

    fn recover(&mut self) -> Result<()> {
        Ok(())
    }

    fn discard(&mut self) -> Result<()> {
        self.log.lock().unwrap().discarded = true;
        Ok(())
    }

    fn drain(&mut self) -> Result<()> {
        self.log.lock().unwrap().drained = true;
        Ok(())
    }
}

#[derive(Clone)]
struct FakeRenderer {
    frames: Arc<Mutex<Vec<(usize, HorizontalScale)>>>,
}

impl FakeRenderer {
    fn new() -> Self {
        Self {
            frames: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Renderer for FakeRenderer {
    fn render(&mut self, magnitudes: &[f32], mode: HorizontalScale) -> Result<()> {
        self.frames.lock().unwrap().push((magnitudes.len(), mode));
        Ok(())
    }
}

/// Replays one batch of events per tick, then reports quiet polls.
struct ScriptedInput {
    script: Vec<Vec<ControlEvent>>,
    tick: usize,
}

impl ScriptedInput {
    fn new(script: Vec<Vec<ControlEvent>>) -> Self {
        Self { script, tick: 0 }
    }

    fn quiet() -> Self {
        Self::new(Vec::new())
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> Result<Vec<ControlEvent>> {
        let events = self.script.get(self.tick).cloned().unwrap_or_default();
        self.tick += 1;
        Ok(events)
    }
}

fn store_with(num_samples: usize) -> SampleStore {
    let analysis: Vec<f32> = (0..num_samples)
        .map(|i| (i as f32 * 0.05).sin())
        .collect();
    let playback = (0..num_samples).map(|i| [i as i16, i as i16]).collect();
    SampleStore::new(AudioBuffer {
        sample_rate: 48_000,
        analysis,
        playback,
    })
}

fn timing() -> TimingConfig {
    TimingConfig {
        frame_offset: 16,
        chunks_per_submit: 2,
    }
}

fn config(fft_size: usize) -> SpectralConfig {
    SpectralConfig {
        fft_size,
        ..SpectralConfig::default()
    }
}

#[test]
fn natural_end_of_stream_drains_the_sink() {
    let sink = FakeSink::new();
    let renderer = FakeRenderer::new();
    let mut scheduler = FrameScheduler::new(
        store_with(96),
        config(64),
        timing(),
        renderer.clone(),
        sink.clone(),
        ScriptedInput::quiet(),
    );

    let reason = scheduler.run().unwrap();

    assert_eq!(reason, StopReason::EndOfStream);
    assert_eq!(scheduler.state(), LoopState::Stopped);
    assert!(scheduler.cursor() >= 96);

    let log = sink.log.lock().unwrap();
    assert!(log.drained);
    assert!(!log.discarded);
    // Prefill plus the look-ahead chunks at cursor 0 and 32; the boundary
    // at 64 skips because its look-ahead start is past end-of-file.
    assert_eq!(log.writes, vec![32, 32, 32]);
    // Held paused through prefill, released after the first rendered frame.
    assert_eq!(log.pauses, vec![true, false]);

    let frames = renderer.frames.lock().unwrap();
    assert_eq!(frames.len(), 6);
    assert!(frames.iter().all(|&(count, _)| count == 32));
}

#[test]
fn close_request_discards_queued_audio() {
    let sink = FakeSink::new();
    let renderer = FakeRenderer::new();
    let mut scheduler = FrameScheduler::new(
        store_with(960),
        config(64),
        timing(),
        renderer.clone(),
        sink.clone(),
        ScriptedInput::new(vec![Vec::new(), vec![ControlEvent::Close]]),
    );

    let reason = scheduler.run().unwrap();

    assert_eq!(reason, StopReason::Closed);
    assert_eq!(scheduler.state(), LoopState::Stopped);

    let log = sink.log.lock().unwrap();
    assert!(log.discarded);
    assert!(!log.drained);
    assert_eq!(renderer.frames.lock().unwrap().len(), 2);
}

#[test]
fn resize_takes_effect_on_the_next_tick_without_skipping_a_frame() {
    let sink = FakeSink::new();
    let renderer = FakeRenderer::new();
    let mut scheduler = FrameScheduler::new(
        store_with(96),
        config(64),
        timing(),
        renderer.clone(),
        sink.clone(),
        ScriptedInput::new(vec![vec![ControlEvent::DoubleFftSize]]),
    );

    scheduler.run().unwrap();

    let frames = renderer.frames.lock().unwrap();
    let counts: Vec<usize> = frames.iter().map(|&(count, _)| count).collect();
    assert_eq!(counts, vec![32, 64, 64, 64, 64, 64]);

    // The rebuild pauses the sink for the duration of the tick and resumes
    // it, on top of the initial hold-until-first-frame pair.
    let log = sink.log.lock().unwrap();
    assert_eq!(log.pauses, vec![true, false, true, false]);
}

#[test]
fn horizontal_mode_change_reaches_the_renderer_on_the_next_tick() {
    let renderer = FakeRenderer::new();
    let mut scheduler = FrameScheduler::new(
        store_with(64),
        config(32),
        timing(),
        renderer.clone(),
        FakeSink::new(),
        ScriptedInput::new(vec![vec![ControlEvent::CycleHorizontal]]),
    );

    scheduler.run().unwrap();

    let frames = renderer.frames.lock().unwrap();
    let modes: Vec<HorizontalScale> = frames.iter().map(|&(_, mode)| mode).collect();
    assert_eq!(
        modes,
        vec![HorizontalScale::Logarithmic, HorizontalScale::Linear, HorizontalScale::Linear, HorizontalScale::Linear]
    );
}

#[test]
fn empty_stream_stops_immediately_with_a_drain() {
    let sink = FakeSink::new();
    let mut scheduler = FrameScheduler::new(
        store_with(0),
        config(64),
        timing(),
        FakeRenderer::new(),
        sink.clone(),
        ScriptedInput::quiet(),
    );

    let reason = scheduler.run().unwrap();

    assert_eq!(reason, StopReason::EndOfStream);
    let log = sink.log.lock().unwrap();
    assert!(log.drained);
    assert!(log.writes.is_empty());
}
