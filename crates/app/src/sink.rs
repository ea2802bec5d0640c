use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleFormat, SampleRate, Stream, StreamConfig};
use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};

use spectrum_visualiser_core::{PlaybackSink, Result as CoreResult};

const DRAIN_POLL: Duration = Duration::from_millis(10);
/// Covers whatever the device still holds after the ring has emptied.
const DRAIN_GRACE: Duration = Duration::from_millis(100);

/// Sample rate the default output device prefers. Decoding targets this
/// rate so the stream can be opened without resampling on the device side.
pub fn default_output_rate() -> Result<u32> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .context("no default audio output device")?;
    let config = device
        .default_output_config()
        .context("failed to query the default output configuration")?;
    Ok(config.sample_rate().0)
}

/// Playback sink backed by a cpal output stream and a lock-free ring of
/// stereo frames.
///
/// The audio callback drains the ring; when the ring underruns, or while
/// the sink is paused, it writes silence instead. `write_nonblocking` only
/// ever pushes into the ring, so the feeder never waits on the device.
pub struct CpalSink {
    producer: HeapProd<[i16; 2]>,
    paused: Arc<AtomicBool>,
    flush: Arc<AtomicBool>,
    _stream: Stream,
}

impl CpalSink {
    /// Opens the default output device at `sample_rate` with room for
    /// `capacity_frames` queued stereo frames.
    pub fn open(sample_rate: u32, capacity_frames: usize) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("no default audio output device")?;
        let default_config = device
            .default_output_config()
            .context("failed to query the default output configuration")?;

        let sample_format = default_config.sample_format();
        let channels = default_config.channels();
        let config = StreamConfig {
            channels,
            sample_rate: SampleRate(sample_rate),
            buffer_size: BufferSize::Default,
        };

        let (producer, consumer) = HeapRb::<[i16; 2]>::new(capacity_frames.max(1)).split();
        let paused = Arc::new(AtomicBool::new(false));
        let flush = Arc::new(AtomicBool::new(false));

        let stream = build_stream(
            &device,
            &config,
            sample_format,
            consumer,
            Arc::clone(&paused),
            Arc::clone(&flush),
        )?;
        stream.play().context("failed to start the output stream")?;

        tracing::debug!(
            sample_rate,
            channels,
            ?sample_format,
            capacity_frames,
            "opened audio output"
        );

        Ok(Self {
            producer,
            paused,
            flush,
            _stream: stream,
        })
    }
}

impl PlaybackSink for CpalSink {
    fn write_nonblocking(&mut self, frames: &[[i16; 2]]) -> CoreResult<usize> {
        Ok(self.producer.push_slice(frames))
    }

    fn pause(&mut self, paused: bool) -> CoreResult<()> {
        self.paused.store(paused, Ordering::Release);
        Ok(())
    }

    fn recover(&mut self) -> CoreResult<()> {
        // Underruns surface as the callback substituting silence; the ring
        // itself stays valid, so there is nothing to reset.
        Ok(())
    }

    fn discard(&mut self) -> CoreResult<()> {
        self.flush.store(true, Ordering::Release);
        Ok(())
    }

    fn drain(&mut self) -> CoreResult<()> {
        self.paused.store(false, Ordering::Release);
        while !self.producer.is_empty() {
            thread::sleep(DRAIN_POLL);
        }
        thread::sleep(DRAIN_GRACE);
        Ok(())
    }
}

fn build_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    sample_format: SampleFormat,
    mut consumer: HeapCons<[i16; 2]>,
    paused: Arc<AtomicBool>,
    flush: Arc<AtomicBool>,
) -> Result<Stream> {
    let channels = config.channels as usize;
    let err_fn = |err: cpal::StreamError| tracing::warn!(%err, "audio output stream error");

    let stream = match sample_format {
        SampleFormat::F32 => device.build_output_stream(
            config,
            move |data: &mut [f32], _| {
                fill_output(data, channels, &mut consumer, &paused, &flush, |s| {
                    f32::from(s) / 32_768.0
                })
            },
            err_fn,
            None,
        )?,
        SampleFormat::I16 => device.build_output_stream(
            config,
            move |data: &mut [i16], _| {
                fill_output(data, channels, &mut consumer, &paused, &flush, |s| s)
            },
            err_fn,
            None,
        )?,
        other => anyhow::bail!("unsupported output sample format: {other:?}"),
    };

    Ok(stream)
}

fn fill_output<T: Copy + Default>(
    data: &mut [T],
    channels: usize,
    consumer: &mut HeapCons<[i16; 2]>,
    paused: &AtomicBool,
    flush: &AtomicBool,
    convert: impl Fn(i16) -> T,
) {
    if flush.swap(false, Ordering::AcqRel) {
        consumer.clear();
    }

    let silence = T::default();
    if paused.load(Ordering::Acquire) {
        data.fill(silence);
        return;
    }

    for frame in data.chunks_mut(channels) {
        match consumer.try_pop() {
            Some([left, right]) => {
                if channels == 1 {
                    frame[0] = convert(((i32::from(left) + i32::from(right)) / 2) as i16);
                } else {
                    frame[0] = convert(left);
                    frame[1] = convert(right);
                    for slot in frame.iter_mut().skip(2) {
                        *slot = silence;
                    }
                }
            }
            None => frame.fill(silence),
        }
    }
}
