use std::path::Path;

use anyhow::{Context, Result};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use spectrum_visualiser_core::AudioBuffer;

/// Decodes an audio file into the core's paired analysis/playback buffers
/// at `target_rate`.
///
/// Whatever the file's channel layout, the result carries one mono float
/// sample for analysis and one stereo i16 pair for playback per logical
/// frame, time-aligned. Files at a different native rate are linearly
/// resampled.
pub fn decode_file(path: &Path, target_rate: u32) -> Result<AudioBuffer> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open audio file: {}", path.display()))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("failed to probe audio format")?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .context("no audio tracks found")?;

    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count());
    let native_rate = track
        .codec_params
        .sample_rate
        .context("unknown sample rate")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("failed to create audio decoder")?;

    let mut left: Vec<f32> = Vec::new();
    let mut right: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();

        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        for frame in sample_buf.samples().chunks(channels) {
            left.push(frame[0]);
            right.push(if channels > 1 { frame[1] } else { frame[0] });
        }
    }

    if native_rate != target_rate {
        tracing::debug!(native_rate, target_rate, "resampling decoded audio");
        left = resample_linear(&left, native_rate, target_rate);
        right = resample_linear(&right, native_rate, target_rate);
    }

    let analysis: Vec<f32> = left
        .iter()
        .zip(right.iter())
        .map(|(l, r)| 0.5 * (l + r))
        .collect();
    let playback: Vec<[i16; 2]> = left
        .iter()
        .zip(right.iter())
        .map(|(&l, &r)| [to_i16(l), to_i16(r)])
        .collect();

    tracing::info!(
        num_samples = analysis.len(),
        sample_rate = target_rate,
        duration_seconds = analysis.len() as f32 / target_rate as f32,
        "decoded audio"
    );

    Ok(AudioBuffer {
        sample_rate: target_rate,
        analysis,
        playback,
    })
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

fn resample_linear(input: &[f32], src_rate: u32, dst_rate: u32) -> Vec<f32> {
    if input.is_empty() || src_rate == dst_rate {
        return input.to_vec();
    }

    let ratio = f64::from(src_rate) / f64::from(dst_rate);
    let out_len = (input.len() as f64 / ratio) as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let pos = i as f64 * ratio;
        let idx = pos as usize;
        let frac = (pos - idx as f64) as f32;
        let a = input[idx.min(input.len() - 1)];
        let b = input[(idx + 1).min(input.len() - 1)];
        out.push(a + (b - a) * frac);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_is_identity_at_equal_rates() {
        let input = vec![0.0, 0.5, -0.5, 1.0];
        assert_eq!(resample_linear(&input, 44_100, 44_100), input);
    }

    #[test]
    fn downsampling_halves_the_length() {
        let input: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let out = resample_linear(&input, 48_000, 24_000);
        assert_eq!(out.len(), 50);
        // Linear interpolation of a ramp reproduces the ramp.
        assert!((out[10] - 20.0).abs() < 1e-3);
    }

    #[test]
    fn sample_conversion_saturates() {
        assert_eq!(to_i16(2.0), i16::MAX);
        assert_eq!(to_i16(-2.0), -i16::MAX);
        assert_eq!(to_i16(0.0), 0);
    }
}
