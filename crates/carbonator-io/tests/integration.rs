//! Integration tests for carbonator-io WAV I/O.

use carbonator_io::{PlanarBuffer, WavSpec, read_wav, read_wav_info, write_wav};
use tempfile::NamedTempFile;

fn sine_wave(sample_rate: u32, freq_hz: f32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| (2.0 * std::f32::consts::PI * freq_hz * i as f32 / sample_rate as f32).sin())
        .collect()
}

fn assert_close(a: &PlanarBuffer, b: &PlanarBuffer, tolerance: f32) {
    assert_eq!(a.num_channels(), b.num_channels());
    assert_eq!(a.num_frames(), b.num_frames());
    for ch in 0..a.num_channels() {
        let (x, y) = (a.channel(ch).unwrap(), b.channel(ch).unwrap());
        for (s, t) in x.iter().zip(y) {
            assert!(
                (s - t).abs() < tolerance,
                "channel {ch}: {s} vs {t} (diff={})",
                (s - t).abs()
            );
        }
    }
}

#[test]
fn wav_roundtrip_mono_f32_44100() {
    let sr = 44100;
    let buffer = PlanarBuffer::from_channels(vec![sine_wave(sr, 440.0, sr as usize)]);
    let spec = WavSpec {
        channels: 1,
        sample_rate: sr,
        bits_per_sample: 32,
    };

    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), &buffer, spec).unwrap();

    let (loaded, loaded_spec) = read_wav(file.path()).unwrap();
    assert_eq!(loaded_spec.channels, 1);
    assert_close(&buffer, &loaded, 1e-6);
}

#[test]
fn wav_roundtrip_surround_keeps_channel_order() {
    let sr = 48000;
    let channels: Vec<Vec<f32>> = (0..6)
        .map(|ch| {
            sine_wave(sr, 100.0 * (ch + 1) as f32, 4800)
                .into_iter()
                .map(|s| s * 0.1 * (ch + 1) as f32)
                .collect()
        })
        .collect();
    let buffer = PlanarBuffer::from_channels(channels);
    let spec = WavSpec {
        channels: 6,
        sample_rate: sr,
        bits_per_sample: 32,
    };

    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), &buffer, spec).unwrap();

    let (loaded, loaded_spec) = read_wav(file.path()).unwrap();
    assert_eq!(loaded_spec, spec);
    assert_eq!(loaded, buffer);
}

#[test]
fn wav_roundtrip_24bit_precision() {
    let sr = 48000;
    let buffer = PlanarBuffer::from_channels(vec![
        sine_wave(sr, 1000.0, 2400),
        sine_wave(sr, 1500.0, 2400),
    ]);
    let spec = WavSpec {
        channels: 2,
        sample_rate: sr,
        bits_per_sample: 24,
    };

    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), &buffer, spec).unwrap();

    let (loaded, _) = read_wav(file.path()).unwrap();
    assert_close(&buffer, &loaded, 1e-6);

    let info = read_wav_info(file.path()).unwrap();
    assert_eq!(info.bits_per_sample, 24);
    assert_eq!(info.num_frames, 2400);
}

#[test]
fn read_missing_file_is_an_error() {
    assert!(read_wav("/nonexistent/carbonator/input.wav").is_err());
}
