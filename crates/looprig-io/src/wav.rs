//! WAV file reading and writing.

use crate::{Error, Result};
use hound::{SampleFormat, WavReader, WavWriter};
use std::path::Path;

/// WAV audio encoding format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavFormat {
    /// Linear PCM (integer samples).
    Pcm,
    /// IEEE 754 floating-point samples.
    IeeeFloat,
}

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Audio encoding format.
    pub format: WavFormat,
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let total_samples = reader.len() as u64;
    let num_frames = total_samples / spec.channels.max(1) as u64;
    let duration_secs = num_frames as f64 / spec.sample_rate as f64;

    let format = match spec.sample_format {
        SampleFormat::Float => WavFormat::IeeeFloat,
        SampleFormat::Int => WavFormat::Pcm,
    };

    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs,
        format,
    })
}

/// WAV file specification. 32-bit files are written as float, narrower
/// ones as integer PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample: 16, 24 or 32.
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 32,
        }
    }
}

impl WavSpec {
    /// Checks the layout is one the writers support.
    pub fn validate(&self) -> Result<()> {
        if !(1..=2).contains(&self.channels) {
            return Err(Error::InvalidSpec(format!(
                "{} channels, expected 1 or 2",
                self.channels
            )));
        }
        if self.sample_rate == 0 {
            return Err(Error::InvalidSpec("sample rate 0".into()));
        }
        if !matches!(self.bits_per_sample, 16 | 24 | 32) {
            return Err(Error::InvalidSpec(format!(
                "{}-bit samples, expected 16, 24 or 32",
                self.bits_per_sample
            )));
        }
        Ok(())
    }
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// Left and right channels of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StereoSamples {
    /// Left channel.
    pub left: Vec<f32>,
    /// Right channel.
    pub right: Vec<f32>,
}

impl StereoSamples {
    /// Pairs two channels. The longer one is truncated.
    pub fn new(mut left: Vec<f32>, mut right: Vec<f32>) -> Self {
        let len = left.len().min(right.len());
        left.truncate(len);
        right.truncate(len);
        Self { left, right }
    }

    /// Same signal on both channels.
    pub fn from_mono(mono: Vec<f32>) -> Self {
        Self {
            right: mono.clone(),
            left: mono,
        }
    }

    /// Splits `L R L R ...`.
    pub fn from_interleaved(samples: &[f32]) -> Self {
        let (left, right) = samples
            .chunks_exact(2)
            .map(|frame| (frame[0], frame[1]))
            .unzip();
        Self { left, right }
    }

    /// Frames.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// No frames.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }
}

pub(crate) fn int_scale(bits: u16) -> f32 {
    (1i64 << (bits.clamp(1, 32) - 1)) as f32
}

pub(crate) fn to_int(sample: f32, scale: f32) -> i32 {
    (sample * scale).clamp(-scale, scale - 1.0) as i32
}

fn read_interleaved(reader: WavReader<std::io::BufReader<std::fs::File>>) -> Result<Vec<f32>> {
    let spec = reader.spec();
    let samples = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let scale = int_scale(spec.bits_per_sample);
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };
    Ok(samples)
}

/// Read a WAV file as stereo.
///
/// Mono files are duplicated to both channels. Files with more than two
/// channels keep only the first two.
pub fn read_wav_stereo<P: AsRef<Path>>(path: P) -> Result<(StereoSamples, WavSpec)> {
    let reader = WavReader::open(path)?;
    let spec = WavSpec::from(reader.spec());
    let channels = spec.channels as usize;
    let all_samples = read_interleaved(reader)?;

    let stereo = match channels {
        0 => StereoSamples::default(),
        1 => StereoSamples::from_mono(all_samples),
        2 => StereoSamples::from_interleaved(&all_samples),
        _ => {
            let (left, right) = all_samples
                .chunks_exact(channels)
                .map(|frame| (frame[0], frame[1]))
                .unzip();
            StereoSamples { left, right }
        }
    };

    Ok((stereo, spec))
}

/// Write interleaved samples to a WAV file in one go.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], spec: WavSpec) -> Result<()> {
    spec.validate()?;
    let mut writer = WavWriter::create(path, hound::WavSpec::from(spec))?;

    if spec.bits_per_sample == 32 {
        for &sample in samples {
            writer.write_sample(sample)?;
        }
    } else {
        let scale = int_scale(spec.bits_per_sample);
        for &sample in samples {
            writer.write_sample(to_int(sample, scale))?;
        }
    }

    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn mono_reads_on_both_channels() {
        let mono: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 32,
        };

        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &mono, spec).unwrap();

        let (stereo, loaded) = read_wav_stereo(file.path()).unwrap();
        assert_eq!(loaded, spec);
        assert_eq!(stereo.left, mono);
        assert_eq!(stereo.right, mono);
    }

    #[test]
    fn interleaved_16_bit() {
        let frames: Vec<f32> = (0..200)
            .flat_map(|i| {
                let x = (i as f32 / 200.0).sin() * 0.8;
                [x, -x]
            })
            .collect();
        let spec = WavSpec {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 16,
        };

        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &frames, spec).unwrap();

        let (stereo, _) = read_wav_stereo(file.path()).unwrap();
        assert_eq!(stereo.len(), 200);
        for (l, r) in stereo.left.iter().zip(&stereo.right) {
            assert!((l + r).abs() < 1e-4);
        }
    }

    #[test]
    fn info_without_samples() {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 24,
        };
        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &vec![0.25; 8000 * 2], spec).unwrap();

        let info = read_wav_info(file.path()).unwrap();
        assert_eq!(info.num_frames, 8000);
        assert_eq!(info.format, WavFormat::Pcm);
        assert!((info.duration_secs - 1.0).abs() < 1e-9);
    }

    #[test]
    fn integer_conversion_clips() {
        let scale = int_scale(16);
        assert_eq!(to_int(2.0, scale), 32767);
        assert_eq!(to_int(-2.0, scale), -32768);
        assert_eq!(to_int(0.0, scale), 0);
    }

    #[test]
    fn rejects_odd_layouts() {
        let file = NamedTempFile::new().unwrap();
        let spec = WavSpec {
            bits_per_sample: 12,
            ..WavSpec::default()
        };
        assert!(matches!(
            write_wav(file.path(), &[0.0], spec),
            Err(Error::InvalidSpec(_))
        ));
        let spec = WavSpec {
            channels: 6,
            ..WavSpec::default()
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn stereo_new_truncates() {
        let s = StereoSamples::new(vec![1.0, 2.0, 3.0], vec![4.0]);
        assert_eq!(s.len(), 1);
        assert_eq!(s.left, vec![1.0]);
    }
}
