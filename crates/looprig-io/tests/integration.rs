//! Takes written through the non-blocking writer read back as WAV files.

use looprig_io::{TakeWriter, WavFormat, WavSpec, WriterStatus, read_wav_info, read_wav_stereo};
use tempfile::TempDir;

fn ramp(frames: usize) -> Vec<f32> {
    (0..frames)
        .flat_map(|i| {
            let x = i as f32 / frames as f32 - 0.5;
            [x, 0.5 * x]
        })
        .collect()
}

#[test]
fn block_by_block_take_reads_back() {
    let dir = TempDir::new().unwrap();
    let spec = WavSpec {
        channels: 2,
        sample_rate: 48000,
        bits_per_sample: 32,
    };
    let samples = ramp(1000);

    let mut take = TakeWriter::new(dir.path());
    assert!(take.start("take.wav", spec, samples.len()));

    let mut done = false;
    for block in samples.chunks(96) {
        for &s in block {
            assert!(take.push(s));
        }
        done = take.poll();
    }
    assert!(done);
    take.close();
    assert_eq!(take.status(), WriterStatus::Idle);

    let (stereo, loaded) = read_wav_stereo(dir.path().join("take.wav")).unwrap();
    assert_eq!(loaded, spec);
    assert_eq!(stereo.len(), 1000);
    for (i, (l, r)) in stereo.left.iter().zip(&stereo.right).enumerate() {
        assert_eq!(*l, samples[2 * i]);
        assert_eq!(*r, samples[2 * i + 1]);
    }
}

#[test]
fn sixteen_bit_take() {
    let dir = TempDir::new().unwrap();
    let spec = WavSpec {
        channels: 2,
        sample_rate: 44100,
        bits_per_sample: 16,
    };
    let samples = ramp(441);

    let mut take = TakeWriter::new(dir.path());
    assert!(take.start("take16.wav", spec, samples.len()));
    assert_eq!(take.push_slice(&samples), samples.len());
    assert!(take.poll());
    take.close();

    let info = read_wav_info(dir.path().join("take16.wav")).unwrap();
    assert_eq!(info.format, WavFormat::Pcm);
    assert_eq!(info.num_frames, 441);

    let (stereo, _) = read_wav_stereo(dir.path().join("take16.wav")).unwrap();
    for (i, l) in stereo.left.iter().enumerate() {
        assert!((l - samples[2 * i]).abs() < 1e-4);
    }
}

#[test]
fn early_close_keeps_what_was_pushed() {
    let dir = TempDir::new().unwrap();
    let spec = WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 32,
    };

    let mut take = TakeWriter::new(dir.path());
    assert!(take.start("short.wav", spec, 8000));
    take.push_slice(&[0.25; 100]);
    take.close();

    let info = read_wav_info(dir.path().join("short.wav")).unwrap();
    assert_eq!(info.num_frames, 100);
    assert_eq!(info.channels, 1);
}

#[test]
fn drop_finalizes_the_header() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dropped.wav");
    {
        let mut take = TakeWriter::new(dir.path());
        assert!(take.start("dropped.wav", WavSpec::default(), 10));
        take.push_slice(&[0.1; 10]);
    }
    let info = read_wav_info(path).unwrap();
    assert_eq!(info.num_frames, 10);
}
