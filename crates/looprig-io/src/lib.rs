//! File I/O for looprig hosts.
//!
//! This crate provides:
//!
//! - **WAV file I/O**: [`read_wav_stereo`], [`read_wav_info`] and
//!   [`write_wav`] for loading and saving whole files
//! - **Take writer**: [`TakeWriter`], which records a take of known length
//!   without blocking the audio context. The audio side pushes samples into
//!   a buffer reserved up front; the control side polls them out to disk.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use looprig_io::{TakeWriter, WavSpec, WriterStatus, read_wav_stereo};
//!
//! let (input, spec) = read_wav_stereo("dry.wav")?;
//!
//! let mut take = TakeWriter::new("takes");
//! let spec = WavSpec { channels: 2, ..spec };
//! assert!(take.start("take-01.wav", spec, input.len() * 2));
//! for (l, r) in input.left.iter().zip(&input.right) {
//!     take.push(*l);
//!     take.push(*r);
//!     take.poll();
//! }
//! take.close();
//! assert_eq!(take.status(), WriterStatus::Idle);
//! # Ok::<(), looprig_io::Error>(())
//! ```

mod take;
mod wav;

pub use take::{TakeWriter, WriterStatus};
pub use wav::{
    StereoSamples, WavFormat, WavInfo, WavSpec, read_wav_info, read_wav_stereo, write_wav,
};

/// Error types for file I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A take is already being written, or the writer is not usable.
    #[error("take writer busy")]
    Busy,

    /// The requested WAV layout or take length cannot be written.
    #[error("invalid take spec: {0}")]
    InvalidSpec(String),
}

/// Convenience result type for file I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
