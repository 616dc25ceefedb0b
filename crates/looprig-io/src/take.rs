//! Non-blocking take writer.
//!
//! A take has a known length. [`TakeWriter::start`] opens the file and
//! reserves a buffer for the whole take, so the audio side can
//! [`push`](TakeWriter::push) without allocating or touching the disk. The
//! control side calls [`poll`](TakeWriter::poll) to move whatever has been
//! pushed since the last poll into the file, and
//! [`close`](TakeWriter::close) to finalize the header.
//!
//! Failures never reach the audio side: they park the writer in
//! [`WriterStatus::Error`] and later pushes are dropped.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use hound::WavWriter;

use crate::wav::{WavSpec, int_scale, to_int};
use crate::{Error, Result};

/// Where the writer is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterStatus {
    /// Ready for a take.
    Idle,
    /// A take is open.
    Writing,
    /// The take directory could not be prepared. Terminal.
    InitFailed,
    /// A write failed. Terminal.
    Error,
}

/// Streams one take at a time to a WAV file.
pub struct TakeWriter {
    root: PathBuf,
    status: WriterStatus,
    writer: Option<WavWriter<BufWriter<File>>>,
    spec: WavSpec,
    path: Option<PathBuf>,
    buffer: Vec<f32>,
    total: usize,
    written: usize,
}

impl std::fmt::Debug for TakeWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TakeWriter")
            .field("root", &self.root)
            .field("status", &self.status)
            .field("path", &self.path)
            .field("pushed", &self.buffer.len())
            .field("written", &self.written)
            .field("total", &self.total)
            .finish_non_exhaustive()
    }
}

impl TakeWriter {
    /// A writer whose takes land under `root`. The directory is created if
    /// missing; failure leaves the writer in [`WriterStatus::InitFailed`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let status = match std::fs::create_dir_all(&root) {
            Ok(()) => WriterStatus::Idle,
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "take directory unavailable");
                WriterStatus::InitFailed
            }
        };
        Self {
            root,
            status,
            writer: None,
            spec: WavSpec::default(),
            path: None,
            buffer: Vec::new(),
            total: 0,
            written: 0,
        }
    }

    /// Current status.
    pub fn status(&self) -> WriterStatus {
        self.status
    }

    /// A take is open.
    pub fn is_writing(&self) -> bool {
        self.status == WriterStatus::Writing
    }

    /// Path of the open or last take.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Samples the take will hold.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Samples pushed so far.
    pub fn pushed(&self) -> usize {
        self.buffer.len()
    }

    /// Samples on their way to disk.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Opens `name` under the root for a take of `total` interleaved
    /// samples. Returns `false` when busy or when the request is invalid.
    pub fn start(&mut self, name: impl AsRef<Path>, spec: WavSpec, total: usize) -> bool {
        match self.try_start(name, spec, total) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, status = ?self.status, "take not started");
                false
            }
        }
    }

    /// [`start`](Self::start) with the reason for a refusal.
    pub fn try_start(&mut self, name: impl AsRef<Path>, spec: WavSpec, total: usize) -> Result<()> {
        if self.status != WriterStatus::Idle {
            return Err(Error::Busy);
        }
        spec.validate()?;
        if total == 0 {
            return Err(Error::InvalidSpec("empty take".into()));
        }
        if total % spec.channels as usize != 0 {
            return Err(Error::InvalidSpec(format!(
                "{total} samples is not a whole number of {}-channel frames",
                spec.channels
            )));
        }

        let path = self.root.join(name);
        let writer = match WavWriter::create(&path, hound::WavSpec::from(spec)) {
            Ok(writer) => writer,
            Err(e) => {
                self.status = WriterStatus::Error;
                return Err(e.into());
            }
        };

        self.buffer.clear();
        self.buffer.reserve_exact(total);
        self.writer = Some(writer);
        self.spec = spec;
        self.total = total;
        self.written = 0;
        self.status = WriterStatus::Writing;
        tracing::info!(path = %path.display(), total, "take started");
        self.path = Some(path);
        Ok(())
    }

    /// Appends one sample. Audio context: never allocates, never blocks.
    /// Returns `false` once the take is full or the writer is not writing.
    pub fn push(&mut self, sample: f32) -> bool {
        if self.status != WriterStatus::Writing || self.buffer.len() >= self.total {
            return false;
        }
        self.buffer.push(sample);
        true
    }

    /// Appends as many of `samples` as fit. Returns how many were taken.
    pub fn push_slice(&mut self, samples: &[f32]) -> usize {
        if self.status != WriterStatus::Writing {
            return 0;
        }
        let n = samples.len().min(self.total - self.buffer.len());
        self.buffer.extend_from_slice(&samples[..n]);
        n
    }

    /// Writes everything pushed since the last poll. Returns `true` once
    /// the whole take is on its way to disk; the caller then closes it.
    pub fn poll(&mut self) -> bool {
        if self.status != WriterStatus::Writing {
            return false;
        }
        if let Err(e) = self.drain() {
            self.fail(&e);
            return false;
        }
        self.written >= self.total
    }

    /// Drains and finalizes the take. A take closed early keeps what was
    /// pushed. A writing take returns to [`WriterStatus::Idle`].
    pub fn close(&mut self) {
        if self.status != WriterStatus::Writing {
            return;
        }
        let result = self.drain().and_then(|()| match self.writer.take() {
            Some(writer) => writer.finalize().map_err(Error::from),
            None => Ok(()),
        });
        match result {
            Ok(()) => {
                tracing::info!(written = self.written, total = self.total, "take closed");
                self.status = WriterStatus::Idle;
            }
            Err(e) => self.fail(&e),
        }
        self.buffer = Vec::new();
    }

    fn drain(&mut self) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        let pending = &self.buffer[self.written..];
        if self.spec.bits_per_sample == 32 {
            for &sample in pending {
                writer.write_sample(sample)?;
            }
        } else {
            let scale = int_scale(self.spec.bits_per_sample);
            for &sample in pending {
                writer.write_sample(to_int(sample, scale))?;
            }
        }
        self.written += pending.len();
        Ok(())
    }

    fn fail(&mut self, error: &Error) {
        tracing::error!(error = %error, path = ?self.path, "take failed");
        self.writer = None;
        self.status = WriterStatus::Error;
    }
}

impl Drop for TakeWriter {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn stereo() -> WavSpec {
        WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 32,
        }
    }

    #[test]
    fn idle_until_started() {
        let dir = TempDir::new().unwrap();
        let mut take = TakeWriter::new(dir.path());
        assert_eq!(take.status(), WriterStatus::Idle);
        assert!(!take.push(0.5));
        assert!(!take.poll());
    }

    #[test]
    fn busy_while_writing() {
        let dir = TempDir::new().unwrap();
        let mut take = TakeWriter::new(dir.path());
        assert!(take.start("a.wav", stereo(), 4));
        assert!(!take.start("b.wav", stereo(), 4));
        assert!(matches!(
            take.try_start("b.wav", stereo(), 4),
            Err(Error::Busy)
        ));
        assert_eq!(take.path(), Some(dir.path().join("a.wav").as_path()));
    }

    #[test]
    fn invalid_requests_leave_it_idle() {
        let dir = TempDir::new().unwrap();
        let mut take = TakeWriter::new(dir.path());
        assert!(!take.start("a.wav", stereo(), 0));
        assert!(!take.start("a.wav", stereo(), 3));
        let mono_8 = WavSpec {
            bits_per_sample: 8,
            ..WavSpec::default()
        };
        assert!(!take.start("a.wav", mono_8, 10));
        assert_eq!(take.status(), WriterStatus::Idle);
    }

    #[test]
    fn push_stops_at_total() {
        let dir = TempDir::new().unwrap();
        let mut take = TakeWriter::new(dir.path());
        assert!(take.start("a.wav", stereo(), 4));
        assert_eq!(take.push_slice(&[0.1, 0.2, 0.3]), 3);
        assert!(take.push(0.4));
        assert!(!take.push(0.5));
        assert_eq!(take.push_slice(&[0.6]), 0);
        assert_eq!(take.pushed(), 4);
    }

    #[test]
    fn poll_reports_completion() {
        let dir = TempDir::new().unwrap();
        let mut take = TakeWriter::new(dir.path());
        assert!(take.start("a.wav", stereo(), 4));
        take.push_slice(&[0.1, 0.2]);
        assert!(!take.poll());
        assert_eq!(take.written(), 2);
        take.push_slice(&[0.3, 0.4]);
        assert!(take.poll());
        take.close();
        assert_eq!(take.status(), WriterStatus::Idle);
        assert!(take.start("b.wav", stereo(), 2));
    }

    #[test]
    fn unwritable_root_fails_init() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain-file");
        std::fs::write(&file, b"x").unwrap();
        let mut take = TakeWriter::new(file.join("takes"));
        assert_eq!(take.status(), WriterStatus::InitFailed);
        assert!(!take.start("a.wav", stereo(), 2));
    }

    #[test]
    fn missing_subdirectory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut take = TakeWriter::new(dir.path());
        assert!(!take.start("no/such/dir/a.wav", stereo(), 2));
        assert_eq!(take.status(), WriterStatus::Error);
        assert!(!take.push(0.0));
    }
}
