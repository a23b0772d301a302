//! Video frame extraction through an external transcoder.
//!
//! The cache talks to the transcoder through the `FrameExtractor` trait so
//! the process invocation can be swapped out in tests.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, trace};
use wait_timeout::ChildExt;

/// Offset of the frame captured for a video thumbnail.
pub const DEFAULT_SEEK_OFFSET: &str = "00:00:01.000";

/// Default transcoder executable, resolved through `PATH`.
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("failed to start {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{status}: {output}")]
    Failed { status: String, output: String },

    #[error("timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("transcoder exited cleanly but wrote no frame to {0:?}")]
    NoFrame(PathBuf),
}

/// Writes a single still frame of `input` to `output`.
pub trait FrameExtractor: Send + Sync {
    fn extract_frame(&self, input: &Path, output: &Path) -> Result<(), ExtractError>;
}

/// `FrameExtractor` backed by an ffmpeg executable.
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    program: PathBuf,
    seek_offset: String,
    timeout: Option<Duration>,
}

impl FfmpegExtractor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            seek_offset: DEFAULT_SEEK_OFFSET.to_string(),
            timeout: None,
        }
    }

    pub fn with_seek_offset(mut self, offset: impl Into<String>) -> Self {
        self.seek_offset = offset.into();
        self
    }

    /// Kill the transcoder if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self, input: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-i")
            .arg(input)
            .arg("-ss")
            .arg(&self.seek_offset)
            .arg("-vframes")
            .arg("1")
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    /// Runs the command to completion, returning its exit status and the
    /// combined stdout and stderr.
    fn run(&self, mut cmd: Command) -> Result<(ExitStatus, Vec<u8>), ExtractError> {
        let spawn_error = |source| ExtractError::Spawn {
            program: self.program.clone(),
            source,
        };

        let Some(timeout) = self.timeout else {
            let out = cmd.output().map_err(spawn_error)?;
            return Ok((out.status, combine(out.stdout, out.stderr)));
        };

        let mut child = cmd.spawn().map_err(spawn_error)?;
        // Drain both pipes while waiting so a chatty transcoder cannot block on a full pipe.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        match child.wait_timeout(timeout).map_err(spawn_error)? {
            Some(status) => Ok((status, combine(join(stdout), join(stderr)))),
            None => {
                child.kill().ok();
                child.wait().ok();
                Err(ExtractError::TimedOut(timeout))
            }
        }
    }
}

impl Default for FfmpegExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_FFMPEG)
    }
}

impl FrameExtractor for FfmpegExtractor {
    fn extract_frame(&self, input: &Path, output: &Path) -> Result<(), ExtractError> {
        debug!(?input, ?output, offset = %self.seek_offset, "Extracting video frame");

        let (status, combined) = self.run(self.command(input, output))?;
        if !status.success() {
            return Err(ExtractError::Failed {
                status: status.to_string(),
                output: String::from_utf8_lossy(&combined).trim().to_string(),
            });
        }
        // Clips shorter than the seek offset exit 0 without writing anything.
        if !output.exists() {
            return Err(ExtractError::NoFrame(output.to_path_buf()));
        }

        trace!(?output, "Frame written");
        Ok(())
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            pipe.read_to_end(&mut buf).ok();
            buf
        })
    })
}

fn join(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

fn combine(mut stdout: Vec<u8>, stderr: Vec<u8>) -> Vec<u8> {
    stdout.extend_from_slice(&stderr);
    stdout
}
