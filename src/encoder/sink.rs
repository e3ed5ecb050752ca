use std::collections::VecDeque;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::cancel::CancelToken;
use crate::encoder::pixel::PixelBuffer;
use crate::encoder::settings::{MediaTime, VideoSettings};
use crate::error::EncodeError;

/// Writer backend for one encoding run
///
/// A sink accepts pixel buffers strictly sequentially. The readiness signal
/// tells the caller when another frame can be appended without blocking; the
/// caller must wait on it rather than drop frames or buffer without bound.
pub trait FrameSink: Send {
    /// Readiness signal: true when the sink can accept another frame
    /// without blocking
    fn is_ready(&self) -> bool;

    /// Park until the sink is ready, cancellation is requested, or the
    /// backend has failed
    fn wait_until_ready(&self, cancel: &CancelToken) -> Result<(), EncodeError>;

    /// Append one frame at the given presentation timestamp
    ///
    /// Timestamps must be strictly increasing across the run.
    fn append(&mut self, buffer: PixelBuffer, pts: MediaTime) -> Result<(), EncodeError>;

    /// Close the write session, blocking until the container is finalized,
    /// and return its path
    fn finish(self: Box<Self>) -> Result<PathBuf, EncodeError>;
}

/// Whether an `ffmpeg` binary is reachable on PATH
pub fn is_ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Map a settings codec id onto an ffmpeg encoder name
fn codec_arg(codec: &str) -> Result<&'static str, EncodeError> {
    match codec {
        "h264" => Ok("libx264"),
        "h265" | "hevc" => Ok("libx265"),
        other => Err(EncodeError::UnsupportedCodec {
            codec: other.to_string(),
        }),
    }
}

/// Input frame rate for a constant frame duration, as an ffmpeg fraction
fn framerate_arg(frame_duration: MediaTime) -> String {
    // frames per second = 1 / duration = timescale / value
    format!("{}/{}", frame_duration.timescale, frame_duration.value)
}

struct QueueState {
    items: VecDeque<Vec<u8>>,
    closed: bool,
    failure: Option<String>,
}

/// Bounded in-flight frame queue between the appender and the drain thread
///
/// Capacity is the readiness signal: a producer may only push while a slot is
/// free and parks on the condition variable otherwise. The consumer pops
/// until the queue is closed and empty. Either side can mark the queue failed,
/// which wakes all waiters.
#[derive(Clone)]
struct FrameQueue {
    shared: Arc<(Mutex<QueueState>, Condvar)>,
    capacity: usize,
}

impl FrameQueue {
    fn new(capacity: usize) -> Self {
        Self {
            shared: Arc::new((
                Mutex::new(QueueState {
                    items: VecDeque::with_capacity(capacity),
                    closed: false,
                    failure: None,
                }),
                Condvar::new(),
            )),
            capacity,
        }
    }

    fn has_capacity(&self) -> bool {
        let (lock, _) = &*self.shared;
        let state = guard(lock.lock());
        state.failure.is_none() && state.items.len() < self.capacity
    }

    /// Park until a slot is free, cancellation is requested, or the queue
    /// has failed
    fn wait_for_capacity(&self, cancel: &CancelToken) -> Result<(), EncodeError> {
        let (lock, cvar) = &*self.shared;
        let mut state = guard(lock.lock());

        loop {
            if cancel.is_cancelled() {
                return Err(EncodeError::Cancelled);
            }
            if let Some(reason) = &state.failure {
                return Err(EncodeError::Backend {
                    reason: reason.clone(),
                });
            }
            if state.items.len() < self.capacity {
                return Ok(());
            }

            // Bounded park so cancellation is observed promptly
            let (next, _) = guard(cvar.wait_timeout(state, Duration::from_millis(50)));
            state = next;
        }
    }

    /// Push one frame, parking while the queue is full
    fn push(&self, bytes: Vec<u8>) -> Result<(), EncodeError> {
        let (lock, cvar) = &*self.shared;
        let mut state = guard(lock.lock());

        loop {
            if let Some(reason) = &state.failure {
                return Err(EncodeError::Backend {
                    reason: reason.clone(),
                });
            }
            if state.items.len() < self.capacity {
                break;
            }
            state = guard(cvar.wait(state));
        }

        state.items.push_back(bytes);
        cvar.notify_all();
        Ok(())
    }

    /// Pop the next frame, parking while the queue is empty;
    /// `None` once the queue is closed and drained
    fn pop_blocking(&self) -> Option<Vec<u8>> {
        let (lock, cvar) = &*self.shared;
        let mut state = guard(lock.lock());

        loop {
            if let Some(item) = state.items.pop_front() {
                // A slot freed up; wake any parked producer
                cvar.notify_all();
                return Some(item);
            }
            if state.closed {
                return None;
            }
            state = guard(cvar.wait(state));
        }
    }

    /// Close the queue; already-queued frames still drain
    fn close(&self) {
        let (lock, cvar) = &*self.shared;
        let mut state = guard(lock.lock());
        state.closed = true;
        cvar.notify_all();
    }

    /// Mark the queue failed and discard pending frames
    fn fail(&self, reason: String) {
        let (lock, cvar) = &*self.shared;
        let mut state = guard(lock.lock());
        state.failure = Some(reason);
        state.items.clear();
        cvar.notify_all();
    }

    fn failure(&self) -> Option<String> {
        let (lock, _) = &*self.shared;
        guard(lock.lock()).failure.clone()
    }
}

/// Streams raw ARGB frames into a spawned `ffmpeg` process
///
/// Appended buffers go through the bounded in-flight queue, drained by a
/// dedicated writer thread feeding the child's stdin. Readiness is "the
/// queue has a free slot".
pub struct FfmpegSink {
    settings: VideoSettings,
    output_path: PathBuf,
    queue: FrameQueue,
    child: Option<Child>,
    drain: Option<thread::JoinHandle<()>>,
    last_pts: Option<MediaTime>,
}

impl FfmpegSink {
    /// Open the output container and begin a write session
    ///
    /// Removes any stale file at the output path first. `capacity` bounds the
    /// number of in-flight frames between the appender and the pipe.
    pub fn create(
        settings: &VideoSettings,
        frame_duration: MediaTime,
        output_path: &Path,
        capacity: usize,
    ) -> Result<Self, EncodeError> {
        if output_path.exists() {
            std::fs::remove_file(output_path).map_err(|e| EncodeError::WriterCreateFailed {
                path: output_path.display().to_string(),
                reason: format!("could not remove stale file: {}", e),
            })?;
        }

        if !is_ffmpeg_available() {
            return Err(EncodeError::WriterCreateFailed {
                path: output_path.display().to_string(),
                reason: "ffmpeg not found on PATH".to_string(),
            });
        }

        let encoder = codec_arg(&settings.codec)?;

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .args([
                "-y",
                "-loglevel",
                "error",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "argb",
                "-s",
                &format!("{}x{}", settings.width, settings.height),
                "-framerate",
                &framerate_arg(frame_duration),
                "-i",
                "pipe:0",
                "-an",
                "-c:v",
                encoder,
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "+faststart",
            ])
            .arg(output_path);

        let mut child = cmd.spawn().map_err(|e| EncodeError::WriterCreateFailed {
            path: output_path.display().to_string(),
            reason: format!("failed to spawn ffmpeg: {}", e),
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| EncodeError::WriterCreateFailed {
                path: output_path.display().to_string(),
                reason: "failed to open ffmpeg stdin".to_string(),
            })?;

        let queue = FrameQueue::new(capacity);
        let drain_queue = queue.clone();
        let drain = thread::spawn(move || {
            while let Some(chunk) = drain_queue.pop_blocking() {
                if let Err(e) = stdin.write_all(&chunk) {
                    drain_queue.fail(e.to_string());
                    break;
                }
            }
            // Dropping stdin closes the pipe and lets ffmpeg finalize
        });

        debug!(
            "ffmpeg writer opened for {}x{} {} at {:?}",
            settings.width, settings.height, settings.codec, output_path
        );

        Ok(Self {
            settings: settings.clone(),
            output_path: output_path.to_path_buf(),
            queue,
            child: Some(child),
            drain: Some(drain),
            last_pts: None,
        })
    }
}

impl FrameSink for FfmpegSink {
    fn is_ready(&self) -> bool {
        self.queue.has_capacity()
    }

    fn wait_until_ready(&self, cancel: &CancelToken) -> Result<(), EncodeError> {
        self.queue.wait_for_capacity(cancel)
    }

    fn append(&mut self, buffer: PixelBuffer, pts: MediaTime) -> Result<(), EncodeError> {
        if buffer.width() != self.settings.width || buffer.height() != self.settings.height {
            return Err(EncodeError::Backend {
                reason: format!(
                    "buffer size {}x{} does not match configured {}x{}",
                    buffer.width(),
                    buffer.height(),
                    self.settings.width,
                    self.settings.height
                ),
            });
        }

        if let Some(last) = self.last_pts {
            if pts <= last {
                return Err(EncodeError::NonMonotonicTimestamp {
                    pts: pts.to_string(),
                    last: last.to_string(),
                });
            }
        }

        self.queue.push(buffer.into_data())?;
        self.last_pts = Some(pts);
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<PathBuf, EncodeError> {
        self.queue.close();

        if let Some(drain) = self.drain.take() {
            drain.join().map_err(|_| EncodeError::FinishFailed {
                reason: "writer thread panicked".to_string(),
            })?;
        }

        let child = self.child.take().ok_or_else(|| EncodeError::FinishFailed {
            reason: "writer already finished".to_string(),
        })?;

        let output = child
            .wait_with_output()
            .map_err(|e| EncodeError::FinishFailed {
                reason: format!("failed to wait for ffmpeg: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EncodeError::FinishFailed {
                reason: format!("ffmpeg exited with {}: {}", output.status, stderr.trim()),
            });
        }

        if let Some(reason) = self.queue.failure() {
            return Err(EncodeError::FinishFailed { reason });
        }

        debug!("ffmpeg writer closed: {:?}", self.output_path);
        Ok(self.output_path.clone())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        // Finish was not called; shut the pipeline down without waiting for
        // a clean container. The child dies first so a drain thread stuck on
        // a full pipe gets its write error and can exit.
        if let Some(child) = self.child.as_mut() {
            let _ = child.kill();
        }
        self.queue.fail("writer dropped before finish".to_string());
        self.queue.close();
        if let Some(drain) = self.drain.take() {
            let _ = drain.join();
        }
        if let Some(mut child) = self.child.take() {
            let _ = child.wait();
        }
    }
}

/// Recover the guard from a poisoned lock; queue state stays consistent
/// under panic because every mutation is a single push/pop/flag store
fn guard<T>(result: std::result::Result<T, std::sync::PoisonError<T>>) -> T {
    result.unwrap_or_else(|poisoned| poisoned.into_inner())
}
