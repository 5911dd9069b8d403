//! Background execution of extraction jobs
//!
//! Each submitted job gets its own thread. The thread computes the result
//! and sends it back over a single-slot channel; it never touches caller
//! state. The caller keeps an [`ExtractionHandle`] and either polls it
//! between other work or blocks on it.
//!
//! ```text
//! foreground ── submit(job) ──► worker thread: job.run()
//!     │                                 │
//!     └── try_result() / wait() ◄── channel (capacity 1)
//! ```
//!
//! There is no timeout and no cancellation: a handle that is dropped simply
//! lets its worker finish and discard the result.

use crate::error::{RegextError, Result};
use crate::extraction::{ExtractionJob, ExtractionResult};
use crate::message::Message;
use crossbeam_channel::{bounded, Receiver, RecvError, TryRecvError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use tracing::debug;

static NEXT_WORKER_ID: AtomicUsize = AtomicUsize::new(1);

/// Kept short so the OS name (15 bytes on Linux) still carries the id
const THREAD_NAME_PREFIX: &str = "rx-extract-";

fn worker_thread_name(id: usize) -> String {
    format!("{}{}", THREAD_NAME_PREFIX, id)
}

/// Run `job` on a new background thread
pub fn submit<M>(job: ExtractionJob<M>) -> Result<ExtractionHandle>
where
    M: Message + Send + Sync + 'static,
{
    let id = NEXT_WORKER_ID.fetch_add(1, Ordering::Relaxed);
    let pattern_name = job.pattern_name().to_string();
    let (result_tx, result_rx) = bounded::<ExtractionResult>(1);

    let thread_name = worker_thread_name(id);
    let join = thread::Builder::new()
        .name(thread_name.clone())
        .spawn(move || {
            set_thread_name(&thread_name);
            debug!(worker = id, messages = job.message_count(), "extraction started");
            let result = job.run();
            // Receiver may already be gone; nothing to do then
            let _ = result_tx.send(result);
        })
        .map_err(|err| RegextError::Worker(format!("failed to start worker: {}", err)))?;

    Ok(ExtractionHandle {
        id,
        pattern_name,
        receiver: result_rx,
        join: Some(join),
    })
}

/// Pending result of a submitted extraction
#[derive(Debug)]
pub struct ExtractionHandle {
    id: usize,
    pattern_name: String,
    receiver: Receiver<ExtractionResult>,
    join: Option<JoinHandle<()>>,
}

impl ExtractionHandle {
    /// Process-unique worker number
    pub fn id(&self) -> usize {
        self.id
    }

    /// Pattern the job was submitted with
    pub fn pattern_name(&self) -> &str {
        &self.pattern_name
    }

    /// Non-blocking poll
    ///
    /// `None` while the worker is still running. Once this returns `Some`
    /// the handle is spent and later calls report a worker error.
    pub fn try_result(&mut self) -> Option<Result<ExtractionResult>> {
        match self.receiver.try_recv() {
            Ok(result) => {
                self.reap();
                Some(Ok(result))
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(self.lost())),
        }
    }

    /// Block until the worker delivers its result
    pub fn wait(mut self) -> Result<ExtractionResult> {
        match self.receiver.recv() {
            Ok(result) => {
                self.reap();
                Ok(result)
            }
            Err(RecvError) => Err(self.lost()),
        }
    }

    fn reap(&mut self) {
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }

    fn lost(&mut self) -> RegextError {
        let reason = match self.join.take().map(JoinHandle::join) {
            Some(Err(payload)) => {
                if let Some(msg) = payload.downcast_ref::<&str>() {
                    format!("worker panicked: {}", msg)
                } else if let Some(msg) = payload.downcast_ref::<String>() {
                    format!("worker panicked: {}", msg)
                } else {
                    "worker panicked".to_string()
                }
            }
            _ => "worker exited without a result".to_string(),
        };
        RegextError::Worker(reason)
    }
}

/// Set thread name for debugging/profiling (cross-platform)
#[cfg(target_os = "macos")]
fn set_thread_name(name: &str) {
    use std::ffi::CString;
    if let Ok(cname) = CString::new(name) {
        unsafe {
            libc::pthread_setname_np(cname.as_ptr());
        }
    }
}

#[cfg(target_os = "linux")]
fn set_thread_name(name: &str) {
    use std::ffi::CString;
    // Linux limits names to 15 bytes plus NUL
    let truncated = &name.as_bytes()[..name.len().min(15)];
    if let Ok(cname) = CString::new(truncated) {
        unsafe {
            libc::pthread_setname_np(libc::pthread_self(), cname.as_ptr());
        }
    }
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
fn set_thread_name(_name: &str) {
    // No-op on other platforms
}
