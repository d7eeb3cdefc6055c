//! Serialized execution context for a capture session.
//!
//! [`SessionQueue`] owns a [`CaptureSession`] on a dedicated worker thread
//! fed by a FIFO command channel. Host calls and pipeline callbacks all
//! become commands on that channel, so every session mutation happens on
//! one thread in issue order: configuration brackets never interleave, and
//! resume/suspend/reconfigure cannot race each other. Commands issued
//! sequentially by one caller execute in issue order; no ordering is
//! guaranteed across independent callers beyond mutual exclusion.

use std::io;
use std::sync::mpsc;
use std::sync::Weak;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, trace};

use crate::capture::backend::{BackendError, CaptureBackend, MetadataSink};
use crate::capture::metadata::MetadataObject;
use crate::capture::orientation::InterfaceOrientation;
use crate::capture::position::CameraPosition;
use crate::capture::preview::PreviewSurface;
use crate::capture::session::{CaptureSession, SessionObserver, SessionSnapshot};
use crate::config::RestartPolicy;

enum Command {
    Initialize(InterfaceOrientation),
    ChangePosition(CameraPosition, InterfaceOrientation),
    ChangeOrientation(InterfaceOrientation),
    Resume,
    Suspend,
    Stop,
    Metadata(Vec<MetadataObject>),
    RuntimeError(BackendError),
    Restart,
    Snapshot(mpsc::Sender<SessionSnapshot>),
    Shutdown,
}

/// Marshals backend callbacks into the session's command channel.
struct PipelineSink {
    sender: mpsc::Sender<Command>,
}

impl MetadataSink for PipelineSink {
    fn metadata_received(&self, objects: Vec<MetadataObject>) {
        // A failed send means the worker is gone; the frame is simply lost.
        let _ = self.sender.send(Command::Metadata(objects));
    }

    fn runtime_error(&self, error: BackendError) {
        let _ = self.sender.send(Command::RuntimeError(error));
    }
}

/// Handle to a capture session running on its own worker thread.
///
/// All operations are asynchronous relative to the caller except
/// [`snapshot`](Self::snapshot), which round-trips through the worker and
/// therefore also acts as a completion barrier for previously issued
/// commands. Dropping the queue shuts the worker down after any queued
/// commands have drained.
pub struct SessionQueue {
    sender: mpsc::Sender<Command>,
    worker: Option<JoinHandle<()>>,
}

impl SessionQueue {
    /// Builds the session and starts its worker thread.
    ///
    /// The backend receives the session's pipeline sink before the worker
    /// starts, so no callback can be observed out of order with commands.
    pub fn spawn<B>(
        backend: B,
        preview: PreviewSurface,
        restart_policy: RestartPolicy,
        observer: Weak<dyn SessionObserver>,
    ) -> io::Result<Self>
    where
        B: CaptureBackend + 'static,
    {
        let (sender, receiver) = mpsc::channel();

        backend.install_sink(Box::new(PipelineSink {
            sender: sender.clone(),
        }));
        let mut session = CaptureSession::new(backend, preview, restart_policy);
        session.set_observer(observer);

        let restart_sender = sender.clone();
        let worker = thread::Builder::new()
            .name("capture-session".into())
            .spawn(move || worker_loop(session, receiver, restart_sender))?;

        Ok(Self {
            sender,
            worker: Some(worker),
        })
    }

    /// Queues session initialization with the given interface orientation.
    pub fn initialize(&self, orientation: InterfaceOrientation) {
        self.send(Command::Initialize(orientation));
    }

    /// Queues a camera position change.
    pub fn change_camera_position(
        &self,
        position: CameraPosition,
        orientation: InterfaceOrientation,
    ) {
        self.send(Command::ChangePosition(position, orientation));
    }

    /// Queues a preview orientation change.
    pub fn change_preview_orientation(&self, orientation: InterfaceOrientation) {
        self.send(Command::ChangeOrientation(orientation));
    }

    /// Queues a resume.
    pub fn resume(&self) {
        self.send(Command::Resume);
    }

    /// Queues a suspend.
    pub fn suspend(&self) {
        self.send(Command::Suspend);
    }

    /// Queues session teardown.
    pub fn stop(&self) {
        self.send(Command::Stop);
    }

    /// Fetches session state after all previously issued commands.
    ///
    /// Returns `None` if the worker has exited.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        let (reply, response) = mpsc::channel();
        self.sender.send(Command::Snapshot(reply)).ok()?;
        response.recv().ok()
    }

    fn send(&self, command: Command) {
        if self.sender.send(command).is_err() {
            debug!("session worker is gone; command dropped");
        }
    }
}

impl Drop for SessionQueue {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl std::fmt::Debug for SessionQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionQueue")
            .field("worker_alive", &self.worker.is_some())
            .finish()
    }
}

fn worker_loop<B: CaptureBackend>(
    mut session: CaptureSession<B>,
    receiver: mpsc::Receiver<Command>,
    restart_sender: mpsc::Sender<Command>,
) {
    while let Ok(command) = receiver.recv() {
        match command {
            Command::Initialize(orientation) => session.initialize(orientation),
            Command::ChangePosition(position, orientation) => {
                session.change_camera_position(position, orientation)
            }
            Command::ChangeOrientation(orientation) => {
                session.change_preview_orientation(orientation)
            }
            Command::Resume => session.resume(),
            Command::Suspend => session.suspend(),
            Command::Stop => session.stop(),
            Command::Metadata(objects) => session.handle_metadata(objects),
            Command::RuntimeError(error) => {
                if let Some(delay) = session.handle_runtime_error(error) {
                    schedule_restart(restart_sender.clone(), delay);
                }
            }
            Command::Restart => session.attempt_restart(),
            Command::Snapshot(reply) => {
                let _ = reply.send(session.snapshot());
            }
            Command::Shutdown => break,
        }
    }
    trace!("session worker exiting");
}

/// Fires one restart command after `delay`.
///
/// The timer holds only a channel sender; if the queue is gone by the time
/// it fires, the send fails and the restart is abandoned.
fn schedule_restart(sender: mpsc::Sender<Command>, delay: Duration) {
    let spawned = thread::Builder::new()
        .name("capture-restart".into())
        .spawn(move || {
            thread::sleep(delay);
            let _ = sender.send(Command::Restart);
        });
    if let Err(spawn_error) = spawned {
        error!(error = %spawn_error, "failed to schedule session restart");
    }
}
