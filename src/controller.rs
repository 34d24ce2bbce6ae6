//! Worker lifecycle.
//!
//! The controller owns the message buffer and at most one worker run.
//! `start`, `kill` and `status` are safe to call repeatedly in any state.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::buffer::{BufferError, MessageBuffer};
use crate::config::Config;
use crate::error_log::ErrorLog;
use crate::render::Facilities;
use crate::shutdown::StopSignal;
use crate::transport::Connector;
use crate::worker::{Worker, WorkerError, WorkerSettings};

/// Exit code reported for a run that failed on a render or transport error.
pub const FAILURE_EXIT_CODE: i32 = 1;
/// Exit code reported for a run whose task died without reporting.
pub const PANIC_EXIT_CODE: i32 = 101;

/// Why a run ended on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitReason {
    pub code: i32,
    pub message: String,
}

impl ExitReason {
    fn failed(err: &WorkerError) -> Self {
        Self {
            code: FAILURE_EXIT_CODE,
            message: err.to_string(),
        }
    }

    fn panicked() -> Self {
        Self {
            code: PANIC_EXIT_CODE,
            message: "worker task ended unexpectedly".to_string(),
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code {}: {}", self.code, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerStatus {
    Idle,
    Running,
    Terminated(ExitReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillOutcome {
    Stopped,
    NotRunning,
}

type FacilitiesFactory = Arc<dyn Fn() -> Facilities + Send + Sync>;

pub struct Controller {
    buffer: MessageBuffer,
    connector: Arc<dyn Connector>,
    settings: WorkerSettings,
    stop_timeout: Duration,
    error_log: Arc<ErrorLog>,
    facilities: FacilitiesFactory,
    handle: Mutex<WorkerHandle>,
}

enum WorkerHandle {
    Idle,
    Active(ActiveRun),
}

struct ActiveRun {
    stop: StopSignal,
    task: JoinHandle<()>,
    outcome: Arc<Mutex<Option<ExitReason>>>,
}

impl ActiveRun {
    fn status(&self) -> WorkerStatus {
        if let Some(reason) = self.outcome.lock().clone() {
            return WorkerStatus::Terminated(reason);
        }
        if self.task.is_finished() {
            // Clean exits only follow a kill, which resets the handle first.
            return WorkerStatus::Terminated(ExitReason::panicked());
        }
        WorkerStatus::Running
    }
}

impl Controller {
    pub fn new(
        buffer: MessageBuffer,
        connector: Arc<dyn Connector>,
        settings: WorkerSettings,
        stop_timeout: Duration,
        error_log: ErrorLog,
    ) -> Self {
        Self {
            buffer,
            connector,
            settings,
            stop_timeout,
            error_log: Arc::new(error_log),
            facilities: Arc::new(Facilities::system),
            handle: Mutex::new(WorkerHandle::Idle),
        }
    }

    /// Build a controller and its buffer from configuration.
    pub fn from_config(config: &Config, connector: Arc<dyn Connector>) -> Result<Self, BufferError> {
        let buffer = MessageBuffer::new(config.broadcast.placeholder.as_bytes())?;
        let settings = WorkerSettings {
            interval: config.broadcast.interval(),
            open: config.destination.open,
        };
        Ok(Self::new(
            buffer,
            connector,
            settings,
            config.broadcast.stop_timeout(),
            ErrorLog::new(config.logging.error_log.clone()),
        ))
    }

    /// Replace the source of randomness and time handed to each new run.
    pub fn with_facilities(
        mut self,
        factory: impl Fn() -> Facilities + Send + Sync + 'static,
    ) -> Self {
        self.facilities = Arc::new(factory);
        self
    }

    pub fn buffer(&self) -> &MessageBuffer {
        &self.buffer
    }

    /// Spawn a fresh worker unless one is already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> StartOutcome {
        let mut handle = self.handle.lock();
        if let WorkerHandle::Active(run) = &*handle {
            if run.status() == WorkerStatus::Running {
                return StartOutcome::AlreadyRunning;
            }
        }

        let stop = StopSignal::new();
        let outcome = Arc::new(Mutex::new(None));
        let task = tokio::spawn(run_worker(
            self.buffer.clone(),
            Arc::clone(&self.connector),
            (self.facilities)(),
            self.settings,
            stop.clone(),
            Arc::clone(&self.error_log),
            Arc::clone(&outcome),
        ));

        *handle = WorkerHandle::Active(ActiveRun {
            stop,
            task,
            outcome,
        });
        tracing::info!(interval_ms = self.settings.interval.as_millis() as u64, "Worker started");
        StartOutcome::Started
    }

    /// Stop the running worker and wait for it to finish.
    ///
    /// Returns once no further sends can happen. A run that already
    /// terminated on its own is left as is so its reason stays visible.
    pub async fn kill(&self) -> KillOutcome {
        let run = {
            let mut handle = self.handle.lock();
            match &*handle {
                WorkerHandle::Active(run) if run.status() == WorkerStatus::Running => {}
                _ => return KillOutcome::NotRunning,
            }
            match std::mem::replace(&mut *handle, WorkerHandle::Idle) {
                WorkerHandle::Active(run) => run,
                WorkerHandle::Idle => return KillOutcome::NotRunning,
            }
        };

        run.stop.signal();
        let mut task = run.task;
        if tokio::time::timeout(self.stop_timeout, &mut task).await.is_err() {
            tracing::warn!(
                timeout_ms = self.stop_timeout.as_millis() as u64,
                "Worker did not stop in time, aborting"
            );
            task.abort();
            let _ = task.await;
        }

        tracing::info!("Worker terminated");
        KillOutcome::Stopped
    }

    /// Current state, without changing it.
    pub fn status(&self) -> WorkerStatus {
        match &*self.handle.lock() {
            WorkerHandle::Idle => WorkerStatus::Idle,
            WorkerHandle::Active(run) => run.status(),
        }
    }
}

async fn run_worker(
    buffer: MessageBuffer,
    connector: Arc<dyn Connector>,
    facilities: Facilities,
    settings: WorkerSettings,
    stop: StopSignal,
    error_log: Arc<ErrorLog>,
    outcome: Arc<Mutex<Option<ExitReason>>>,
) {
    let result = match connector.connect().await {
        Ok(transport) => {
            Worker::new(buffer, transport, facilities, settings, stop)
                .run()
                .await
        }
        Err(err) => Err(WorkerError::from(err)),
    };

    if let Err(err) = result {
        tracing::error!(error = %err, "Worker run failed");
        error_log.record(&err.to_string());
        *outcome.lock() = Some(ExitReason::failed(&err));
    }
}
