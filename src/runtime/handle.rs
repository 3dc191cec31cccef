use std::{collections::VecDeque, path::PathBuf, sync::Arc};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{
    sync::{Mutex, broadcast, mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    adif::DecoderOptions,
    error::Error,
    import::{CancelToken, ImportTally, Importer},
    normalize::{LogDefaults, NormalizerOptions},
    persist::QsoStore,
    types::LogId,
};

use super::events::JobEvent;

/// Identifier assigned to a submitted job.
pub type JobId = u64;

/// Store shared between the caller and the job worker.
pub type SharedStore = Arc<Mutex<Box<dyn QsoStore>>>;

/// Wraps `store` for use with [`spawn_importer`].
pub fn shared_store(store: impl QsoStore + 'static) -> SharedStore {
    Arc::new(Mutex::new(Box::new(store)))
}

/// Failures of the job runner itself, as opposed to a job's outcome.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The runner has shut down.
    #[error("runtime channel closed")]
    ChannelClosed,
    /// `job_queue_bound` jobs are already waiting.
    #[error("job queue is full")]
    QueueFull,
    /// No such job, or its status has been evicted.
    #[error("unknown job {0}")]
    UnknownJob(JobId),
    /// An import error surfaced outside a job.
    #[error(transparent)]
    Import(#[from] Error),
}

/// Job runner limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Jobs that may wait behind the running one.
    pub job_queue_bound: usize,
    /// Buffered events per subscriber before it lags.
    pub event_capacity: usize,
    /// Finished jobs whose status stays queryable; older ones are evicted.
    pub finished_retention: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            job_queue_bound: 64,
            event_capacity: 256,
            finished_retention: 1024,
        }
    }
}

/// Lifecycle of an import job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum JobStatus {
    /// Queued behind other jobs.
    Pending,
    /// Importing.
    Started,
    /// Ran to the end of its file.
    Success(ImportTally),
    /// Stopped by an I/O or store error.
    Failure(String),
    /// Stopped on request; the tally covers records processed before the stop.
    Cancelled(ImportTally),
}

impl JobStatus {
    /// True once the job can no longer change.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Started)
    }
}

/// One file to import into one log.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    /// File to read.
    pub path: PathBuf,
    /// Log receiving the records.
    pub log_id: LogId,
    /// Per-log fallbacks.
    pub defaults: LogDefaults,
    /// Decoder tuning.
    pub decoder: DecoderOptions,
    /// Normalizer tuning.
    pub normalizer: NormalizerOptions,
}

impl ImportRequest {
    /// Request with default decoder and normalizer options.
    pub fn new(path: impl Into<PathBuf>, log_id: LogId, defaults: LogDefaults) -> Self {
        Self {
            path: path.into(),
            log_id,
            defaults,
            decoder: DecoderOptions::default(),
            normalizer: NormalizerOptions::default(),
        }
    }
}

/// Cloneable handle to a running job runner.
pub struct ImporterHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<JobEvent>,
}

impl Clone for ImporterHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Command {
    Submit {
        request: ImportRequest,
        resp: oneshot::Sender<Result<JobId, RuntimeError>>,
    },
    Status {
        job: JobId,
        resp: oneshot::Sender<Option<JobStatus>>,
    },
    Wait {
        job: JobId,
        resp: oneshot::Sender<Option<JobStatus>>,
    },
    Cancel {
        job: JobId,
        resp: oneshot::Sender<Option<JobStatus>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

struct Job {
    id: JobId,
    request: ImportRequest,
    cancel: CancelToken,
}

struct Progress {
    job: JobId,
    status: JobStatus,
}

struct JobEntry {
    status: JobStatus,
    cancel: CancelToken,
    waiters: Vec<oneshot::Sender<Option<JobStatus>>>,
}

struct JobTable {
    jobs: HashMap<JobId, JobEntry>,
    /// Terminal jobs, oldest first.
    finished: VecDeque<JobId>,
    finished_retention: usize,
    next_job_id: JobId,
    events_tx: broadcast::Sender<JobEvent>,
}

impl JobTable {
    fn apply(&mut self, progress: Progress) {
        let Some(entry) = self.jobs.get_mut(&progress.job) else {
            return;
        };
        entry.status = progress.status.clone();

        let event = if progress.status.is_terminal() {
            for waiter in entry.waiters.drain(..) {
                let _ = waiter.send(Some(progress.status.clone()));
            }
            self.retire(progress.job);
            JobEvent::Finished {
                job: progress.job,
                status: progress.status,
            }
        } else {
            JobEvent::Started { job: progress.job }
        };
        let _ = self.events_tx.send(event);
    }

    fn retire(&mut self, job: JobId) {
        self.finished.push_back(job);
        while self.finished.len() > self.finished_retention {
            if let Some(oldest) = self.finished.pop_front() {
                self.jobs.remove(&oldest);
                debug!(job = oldest, "finished job evicted");
            }
        }
    }
}

/// Spawns the job runner. Jobs run one at a time in submission order; the
/// store lock is taken only while a job is importing.
pub fn spawn_importer(store: SharedStore, config: RuntimeConfig) -> ImporterHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(256);
    let (events_tx, _) = broadcast::channel::<JobEvent>(config.event_capacity.max(1));
    let (job_tx, job_rx) = mpsc::channel::<Job>(config.job_queue_bound.max(1));
    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<Progress>();

    let worker = spawn_worker(store, job_rx, progress_tx);
    let mut table = JobTable {
        jobs: HashMap::new(),
        finished: VecDeque::new(),
        finished_retention: config.finished_retention,
        next_job_id: 1,
        events_tx: events_tx.clone(),
    };

    tokio::spawn(async move {
        let mut job_tx = Some(job_tx);
        let mut worker = Some(worker);

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    let Some(cmd) = cmd else { break; };
                    match cmd {
                        Command::Shutdown { resp } => {
                            drain_on_shutdown(&mut table, job_tx.take(), worker.take(), &mut progress_rx).await;
                            let _ = resp.send(());
                            break;
                        }
                        cmd => handle_command(cmd, &mut table, job_tx.as_ref()),
                    }
                }
                progress = progress_rx.recv() => {
                    if let Some(progress) = progress {
                        table.apply(progress);
                    }
                }
            }
        }
    });

    ImporterHandle { cmd_tx, events_tx }
}

impl ImporterHandle {
    /// Receives every job event published after the call.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events_tx.subscribe()
    }

    /// Queues `request`; returns its job id immediately.
    pub async fn submit(&self, request: ImportRequest) -> Result<JobId, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Submit { request, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Current status of `job`.
    pub async fn status(&self, job: JobId) -> Result<JobStatus, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Status { job, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await
            .map_err(|_| RuntimeError::ChannelClosed)?
            .ok_or(RuntimeError::UnknownJob(job))
    }

    /// Resolves once `job` reaches a terminal status.
    pub async fn wait(&self, job: JobId) -> Result<JobStatus, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Wait { job, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await
            .map_err(|_| RuntimeError::ChannelClosed)?
            .ok_or(RuntimeError::UnknownJob(job))
    }

    /// Requests cancellation and returns the status at the time of the
    /// request. A queued job finishes as cancelled without reading its file;
    /// a running job stops before its next record.
    pub async fn cancel(&self, job: JobId) -> Result<JobStatus, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Cancel { job, resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await
            .map_err(|_| RuntimeError::ChannelClosed)?
            .ok_or(RuntimeError::UnknownJob(job))
    }

    /// Cancels queued jobs, lets the running job finish, and stops the runner.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

fn handle_command(cmd: Command, table: &mut JobTable, job_tx: Option<&mpsc::Sender<Job>>) {
    match cmd {
        Command::Submit { request, resp } => {
            let Some(job_tx) = job_tx else {
                let _ = resp.send(Err(RuntimeError::ChannelClosed));
                return;
            };

            let id = table.next_job_id;
            let log_id = request.log_id;
            let cancel = CancelToken::new();
            let job = Job {
                id,
                request,
                cancel: cancel.clone(),
            };

            let res = match job_tx.try_send(job) {
                Ok(()) => {
                    table.next_job_id += 1;
                    table.jobs.insert(
                        id,
                        JobEntry {
                            status: JobStatus::Pending,
                            cancel,
                            waiters: Vec::new(),
                        },
                    );
                    debug!(job = id, log_id, "import job queued");
                    let _ = table.events_tx.send(JobEvent::Queued { job: id, log_id });
                    Ok(id)
                }
                Err(mpsc::error::TrySendError::Full(_)) => Err(RuntimeError::QueueFull),
                Err(mpsc::error::TrySendError::Closed(_)) => Err(RuntimeError::ChannelClosed),
            };
            let _ = resp.send(res);
        }
        Command::Status { job, resp } => {
            let _ = resp.send(table.jobs.get(&job).map(|e| e.status.clone()));
        }
        Command::Wait { job, resp } => match table.jobs.get_mut(&job) {
            Some(entry) if entry.status.is_terminal() => {
                let _ = resp.send(Some(entry.status.clone()));
            }
            Some(entry) => entry.waiters.push(resp),
            None => {
                let _ = resp.send(None);
            }
        },
        Command::Cancel { job, resp } => {
            let status = table.jobs.get(&job).map(|entry| {
                entry.cancel.cancel();
                entry.status.clone()
            });
            let _ = resp.send(status);
        }
        Command::Shutdown { resp } => {
            let _ = resp.send(());
        }
    }
}

async fn drain_on_shutdown(
    table: &mut JobTable,
    job_tx: Option<mpsc::Sender<Job>>,
    worker: Option<JoinHandle<()>>,
    progress_rx: &mut mpsc::UnboundedReceiver<Progress>,
) {
    for entry in table.jobs.values() {
        if entry.status == JobStatus::Pending {
            entry.cancel.cancel();
        }
    }
    drop(job_tx);

    if let Some(worker) = worker {
        if let Err(err) = worker.await {
            warn!(error = %err, "import worker ended abnormally");
        }
    }
    while let Ok(progress) = progress_rx.try_recv() {
        table.apply(progress);
    }
}

fn spawn_worker(
    store: SharedStore,
    mut rx: mpsc::Receiver<Job>,
    progress_tx: mpsc::UnboundedSender<Progress>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            let id = job.id;
            if job.cancel.is_cancelled() {
                let _ = progress_tx.send(Progress {
                    job: id,
                    status: JobStatus::Cancelled(ImportTally::default()),
                });
                continue;
            }

            let _ = progress_tx.send(Progress {
                job: id,
                status: JobStatus::Started,
            });
            info!(job = id, path = %job.request.path.display(), "import job started");

            let status = run_job(Arc::clone(&store), job).await;
            if let JobStatus::Failure(reason) = &status {
                warn!(job = id, %reason, "import job failed");
            }
            let _ = progress_tx.send(Progress { job: id, status });
        }
    })
}

async fn run_job(store: SharedStore, job: Job) -> JobStatus {
    let Job {
        request, cancel, ..
    } = job;

    let outcome = tokio::task::spawn_blocking(move || {
        let importer = Importer::with_options(request.defaults, request.decoder, request.normalizer)
            .with_cancel_token(cancel);
        let mut store = store.blocking_lock();
        importer.import_file(&request.path, &mut *store, request.log_id)
    })
    .await;

    match outcome {
        Ok(Ok(report)) if report.cancelled => JobStatus::Cancelled(report.tally),
        Ok(Ok(report)) => JobStatus::Success(report.tally),
        Ok(Err(err)) => JobStatus::Failure(err.to_string()),
        Err(err) => JobStatus::Failure(format!("join error: {err}")),
    }
}
