//! Retrain orchestrator: background jobs that fit, evaluate and promote models
//!
//! At most one job is non-terminal at a time. Forecasts keep using the active
//! model until a candidate is promoted, which swaps the scorer and the sales
//! history snapshot together.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::{DashMap, DashSet};
use shared::{
    AccuracyAggregate, RetrainEvaluation, RetrainJob, RetrainState, RetrainTrigger,
};
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::history::{read_sales_upload, HistoryHandle, SalesHistory};
use crate::services::model_store::ModelStore;
use crate::services::scorer::{LinearModel, ScorerAdapter};
use crate::services::trainer::{evaluate, RidgeTrainer, TrainingSet};

/// Settled jobs kept for polling; older ones are dropped
pub const MAX_SETTLED_JOBS: usize = 50;

#[derive(Debug, Clone)]
pub struct RetrainSettings {
    pub holdout_days: u32,
    pub ridge_lambda: f64,
    /// Artifact path the active model is served from
    pub active_model_path: PathBuf,
    /// Data used for retrains triggered by degraded accuracy
    pub auto_data_path: Option<PathBuf>,
}

struct Inner {
    jobs: DashMap<Uuid, RetrainJob>,
    /// Jobs whose background task has not returned yet
    in_flight: DashSet<Uuid>,
    /// Bumped each time a background task returns
    settled: watch::Sender<u64>,
    /// The job currently holding the single-flight slot
    current: Mutex<Option<Uuid>>,
    latest: Mutex<Option<Uuid>>,
    scorer: Arc<ScorerAdapter>,
    store: ModelStore,
    history: Arc<HistoryHandle>,
    settings: RetrainSettings,
}

/// Output of the training phase, carried into evaluation
struct TrainedCandidate {
    model: LinearModel,
    path: PathBuf,
    combined: SalesHistory,
    holdout: TrainingSet,
    training_rows: usize,
}

#[derive(Clone)]
pub struct RetrainOrchestrator {
    inner: Arc<Inner>,
}

impl RetrainOrchestrator {
    pub fn new(
        scorer: Arc<ScorerAdapter>,
        store: ModelStore,
        history: Arc<HistoryHandle>,
        settings: RetrainSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                jobs: DashMap::new(),
                in_flight: DashSet::new(),
                settled: watch::channel(0).0,
                current: Mutex::new(None),
                latest: Mutex::new(None),
                scorer,
                store,
                history,
                settings,
            }),
        }
    }

    /// Start a retrain job against the sales CSV at `data_reference`.
    ///
    /// Returns the job as created; it runs on the tokio runtime and is polled
    /// with [`RetrainOrchestrator::job`].
    pub fn trigger(&self, data_reference: &str, trigger: RetrainTrigger) -> AppResult<RetrainJob> {
        let path = PathBuf::from(data_reference);
        if !path.is_file() {
            return Err(AppError::DataNotFound(data_reference.to_string()));
        }

        let job = {
            let mut current = self.inner.current.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(id) = *current {
                let busy = self.inner.jobs.get(&id).map(|j| j.is_active()).unwrap_or(false);
                if busy {
                    return Err(AppError::RetrainInProgress(id));
                }
            }
            let job = RetrainJob::new(data_reference, trigger);
            self.inner.jobs.insert(job.id, job.clone());
            *current = Some(job.id);
            job
        };
        *self.inner.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(job.id);

        tracing::info!(
            "Retrain job {} queued ({:?}) with data {}",
            job.id,
            trigger,
            data_reference
        );
        let inner = Arc::clone(&self.inner);
        let id = job.id;
        inner.in_flight.insert(id);
        tokio::spawn(async move {
            run(Arc::clone(&inner), id, path).await;
            {
                let mut current = inner.current.lock().unwrap_or_else(PoisonError::into_inner);
                if *current == Some(id) {
                    *current = None;
                }
            }
            inner.in_flight.remove(&id);
            prune_settled(&inner);
            inner.settled.send_modify(|n| *n = n.wrapping_add(1));
        });
        Ok(job)
    }

    /// Start a retrain when the aggregate says accuracy has degraded.
    ///
    /// Missing the target without degrading never retrains.
    pub fn auto_retrain(&self, aggregate: &AccuracyAggregate) -> Option<RetrainJob> {
        if !aggregate.should_retrain() {
            return None;
        }
        let Some(path) = self.inner.settings.auto_data_path.as_deref() else {
            tracing::warn!("Accuracy degraded but no automatic retrain data is configured");
            return None;
        };
        match self.trigger(&path.display().to_string(), RetrainTrigger::AccuracyDegraded) {
            Ok(job) => Some(job),
            Err(AppError::RetrainInProgress(id)) => {
                tracing::debug!("Accuracy degraded; retrain {} already running", id);
                None
            }
            Err(err) => {
                tracing::error!("Automatic retrain could not start: {}", err);
                None
            }
        }
    }

    pub fn job(&self, id: Uuid) -> AppResult<RetrainJob> {
        self.inner
            .jobs
            .get(&id)
            .map(|j| j.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("Retrain job {}", id)))
    }

    pub fn latest(&self) -> Option<RetrainJob> {
        let id = (*self.inner.latest.lock().unwrap_or_else(PoisonError::into_inner))?;
        self.job(id).ok()
    }

    /// Abandon a job that has not reached evaluation yet.
    ///
    /// The job ends `Failed` with reason "abandoned"; the active model is untouched.
    pub fn abandon(&self, id: Uuid) -> AppResult<RetrainJob> {
        let mut job = self
            .inner
            .jobs
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Retrain job {}", id)))?;
        if !job.state.is_abandonable() {
            return Err(AppError::Validation {
                field: "job_id".to_string(),
                message: format!("Job is {} and can no longer be abandoned", job.state),
            });
        }
        job.fail("abandoned")
            .map_err(|e| AppError::InternalInvariant(e.to_string()))?;
        tracing::info!("Retrain job {} abandoned", id);
        Ok(job.value().clone())
    }

    /// Wait for a job's background task to finish and return its final state
    pub async fn wait(&self, id: Uuid) -> AppResult<RetrainJob> {
        let mut settled = self.inner.settled.subscribe();
        while self.inner.in_flight.contains(&id) {
            settled
                .changed()
                .await
                .map_err(|e| AppError::Internal(format!("retrain tasks stopped: {}", e)))?;
        }
        self.job(id)
    }

    /// Number of jobs still held for polling
    pub fn tracked_jobs(&self) -> usize {
        self.inner.jobs.len()
    }
}

/// Apply a state change unless the job was abandoned in the meantime
fn advance(inner: &Inner, id: Uuid, next: RetrainState) -> bool {
    let Some(mut job) = inner.jobs.get_mut(&id) else {
        return false;
    };
    match job.advance(next) {
        Ok(()) => {
            tracing::info!("Retrain job {} is {}", id, next);
            true
        }
        Err(err) => {
            tracing::info!("Retrain job {} stopped: {}", id, err);
            false
        }
    }
}

/// Drop the oldest settled jobs beyond [`MAX_SETTLED_JOBS`], never the latest one
fn prune_settled(inner: &Inner) {
    let latest = *inner.latest.lock().unwrap_or_else(PoisonError::into_inner);
    let mut settled: Vec<_> = inner
        .jobs
        .iter()
        .filter(|job| {
            job.state.is_terminal() && Some(job.id) != latest && !inner.in_flight.contains(&job.id)
        })
        .map(|job| (job.created_at, job.id))
        .collect();
    if settled.len() <= MAX_SETTLED_JOBS {
        return;
    }
    settled.sort();
    let excess = settled.len() - MAX_SETTLED_JOBS;
    for (_, id) in settled.into_iter().take(excess) {
        inner.jobs.remove(&id);
    }
    tracing::debug!("Pruned {} settled retrain jobs", excess);
}

fn fail(inner: &Inner, id: Uuid, reason: String) {
    tracing::error!("Retrain job {} failed: {}", id, reason);
    if let Some(mut job) = inner.jobs.get_mut(&id) {
        if let Err(err) = job.fail(reason) {
            tracing::debug!("Retrain job {} already settled: {}", id, err);
        }
    }
}

async fn run(inner: Arc<Inner>, id: Uuid, data_path: PathBuf) {
    if !advance(&inner, id, RetrainState::Running) {
        return;
    }

    let outcome = {
        let inner = Arc::clone(&inner);
        tokio::task::spawn_blocking(move || train_and_decide(&inner, id, &data_path)).await
    };
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(err)) => fail(&inner, id, err.to_string()),
        Err(err) => fail(&inner, id, format!("retrain task panicked: {}", err)),
    }
}

/// Training, evaluation and artifact writes, all on the blocking pool
fn train_and_decide(inner: &Inner, id: Uuid, data_path: &Path) -> AppResult<()> {
    let candidate = train(inner, id, data_path)?;
    if let Some(mut job) = inner.jobs.get_mut(&id) {
        job.candidate_model = Some(candidate.path.display().to_string());
    }
    if !advance(inner, id, RetrainState::Evaluating) {
        return Ok(());
    }
    evaluate_and_decide(inner, id, candidate)
}

/// Validate the upload, merge it into history and fit a candidate
fn train(inner: &Inner, id: Uuid, data_path: &Path) -> AppResult<TrainedCandidate> {
    let (rows, report) = read_sales_upload(data_path)?;
    if !report.valid {
        return Err(AppError::Validation {
            field: "data_reference".to_string(),
            message: report.errors.join("; "),
        });
    }
    for warning in &report.warnings {
        tracing::warn!("Retrain data {}: {}", data_path.display(), warning);
    }

    let combined = inner.history.snapshot().merged(&rows);
    let (train_set, holdout) =
        TrainingSet::from_history(&combined).split_holdout(inner.settings.holdout_days);
    if train_set.is_empty() || holdout.is_empty() {
        return Err(AppError::Validation {
            field: "data_reference".to_string(),
            message: format!(
                "not enough history to train and hold out {} days",
                inner.settings.holdout_days
            ),
        });
    }

    let model = RidgeTrainer::new(inner.settings.ridge_lambda).fit(&train_set)?;
    let path = inner.store.candidate_path(id);
    inner.store.save(&path, &model)?;
    tracing::info!(
        "Retrain job {} fitted a candidate on {} rows",
        id,
        train_set.len()
    );

    Ok(TrainedCandidate {
        model,
        path,
        combined,
        holdout,
        training_rows: train_set.len(),
    })
}

fn evaluate_and_decide(inner: &Inner, id: Uuid, candidate: TrainedCandidate) -> AppResult<()> {
    let candidate_metrics = evaluate(&candidate.model, &candidate.holdout)?;
    let active_metrics = match inner.scorer.active_scorer() {
        Some(active) => match evaluate(active.as_ref(), &candidate.holdout) {
            Ok(metrics) => Some(metrics),
            Err(err) => {
                tracing::warn!("Active model could not be evaluated: {}", err);
                None
            }
        },
        None => None,
    };
    let evaluation = RetrainEvaluation {
        candidate: candidate_metrics,
        active: active_metrics,
        holdout_rows: candidate.holdout.len(),
        training_rows: candidate.training_rows,
    };
    let promote = evaluation.candidate_wins();
    tracing::info!(
        "Retrain job {}: candidate MAPE {:.2}% vs active {}",
        id,
        evaluation.candidate.mape,
        evaluation
            .active
            .map(|m| format!("{:.2}%", m.mape))
            .unwrap_or_else(|| "none".to_string())
    );
    if let Some(mut job) = inner.jobs.get_mut(&id) {
        job.evaluation = Some(evaluation);
    }

    if !promote {
        advance(inner, id, RetrainState::RolledBack);
        return Ok(());
    }

    let active_path = &inner.settings.active_model_path;
    let archived = inner.store.promote(&candidate.path, active_path)?;
    inner
        .scorer
        .reload(&inner.store, active_path)
        .map_err(AppError::from)?;
    inner.history.replace(candidate.combined);

    if let Some(mut job) = inner.jobs.get_mut(&id) {
        job.archived_model = archived.map(|p| p.display().to_string());
    }
    advance(inner, id, RetrainState::Promoted);
    Ok(())
}
