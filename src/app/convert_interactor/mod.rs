// Convert interactor - Trims a clip and drives encode attempts until it fits the budget

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::app::job_registry::JobRegistry;
use crate::app::output_slot::OutputSlot;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;
use crate::utils::time::TimeParser;

/// Result of a suspension point
///
/// `Stale` means a newer job took over while we were waiting; callers abort
/// silently and never treat it as an error.
#[derive(Debug)]
pub enum Checkpoint<T> {
    Proceed(T),
    Stale,
    Failed(DomainError),
}

/// One encode attempt and what it produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub video_bitrate_bps: u64,
    pub size_bytes: u64,
}

/// Summary of a job that reached `Done`
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub job_id: JobId,
    pub handle: ArtifactHandle,
    pub size_bytes: u64,
    pub window: TrimWindow,
    pub analysis: AnalysisResult,
    pub final_plan: EncodePlan,
    pub attempts: Vec<AttemptRecord>,
}

/// How a job ended, from the caller's point of view
#[derive(Debug)]
pub enum JobOutcome {
    Completed(ConversionReport),
    Failed(DomainError),
    /// A newer job started; nothing was reported for this one
    Superseded,
}

/// Controller for trim+compress jobs
///
/// Any number of `start_conversion` futures may be in flight, but only the
/// most recently started one can change the status or the output slot.
pub struct ConvertInteractor {
    analyzer: Arc<dyn MediaAnalyzer>,
    engine: Arc<dyn TranscodeEngine>,
    settings: ConversionSettings,
    parser: TimeParser,
    jobs: JobRegistry,
    output: Mutex<OutputSlot>,
    status: watch::Sender<ConversionStatus>,
}

impl ConvertInteractor {
    /// Create new convert interactor with injected ports
    pub fn new(
        analyzer: Arc<dyn MediaAnalyzer>,
        engine: Arc<dyn TranscodeEngine>,
        settings: ConversionSettings,
    ) -> Self {
        let (status, _) = watch::channel(ConversionStatus::Idle);
        Self {
            analyzer,
            engine,
            settings,
            parser: TimeParser::new(),
            jobs: JobRegistry::new(),
            output: Mutex::new(OutputSlot::new()),
            status,
        }
    }

    /// Use a different time parser (e.g. strict mode)
    pub fn with_time_parser(mut self, parser: TimeParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn settings(&self) -> &ConversionSettings {
        &self.settings
    }

    /// Subscribe to the status stream
    pub fn subscribe(&self) -> watch::Receiver<ConversionStatus> {
        self.status.subscribe()
    }

    /// Latest status
    pub fn status(&self) -> ConversionStatus {
        self.status.borrow().clone()
    }

    /// Handle to the live artifact, if one is held
    pub fn current_handle(&self) -> Option<ArtifactHandle> {
        self.lock_output().handle()
    }

    /// Artifacts released so far by this controller
    pub fn released_artifacts(&self) -> u64 {
        self.lock_output().released_count()
    }

    /// Start a job, superseding any job still running
    pub async fn start_conversion(
        &self,
        source: SourceHandle,
        start_text: &str,
        end_text: &str,
    ) -> JobOutcome {
        let mut job = self.begin_job(source);
        info!(job_id = %job.id, source = %job.source, start = start_text, end = end_text, "Starting conversion");

        let outcome = self.run_job(&mut job, start_text, end_text).await;
        match &outcome {
            JobOutcome::Completed(report) => info!(
                job_id = %job.id,
                size_bytes = report.size_bytes,
                attempts = report.attempts.len(),
                "Conversion finished"
            ),
            JobOutcome::Failed(e) => warn!(job_id = %job.id, kind = e.kind(), error = %e, "Conversion failed"),
            JobOutcome::Superseded => debug!(job_id = %job.id, "Conversion superseded, result discarded"),
        }
        outcome
    }

    /// Supersede the running job without starting a new one
    ///
    /// Returns false when no job was active. A finished job's artifact stays
    /// live.
    pub fn cancel_current(&self) -> bool {
        let _slot = self.lock_output();
        let active = {
            let status = self.status.borrow();
            !status.is_terminal() && !matches!(*status, ConversionStatus::Idle)
        };
        if active {
            self.jobs.retire_current();
            self.status.send_replace(ConversionStatus::Idle);
            info!("Active conversion cancelled");
        }
        active
    }

    /// Supersede everything and release the live artifact
    pub fn shutdown(&self) {
        let mut slot = self.lock_output();
        self.jobs.retire_current();
        slot.release();
        self.status.send_replace(ConversionStatus::Idle);
        debug!("Controller shut down");
    }

    fn lock_output(&self) -> MutexGuard<'_, OutputSlot> {
        self.output.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim a new id and release the previous artifact in one step
    fn begin_job(&self, source: SourceHandle) -> Job {
        let mut slot = self.lock_output();
        let id = self.jobs.begin_job();
        slot.release();
        Job::new(id, source)
    }

    async fn run_job(&self, job: &mut Job, start_text: &str, end_text: &str) -> JobOutcome {
        let window = match TrimValidator::validate(&self.parser, start_text, end_text) {
            Ok(window) => window,
            Err(e) => return self.fail(job, e),
        };
        job.trim_window = Some(window);

        if !self.publish(job.id, ConversionStatus::Analyzing) {
            return JobOutcome::Superseded;
        }
        job.transition(JobState::Analyzing);

        let analysis = match self
            .checkpoint(job.id, self.analyzer.analyze(&job.source))
            .await
        {
            Checkpoint::Proceed(analysis) => analysis,
            Checkpoint::Stale => return JobOutcome::Superseded,
            Checkpoint::Failed(e) => return self.fail(job, e),
        };

        let (mut plan, breakdown) =
            match ParameterDeriver::derive_with_breakdown(&analysis, &window, &self.settings) {
                Ok(derived) => derived,
                Err(e) => return self.fail(job, e),
            };
        info!(
            job_id = %job.id,
            duration = breakdown.duration_seconds,
            video_bytes = breakdown.video_bytes,
            audio_bytes = breakdown.audio_bytes,
            bits_per_pixel = breakdown.bits_per_pixel,
            bitrate_bps = plan.video_bitrate_bps,
            scale = ?plan.scale,
            "Derived encode plan"
        );

        self.converge(job, window, analysis, &mut plan).await
    }

    /// Encode, check size, correct bitrate; at most `max_attempts` times
    async fn converge(
        &self,
        job: &mut Job,
        window: TrimWindow,
        analysis: AnalysisResult,
        plan: &mut EncodePlan,
    ) -> JobOutcome {
        let max_attempts = self.settings.max_attempts;
        let target = self.settings.target_bytes;
        let mut attempts: Vec<AttemptRecord> = Vec::new();

        for attempt in 1..=max_attempts {
            if !self.publish(
                job.id,
                ConversionStatus::Encoding {
                    attempt,
                    max_attempts,
                },
            ) {
                return JobOutcome::Superseded;
            }
            job.transition(JobState::Encoding { attempt });

            let output = match self
                .checkpoint(job.id, self.engine.encode(&job.source, &window, plan))
                .await
            {
                Checkpoint::Proceed(output) => output,
                Checkpoint::Stale => return JobOutcome::Superseded,
                Checkpoint::Failed(e) => return self.fail(job, e),
            };

            let size_bytes = output.size_bytes;
            attempts.push(AttemptRecord {
                attempt,
                video_bitrate_bps: plan.video_bitrate_bps,
                size_bytes,
            });

            if size_bytes <= target {
                return self.complete(job, output, window, analysis, plan.clone(), attempts);
            }

            let next = BitrateCorrector::next_bitrate(plan.video_bitrate_bps, size_bytes, &self.settings);
            info!(
                job_id = %job.id,
                attempt,
                size_bytes,
                target_bytes = target,
                bitrate_bps = plan.video_bitrate_bps,
                next_bitrate_bps = next,
                "Output over budget, lowering bitrate"
            );
            plan.video_bitrate_bps = next;
        }

        let last_size_bytes = attempts.last().map(|a| a.size_bytes).unwrap_or_default();
        self.fail(
            job,
            DomainError::Convergence {
                attempts: max_attempts,
                target_bytes: target,
                last_size_bytes,
            },
        )
    }

    /// Await a port call, then re-check that the job is still current
    ///
    /// A stale result is dropped here, releasing any buffer it carried.
    async fn checkpoint<T, F>(&self, job_id: JobId, call: F) -> Checkpoint<T>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        if !self.jobs.is_current(job_id) {
            return Checkpoint::Stale;
        }

        let result = call.await;

        if !self.jobs.is_current(job_id) {
            debug!(job_id = %job_id, "Discarding result of superseded job");
            return Checkpoint::Stale;
        }

        match result {
            Ok(value) => Checkpoint::Proceed(value),
            Err(e) => Checkpoint::Failed(e),
        }
    }

    /// Report a non-terminal status if the job is still current
    fn publish(&self, job_id: JobId, status: ConversionStatus) -> bool {
        let _slot = self.lock_output();
        if !self.jobs.is_current(job_id) {
            return false;
        }
        self.status.send_replace(status);
        true
    }

    fn fail(&self, job: &mut Job, error: DomainError) -> JobOutcome {
        let mut slot = self.lock_output();
        if !self.jobs.is_current(job.id) {
            return JobOutcome::Superseded;
        }

        slot.release();
        self.status.send_replace(ConversionStatus::Error {
            message: error.to_string(),
        });
        job.transition(JobState::Failed);
        JobOutcome::Failed(error)
    }

    fn complete(
        &self,
        job: &mut Job,
        output: EncodedOutput,
        window: TrimWindow,
        analysis: AnalysisResult,
        final_plan: EncodePlan,
        attempts: Vec<AttemptRecord>,
    ) -> JobOutcome {
        let mut slot = self.lock_output();
        if !self.jobs.is_current(job.id) {
            return JobOutcome::Superseded;
        }

        let size_bytes = output.size_bytes;
        let handle = slot.install(job.id, output);
        self.status.send_replace(ConversionStatus::Done {
            handle: handle.clone(),
            size_bytes,
        });
        job.transition(JobState::Done);

        JobOutcome::Completed(ConversionReport {
            job_id: job.id,
            handle,
            size_bytes,
            window,
            analysis,
            final_plan,
            attempts,
        })
    }
}
