//! Controller behaviour against stub analyzer and engine implementations

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Notify};

use trimfit::app::{ConvertInteractor, JobOutcome};
use trimfit::domain::errors::DomainError;
use trimfit::domain::model::*;
use trimfit::ports::{MediaAnalyzer, TranscodeEngine};

const TARGET: u64 = 9_800_000;

struct FixedAnalyzer {
    result: Result<AnalysisResult, DomainError>,
}

impl FixedAnalyzer {
    fn hd_with_audio() -> Arc<Self> {
        Arc::new(Self {
            result: AnalysisResult::new(1280, 720, 30.0, true),
        })
    }
}

#[async_trait]
impl MediaAnalyzer for FixedAnalyzer {
    async fn analyze(&self, _source: &SourceHandle) -> Result<AnalysisResult, DomainError> {
        self.result.clone()
    }
}

/// Engine whose output size is a function of the requested bitrate
struct ScriptedEngine {
    size_for: Box<dyn Fn(u64) -> Result<u64, DomainError> + Send + Sync>,
    plans: Mutex<Vec<EncodePlan>>,
    seen_status: Mutex<Vec<ConversionStatus>>,
    status: OnceLock<watch::Receiver<ConversionStatus>>,
}

impl ScriptedEngine {
    fn new(size_for: impl Fn(u64) -> Result<u64, DomainError> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            size_for: Box::new(size_for),
            plans: Mutex::new(Vec::new()),
            seen_status: Mutex::new(Vec::new()),
            status: OnceLock::new(),
        })
    }

    fn calls(&self) -> usize {
        self.plans.lock().unwrap().len()
    }

    fn bitrates(&self) -> Vec<u64> {
        self.plans
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.video_bitrate_bps)
            .collect()
    }
}

#[async_trait]
impl TranscodeEngine for ScriptedEngine {
    async fn encode(
        &self,
        _source: &SourceHandle,
        _window: &TrimWindow,
        plan: &EncodePlan,
    ) -> Result<EncodedOutput, DomainError> {
        self.plans.lock().unwrap().push(plan.clone());
        if let Some(rx) = self.status.get() {
            self.seen_status.lock().unwrap().push(rx.borrow().clone());
        }
        let size = (self.size_for)(plan.video_bitrate_bps)?;
        Ok(EncodedOutput::from_buffer(vec![0u8; size as usize]))
    }
}

/// Engine that parks encodes of `gated.mp4` until released
struct GatedEngine {
    gate: Notify,
    gated_calls: AtomicU32,
    size_bytes: u64,
}

#[async_trait]
impl TranscodeEngine for GatedEngine {
    async fn encode(
        &self,
        source: &SourceHandle,
        _window: &TrimWindow,
        _plan: &EncodePlan,
    ) -> Result<EncodedOutput, DomainError> {
        if source.path() == Path::new("gated.mp4") {
            self.gated_calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
        }
        Ok(EncodedOutput::from_buffer(vec![1u8; self.size_bytes as usize]))
    }
}

fn controller(
    analyzer: Arc<dyn MediaAnalyzer>,
    engine: Arc<dyn TranscodeEngine>,
) -> Arc<ConvertInteractor> {
    Arc::new(ConvertInteractor::new(
        analyzer,
        engine,
        ConversionSettings::default(),
    ))
}

fn watch_status(engine: &ScriptedEngine, controller: &ConvertInteractor) {
    let _ = engine.status.set(controller.subscribe());
}

#[tokio::test]
async fn test_converges_when_first_attempt_fits() {
    let engine = ScriptedEngine::new(|_| Ok(4_000_000));
    let controller = controller(FixedAnalyzer::hd_with_audio(), engine.clone());

    let outcome = controller
        .start_conversion(SourceHandle::new("clip.mp4"), "0:10", "0:30")
        .await;

    let JobOutcome::Completed(report) = outcome else {
        panic!("expected completion");
    };
    assert_eq!(report.size_bytes, 4_000_000);
    assert_eq!(report.attempts.len(), 1);
    assert_eq!(engine.bitrates(), vec![3_764_000]);
    assert!(report.handle.is_live());
    assert!(matches!(
        controller.status(),
        ConversionStatus::Done { size_bytes: 4_000_000, .. }
    ));
}

#[tokio::test]
async fn test_corrects_bitrate_until_it_fits() {
    // Output size is roughly proportional to bitrate, overshooting by 40%
    let engine = ScriptedEngine::new(|bps| Ok((bps as f64 * 20.0 / 8.0 * 1.4) as u64));
    let controller = controller(FixedAnalyzer::hd_with_audio(), engine.clone());

    let outcome = controller
        .start_conversion(SourceHandle::new("clip.mp4"), "0:10", "0:30")
        .await;

    let JobOutcome::Completed(report) = outcome else {
        panic!("expected completion");
    };
    assert!(report.size_bytes <= TARGET);
    assert_eq!(report.attempts.len(), 2);

    let bitrates = engine.bitrates();
    assert!(bitrates[1] < bitrates[0]);
    assert_eq!(report.final_plan.video_bitrate_bps, bitrates[1]);
}

#[tokio::test]
async fn test_gives_up_after_five_oversized_attempts() {
    let engine = ScriptedEngine::new(|_| Ok(TARGET * 3 / 2));
    let controller = controller(FixedAnalyzer::hd_with_audio(), engine.clone());
    watch_status(&engine, &controller);

    let outcome = controller
        .start_conversion(SourceHandle::new("clip.mp4"), "0:00", "1:00")
        .await;

    match outcome {
        JobOutcome::Failed(DomainError::Convergence { attempts, .. }) => assert_eq!(attempts, 5),
        other => panic!("expected convergence failure, got {:?}", other),
    }
    assert_eq!(engine.calls(), 5);

    let bitrates = engine.bitrates();
    assert!(bitrates.windows(2).all(|pair| pair[1] < pair[0]));

    let seen = engine.seen_status.lock().unwrap().clone();
    for (index, status) in seen.iter().enumerate() {
        match status {
            ConversionStatus::Encoding {
                attempt,
                max_attempts,
            } => {
                assert_eq!(*attempt as usize, index + 1);
                assert_eq!(*max_attempts, 5);
            }
            other => panic!("engine ran while status was {:?}", other),
        }
    }

    match controller.status() {
        ConversionStatus::Error { message } => assert!(message.contains("trim")),
        other => panic!("expected error status, got {:?}", other),
    }
    assert!(controller.current_handle().is_none());
}

#[tokio::test]
async fn test_encode_error_is_not_retried() {
    let engine = ScriptedEngine::new(|_| Err(DomainError::Encode("codec exploded".into())));
    let controller = controller(FixedAnalyzer::hd_with_audio(), engine.clone());

    let outcome = controller
        .start_conversion(SourceHandle::new("clip.mp4"), "0:00", "0:20")
        .await;

    assert!(matches!(outcome, JobOutcome::Failed(DomainError::Encode(_))));
    assert_eq!(engine.calls(), 1);
    assert!(matches!(controller.status(), ConversionStatus::Error { .. }));
}

#[tokio::test]
async fn test_budget_exhausted_never_encodes() {
    let engine = ScriptedEngine::new(|_| Ok(1));
    let controller = controller(FixedAnalyzer::hd_with_audio(), engine.clone());

    // Half an hour of 96 kbps audio alone is larger than the budget
    let outcome = controller
        .start_conversion(SourceHandle::new("clip.mp4"), "0:00", "30:00")
        .await;

    assert!(matches!(
        outcome,
        JobOutcome::Failed(DomainError::BudgetExhausted { .. })
    ));
    assert_eq!(engine.calls(), 0);
}

#[tokio::test]
async fn test_invalid_range_never_reaches_ports() {
    let engine = ScriptedEngine::new(|_| Ok(1));
    let controller = controller(FixedAnalyzer::hd_with_audio(), engine.clone());

    for (start, end) in [("0:30", "0:10"), ("0:10", "0:10"), ("0:10", ""), ("0:10", ":")] {
        let outcome = controller
            .start_conversion(SourceHandle::new("clip.mp4"), start, end)
            .await;
        assert!(
            matches!(outcome, JobOutcome::Failed(DomainError::Validation(_))),
            "{} -> {} should fail validation",
            start,
            end
        );
    }
    assert_eq!(engine.calls(), 0);
}

#[tokio::test]
async fn test_newer_job_supersedes_pending_one() {
    let engine = Arc::new(GatedEngine {
        gate: Notify::new(),
        gated_calls: AtomicU32::new(0),
        size_bytes: 1_000,
    });
    let controller = controller(FixedAnalyzer::hd_with_audio(), engine.clone());
    let mut status_rx = controller.subscribe();

    let job_a = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            controller
                .start_conversion(SourceHandle::new("gated.mp4"), "0:00", "0:20")
                .await
        })
    };

    status_rx
        .wait_for(|status| matches!(status, ConversionStatus::Encoding { .. }))
        .await
        .unwrap();
    assert_eq!(engine.gated_calls.load(Ordering::SeqCst), 1);

    let outcome_b = controller
        .start_conversion(SourceHandle::new("other.mp4"), "0:00", "0:20")
        .await;
    let JobOutcome::Completed(report_b) = outcome_b else {
        panic!("job B should complete");
    };

    let mut after_b = controller.subscribe();
    after_b.borrow_and_update();

    engine.gate.notify_one();
    let outcome_a = tokio::time::timeout(Duration::from_secs(5), job_a)
        .await
        .unwrap()
        .unwrap();

    assert!(matches!(outcome_a, JobOutcome::Superseded));
    assert!(!after_b.has_changed().unwrap());
    assert!(report_b.handle.is_live());
    assert_eq!(
        controller.current_handle().map(|h| h.id),
        Some(report_b.handle.id)
    );
    match controller.status() {
        ConversionStatus::Done { handle, .. } => assert_eq!(handle.id, report_b.handle.id),
        other => panic!("expected job B's result, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cancel_discards_pending_result() {
    let engine = Arc::new(GatedEngine {
        gate: Notify::new(),
        gated_calls: AtomicU32::new(0),
        size_bytes: 1_000,
    });
    let controller = controller(FixedAnalyzer::hd_with_audio(), engine.clone());
    let mut status_rx = controller.subscribe();

    let job = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            controller
                .start_conversion(SourceHandle::new("gated.mp4"), "0:00", "0:20")
                .await
        })
    };

    status_rx
        .wait_for(|status| matches!(status, ConversionStatus::Encoding { .. }))
        .await
        .unwrap();

    assert!(controller.cancel_current());
    assert!(matches!(controller.status(), ConversionStatus::Idle));

    engine.gate.notify_one();
    let outcome = job.await.unwrap();

    assert!(matches!(outcome, JobOutcome::Superseded));
    assert!(matches!(controller.status(), ConversionStatus::Idle));
    assert!(controller.current_handle().is_none());
}

#[tokio::test]
async fn test_at_most_one_live_artifact() {
    let engine = ScriptedEngine::new(|_| Ok(2_048));
    let controller = controller(FixedAnalyzer::hd_with_audio(), engine.clone());
    let mut handles = Vec::new();

    for round in 0..4 {
        let outcome = controller
            .start_conversion(SourceHandle::new("clip.mp4"), "0:00", "0:15")
            .await;
        let JobOutcome::Completed(report) = outcome else {
            panic!("round {} should complete", round);
        };
        handles.push(report.handle);

        let live = handles.iter().filter(|h| h.is_live()).count();
        assert_eq!(live, 1);
    }

    assert_eq!(controller.released_artifacts(), 3);
    assert!(handles.last().unwrap().is_live());

    controller.shutdown();
    assert!(handles.iter().all(|h| !h.is_live()));
    assert_eq!(controller.released_artifacts(), 4);
}

#[tokio::test]
async fn test_new_request_releases_previous_artifact_even_if_invalid() {
    let engine = ScriptedEngine::new(|_| Ok(2_048));
    let controller = controller(FixedAnalyzer::hd_with_audio(), engine.clone());

    let JobOutcome::Completed(report) = controller
        .start_conversion(SourceHandle::new("clip.mp4"), "0:00", "0:15")
        .await
    else {
        panic!("first job should complete");
    };
    assert!(report.handle.is_live());

    let outcome = controller
        .start_conversion(SourceHandle::new("clip.mp4"), "0:20", "0:15")
        .await;

    assert!(matches!(outcome, JobOutcome::Failed(DomainError::Validation(_))));
    assert!(!report.handle.is_live());
    assert!(report.handle.bytes().is_none());
}

#[tokio::test]
async fn test_analysis_failure_reports_error() {
    let analyzer = Arc::new(FixedAnalyzer {
        result: Err(DomainError::Analysis("No video track found".into())),
    });
    let engine = ScriptedEngine::new(|_| Ok(1));
    let controller = controller(analyzer, engine.clone());

    let outcome = controller
        .start_conversion(SourceHandle::new("song.mp3"), "0:00", "0:20")
        .await;

    assert!(matches!(outcome, JobOutcome::Failed(DomainError::Analysis(_))));
    assert_eq!(engine.calls(), 0);
    match controller.status() {
        ConversionStatus::Error { message } => assert!(message.contains("No video track")),
        other => panic!("expected error status, got {:?}", other),
    }
}
