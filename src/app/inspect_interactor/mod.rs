// Inspect interactor - Source analysis and dry-run planning without encoding

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;
use crate::utils::time::TimeParser;

/// First plan a conversion would try, with the numbers behind it
#[derive(Debug, Clone, Serialize)]
pub struct PlanPreview {
    pub window: TrimWindow,
    pub analysis: AnalysisResult,
    pub plan: EncodePlan,
    pub breakdown: BudgetBreakdown,
    pub target_bytes: u64,
}

/// Interactor for the read-only use cases
pub struct InspectInteractor {
    analyzer: Arc<dyn MediaAnalyzer>,
    settings: ConversionSettings,
    parser: TimeParser,
}

impl InspectInteractor {
    /// Create new inspect interactor with injected ports
    pub fn new(
        analyzer: Arc<dyn MediaAnalyzer>,
        settings: ConversionSettings,
        parser: TimeParser,
    ) -> Self {
        Self {
            analyzer,
            settings,
            parser,
        }
    }

    /// Analyze the source
    pub async fn inspect(&self, source: &SourceHandle) -> Result<AnalysisResult, DomainError> {
        let analysis = self.analyzer.analyze(source).await?;
        info!(
            source = %source,
            width = analysis.display_width,
            height = analysis.display_height,
            fps = analysis.estimated_fps,
            has_audio = analysis.has_audio,
            "Source analyzed"
        );
        Ok(analysis)
    }

    /// Validate the trim, analyze, and derive the first plan
    ///
    /// Validation runs before the analyzer is touched.
    pub async fn plan(
        &self,
        source: &SourceHandle,
        start_text: &str,
        end_text: &str,
    ) -> Result<PlanPreview, DomainError> {
        let window = TrimValidator::validate(&self.parser, start_text, end_text)?;
        let analysis = self.inspect(source).await?;
        let (plan, breakdown) =
            ParameterDeriver::derive_with_breakdown(&analysis, &window, &self.settings)?;

        Ok(PlanPreview {
            window,
            analysis,
            plan,
            breakdown,
            target_bytes: self.settings.target_bytes,
        })
    }
}
