use std::sync::Arc;

use crate::adapters::{AppConfig, FfmpegTranscoder, FfprobeAnalyzer};
use crate::app::{convert_interactor::ConvertInteractor, inspect_interactor::InspectInteractor};
use crate::ports::{MediaAnalyzer, TranscodeEngine};
use crate::utils::time::TimeParser;

pub trait AppContainer: Send + Sync {
    fn convert_interactor(&self) -> Arc<ConvertInteractor>;
    fn inspect_interactor(&self) -> Arc<InspectInteractor>;
}

pub struct DefaultAppContainer {
    convert_interactor: Arc<ConvertInteractor>,
    inspect_interactor: Arc<InspectInteractor>,
}

impl DefaultAppContainer {
    /// Wire the ffprobe/ffmpeg adapters from a validated configuration
    pub fn new(config: &AppConfig) -> Self {
        let analyzer: Arc<dyn MediaAnalyzer> =
            Arc::new(FfprobeAnalyzer::new(config.encoder.ffprobe_path.clone()));
        let engine: Arc<dyn TranscodeEngine> = Arc::new(FfmpegTranscoder::new(
            config.encoder.ffmpeg_path.clone(),
            config.encoder.preset,
            config.encoder.threads,
        ));

        Self::with_ports(analyzer, engine, config)
    }

    /// Wire arbitrary port implementations
    pub fn with_ports(
        analyzer: Arc<dyn MediaAnalyzer>,
        engine: Arc<dyn TranscodeEngine>,
        config: &AppConfig,
    ) -> Self {
        let parser = if config.input.strict_time_parsing {
            TimeParser::strict()
        } else {
            TimeParser::new()
        };

        let convert_interactor = Arc::new(
            ConvertInteractor::new(
                Arc::clone(&analyzer),
                engine,
                config.conversion.clone(),
            )
            .with_time_parser(parser),
        );

        let inspect_interactor = Arc::new(InspectInteractor::new(
            analyzer,
            config.conversion.clone(),
            parser,
        ));

        Self {
            convert_interactor,
            inspect_interactor,
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn convert_interactor(&self) -> Arc<ConvertInteractor> {
        Arc::clone(&self.convert_interactor)
    }

    fn inspect_interactor(&self) -> Arc<InspectInteractor> {
        Arc::clone(&self.inspect_interactor)
    }
}
