// Application layer - Use case interactors

pub mod container;
pub mod convert_interactor;
pub mod inspect_interactor;
pub mod job_registry;
pub mod output_slot;

// Re-export interactors
pub use container::{AppContainer, DefaultAppContainer};
pub use convert_interactor::{
    AttemptRecord, Checkpoint, ConversionReport, ConvertInteractor, JobOutcome,
};
pub use inspect_interactor::{InspectInteractor, PlanPreview};
pub use job_registry::JobRegistry;
pub use output_slot::OutputSlot;
