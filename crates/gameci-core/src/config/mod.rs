//! Run configuration and pipeline settings.

pub mod settings;
pub mod types;

pub use settings::PipelineSettings;
pub use settings::SettingsOverlay;
pub use types::ErrorPolicy;
pub use types::RunConfig;
pub use types::RunMode;
