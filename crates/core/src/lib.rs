pub mod config;
pub mod config_loader;
pub mod error;
pub mod quarter;
pub mod validation;

pub use config::{AnalysisConfig, AppConfig, DataConfig, GapPolicy, OutputConfig, UniverseConfig};
pub use config_loader::ConfigLoader;
pub use error::{FlowError, FlowResult};
pub use validation::HitRateValidation;
