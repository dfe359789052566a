pub mod analyzer;
pub mod archive;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod model;
pub mod output;
pub mod registry;
pub mod risk;
pub mod scanner;

pub use analyzer::{analyze, AnalyzeOptions};
pub use cache::Cache;
pub use config::Config;
pub use error::{AnalyzeError, ExtractError, RegistryError};
pub use model::{AnalysisReport, FileReport, PackageMetadata, ScanFinding, ScanReport};
pub use registry::{PyPiRegistry, Registry};
pub use risk::RiskScore;
