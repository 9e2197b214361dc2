pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod hasher;
pub mod model;
pub mod placement;
pub mod progress;
pub mod report;
pub mod scanner;

pub use classify::catalog::{Catalog, CatalogError, SystemEntry, SystemRole};
pub use classify::{Classifier, PassOutcome, RecoveryPass};
pub use config::AppConfig;
pub use engine::{ClassifyOutcome, RunResult, SortEngine};
pub use error::Error;
pub use extract::{ExtractError, PdfTextExtractor, TextExtractor};
pub use model::{
    ClassificationResult, Confidence, Document, ExtractionStatus, MatchEvidence, MatchKind,
    ReasonCode,
};
pub use progress::{ProgressReporter, SilentReporter};
pub use report::RunSummary;
