//! Client-side core of the document review tool: issue model, filtering,
//! selection, session state, persisted settings and job polling.

pub mod error;
pub mod export;
pub mod filter;
pub mod job;
pub mod logging;
pub mod schema;
pub mod selection;
pub mod settings;
pub mod state;
pub mod storage;
pub mod tracker;
pub mod types;

pub use error::{ApiError, SettingsError, StorageError};
pub use filter::{compute_filtered, ChartFilter, FilterCriteria, ValidationFilter};
pub use selection::SelectionSet;
pub use settings::SettingsStore;
pub use state::SessionState;
pub use tracker::{JobApi, JobEvent, JobStream, JobTracker};
pub use types::{Issue, IssueEntry, IssueId, IssueKey, Severity};
