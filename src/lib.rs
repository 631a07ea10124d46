pub mod errors;
pub mod result;
pub mod record;
pub(crate) mod index;
pub mod model;
pub mod filter;
pub mod options;
pub mod store;
pub mod ingest;
pub mod export;
pub mod narrative;
pub mod controller;
pub mod session;
pub mod config;

pub use index::IndexStats;

pub use record::{FilterField, Record, RecordField};
pub use filter::{filter, ActivityWindow, AmountRange, FilterSpec, QuerySummary, Selector};
pub use options::{derive_options, FilterOptions};
pub use model::{OverlapStats, QueryResult, VennArea};
pub use store::RecordStore;
pub use ingest::{load_csv_bytes, load_csv_file, parse_csv, IngestOptions, IngestReport};
pub use narrative::{Narrative, NarrativeService, Narrator, PromptBuilder, RequestKind, RequestState};
pub use controller::{Dashboard, DashboardSnapshot, NarrativeTicket};
pub use session::{InMemorySessionStore, SessionId, SessionStore};
pub use config::CrmConfig;
