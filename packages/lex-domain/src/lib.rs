pub mod candidate;
pub mod context;
pub mod date_serde;
pub mod keywords;
pub mod merge;
pub mod precedent;
pub mod query;
pub mod scoring;

pub use candidate::{
	Candidate, IndexKind, RetrievalMode, ScoredResult, SourceRef, SourceTier, field,
};
pub use precedent::PrecedentUnit;
pub use query::{PracticeCategory, Query};
