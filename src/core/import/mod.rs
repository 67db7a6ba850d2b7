//! Transactional import of the Papers3 document set
//!
//! - [`coordinator`] - run state machine and commit/rollback decision
//! - [`record`] - one publication, isolated in a savepoint
//! - [`mapping`] - type, field and content-type mapping
//! - [`summary`] - counters and the error log

pub mod coordinator;
pub mod mapping;
pub mod record;
pub mod summary;

pub use coordinator::ImportCoordinator;
pub use record::{RecordImporter, RecordOutcome};
pub use summary::{FileStats, ImportError, ImportErrorKind, ImportSummary, RunOutcome};
