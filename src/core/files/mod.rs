//! Attachment file resolution and organization
//!
//! - [`sanitize`] - path component cleanup
//! - [`fingerprint`] - content comparison
//! - [`organizer`] - destination assignment and copying

pub mod fingerprint;
pub mod organizer;
pub mod sanitize;

pub use organizer::{FileMeta, FileOrganizer, FileOutcome, FileSlot};
