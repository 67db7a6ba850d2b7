//! Store maintenance

pub mod keys;

pub use keys::{repair_keys, RepairReport, TableRepair};
