//! Collection hierarchy import

pub mod importer;

pub use importer::{import_tree, HierarchyImport};
