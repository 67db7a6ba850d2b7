//! Key generation shared by the importer and the key repair utility

pub mod generator;

pub use generator::KeyGenerator;
