//! CLI command implementations
//!
//! Every command returns the process exit code:
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success |
//! | 1 | Completed, but some records were skipped |
//! | 2 | Configuration error |
//! | 3 | Input document set not found |
//! | 4 | Destination store not found |
//! | 5 | Unrecoverable error, nothing committed |
//! | 130 | Interrupted, nothing committed |

pub mod fix_keys;
pub mod import;
pub mod validate;

use crate::domain::MigrationError;

pub const EXIT_OK: i32 = 0;
pub const EXIT_RECORD_ERRORS: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_INPUT_NOT_FOUND: i32 = 3;
pub const EXIT_STORE_NOT_FOUND: i32 = 4;
pub const EXIT_FATAL: i32 = 5;
pub const EXIT_INTERRUPTED: i32 = 130;

/// Exit code for an error that ended a command
pub fn exit_code_for(error: &MigrationError) -> i32 {
    match error {
        MigrationError::Configuration(_) => EXIT_CONFIG,
        MigrationError::InputNotFound(_) => EXIT_INPUT_NOT_FOUND,
        MigrationError::StoreNotFound(_) => EXIT_STORE_NOT_FOUND,
        _ => EXIT_FATAL,
    }
}
