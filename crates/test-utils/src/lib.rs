//! Shared test utilities for the GHRSST workspace.
//!
//! - Test data path helpers and skip macros for the optional MUR fixture
//! - Synthetic MUR-shaped datasets
//! - Known constants describing the fixture file
//!
//! ```ignore
//! use test_utils::{require_test_file, MUR_FIXTURE_FILE};
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Macro to skip a test if the required file is not found.
///
/// This is useful for tests that depend on external data files that may not
/// be present in all environments (e.g., CI without large test data).
///
/// # Usage
///
/// ```ignore
/// use test_utils::require_test_file;
///
/// #[test]
/// fn test_mur_parsing() {
///     let path = require_test_file!(MUR_FIXTURE_FILE);
///     // Test code using path...
/// }
/// ```
///
/// If the file is not found, the test will print a skip message and return early.
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!(
                    "SKIPPED: Test file '{}' not found. Download test data or set TEST_DATA_DIR.",
                    $name
                );
                return;
            }
        }
    }};
}
