//! Process exit codes of `grade`.

/// Every check matched.
pub const PASSED: i32 = 0;
/// At least one check failed or a procedure ended in a fatal.
pub const FAILED: i32 = 1;
/// The suite could not be run: bad config, faulty reference implementation,
/// or an impossible substitution.
pub const SUITE_ERROR: i32 = 2;
