//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions where applicable.

/// Success - every object was converted or reported as unhandled
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Input error - unreadable manifests or invalid chart settings
pub const INPUT_ERROR: i32 = 2;

/// Conversion error - the run was aborted or some objects failed
pub const CONVERSION_ERROR: i32 = 3;

/// Output error - the chart directory cannot be written as requested
pub const OUTPUT_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;
