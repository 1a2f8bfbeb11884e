//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

#![allow(dead_code)]

/// Success - operation completed without errors
pub const SUCCESS: i32 = 0;

/// General error - an operation reported error diagnostics
pub const ERROR: i32 = 1;

/// Validation error - configuration does not match the resource schema
pub const VALIDATION_ERROR: i32 = 2;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Usage error - unknown resource type or invalid arguments (sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
