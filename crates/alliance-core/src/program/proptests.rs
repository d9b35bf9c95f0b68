//! Property-based tests for program planning.
