//! Integration tests for the processor module
//!
//! Tests the batch pipeline against temporary payload directories.
