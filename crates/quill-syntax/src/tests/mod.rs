//! Tests for the quill-syntax crate.

mod behaviour;
