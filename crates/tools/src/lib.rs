//! Small shared helpers for the translator workspace.

pub mod utf8;
