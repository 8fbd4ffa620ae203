//! Unit tests for the status registry.
