//! Integration test runner for unit tests
//! This file makes cargo test discover the unit test modules

#[path = "unit/test_options.rs"]
mod test_options;

#[path = "unit/test_model.rs"]
mod test_model;
