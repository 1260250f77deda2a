// Integration test module organization

pub mod common;

mod concurrency_test;
mod config_test;
mod registry_test;
