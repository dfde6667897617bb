//! Property-based tests for DbTree core library

mod config_tests;
mod connection_tests;
mod profiler_tests;
mod visibility_tests;
