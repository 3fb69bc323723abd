//! Benchmark support for RevDB.

#![warn(missing_docs)]

pub mod utils;
