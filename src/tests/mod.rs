//! integrated tests
pub mod toolkit;

mod conversion;
