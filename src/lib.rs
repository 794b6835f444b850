//! Easel library exports for testing

pub mod console;
pub mod core;
pub mod imaging;
pub mod store;
pub mod view;

#[cfg(test)]
pub mod test_support;
