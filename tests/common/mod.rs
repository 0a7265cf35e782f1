//! Integration test common infrastructure.
//!
//! Provides an in-memory host implementing the chanmon host traits, with
//! every call recorded for assertions.

pub mod host;

#[allow(unused_imports)]
pub use host::TestHost;
#[allow(unused_imports)]
pub use host::coordinator;
