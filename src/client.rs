//! Service client: operation name + parameters in, parsed output or a
//! structured service error out.
//!
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod core;

pub use builder::ClientBuilder;
pub use core::ServiceClient;
