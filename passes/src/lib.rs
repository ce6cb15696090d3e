//! Optimization passes over the splice IR: layer re-fusion, backend
//! prepack insertion, parameter freezing, clamp fusion, prepack constant
//! folding and cleanup, orchestrated by [`optimize::optimize_for_vk`].

pub mod clamp;
pub mod cleanup;
pub mod error;
pub mod fold;
pub mod freeze;
pub mod fuse;
pub mod helpers;
pub mod kinds;
pub mod module;
pub mod optimize;
pub mod prepack;
pub mod registry;
pub mod vk;

#[cfg(test)]
mod test;

pub use error::{Error, Result};
pub use module::{Method, Module};
pub use optimize::{FOLD_ATTR_PREFIX, OPTIMIZED_ATTR, optimize_for_vk, optimize_with_registry};
pub use registry::{OpEntry, OpRegistry};
