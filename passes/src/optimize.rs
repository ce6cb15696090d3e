//! The pipeline orchestrator.
//!
//! Step order is load-bearing: fusion must precede prepack insertion so a
//! decomposed linear is seen whole; freezing must precede folding so the
//! prepack inputs are constants; cleanup runs last over whatever the
//! earlier steps left dead.

use splice_ir::AttrValue;

use crate::error::Result;
use crate::module::Module;
use crate::registry::OpRegistry;
use crate::{cleanup, clamp, fold, freeze, fuse, prepack, vk};

pub const OPTIMIZED_ATTR: &str = "optimized_for_vk";
pub const FOLD_ATTR_PREFIX: &str = "prepack_folding";

/// Optimize a module tree for the `vk` backend. The input module is never
/// mutated; any fatal error aborts the whole call.
pub fn optimize_for_vk(module: &Module, preserved_methods: &[&str]) -> Result<Module> {
    optimize_with_registry(module, &vk::registry(), preserved_methods)
}

pub fn optimize_with_registry(
    module: &Module,
    registry: &OpRegistry,
    preserved: &[&str],
) -> Result<Module> {
    tracing::debug!(backend = registry.backend(), "checking backend op coverage");
    registry.ensure_ops(vk::REQUIRED_OPS)?;
    let mut optimized = module.clone();

    tracing::info!(module = %optimized.name, "fusing decomposed layers");
    fuse::fuse_decomposed(&mut optimized, preserved)?;

    tracing::info!(module = %optimized.name, "inserting prepack ops");
    prepack::insert_prepack_ops(&mut optimized, preserved)?;

    tracing::info!(module = %optimized.name, "freezing parameters");
    freeze::freeze(&mut optimized, preserved)?;

    tracing::info!(module = %optimized.name, "fusing clamps");
    clamp::fuse_clamp_ops(&mut optimized, preserved)?;

    tracing::info!(module = %optimized.name, "folding prepack ops");
    fold::fold_prepack_ops(&mut optimized, registry, FOLD_ATTR_PREFIX, preserved)?;

    tracing::info!(module = %optimized.name, "cleanup");
    cleanup::remove_dropout(&mut optimized, preserved)?;
    cleanup::remove_mutation(&mut optimized, preserved)?;
    cleanup::canonical_cleanup(&mut optimized, preserved)?;

    optimized.register_attribute(OPTIMIZED_ATTR, AttrValue::Bool(true));
    Ok(optimized)
}
