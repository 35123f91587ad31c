#![doc = include_str!("../README.md")]
#![warn(
    anonymous_parameters,
    bare_trait_objects,
    clippy::branches_sharing_code,
    clippy::map_unwrap_or,
    clippy::match_wildcard_for_single_variants,
    clippy::must_use_candidate,
    clippy::needless_for_each,
    clippy::redundant_closure_for_method_calls,
    clippy::semicolon_if_nothing_returned,
    clippy::unreadable_literal,
    clippy::unwrap_used,
    clippy::expect_used,
    deprecated_in_future,
    ellipsis_inclusive_range_patterns,
    future_incompatible,
    missing_copy_implementations,
    missing_debug_implementations,
    nonstandard_style,
    rust_2018_compatibility,
    rust_2018_idioms,
    rust_2021_compatibility,
    rustdoc::bare_urls,
    rustdoc::broken_intra_doc_links,
    rustdoc::invalid_html_tags,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::private_intra_doc_links,
    single_use_lifetimes,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused,
    variant_size_differences
)]

use anyhow::Result;
use quake_engine::prelude::*;
use std::{env, path::PathBuf};

mod trace;

const VERTEX_SHADER: &str = concat!(env!("OUT_DIR"), "/shader.vert.spv");
const FRAGMENT_SHADER: &str = concat!(env!("OUT_DIR"), "/shader.frag.spv");

/// Shader path from `var`, falling back to the bytecode compiled by the build script.
fn shader_path(var: &str, default: &str) -> PathBuf {
    env::var_os(var).map_or_else(|| PathBuf::from(default), PathBuf::from)
}

fn main() -> Result<()> {
    let _log_guard = trace::init_logging(&trace::LogConfig::from_env());

    let shaders = ShaderPaths::new(
        shader_path("VERTEX_SHADER", VERTEX_SHADER),
        shader_path("FRAGMENT_SHADER", FRAGMENT_SHADER),
    );
    let config = Config::new().with_shaders(shaders);

    let driver = VulkanDriver::new();
    let mut lifecycle = LifecycleManager::new(config, driver, WinitWindow::new());
    lifecycle.initialize()?;

    tracing::info!("application started");
    lifecycle.run()?;
    tracing::info!("shutting down...");

    Ok(())
}
