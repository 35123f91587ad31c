#![doc = include_str!("../README.md")]
#![warn(
    anonymous_parameters,
    bare_trait_objects,
    clippy::branches_sharing_code,
    clippy::map_unwrap_or,
    clippy::match_wildcard_for_single_variants,
    // clippy::missing_errors_doc,
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
    // missing_docs,
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

use std::{io, path::PathBuf};

pub mod config;
pub mod event;
pub mod lifecycle;
pub mod platform;
pub mod render;
pub mod shader;
pub mod window;

/// Results that can be returned from this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can be returned from this crate.
///
/// Every variant is fatal to the bootstrap sequence. Driver failures carry the underlying
/// [`anyhow::Error`] chain so the reported message names the failed call.
#[allow(variant_size_differences)]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to initialize platform window: {0}")]
    PlatformInit(anyhow::Error),
    #[error("failed to query platform capabilities: {0}")]
    CapabilityQuery(anyhow::Error),
    #[error("validation layer `{0}` requested, but not available")]
    ValidationUnavailable(String),
    #[error("required extensions are not available: {0:?}")]
    ExtensionMissing(Vec<String>),
    #[error("failed to create instance: {0}")]
    InstanceCreation(anyhow::Error),
    #[error("failed to set up diagnostics messenger: {0}")]
    ValidationSetup(anyhow::Error),
    #[error("failed to create surface: {0}")]
    SurfaceCreation(anyhow::Error),
    #[error("failed to find any devices with vulkan support")]
    NoGpuFound,
    #[error("failed to find a suitable physical device")]
    NoSuitableGpu,
    #[error("failed to create logical device: {0}")]
    DeviceCreation(anyhow::Error),
    #[error("failed to create swapchain: {0}")]
    SwapchainCreation(anyhow::Error),
    #[error("failed to create swapchain image view: {0}")]
    ImageViewCreation(anyhow::Error),
    #[error("failed to read shader bytecode {path:?}: {source}")]
    ShaderRead { path: PathBuf, source: io::Error },
    #[error("failed to create shader module: {0}")]
    ShaderCompilation(anyhow::Error),
    #[error("failed to create render pass: {0}")]
    RenderPassCreation(anyhow::Error),
    #[error("failed to create pipeline layout: {0}")]
    PipelineLayoutCreation(anyhow::Error),
    #[error("failed to create graphics pipeline: {0}")]
    PipelineCreation(anyhow::Error),
    #[error("invalid lifecycle state: expected {expected:?}, found {actual:?}")]
    InvalidState {
        expected: lifecycle::LifecycleState,
        actual: lifecycle::LifecycleState,
    },
}

pub mod prelude {
    //! Most commonly used exports for bringing up a rendering context.

    pub use crate::{
        config::{Config, ShaderPaths, WindowConfig},
        event::Event,
        lifecycle::{LifecycleManager, LifecycleState, RenderContext},
        render::{backend::VulkanDriver, Driver},
        window::{PhysicalSize, WindowSystem, WinitWindow},
        Error, Result,
    };
}
