//! Negotiation of a Vulkan rendering context against a window surface.
//!
//! Each submodule is one stage of the bootstrap chain. Stages only talk to the graphics API
//! through a [`Driver`] and push every object they create onto the lifecycle's teardown stack
//! before returning.

pub use backend::Driver;

pub mod backend;
pub mod capability;
pub mod debug;
pub mod device;
pub(crate) mod instance;
pub mod pipeline;
pub mod shader;
pub(crate) mod surface;
pub mod swapchain;
