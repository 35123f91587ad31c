//! Platform-specific Vulkan requirements.

#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "macos")]
pub use macos::*;

#[cfg(not(target_os = "macos"))]
pub use conformant::*;

#[cfg(all(
    not(target_os = "windows"),
    not(target_os = "linux"),
    not(target_os = "macos"),
))]
compile_error!("quake-engine is not supported for your target platform");

#[cfg(not(target_os = "macos"))]
mod conformant {
    use ash::{extensions::khr, vk};
    use std::ffi::CStr;

    /// Set of [`vk::InstanceCreateFlags`] for platforms with conformant drivers.
    pub const INSTANCE_CREATE_FLAGS: vk::InstanceCreateFlags = vk::InstanceCreateFlags::empty();

    /// Instance extensions required to enumerate non-conformant drivers. None on this platform.
    pub const PORTABILITY_EXTENSIONS: [&CStr; 0] = [];

    /// List of required [`vk::PhysicalDevice`] extensions.
    pub const REQUIRED_DEVICE_EXTENSIONS: [&CStr; 1] = [khr::Swapchain::name()];
}
