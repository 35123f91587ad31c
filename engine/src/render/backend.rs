//! The driver seam between the bootstrap sequence and the graphics API.

use ash::vk;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::ffi::CString;

#[cfg(test)]
pub(crate) mod mock;
mod vulkan;

pub use vulkan::VulkanDriver;

/// Every graphics API call made while negotiating a rendering context.
///
/// Creation calls take fully built create-info structures, so the negotiation policy is decided
/// by the caller and the driver only forwards it. Destruction calls cannot fail.
pub trait Driver {
    /// Names of the instance extensions installed on this platform.
    fn instance_extensions(&self) -> anyhow::Result<Vec<CString>>;

    /// Names of the instance layers installed on this platform.
    fn instance_layers(&self) -> anyhow::Result<Vec<CString>>;

    fn create_instance(&mut self, create_info: &vk::InstanceCreateInfo)
        -> anyhow::Result<vk::Instance>;

    fn destroy_instance(&mut self, instance: vk::Instance);

    /// Install a diagnostics messenger. Fails if the entry point can not be resolved from the
    /// instance.
    fn create_debug_messenger(
        &mut self,
        instance: vk::Instance,
        create_info: &vk::DebugUtilsMessengerCreateInfoEXT,
    ) -> anyhow::Result<vk::DebugUtilsMessengerEXT>;

    fn destroy_debug_messenger(
        &mut self,
        instance: vk::Instance,
        messenger: vk::DebugUtilsMessengerEXT,
    );

    fn create_surface(
        &mut self,
        instance: vk::Instance,
        display_handle: RawDisplayHandle,
        window_handle: RawWindowHandle,
    ) -> anyhow::Result<vk::SurfaceKHR>;

    fn destroy_surface(&mut self, instance: vk::Instance, surface: vk::SurfaceKHR);

    /// Physical devices in driver enumeration order.
    fn physical_devices(&self, instance: vk::Instance) -> anyhow::Result<Vec<vk::PhysicalDevice>>;

    fn physical_device_name(&self, physical_device: vk::PhysicalDevice) -> anyhow::Result<String>;

    fn queue_families(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> anyhow::Result<Vec<vk::QueueFamilyProperties>>;

    /// Whether the queue family at `queue_family_index` can present to `surface`.
    fn surface_support(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        surface: vk::SurfaceKHR,
    ) -> anyhow::Result<bool>;

    fn device_extensions(&self, physical_device: vk::PhysicalDevice)
        -> anyhow::Result<Vec<CString>>;

    fn surface_capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> anyhow::Result<vk::SurfaceCapabilitiesKHR>;

    fn surface_formats(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> anyhow::Result<Vec<vk::SurfaceFormatKHR>>;

    fn surface_present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> anyhow::Result<Vec<vk::PresentModeKHR>>;

    fn create_device(
        &mut self,
        physical_device: vk::PhysicalDevice,
        create_info: &vk::DeviceCreateInfo,
    ) -> anyhow::Result<vk::Device>;

    fn device_queue(
        &self,
        device: vk::Device,
        queue_family_index: u32,
        queue_index: u32,
    ) -> anyhow::Result<vk::Queue>;

    fn destroy_device(&mut self, device: vk::Device);

    fn create_swapchain(
        &mut self,
        device: vk::Device,
        create_info: &vk::SwapchainCreateInfoKHR,
    ) -> anyhow::Result<vk::SwapchainKHR>;

    /// Images owned by `swapchain`. May contain more images than were requested.
    fn swapchain_images(
        &self,
        device: vk::Device,
        swapchain: vk::SwapchainKHR,
    ) -> anyhow::Result<Vec<vk::Image>>;

    fn destroy_swapchain(&mut self, device: vk::Device, swapchain: vk::SwapchainKHR);

    fn create_image_view(
        &mut self,
        device: vk::Device,
        create_info: &vk::ImageViewCreateInfo,
    ) -> anyhow::Result<vk::ImageView>;

    fn destroy_image_view(&mut self, device: vk::Device, image_view: vk::ImageView);

    fn create_shader_module(
        &mut self,
        device: vk::Device,
        create_info: &vk::ShaderModuleCreateInfo,
    ) -> anyhow::Result<vk::ShaderModule>;

    fn destroy_shader_module(&mut self, device: vk::Device, shader_module: vk::ShaderModule);

    fn create_render_pass(
        &mut self,
        device: vk::Device,
        create_info: &vk::RenderPassCreateInfo,
    ) -> anyhow::Result<vk::RenderPass>;

    fn destroy_render_pass(&mut self, device: vk::Device, render_pass: vk::RenderPass);

    fn create_pipeline_layout(
        &mut self,
        device: vk::Device,
        create_info: &vk::PipelineLayoutCreateInfo,
    ) -> anyhow::Result<vk::PipelineLayout>;

    fn destroy_pipeline_layout(&mut self, device: vk::Device, layout: vk::PipelineLayout);

    fn create_graphics_pipeline(
        &mut self,
        device: vk::Device,
        create_info: &vk::GraphicsPipelineCreateInfo,
    ) -> anyhow::Result<vk::Pipeline>;

    fn destroy_pipeline(&mut self, device: vk::Device, pipeline: vk::Pipeline);
}
