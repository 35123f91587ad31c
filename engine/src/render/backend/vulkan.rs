//! Vulkan driver backed by `ash`.

use super::Driver;
use anyhow::{bail, Context, Result};
use ash::{
    extensions::{ext, khr},
    vk,
};
use derive_more::{Deref, DerefMut};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::{
    ffi::{c_char, CStr, CString},
    fmt, slice,
};

// SAFETY: This static string has been verified as a valid CStr.
const CREATE_DEBUG_MESSENGER_NAME: &CStr =
    unsafe { CStr::from_bytes_with_nul_unchecked(b"vkCreateDebugUtilsMessengerEXT\0") };

/// A [`Driver`] that forwards every call to the system Vulkan loader.
///
/// Holds the `ash` function tables for the single instance and logical device it creates. Raw
/// handles passed back in are checked against the ones it owns.
pub struct VulkanDriver {
    entry: ash::Entry,
    instance: Option<Instance>,
    device: Option<Device>,
}

#[derive(Deref, DerefMut)]
struct Instance {
    #[deref]
    #[deref_mut]
    handle: ash::Instance,
    surface: khr::Surface,
    debug_utils: Option<ext::DebugUtils>,
}

#[derive(Deref, DerefMut)]
struct Device {
    #[deref]
    #[deref_mut]
    handle: ash::Device,
    swapchain: khr::Swapchain,
}

impl fmt::Debug for VulkanDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VulkanDriver")
            .field("instance", &self.instance.as_ref().map(|i| i.handle.handle()))
            .field("device", &self.device.as_ref().map(|d| d.handle.handle()))
            .finish_non_exhaustive()
    }
}

impl Default for VulkanDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl VulkanDriver {
    /// Create a `VulkanDriver` using the statically linked Vulkan loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entry: ash::Entry::linked(),
            instance: None,
            device: None,
        }
    }

    fn instance(&self, instance: vk::Instance) -> Result<&Instance> {
        let Some(owned) = self.instance.as_ref() else {
            bail!("vulkan instance has not been created");
        };
        if owned.handle() != instance {
            bail!("unknown vulkan instance {instance:?}");
        }
        Ok(owned)
    }

    /// The instance that enumerated `physical_device`. Only one instance is ever alive.
    fn physical_instance(&self) -> Result<&Instance> {
        self.instance
            .as_ref()
            .context("vulkan instance has not been created")
    }

    fn device(&self, device: vk::Device) -> Result<&Device> {
        let Some(owned) = self.device.as_ref() else {
            bail!("logical device has not been created");
        };
        if owned.handle() != device {
            bail!("unknown logical device {device:?}");
        }
        Ok(owned)
    }

    /// Run `destroy` against the owned logical device, logging instead of failing.
    fn destroy_with(&self, device: vk::Device, name: &str, destroy: impl FnOnce(&Device)) {
        match self.device(device) {
            Ok(device) => destroy(device),
            Err(err) => tracing::error!("failed to destroy {name}: {err}"),
        }
    }
}

/// Convert a fixed-size, nul-terminated name returned by Vulkan into an owned [`CString`].
fn to_cstring(name: &[c_char]) -> CString {
    // SAFETY: Names are provided by Vulkan and are valid, nul-terminated CStrs.
    unsafe { CStr::from_ptr(name.as_ptr()) }.to_owned()
}

impl Driver for VulkanDriver {
    fn instance_extensions(&self) -> Result<Vec<CString>> {
        let properties = self
            .entry
            .enumerate_instance_extension_properties(None)
            .context("failed to enumerate instance extension properties")?;
        Ok(properties
            .iter()
            .map(|property| to_cstring(&property.extension_name))
            .collect())
    }

    fn instance_layers(&self) -> Result<Vec<CString>> {
        let properties = self
            .entry
            .enumerate_instance_layer_properties()
            .context("failed to enumerate instance layer properties")?;
        Ok(properties
            .iter()
            .map(|property| to_cstring(&property.layer_name))
            .collect())
    }

    fn create_instance(&mut self, create_info: &vk::InstanceCreateInfo) -> Result<vk::Instance> {
        if self.instance.is_some() {
            bail!("vulkan instance has already been created");
        }

        // SAFETY: The caller builds create_info with valid lifetimes for this call.
        let instance = unsafe { self.entry.create_instance(create_info, None) }
            .context("failed to create vulkan instance")?;
        let surface = khr::Surface::new(&self.entry, &instance);
        let handle = instance.handle();
        self.instance = Some(Instance {
            handle: instance,
            surface,
            debug_utils: None,
        });

        Ok(handle)
    }

    fn destroy_instance(&mut self, instance: vk::Instance) {
        if let Err(err) = self.instance(instance) {
            tracing::error!("failed to destroy instance: {err}");
            return;
        }
        if let Some(owned) = self.instance.take() {
            // SAFETY: Every child object has been destroyed by the caller.
            unsafe { owned.handle.destroy_instance(None) };
        }
    }

    fn create_debug_messenger(
        &mut self,
        instance: vk::Instance,
        create_info: &vk::DebugUtilsMessengerCreateInfoEXT,
    ) -> Result<vk::DebugUtilsMessengerEXT> {
        self.instance(instance)?;
        let Some(owned) = self.instance.as_mut() else {
            bail!("vulkan instance has not been created");
        };

        // SAFETY: CREATE_DEBUG_MESSENGER_NAME is a valid, nul-terminated CStr.
        let entry_point = unsafe {
            self.entry
                .get_instance_proc_addr(instance, CREATE_DEBUG_MESSENGER_NAME.as_ptr())
        };
        if entry_point.is_none() {
            bail!("{CREATE_DEBUG_MESSENGER_NAME:?} could not be resolved from the instance");
        }

        let utils = ext::DebugUtils::new(&self.entry, &owned.handle);
        // SAFETY: The caller builds create_info with valid lifetimes for this call.
        let messenger = unsafe { utils.create_debug_utils_messenger(create_info, None) }
            .context("failed to create debug utils messenger")?;
        owned.debug_utils = Some(utils);

        Ok(messenger)
    }

    fn destroy_debug_messenger(
        &mut self,
        instance: vk::Instance,
        messenger: vk::DebugUtilsMessengerEXT,
    ) {
        if let Err(err) = self.instance(instance) {
            tracing::error!("failed to destroy debug messenger: {err}");
            return;
        }
        let utils = self
            .instance
            .as_mut()
            .and_then(|owned| owned.debug_utils.take());
        match utils {
            // SAFETY: messenger was created by these debug utils.
            Some(utils) => unsafe { utils.destroy_debug_utils_messenger(messenger, None) },
            None => tracing::error!("failed to destroy debug messenger: not installed"),
        }
    }

    fn create_surface(
        &mut self,
        instance: vk::Instance,
        display_handle: RawDisplayHandle,
        window_handle: RawWindowHandle,
    ) -> Result<vk::SurfaceKHR> {
        let owned = self.instance(instance)?;
        // SAFETY: The window handles are alive for as long as the window is, which outlives
        // the surface.
        unsafe {
            ash_window::create_surface(
                &self.entry,
                &owned.handle,
                display_handle,
                window_handle,
                None,
            )
        }
        .context("failed to create surface")
    }

    fn destroy_surface(&mut self, instance: vk::Instance, surface: vk::SurfaceKHR) {
        match self.instance(instance) {
            // SAFETY: The swapchain presenting to this surface has already been destroyed.
            Ok(owned) => unsafe { owned.surface.destroy_surface(surface, None) },
            Err(err) => tracing::error!("failed to destroy surface: {err}"),
        }
    }

    fn physical_devices(&self, instance: vk::Instance) -> Result<Vec<vk::PhysicalDevice>> {
        let owned = self.instance(instance)?;
        unsafe { owned.enumerate_physical_devices() }
            .context("failed to enumerate physical devices")
    }

    fn physical_device_name(&self, physical_device: vk::PhysicalDevice) -> Result<String> {
        let instance = self.physical_instance()?;
        let properties = unsafe { instance.get_physical_device_properties(physical_device) };
        Ok(to_cstring(&properties.device_name)
            .to_string_lossy()
            .to_string())
    }

    fn queue_families(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Vec<vk::QueueFamilyProperties>> {
        let instance = self.physical_instance()?;
        Ok(unsafe { instance.get_physical_device_queue_family_properties(physical_device) })
    }

    fn surface_support(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        surface: vk::SurfaceKHR,
    ) -> Result<bool> {
        let instance = self.physical_instance()?;
        unsafe {
            instance.surface.get_physical_device_surface_support(
                physical_device,
                queue_family_index,
                surface,
            )
        }
        .context("failed to query for surface support")
    }

    fn device_extensions(&self, physical_device: vk::PhysicalDevice) -> Result<Vec<CString>> {
        let instance = self.physical_instance()?;
        let properties = unsafe { instance.enumerate_device_extension_properties(physical_device) }
            .context("failed to enumerate device extensions")?;
        Ok(properties
            .iter()
            .map(|property| to_cstring(&property.extension_name))
            .collect())
    }

    fn surface_capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<vk::SurfaceCapabilitiesKHR> {
        let instance = self.physical_instance()?;
        unsafe {
            instance
                .surface
                .get_physical_device_surface_capabilities(physical_device, surface)
        }
        .context("failed to query for surface capabilities")
    }

    fn surface_formats(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<Vec<vk::SurfaceFormatKHR>> {
        let instance = self.physical_instance()?;
        unsafe {
            instance
                .surface
                .get_physical_device_surface_formats(physical_device, surface)
        }
        .context("failed to query for surface formats")
    }

    fn surface_present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<Vec<vk::PresentModeKHR>> {
        let instance = self.physical_instance()?;
        unsafe {
            instance
                .surface
                .get_physical_device_surface_present_modes(physical_device, surface)
        }
        .context("failed to query for surface present modes")
    }

    fn create_device(
        &mut self,
        physical_device: vk::PhysicalDevice,
        create_info: &vk::DeviceCreateInfo,
    ) -> Result<vk::Device> {
        if self.device.is_some() {
            bail!("logical device has already been created");
        }
        let instance = self.physical_instance()?;

        // SAFETY: The caller builds create_info with valid lifetimes for this call.
        let device = unsafe { instance.create_device(physical_device, create_info, None) }
            .context("failed to create logical device")?;
        let swapchain = khr::Swapchain::new(&instance.handle, &device);
        let handle = device.handle();
        self.device = Some(Device {
            handle: device,
            swapchain,
        });

        Ok(handle)
    }

    fn device_queue(
        &self,
        device: vk::Device,
        queue_family_index: u32,
        queue_index: u32,
    ) -> Result<vk::Queue> {
        let device = self.device(device)?;
        Ok(unsafe { device.get_device_queue(queue_family_index, queue_index) })
    }

    fn destroy_device(&mut self, device: vk::Device) {
        if let Err(err) = self.device(device) {
            tracing::error!("failed to destroy logical device: {err}");
            return;
        }
        if let Some(owned) = self.device.take() {
            // SAFETY: Every child object has been destroyed by the caller.
            unsafe { owned.handle.destroy_device(None) };
        }
    }

    fn create_swapchain(
        &mut self,
        device: vk::Device,
        create_info: &vk::SwapchainCreateInfoKHR,
    ) -> Result<vk::SwapchainKHR> {
        let device = self.device(device)?;
        // SAFETY: The caller builds create_info with valid lifetimes for this call.
        unsafe { device.swapchain.create_swapchain(create_info, None) }
            .context("failed to create swapchain")
    }

    fn swapchain_images(
        &self,
        device: vk::Device,
        swapchain: vk::SwapchainKHR,
    ) -> Result<Vec<vk::Image>> {
        let device = self.device(device)?;
        unsafe { device.swapchain.get_swapchain_images(swapchain) }
            .context("failed to get swapchain images")
    }

    fn destroy_swapchain(&mut self, device: vk::Device, swapchain: vk::SwapchainKHR) {
        self.destroy_with(device, "swapchain", |device| unsafe {
            device.swapchain.destroy_swapchain(swapchain, None);
        });
    }

    fn create_image_view(
        &mut self,
        device: vk::Device,
        create_info: &vk::ImageViewCreateInfo,
    ) -> Result<vk::ImageView> {
        let device = self.device(device)?;
        unsafe { device.create_image_view(create_info, None) }
            .context("failed to create image view")
    }

    fn destroy_image_view(&mut self, device: vk::Device, image_view: vk::ImageView) {
        self.destroy_with(device, "image view", |device| unsafe {
            device.destroy_image_view(image_view, None);
        });
    }

    fn create_shader_module(
        &mut self,
        device: vk::Device,
        create_info: &vk::ShaderModuleCreateInfo,
    ) -> Result<vk::ShaderModule> {
        let device = self.device(device)?;
        unsafe { device.create_shader_module(create_info, None) }
            .context("failed to create shader module")
    }

    fn destroy_shader_module(&mut self, device: vk::Device, shader_module: vk::ShaderModule) {
        self.destroy_with(device, "shader module", |device| unsafe {
            device.destroy_shader_module(shader_module, None);
        });
    }

    fn create_render_pass(
        &mut self,
        device: vk::Device,
        create_info: &vk::RenderPassCreateInfo,
    ) -> Result<vk::RenderPass> {
        let device = self.device(device)?;
        unsafe { device.create_render_pass(create_info, None) }
            .context("failed to create render pass")
    }

    fn destroy_render_pass(&mut self, device: vk::Device, render_pass: vk::RenderPass) {
        self.destroy_with(device, "render pass", |device| unsafe {
            device.destroy_render_pass(render_pass, None);
        });
    }

    fn create_pipeline_layout(
        &mut self,
        device: vk::Device,
        create_info: &vk::PipelineLayoutCreateInfo,
    ) -> Result<vk::PipelineLayout> {
        let device = self.device(device)?;
        unsafe { device.create_pipeline_layout(create_info, None) }
            .context("failed to create graphics pipeline layout")
    }

    fn destroy_pipeline_layout(&mut self, device: vk::Device, layout: vk::PipelineLayout) {
        self.destroy_with(device, "pipeline layout", |device| unsafe {
            device.destroy_pipeline_layout(layout, None);
        });
    }

    fn create_graphics_pipeline(
        &mut self,
        device: vk::Device,
        create_info: &vk::GraphicsPipelineCreateInfo,
    ) -> Result<vk::Pipeline> {
        let device = self.device(device)?;
        unsafe {
            device.create_graphics_pipelines(
                vk::PipelineCache::null(),
                slice::from_ref(create_info),
                None,
            )
        }
        .map_err(|(_, err)| err)
        .context("failed to create graphics pipeline")?
        .into_iter()
        .next()
        .context("no graphics pipelines were created")
    }

    fn destroy_pipeline(&mut self, device: vk::Device, pipeline: vk::Pipeline) {
        self.destroy_with(device, "pipeline", |device| unsafe {
            device.destroy_pipeline(pipeline, None);
        });
    }
}
