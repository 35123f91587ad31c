//! Vulkan devices.

use crate::{
    lifecycle::{Resource, TeardownStack},
    render::{capability, Driver},
    Error, Result,
};
use ash::vk;
use std::ffi::{CStr, CString};

/// Queue family indices found on a physical device, which may not have been found yet.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub present: Option<u32>,
}

impl QueueFamilyIndices {
    /// Scan the queue families of `physical_device` for the first family with the graphics bit
    /// and, independently, the first family able to present to `surface`.
    pub(crate) fn find<D: Driver + ?Sized>(
        driver: &D,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> anyhow::Result<Self> {
        let queue_families = driver.queue_families(physical_device)?;

        let mut indices = Self::default();
        for (index, queue_family) in (0..).zip(queue_families.iter()) {
            if indices.graphics.is_none()
                && queue_family.queue_count > 0
                && queue_family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
            {
                indices.graphics = Some(index);
            }
            if indices.present.is_none() && driver.surface_support(physical_device, index, surface)? {
                indices.present = Some(index);
            }
            if indices.is_complete() {
                break;
            }
        }

        Ok(indices)
    }

    /// Whether both a graphics and a present family were found.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.present.is_some()
    }

    /// The resolved families, or `None` if either is missing.
    #[inline]
    #[must_use]
    pub fn complete(&self) -> Option<QueueFamilies> {
        Some(QueueFamilies {
            graphics: self.graphics?,
            present: self.present?,
        })
    }
}

/// The graphics and present queue families of a selected device.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub struct QueueFamilies {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilies {
    /// Whether graphics and present are the same family.
    #[inline]
    #[must_use]
    pub fn is_shared(&self) -> bool {
        self.graphics == self.present
    }

    /// Distinct family indices, graphics first.
    #[must_use]
    pub fn unique(&self) -> Vec<u32> {
        if self.is_shared() {
            vec![self.graphics]
        } else {
            vec![self.graphics, self.present]
        }
    }
}

/// Surface formats and present modes a device supports for a surface.
#[derive(Default, Debug, Clone)]
#[must_use]
pub struct SwapchainSupport {
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupport {
    /// Queries a [`vk::PhysicalDevice`] for [`vk::SwapchainKHR`] support.
    pub(crate) fn query<D: Driver + ?Sized>(
        driver: &D,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            formats: driver.surface_formats(physical_device, surface)?,
            present_modes: driver.surface_present_modes(physical_device, surface)?,
        })
    }

    /// At least one format and one present mode are available.
    #[inline]
    #[must_use]
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// A physical device along with the facts that decide whether it is suitable.
#[derive(Debug, Clone)]
#[must_use]
pub struct PhysicalDeviceDescriptor {
    pub handle: vk::PhysicalDevice,
    pub name: String,
    pub queue_family_indices: QueueFamilyIndices,
    pub missing_extensions: Vec<CString>,
    pub swapchain_support: SwapchainSupport,
}

impl PhysicalDeviceDescriptor {
    /// Query the suitability facts of `physical_device` against `surface`.
    pub(crate) fn query<D: Driver + ?Sized>(
        driver: &D,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        required_extensions: &[&CStr],
    ) -> anyhow::Result<Self> {
        let name = driver.physical_device_name(physical_device)?;
        let queue_family_indices = QueueFamilyIndices::find(driver, physical_device, surface)?;
        let available_extensions = driver.device_extensions(physical_device)?;
        let missing_extensions = capability::missing(&available_extensions, required_extensions)
            .into_iter()
            .map(CStr::to_owned)
            .collect();
        let swapchain_support = SwapchainSupport::query(driver, physical_device, surface)?;

        Ok(Self {
            handle: physical_device,
            name,
            queue_family_indices,
            missing_extensions,
            swapchain_support,
        })
    }

    /// Complete queue families, every required extension, and an adequate swapchain.
    #[must_use]
    pub fn is_suitable(&self) -> bool {
        self.queue_family_indices.is_complete()
            && self.missing_extensions.is_empty()
            && self.swapchain_support.is_adequate()
    }

    #[inline]
    #[must_use]
    pub fn queue_families(&self) -> Option<QueueFamilies> {
        self.queue_family_indices.complete()
    }
}

/// Select the first suitable physical device in enumeration order.
pub(crate) fn pick_physical_device<D: Driver + ?Sized>(
    driver: &D,
    instance: vk::Instance,
    surface: vk::SurfaceKHR,
    required_extensions: &[&CStr],
) -> Result<PhysicalDeviceDescriptor> {
    tracing::debug!("selecting physical device");

    let physical_devices = driver
        .physical_devices(instance)
        .map_err(Error::CapabilityQuery)?;
    if physical_devices.is_empty() {
        return Err(Error::NoGpuFound);
    }

    for physical_device in physical_devices {
        let descriptor =
            PhysicalDeviceDescriptor::query(driver, physical_device, surface, required_extensions)
                .map_err(Error::CapabilityQuery)?;
        if descriptor.is_suitable() {
            tracing::debug!("selected physical device `{}`", descriptor.name);
            return Ok(descriptor);
        }
        tracing::warn!(
            "device `{}` does not meet minimum device requirements: queue families: {:?}, missing extensions: {:?}, swapchain support: {}",
            descriptor.name,
            descriptor.queue_family_indices,
            descriptor.missing_extensions,
            descriptor.swapchain_support.is_adequate(),
        );
    }

    Err(Error::NoSuitableGpu)
}

/// A logical device and its graphics and present queues.
///
/// The queues are the same handle when both roles share a family.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub struct LogicalDevice {
    pub handle: vk::Device,
    pub queue_families: QueueFamilies,
    pub graphics_queue: vk::Queue,
    pub present_queue: vk::Queue,
}

/// Create a logical [`vk::Device`] with one queue per unique family.
pub(crate) fn create_logical_device<D: Driver + ?Sized>(
    driver: &mut D,
    physical_device: vk::PhysicalDevice,
    queue_families: QueueFamilies,
    required_extensions: &[&CStr],
    validation_layer: Option<&CStr>,
    teardown: &mut TeardownStack,
) -> Result<LogicalDevice> {
    tracing::debug!("creating logical device");

    let queue_priorities = [1.0];
    let queue_create_infos = queue_families
        .unique()
        .iter()
        .map(|&index| {
            vk::DeviceQueueCreateInfo::builder()
                .queue_family_index(index)
                .queue_priorities(&queue_priorities)
                .build()
        })
        .collect::<Vec<vk::DeviceQueueCreateInfo>>();
    let enabled_features = vk::PhysicalDeviceFeatures::default();
    let enabled_layer_names = validation_layer
        .iter()
        .map(|name| name.as_ptr())
        .collect::<Vec<_>>();
    let enabled_extension_names = required_extensions
        .iter()
        .map(|name| name.as_ptr())
        .collect::<Vec<_>>();
    let device_create_info = vk::DeviceCreateInfo::builder()
        .queue_create_infos(&queue_create_infos)
        .enabled_features(&enabled_features)
        .enabled_layer_names(&enabled_layer_names)
        .enabled_extension_names(&enabled_extension_names);

    let device = driver
        .create_device(physical_device, &device_create_info)
        .map_err(Error::DeviceCreation)?;
    teardown.push(Resource::Device(device));

    let graphics_queue = driver
        .device_queue(device, queue_families.graphics, 0)
        .map_err(Error::DeviceCreation)?;
    let present_queue = if queue_families.is_shared() {
        graphics_queue
    } else {
        driver
            .device_queue(device, queue_families.present, 0)
            .map_err(Error::DeviceCreation)?
    };

    tracing::debug!("created logical device successfully");

    Ok(LogicalDevice {
        handle: device,
        queue_families,
        graphics_queue,
        present_queue,
    })
}
