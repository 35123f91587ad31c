//! Vulkan swapchain.

use crate::{
    lifecycle::{Resource, TeardownStack},
    render::{
        device::{LogicalDevice, QueueFamilies, SwapchainSupport},
        Driver,
    },
    window::PhysicalSize,
    Error, Result,
};
use anyhow::Context;
use ash::vk;

/// The surface format chosen whenever the surface advertises it.
pub const PREFERRED_SURFACE_FORMAT: vk::SurfaceFormatKHR = vk::SurfaceFormatKHR {
    format: vk::Format::B8G8R8A8_SRGB,
    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
};

/// Surface capabilities of one device for one surface, queried fresh when a swapchain is built.
#[derive(Debug, Clone)]
#[must_use]
pub struct SurfaceCapabilitiesSnapshot {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub support: SwapchainSupport,
}

impl SurfaceCapabilitiesSnapshot {
    pub(crate) fn query<D: Driver + ?Sized>(
        driver: &D,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            capabilities: driver.surface_capabilities(physical_device, surface)?,
            support: SwapchainSupport::query(driver, physical_device, surface)?,
        })
    }
}

/// Select the preferred sRGB format, falling back to the first advertised format.
#[must_use]
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .find(|surface_format| {
            surface_format.format == PREFERRED_SURFACE_FORMAT.format
                && surface_format.color_space == PREFERRED_SURFACE_FORMAT.color_space
        })
        .or_else(|| formats.first())
        .copied()
}

/// Select [`vk::PresentModeKHR::FIFO`], the only mode every implementation must support.
#[must_use]
pub fn choose_present_mode(_present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    vk::PresentModeKHR::FIFO
}

/// Select the swapchain extent.
///
/// A current width of `u32::MAX` means the surface size is decided by the swapchain, in which
/// case the drawable size is clamped into the supported bounds. Inverted bounds resolve to the
/// maximum.
#[must_use]
pub fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    drawable_size: PhysicalSize<u32>,
) -> vk::Extent2D {
    if capabilities.current_extent.width == u32::MAX {
        let min = capabilities.min_image_extent;
        let max = capabilities.max_image_extent;
        vk::Extent2D {
            width: drawable_size.width.max(min.width).min(max.width),
            height: drawable_size.height.max(min.height).min(max.height),
        }
    } else {
        capabilities.current_extent
    }
}

/// Select the minimum image count, clamped down to the maximum. A maximum of `0` is unbounded.
#[must_use]
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let min_image_count = capabilities.min_image_count;
    if capabilities.max_image_count > 0 && min_image_count > capabilities.max_image_count {
        capabilities.max_image_count
    } else {
        min_image_count
    }
}

/// Select image sharing mode, concurrent across both families when they differ.
#[must_use]
pub fn sharing_mode(queue_families: QueueFamilies) -> (vk::SharingMode, Vec<u32>) {
    if queue_families.is_shared() {
        (vk::SharingMode::EXCLUSIVE, vec![])
    } else {
        (vk::SharingMode::CONCURRENT, queue_families.unique())
    }
}

/// The negotiated swapchain, its images, and the views created for them.
#[derive(Debug, Clone)]
#[must_use]
pub struct SwapchainDescriptor {
    pub handle: vk::SwapchainKHR,
    pub format: vk::SurfaceFormatKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub image_count: u32,
    pub images: Vec<vk::Image>,
    pub image_views: Vec<vk::ImageView>,
}

/// Create a [`vk::SwapchainKHR`] and retrieve its images.
pub(crate) fn create_swapchain<D: Driver + ?Sized>(
    driver: &mut D,
    device: &LogicalDevice,
    physical_device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    drawable_size: PhysicalSize<u32>,
    teardown: &mut TeardownStack,
) -> Result<SwapchainDescriptor> {
    tracing::debug!("creating swapchain");

    let snapshot = SurfaceCapabilitiesSnapshot::query(&*driver, physical_device, surface)
        .map_err(Error::SwapchainCreation)?;
    let capabilities = &snapshot.capabilities;

    let surface_format = choose_surface_format(&snapshot.support.formats)
        .context("failed to find a valid swapchain format")
        .map_err(Error::SwapchainCreation)?;
    let present_mode = choose_present_mode(&snapshot.support.present_modes);
    let image_extent = choose_extent(capabilities, drawable_size);
    let image_count = choose_image_count(capabilities);
    let (image_sharing_mode, queue_family_indices) = sharing_mode(device.queue_families);

    tracing::debug!(
        "swapchain format: {surface_format:?}, present mode: {present_mode:?}, extent: {image_extent:?}, image count: {image_count}, sharing mode: {image_sharing_mode:?}"
    );

    let swapchain_create_info = vk::SwapchainCreateInfoKHR::builder()
        .surface(surface)
        .min_image_count(image_count)
        .image_color_space(surface_format.color_space)
        .image_format(surface_format.format)
        .image_extent(image_extent)
        .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
        .image_sharing_mode(image_sharing_mode)
        .queue_family_indices(&queue_family_indices)
        .pre_transform(capabilities.current_transform)
        .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
        .present_mode(present_mode)
        .clipped(true)
        .image_array_layers(1);

    let swapchain = driver
        .create_swapchain(device.handle, &swapchain_create_info)
        .map_err(Error::SwapchainCreation)?;
    teardown.push(Resource::Swapchain(device.handle, swapchain));

    let images = driver
        .swapchain_images(device.handle, swapchain)
        .map_err(Error::SwapchainCreation)?;

    tracing::debug!("created swapchain with {} images successfully", images.len());

    Ok(SwapchainDescriptor {
        handle: swapchain,
        format: surface_format,
        present_mode,
        extent: image_extent,
        image_count,
        images,
        image_views: vec![],
    })
}

/// Create one color [`vk::ImageView`] per swapchain image.
pub(crate) fn create_image_views<D: Driver + ?Sized>(
    driver: &mut D,
    device: vk::Device,
    swapchain: &mut SwapchainDescriptor,
    teardown: &mut TeardownStack,
) -> Result<()> {
    tracing::debug!("creating swapchain image views");

    let mut image_views = Vec::with_capacity(swapchain.images.len());
    for &image in &swapchain.images {
        let image_view_create_info = vk::ImageViewCreateInfo::builder()
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(swapchain.format.format)
            .components(vk::ComponentMapping::default())
            .subresource_range(
                vk::ImageSubresourceRange::builder()
                    .aspect_mask(vk::ImageAspectFlags::COLOR)
                    .base_mip_level(0)
                    .level_count(1)
                    .base_array_layer(0)
                    .layer_count(1)
                    .build(),
            )
            .image(image);
        let image_view = driver
            .create_image_view(device, &image_view_create_info)
            .map_err(Error::ImageViewCreation)?;
        teardown.push(Resource::ImageView(device, image_view));
        image_views.push(image_view);
    }
    swapchain.image_views = image_views;

    tracing::debug!("created swapchain image views successfully");

    Ok(())
}
