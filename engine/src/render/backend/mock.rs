//! A recording [`Driver`] and [`WindowSystem`] for exercising the bootstrap sequence without a GPU.
//!
//! Both record into a shared [`CallLog`] so window and driver calls can be checked for ordering
//! together.

use super::Driver;
use crate::{
    config::{ShaderPaths, WindowConfig},
    event::Event,
    platform,
    window::{PhysicalSize, WindowSystem},
};
use anyhow::{bail, Context, Result};
use ash::{
    extensions::{ext, khr},
    vk::{self, Handle},
};
use raw_window_handle::{
    RawDisplayHandle, RawWindowHandle, XlibDisplayHandle, XlibWindowHandle,
};
use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    ffi::{c_char, CStr, CString},
    fs,
    path::Path,
    rc::Rc,
    slice,
};

pub(crate) const SPIRV_MAGIC: u32 = 0x0723_0203;

/// A minimal SPIR-V header: magic, version 1.0, generator, bound and schema.
pub(crate) fn spirv_bytes() -> Vec<u8> {
    [SPIRV_MAGIC, 0x0001_0000, 0, 1, 0]
        .iter()
        .flat_map(|word| word.to_le_bytes())
        .collect()
}

/// Write vertex and fragment bytecode into `dir`.
pub(crate) fn write_shaders(dir: &Path) -> ShaderPaths {
    let paths = ShaderPaths::new(dir.join("shader.vert.spv"), dir.join("shader.frag.spv"));
    for path in [&paths.vertex, &paths.fragment] {
        fs::write(path, spirv_bytes()).expect("shader written");
    }
    paths
}

/// The kind of object created or destroyed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Kind {
    Window,
    Instance,
    DebugMessenger,
    Surface,
    Device,
    Swapchain,
    ImageView,
    ShaderModule,
    RenderPass,
    PipelineLayout,
    Pipeline,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Create(Kind, u64),
    Destroy(Kind, u64),
    /// A physical device level query.
    Query(&'static str),
}

pub(crate) type CallLog = Rc<RefCell<Vec<Call>>>;

/// Creation calls from `log` in order.
pub(crate) fn creations(log: &CallLog) -> Vec<(Kind, u64)> {
    log.borrow()
        .iter()
        .filter_map(|call| match *call {
            Call::Create(kind, id) => Some((kind, id)),
            _ => None,
        })
        .collect()
}

/// Destruction calls from `log` in order.
pub(crate) fn destructions(log: &CallLog) -> Vec<(Kind, u64)> {
    log.borrow()
        .iter()
        .filter_map(|call| match *call {
            Call::Destroy(kind, id) => Some((kind, id)),
            _ => None,
        })
        .collect()
}

/// A synthetic physical device.
#[derive(Debug, Clone)]
pub(crate) struct MockGpu {
    pub(crate) name: String,
    pub(crate) queue_families: Vec<vk::QueueFlags>,
    pub(crate) present_families: Vec<u32>,
    pub(crate) extensions: Vec<CString>,
    pub(crate) capabilities: vk::SurfaceCapabilitiesKHR,
    pub(crate) formats: Vec<vk::SurfaceFormatKHR>,
    pub(crate) present_modes: Vec<vk::PresentModeKHR>,
}

impl MockGpu {
    /// A device with a single queue family supporting graphics and present.
    pub(crate) fn discrete(name: &str) -> Self {
        Self {
            name: name.to_string(),
            queue_families: vec![vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER],
            present_families: vec![0],
            extensions: platform::REQUIRED_DEVICE_EXTENSIONS
                .iter()
                .map(|&name| name.to_owned())
                .collect(),
            capabilities: vk::SurfaceCapabilitiesKHR {
                min_image_count: 2,
                max_image_count: 8,
                current_extent: vk::Extent2D {
                    width: 1280,
                    height: 720,
                },
                min_image_extent: vk::Extent2D {
                    width: 1,
                    height: 1,
                },
                max_image_extent: vk::Extent2D {
                    width: 4096,
                    height: 4096,
                },
                max_image_array_layers: 1,
                current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
                ..Default::default()
            },
            formats: vec![
                vk::SurfaceFormatKHR {
                    format: vk::Format::B8G8R8A8_UNORM,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
                vk::SurfaceFormatKHR {
                    format: vk::Format::B8G8R8A8_SRGB,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
            ],
            present_modes: vec![vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::FIFO],
        }
    }

    /// A device whose only queue family supports graphics but can not present.
    pub(crate) fn graphics_only(name: &str) -> Self {
        Self {
            present_families: vec![],
            ..Self::discrete(name)
        }
    }

    /// A device with separate graphics and present queue families.
    pub(crate) fn split_queues(name: &str) -> Self {
        Self {
            queue_families: vec![vk::QueueFlags::GRAPHICS, vk::QueueFlags::TRANSFER],
            present_families: vec![1],
            ..Self::discrete(name)
        }
    }

    pub(crate) fn without_extensions(mut self) -> Self {
        self.extensions.clear();
        self
    }

    pub(crate) fn without_formats(mut self) -> Self {
        self.formats.clear();
        self
    }
}

/// Fields of the create-infos passed to the driver that tests assert on.
#[derive(Debug, Default, Clone)]
pub(crate) struct Recorded {
    pub(crate) instance_extensions: Vec<CString>,
    pub(crate) instance_layers: Vec<CString>,
    pub(crate) instance_flags: vk::InstanceCreateFlags,
    pub(crate) api_version: u32,
    pub(crate) debug_chained: bool,
    pub(crate) messenger_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    pub(crate) messenger_type: vk::DebugUtilsMessageTypeFlagsEXT,
    pub(crate) device_queue_families: Vec<u32>,
    pub(crate) device_queue_priorities: Vec<f32>,
    pub(crate) device_extensions: Vec<CString>,
    pub(crate) device_layers: Vec<CString>,
    pub(crate) swapchain: Option<vk::SwapchainCreateInfoKHR>,
    pub(crate) swapchain_queue_families: Vec<u32>,
    pub(crate) image_view_images: Vec<vk::Image>,
    pub(crate) render_pass_attachments: Vec<vk::AttachmentDescription>,
    pub(crate) render_pass_dependencies: Vec<vk::SubpassDependency>,
    pub(crate) pipeline_stages: Vec<vk::ShaderStageFlags>,
    pub(crate) pipeline_dynamic_states: Vec<vk::DynamicState>,
    pub(crate) pipeline_vertex_attributes: u32,
    pub(crate) pipeline_topology: Option<vk::PrimitiveTopology>,
    pub(crate) pipeline_cull_mode: Option<vk::CullModeFlags>,
    pub(crate) pipeline_front_face: Option<vk::FrontFace>,
    pub(crate) pipeline_subpass: Option<u32>,
    pub(crate) pipeline_base_index: Option<i32>,
}

/// A [`Driver`] over synthetic physical devices that records every call.
#[derive(Debug)]
pub(crate) struct MockDriver {
    log: CallLog,
    next_id: u64,
    created: HashMap<Kind, usize>,
    pub(crate) instance_extensions: Vec<CString>,
    pub(crate) instance_layers: Vec<CString>,
    pub(crate) gpus: Vec<MockGpu>,
    /// Fail the n-th (zero-based) creation of this kind.
    pub(crate) failure: Option<(Kind, usize)>,
    pub(crate) debug_entry_point: bool,
    /// Number of images returned for the swapchain, defaulting to the requested minimum.
    pub(crate) returned_images: Option<u32>,
    pub(crate) recorded: Recorded,
    swapchain_image_count: u32,
}

impl MockDriver {
    /// A driver exposing `gpus`, with every instance extension and layer this platform could ask
    /// for installed.
    pub(crate) fn new(log: &CallLog, gpus: Vec<MockGpu>) -> Self {
        let mut instance_extensions = vec![
            khr::Surface::name().to_owned(),
            ext::DebugUtils::name().to_owned(),
            vk::KhrPortabilityEnumerationFn::name().to_owned(),
            vk::KhrGetPhysicalDeviceProperties2Fn::name().to_owned(),
        ];
        instance_extensions.extend(MockWindow::surface_extensions());
        Self {
            log: Rc::clone(log),
            next_id: 0,
            created: HashMap::new(),
            instance_extensions,
            instance_layers: vec![crate::config::VALIDATION_LAYER_NAME.to_owned()],
            gpus,
            failure: None,
            debug_entry_point: true,
            returned_images: None,
            recorded: Recorded::default(),
            swapchain_image_count: 0,
        }
    }

    pub(crate) fn fail_on(mut self, kind: Kind) -> Self {
        self.failure = Some((kind, 0));
        self
    }

    pub(crate) fn fail_on_nth(mut self, kind: Kind, n: usize) -> Self {
        self.failure = Some((kind, n));
        self
    }

    fn create<T: Handle>(&mut self, kind: Kind) -> Result<T> {
        let count = self.created.entry(kind).or_default();
        let attempt = *count;
        *count += 1;
        if self.failure == Some((kind, attempt)) {
            bail!("simulated {kind:?} creation failure");
        }
        self.next_id += 1;
        self.log.borrow_mut().push(Call::Create(kind, self.next_id));
        Ok(T::from_raw(self.next_id))
    }

    fn destroy(&mut self, kind: Kind, handle: impl Handle) {
        self.log
            .borrow_mut()
            .push(Call::Destroy(kind, handle.as_raw()));
    }

    fn query(&self, name: &'static str) {
        self.log.borrow_mut().push(Call::Query(name));
    }

    fn gpu(&self, physical_device: vk::PhysicalDevice) -> Result<&MockGpu> {
        let index = physical_device
            .as_raw()
            .checked_sub(1)
            .context("null physical device")?;
        usize::try_from(index)
            .ok()
            .and_then(|index| self.gpus.get(index))
            .context("unknown physical device")
    }
}

/// Read a pointer and count pair from a create-info as a slice.
///
/// # Safety
///
/// `ptr` must be null or valid for `len` reads.
unsafe fn from_raw_parts<'a, T>(ptr: *const T, len: u32) -> &'a [T] {
    if ptr.is_null() || len == 0 {
        &[]
    } else {
        slice::from_raw_parts(ptr, len as usize)
    }
}

/// Read an array of C string pointers as owned names.
///
/// # Safety
///
/// `names` must be null or valid for `len` reads of nul-terminated strings.
unsafe fn names(names: *const *const c_char, len: u32) -> Vec<CString> {
    from_raw_parts(names, len)
        .iter()
        .map(|&name| CStr::from_ptr(name).to_owned())
        .collect()
}

impl Driver for MockDriver {
    fn instance_extensions(&self) -> Result<Vec<CString>> {
        Ok(self.instance_extensions.clone())
    }

    fn instance_layers(&self) -> Result<Vec<CString>> {
        Ok(self.instance_layers.clone())
    }

    fn create_instance(&mut self, create_info: &vk::InstanceCreateInfo) -> Result<vk::Instance> {
        // SAFETY: create_info is built by the caller with valid lifetimes for this call.
        unsafe {
            self.recorded.instance_extensions = names(
                create_info.pp_enabled_extension_names,
                create_info.enabled_extension_count,
            );
            self.recorded.instance_layers = names(
                create_info.pp_enabled_layer_names,
                create_info.enabled_layer_count,
            );
            if let Some(application_info) = create_info.p_application_info.as_ref() {
                self.recorded.api_version = application_info.api_version;
            }
            let next = create_info.p_next.cast::<vk::BaseInStructure>();
            self.recorded.debug_chained = next.as_ref().map_or(false, |next| {
                next.s_type == vk::StructureType::DEBUG_UTILS_MESSENGER_CREATE_INFO_EXT
            });
        }
        self.recorded.instance_flags = create_info.flags;
        self.create(Kind::Instance)
    }

    fn destroy_instance(&mut self, instance: vk::Instance) {
        self.destroy(Kind::Instance, instance);
    }

    fn create_debug_messenger(
        &mut self,
        _instance: vk::Instance,
        create_info: &vk::DebugUtilsMessengerCreateInfoEXT,
    ) -> Result<vk::DebugUtilsMessengerEXT> {
        if !self.debug_entry_point {
            bail!("vkCreateDebugUtilsMessengerEXT could not be resolved from the instance");
        }
        self.recorded.messenger_severity = create_info.message_severity;
        self.recorded.messenger_type = create_info.message_type;
        self.create(Kind::DebugMessenger)
    }

    fn destroy_debug_messenger(
        &mut self,
        _instance: vk::Instance,
        messenger: vk::DebugUtilsMessengerEXT,
    ) {
        self.destroy(Kind::DebugMessenger, messenger);
    }

    fn create_surface(
        &mut self,
        _instance: vk::Instance,
        _display_handle: RawDisplayHandle,
        _window_handle: RawWindowHandle,
    ) -> Result<vk::SurfaceKHR> {
        self.create(Kind::Surface)
    }

    fn destroy_surface(&mut self, _instance: vk::Instance, surface: vk::SurfaceKHR) {
        self.destroy(Kind::Surface, surface);
    }

    fn physical_devices(&self, _instance: vk::Instance) -> Result<Vec<vk::PhysicalDevice>> {
        Ok((1..=self.gpus.len() as u64)
            .map(vk::PhysicalDevice::from_raw)
            .collect())
    }

    fn physical_device_name(&self, physical_device: vk::PhysicalDevice) -> Result<String> {
        self.query("physical_device_name");
        Ok(self.gpu(physical_device)?.name.clone())
    }

    fn queue_families(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Vec<vk::QueueFamilyProperties>> {
        self.query("queue_families");
        Ok(self
            .gpu(physical_device)?
            .queue_families
            .iter()
            .map(|&queue_flags| vk::QueueFamilyProperties {
                queue_flags,
                queue_count: 1,
                ..Default::default()
            })
            .collect())
    }

    fn surface_support(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        _surface: vk::SurfaceKHR,
    ) -> Result<bool> {
        self.query("surface_support");
        Ok(self
            .gpu(physical_device)?
            .present_families
            .contains(&queue_family_index))
    }

    fn device_extensions(&self, physical_device: vk::PhysicalDevice) -> Result<Vec<CString>> {
        self.query("device_extensions");
        Ok(self.gpu(physical_device)?.extensions.clone())
    }

    fn surface_capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> Result<vk::SurfaceCapabilitiesKHR> {
        self.query("surface_capabilities");
        Ok(self.gpu(physical_device)?.capabilities)
    }

    fn surface_formats(
        &self,
        physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> Result<Vec<vk::SurfaceFormatKHR>> {
        self.query("surface_formats");
        Ok(self.gpu(physical_device)?.formats.clone())
    }

    fn surface_present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> Result<Vec<vk::PresentModeKHR>> {
        self.query("surface_present_modes");
        Ok(self.gpu(physical_device)?.present_modes.clone())
    }

    fn create_device(
        &mut self,
        physical_device: vk::PhysicalDevice,
        create_info: &vk::DeviceCreateInfo,
    ) -> Result<vk::Device> {
        self.gpu(physical_device)?;
        // SAFETY: create_info is built by the caller with valid lifetimes for this call.
        unsafe {
            let queue_infos = from_raw_parts(
                create_info.p_queue_create_infos,
                create_info.queue_create_info_count,
            );
            self.recorded.device_queue_families = queue_infos
                .iter()
                .map(|info| info.queue_family_index)
                .collect();
            self.recorded.device_queue_priorities = queue_infos
                .iter()
                .flat_map(|info| from_raw_parts(info.p_queue_priorities, info.queue_count))
                .copied()
                .collect();
            self.recorded.device_extensions = names(
                create_info.pp_enabled_extension_names,
                create_info.enabled_extension_count,
            );
            self.recorded.device_layers = names(
                create_info.pp_enabled_layer_names,
                create_info.enabled_layer_count,
            );
        }
        self.create(Kind::Device)
    }

    fn device_queue(
        &self,
        _device: vk::Device,
        queue_family_index: u32,
        queue_index: u32,
    ) -> Result<vk::Queue> {
        Ok(vk::Queue::from_raw(
            0x1000 + u64::from(queue_family_index) * 0x10 + u64::from(queue_index),
        ))
    }

    fn destroy_device(&mut self, device: vk::Device) {
        self.destroy(Kind::Device, device);
    }

    fn create_swapchain(
        &mut self,
        _device: vk::Device,
        create_info: &vk::SwapchainCreateInfoKHR,
    ) -> Result<vk::SwapchainKHR> {
        // SAFETY: create_info is built by the caller with valid lifetimes for this call.
        self.recorded.swapchain_queue_families = unsafe {
            from_raw_parts(
                create_info.p_queue_family_indices,
                create_info.queue_family_index_count,
            )
        }
        .to_vec();
        self.recorded.swapchain = Some(vk::SwapchainCreateInfoKHR {
            p_queue_family_indices: std::ptr::null(),
            ..*create_info
        });
        self.swapchain_image_count = self
            .returned_images
            .unwrap_or(create_info.min_image_count);
        self.create(Kind::Swapchain)
    }

    fn swapchain_images(
        &self,
        _device: vk::Device,
        _swapchain: vk::SwapchainKHR,
    ) -> Result<Vec<vk::Image>> {
        Ok((0..u64::from(self.swapchain_image_count))
            .map(|index| vk::Image::from_raw(0x2000 + index))
            .collect())
    }

    fn destroy_swapchain(&mut self, _device: vk::Device, swapchain: vk::SwapchainKHR) {
        self.destroy(Kind::Swapchain, swapchain);
    }

    fn create_image_view(
        &mut self,
        _device: vk::Device,
        create_info: &vk::ImageViewCreateInfo,
    ) -> Result<vk::ImageView> {
        let image_view = self.create(Kind::ImageView)?;
        self.recorded.image_view_images.push(create_info.image);
        Ok(image_view)
    }

    fn destroy_image_view(&mut self, _device: vk::Device, image_view: vk::ImageView) {
        self.destroy(Kind::ImageView, image_view);
    }

    fn create_shader_module(
        &mut self,
        _device: vk::Device,
        create_info: &vk::ShaderModuleCreateInfo,
    ) -> Result<vk::ShaderModule> {
        // SAFETY: create_info is built by the caller with valid lifetimes for this call.
        let code = unsafe { from_raw_parts(create_info.p_code, (create_info.code_size / 4) as u32) };
        match code.first() {
            None => bail!("shader bytecode is empty"),
            Some(&magic) if magic != SPIRV_MAGIC => bail!("invalid SPIR-V magic number"),
            Some(_) => self.create(Kind::ShaderModule),
        }
    }

    fn destroy_shader_module(&mut self, _device: vk::Device, shader_module: vk::ShaderModule) {
        self.destroy(Kind::ShaderModule, shader_module);
    }

    fn create_render_pass(
        &mut self,
        _device: vk::Device,
        create_info: &vk::RenderPassCreateInfo,
    ) -> Result<vk::RenderPass> {
        // SAFETY: create_info is built by the caller with valid lifetimes for this call.
        unsafe {
            self.recorded.render_pass_attachments =
                from_raw_parts(create_info.p_attachments, create_info.attachment_count).to_vec();
            self.recorded.render_pass_dependencies =
                from_raw_parts(create_info.p_dependencies, create_info.dependency_count).to_vec();
        }
        self.create(Kind::RenderPass)
    }

    fn destroy_render_pass(&mut self, _device: vk::Device, render_pass: vk::RenderPass) {
        self.destroy(Kind::RenderPass, render_pass);
    }

    fn create_pipeline_layout(
        &mut self,
        _device: vk::Device,
        create_info: &vk::PipelineLayoutCreateInfo,
    ) -> Result<vk::PipelineLayout> {
        if create_info.set_layout_count != 0 || create_info.push_constant_range_count != 0 {
            bail!("unexpected pipeline layout contents");
        }
        self.create(Kind::PipelineLayout)
    }

    fn destroy_pipeline_layout(&mut self, _device: vk::Device, layout: vk::PipelineLayout) {
        self.destroy(Kind::PipelineLayout, layout);
    }

    fn create_graphics_pipeline(
        &mut self,
        _device: vk::Device,
        create_info: &vk::GraphicsPipelineCreateInfo,
    ) -> Result<vk::Pipeline> {
        // SAFETY: create_info is built by the caller with valid lifetimes for this call.
        unsafe {
            self.recorded.pipeline_stages =
                from_raw_parts(create_info.p_stages, create_info.stage_count)
                    .iter()
                    .map(|stage| stage.stage)
                    .collect();
            if let Some(dynamic_state) = create_info.p_dynamic_state.as_ref() {
                self.recorded.pipeline_dynamic_states = from_raw_parts(
                    dynamic_state.p_dynamic_states,
                    dynamic_state.dynamic_state_count,
                )
                .to_vec();
            }
            if let Some(vertex_input) = create_info.p_vertex_input_state.as_ref() {
                self.recorded.pipeline_vertex_attributes = vertex_input
                    .vertex_attribute_description_count
                    + vertex_input.vertex_binding_description_count;
            }
            if let Some(input_assembly) = create_info.p_input_assembly_state.as_ref() {
                self.recorded.pipeline_topology = Some(input_assembly.topology);
            }
            if let Some(rasterization) = create_info.p_rasterization_state.as_ref() {
                self.recorded.pipeline_cull_mode = Some(rasterization.cull_mode);
                self.recorded.pipeline_front_face = Some(rasterization.front_face);
            }
        }
        self.recorded.pipeline_subpass = Some(create_info.subpass);
        self.recorded.pipeline_base_index = Some(create_info.base_pipeline_index);
        self.create(Kind::Pipeline)
    }

    fn destroy_pipeline(&mut self, _device: vk::Device, pipeline: vk::Pipeline) {
        self.destroy(Kind::Pipeline, pipeline);
    }
}

/// A [`WindowSystem`] that replays a scripted event queue and records window creation.
#[derive(Debug)]
pub(crate) struct MockWindow {
    log: CallLog,
    pub(crate) fail_create: bool,
    pub(crate) size: PhysicalSize<u32>,
    pub(crate) events: VecDeque<Event>,
    pub(crate) polled: usize,
    window: Option<u64>,
}

impl MockWindow {
    pub(crate) fn new(log: &CallLog) -> Self {
        Self {
            log: Rc::clone(log),
            fail_create: false,
            size: PhysicalSize::new(1280, 720),
            events: VecDeque::new(),
            polled: 0,
            window: None,
        }
    }

    pub(crate) fn surface_extensions() -> Vec<CString> {
        vec![
            khr::Surface::name().to_owned(),
            khr::XlibSurface::name().to_owned(),
        ]
    }
}

impl WindowSystem for MockWindow {
    fn create_window(&mut self, config: &WindowConfig) -> Result<()> {
        if self.fail_create {
            bail!("simulated window creation failure");
        }
        self.size = config.size;
        self.window = Some(0);
        self.log.borrow_mut().push(Call::Create(Kind::Window, 0));
        Ok(())
    }

    fn required_surface_extensions(&self) -> Result<Vec<CString>> {
        Ok(Self::surface_extensions())
    }

    fn drawable_size(&self) -> PhysicalSize<u32> {
        self.size
    }

    fn raw_handles(&self) -> Option<(RawDisplayHandle, RawWindowHandle)> {
        self.window.map(|_| {
            (
                RawDisplayHandle::Xlib(XlibDisplayHandle::empty()),
                RawWindowHandle::Xlib(XlibWindowHandle::empty()),
            )
        })
    }

    /// Pops the next scripted event, reporting [`Event::Quit`] once the script is exhausted.
    fn poll_event(&mut self) -> Option<Event> {
        self.window?;
        self.polled += 1;
        Some(self.events.pop_front().unwrap_or(Event::Quit))
    }

    fn destroy_window(&mut self) {
        if let Some(id) = self.window.take() {
            self.log.borrow_mut().push(Call::Destroy(Kind::Window, id));
        }
    }
}
