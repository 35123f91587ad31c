//! Vulkan render pass and pipelines.

use crate::{
    lifecycle::{Resource, TeardownStack},
    render::{shader::ShaderModulePair, Driver},
    Error, Result,
};
use anyhow::Context;
use ash::vk;
use std::slice;

/// The render pass drawn into the swapchain images.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub struct RenderPassDescriptor {
    pub handle: vk::RenderPass,
    pub color_format: vk::Format,
}

/// The graphics pipeline, its layout, and the initial values for its dynamic state.
#[derive(Debug, Copy, Clone)]
#[must_use]
pub struct PipelineDescriptor {
    pub handle: vk::Pipeline,
    pub layout: vk::PipelineLayout,
    pub viewport: vk::Viewport,
    pub scissor: vk::Rect2D,
}

/// Create the primary [`vk::RenderPass`] instance with one color attachment.
pub(crate) fn create_render_pass<D: Driver + ?Sized>(
    driver: &mut D,
    device: vk::Device,
    color_format: vk::Format,
    teardown: &mut TeardownStack,
) -> Result<RenderPassDescriptor> {
    tracing::debug!("creating primary render pass");

    // Attachments
    let color_attachment = vk::AttachmentDescription::builder()
        .format(color_format)
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::STORE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)
        .build();

    // Subpasses
    let color_attachment_ref = vk::AttachmentReference::builder()
        .attachment(0)
        .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
        .build();
    let subpass = vk::SubpassDescription::builder()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(slice::from_ref(&color_attachment_ref))
        .build();

    // Dependencies
    let dependency = vk::SubpassDependency::builder()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .src_access_mask(vk::AccessFlags::empty())
        .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
        .build();

    // Create
    let render_pass_create_info = vk::RenderPassCreateInfo::builder()
        .attachments(slice::from_ref(&color_attachment))
        .subpasses(slice::from_ref(&subpass))
        .dependencies(slice::from_ref(&dependency));

    let render_pass = driver
        .create_render_pass(device, &render_pass_create_info)
        .map_err(Error::RenderPassCreation)?;
    teardown.push(Resource::RenderPass(device, render_pass));

    tracing::debug!("created primary render pass successfully");

    Ok(RenderPassDescriptor {
        handle: render_pass,
        color_format,
    })
}

/// Create an empty [`vk::PipelineLayout`] with no descriptor sets or push constants.
pub(crate) fn create_pipeline_layout<D: Driver + ?Sized>(
    driver: &mut D,
    device: vk::Device,
    teardown: &mut TeardownStack,
) -> Result<vk::PipelineLayout> {
    let layout_info = vk::PipelineLayoutCreateInfo::builder();
    let layout = driver
        .create_pipeline_layout(device, &layout_info)
        .map_err(Error::PipelineLayoutCreation)?;
    teardown.push(Resource::PipelineLayout(device, layout));
    Ok(layout)
}

/// Create the graphics pipeline for `render_pass` from `shaders`.
///
/// `extent` only seeds the default viewport and scissor, both of which are dynamic.
pub(crate) fn create_pipeline<D: Driver + ?Sized>(
    driver: &mut D,
    device: vk::Device,
    shaders: &ShaderModulePair,
    render_pass: &RenderPassDescriptor,
    extent: vk::Extent2D,
    teardown: &mut TeardownStack,
) -> Result<PipelineDescriptor> {
    tracing::debug!("creating graphics pipeline");

    let layout = create_pipeline_layout(driver, device, teardown)?;

    let viewport = vk::Viewport::builder()
        .x(0.0)
        .y(0.0)
        .width(extent.width as f32)
        .height(extent.height as f32)
        .min_depth(0.0)
        .max_depth(1.0)
        .build();
    let scissor = vk::Rect2D::builder()
        .offset(vk::Offset2D::default())
        .extent(extent)
        .build();

    // Geometry is generated in the vertex shader
    let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::builder().build();
    let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::builder()
        .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
        .primitive_restart_enable(false)
        .build();
    let rasterization_state = vk::PipelineRasterizationStateCreateInfo::builder()
        .polygon_mode(vk::PolygonMode::FILL)
        .line_width(1.0)
        .cull_mode(vk::CullModeFlags::BACK)
        .front_face(vk::FrontFace::CLOCKWISE)
        .rasterizer_discard_enable(false)
        .depth_clamp_enable(false)
        .depth_bias_enable(false)
        .depth_bias_constant_factor(0.0)
        .depth_bias_clamp(0.0)
        .depth_bias_slope_factor(0.0)
        .build();
    let multisample_state = vk::PipelineMultisampleStateCreateInfo::builder()
        .sample_shading_enable(false)
        .min_sample_shading(1.0)
        .rasterization_samples(vk::SampleCountFlags::TYPE_1)
        .build();
    let color_blend_attachment = vk::PipelineColorBlendAttachmentState::builder()
        .blend_enable(false)
        .color_write_mask(vk::ColorComponentFlags::RGBA)
        .src_color_blend_factor(vk::BlendFactor::ONE)
        .dst_color_blend_factor(vk::BlendFactor::ZERO)
        .color_blend_op(vk::BlendOp::ADD)
        .src_alpha_blend_factor(vk::BlendFactor::ONE)
        .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
        .alpha_blend_op(vk::BlendOp::ADD)
        .build();

    let shader_stages = shaders.stage_infos();
    let mut pipeline_builder = PipelineBuilder::new();
    pipeline_builder
        .shader_stages(&shader_stages)
        .vertex_input_state(vertex_input_state)
        .input_assembly_state(input_assembly_state)
        .viewport(viewport)
        .scissor(scissor)
        .rasterization_state(rasterization_state)
        .color_blend_attachment(color_blend_attachment)
        .multisample_state(multisample_state)
        .layout(layout);

    let pipeline = pipeline_builder
        .build(driver, device, render_pass.handle)
        .map_err(Error::PipelineCreation)?;
    teardown.push(Resource::Pipeline(device, pipeline));

    tracing::debug!("created graphics pipeline successfully");

    Ok(PipelineDescriptor {
        handle: pipeline,
        layout,
        viewport,
        scissor,
    })
}

#[derive(Default, Clone)]
#[must_use]
pub(crate) struct PipelineBuilder<'a> {
    pub(crate) shader_stages: &'a [vk::PipelineShaderStageCreateInfo],
    pub(crate) vertex_input_state: vk::PipelineVertexInputStateCreateInfo,
    pub(crate) input_assembly_state: vk::PipelineInputAssemblyStateCreateInfo,
    pub(crate) viewport: vk::Viewport,
    pub(crate) scissor: vk::Rect2D,
    pub(crate) rasterization_state: vk::PipelineRasterizationStateCreateInfo,
    pub(crate) color_blend_attachment: vk::PipelineColorBlendAttachmentState,
    pub(crate) multisample_state: vk::PipelineMultisampleStateCreateInfo,
    pub(crate) layout: vk::PipelineLayout,
}

impl<'a> PipelineBuilder<'a> {
    /// Create a new `PipelineBuilder`.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Set [`vk::PipelineShaderStageCreateInfo`]s.
    #[inline]
    pub(crate) fn shader_stages(
        &mut self,
        shader_stages: &'a [vk::PipelineShaderStageCreateInfo],
    ) -> &mut Self {
        self.shader_stages = shader_stages;
        self
    }

    /// Set [`vk::PipelineVertexInputStateCreateInfo`].
    #[inline]
    pub(crate) fn vertex_input_state(
        &mut self,
        vertex_input_state: vk::PipelineVertexInputStateCreateInfo,
    ) -> &mut Self {
        self.vertex_input_state = vertex_input_state;
        self
    }

    /// Set [`vk::PipelineInputAssemblyStateCreateInfo`].
    #[inline]
    pub(crate) fn input_assembly_state(
        &mut self,
        input_assembly_state: vk::PipelineInputAssemblyStateCreateInfo,
    ) -> &mut Self {
        self.input_assembly_state = input_assembly_state;
        self
    }

    /// Set the initial [`vk::Viewport`].
    #[inline]
    pub(crate) fn viewport(&mut self, viewport: vk::Viewport) -> &mut Self {
        self.viewport = viewport;
        self
    }

    /// Set the initial scissor [`vk::Rect2D`].
    #[inline]
    pub(crate) fn scissor(&mut self, scissor: vk::Rect2D) -> &mut Self {
        self.scissor = scissor;
        self
    }

    /// Set [`vk::PipelineRasterizationStateCreateInfo`].
    #[inline]
    pub(crate) fn rasterization_state(
        &mut self,
        rasterization_state: vk::PipelineRasterizationStateCreateInfo,
    ) -> &mut Self {
        self.rasterization_state = rasterization_state;
        self
    }

    /// Set [`vk::PipelineColorBlendAttachmentState`].
    #[inline]
    pub(crate) fn color_blend_attachment(
        &mut self,
        color_blend_attachment: vk::PipelineColorBlendAttachmentState,
    ) -> &mut Self {
        self.color_blend_attachment = color_blend_attachment;
        self
    }

    /// Set [`vk::PipelineMultisampleStateCreateInfo`].
    #[inline]
    pub(crate) fn multisample_state(
        &mut self,
        multisample_state: vk::PipelineMultisampleStateCreateInfo,
    ) -> &mut Self {
        self.multisample_state = multisample_state;
        self
    }

    /// Set [`vk::PipelineLayout`].
    #[inline]
    pub(crate) fn layout(&mut self, layout: vk::PipelineLayout) -> &mut Self {
        self.layout = layout;
        self
    }

    /// Build the [`vk::Pipeline`] for subpass 0 of `render_pass`.
    pub(crate) fn build<D: Driver + ?Sized>(
        &self,
        driver: &mut D,
        device: vk::Device,
        render_pass: vk::RenderPass,
    ) -> anyhow::Result<vk::Pipeline> {
        // Viewport State
        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewports(slice::from_ref(&self.viewport))
            .scissors(slice::from_ref(&self.scissor));

        let color_blend_info = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .logic_op(vk::LogicOp::COPY)
            .attachments(slice::from_ref(&self.color_blend_attachment))
            .blend_constants([0.0; 4]);

        // Dynamic State
        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state =
            vk::PipelineDynamicStateCreateInfo::builder().dynamic_states(&dynamic_states);

        // Create
        let pipeline_create_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(self.shader_stages)
            .vertex_input_state(&self.vertex_input_state)
            .input_assembly_state(&self.input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&self.rasterization_state)
            .multisample_state(&self.multisample_state)
            .color_blend_state(&color_blend_info)
            .dynamic_state(&dynamic_state)
            .layout(self.layout)
            .render_pass(render_pass)
            .subpass(0)
            .base_pipeline_handle(vk::Pipeline::null())
            .base_pipeline_index(-1);

        driver
            .create_graphics_pipeline(device, &pipeline_create_info)
            .context("failed to create graphics pipeline")
    }
}
