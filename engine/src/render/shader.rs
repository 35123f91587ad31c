//! Vulkan shader modules.

use crate::{
    config::ShaderPaths,
    lifecycle::{Resource, TeardownStack},
    render::Driver,
    shader::{Shader, ShaderStage},
    Error, Result,
};
use anyhow::{anyhow, Context};
use ash::vk;
use std::{ffi::CStr, io::Cursor};

// SAFETY: This is static string with a nul character.
const SHADER_ENTRY_NAME: &CStr = unsafe { CStr::from_bytes_with_nul_unchecked(b"main\0") };

/// The vertex and fragment shader modules the pipeline is built from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub struct ShaderModulePair {
    pub vertex: vk::ShaderModule,
    pub fragment: vk::ShaderModule,
}

impl ShaderModulePair {
    /// Load the vertex then the fragment shader named by `paths`.
    pub(crate) fn load<D: Driver + ?Sized>(
        driver: &mut D,
        device: vk::Device,
        paths: &ShaderPaths,
        teardown: &mut TeardownStack,
    ) -> Result<Self> {
        let vertex = Shader::from_path(ShaderStage::Vertex, &paths.vertex)?;
        let vertex = create_module(driver, device, &vertex, teardown)?;
        let fragment = Shader::from_path(ShaderStage::Fragment, &paths.fragment)?;
        let fragment = create_module(driver, device, &fragment, teardown)?;
        Ok(Self { vertex, fragment })
    }

    /// Pipeline stages in vertex, fragment order.
    pub(crate) fn stage_infos(&self) -> [vk::PipelineShaderStageCreateInfo; 2] {
        [
            build_stage_info(ShaderStage::Vertex, self.vertex),
            build_stage_info(ShaderStage::Fragment, self.fragment),
        ]
    }
}

/// Build a [`vk::PipelineShaderStageCreateInfo`].
pub(crate) fn build_stage_info(
    stage: ShaderStage,
    module: vk::ShaderModule,
) -> vk::PipelineShaderStageCreateInfo {
    vk::PipelineShaderStageCreateInfo::builder()
        .stage(stage.into())
        .module(module)
        .name(SHADER_ENTRY_NAME)
        .build()
}

/// Create a [`vk::ShaderModule`] instance from bytecode.
///
/// Only the length of the bytecode is checked here. The driver rejects malformed contents.
pub(crate) fn create_module<D: Driver + ?Sized>(
    driver: &mut D,
    device: vk::Device,
    shader: &Shader,
    teardown: &mut TeardownStack,
) -> Result<vk::ShaderModule> {
    tracing::debug!("creating shader module `{}`", shader.name);

    if shader.bytes.is_empty() {
        return Err(Error::ShaderCompilation(anyhow!(
            "shader bytecode `{}` is empty",
            shader.name
        )));
    }
    let code = ash::util::read_spv(&mut Cursor::new(&shader.bytes))
        .with_context(|| format!("shader bytecode `{}` is not properly aligned", shader.name))
        .map_err(Error::ShaderCompilation)?;
    let shader_module_info = vk::ShaderModuleCreateInfo::builder().code(&code);

    let shader_module = driver
        .create_shader_module(device, &shader_module_info)
        .with_context(|| format!("invalid shader bytecode `{}`", shader.name))
        .map_err(Error::ShaderCompilation)?;
    teardown.push(Resource::ShaderModule(device, shader_module));

    tracing::debug!("created shader module `{}` successfully", shader.name);

    Ok(shader_module)
}

impl From<ShaderStage> for vk::ShaderStageFlags {
    fn from(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
            ShaderStage::Fragment => vk::ShaderStageFlags::FRAGMENT,
        }
    }
}
