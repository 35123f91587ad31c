//! Shader management.

use crate::{Error, Result};
use std::{borrow::Cow, fmt, fs, path::Path};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Pre-compiled shader bytecode.
#[derive(Clone)]
#[must_use]
pub struct Shader {
    pub(crate) name: Cow<'static, str>,
    pub(crate) stage: ShaderStage,
    // NOTE: Required to be owned, so that it can be aligned by the renderer
    pub(crate) bytes: Vec<u8>,
}

impl fmt::Debug for Shader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shader")
            .field("name", &self.name)
            .field("stage", &self.stage)
            .field("size", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

impl Shader {
    pub fn from_bytes(name: impl Into<Cow<'static, str>>, ty: ShaderStage, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            stage: ty,
            bytes,
        }
    }

    /// Read the entire bytecode file at `path`.
    pub fn from_path(ty: ShaderStage, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| Error::ShaderRead {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("read {} bytes of shader bytecode from {path:?}", bytes.len());
        Ok(Self::from_bytes(
            path.to_string_lossy().into_owned(),
            ty,
            bytes,
        ))
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}
