//! Named binding layouts.
//!
//! A stage declares the resources it reads as named slots instead of relying
//! on positional convention. The layout is validated once when the pipeline
//! is built; the host then proves it supplies every slot with [`BindingLayout::check`].

use std::collections::{HashMap, HashSet};
use std::fmt;

use bitflags::bitflags;

use crate::error::BindingError;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStage: u8 {
        const VERTEX   = 1 << 0;
        const FRAGMENT = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Texture2d { filterable: bool },
    Sampler { filtering: bool },
    UniformBuffer { min_size: u64 },
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Texture2d { filterable: true } => f.write_str("filterable 2d texture"),
            ResourceKind::Texture2d { filterable: false } => {
                f.write_str("non-filterable 2d texture")
            }
            ResourceKind::Sampler { filtering: true } => f.write_str("filtering sampler"),
            ResourceKind::Sampler { filtering: false } => f.write_str("non-filtering sampler"),
            ResourceKind::UniformBuffer { min_size } => {
                write!(f, "uniform buffer (>= {min_size} bytes)")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingSlot {
    pub name: &'static str,
    pub binding: u32,
    pub kind: ResourceKind,
    pub visibility: ShaderStage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingLayout {
    label: &'static str,
    slots: Vec<BindingSlot>,
}

impl BindingLayout {
    pub const SOURCE_TEXTURE: &'static str = "source_texture";
    pub const SOURCE_SAMPLER: &'static str = "source_sampler";
    pub const VIEW: &'static str = "view";
    pub const MESH: &'static str = "mesh";

    pub fn new(label: &'static str, slots: Vec<BindingSlot>) -> Result<Self, BindingError> {
        if slots.is_empty() {
            return Err(BindingError::Empty(label.to_string()));
        }

        let mut names = HashSet::new();
        let mut indices: HashMap<u32, &'static str> = HashMap::new();
        for slot in &slots {
            if !names.insert(slot.name) {
                return Err(BindingError::DuplicateName(slot.name.to_string()));
            }
            if let Some(first) = indices.insert(slot.binding, slot.name) {
                return Err(BindingError::DuplicateBinding {
                    binding: slot.binding,
                    first: first.to_string(),
                    second: slot.name.to_string(),
                });
            }
        }

        // A filtering sampler is only legal when it has something filterable
        // to sample.
        let textures: Vec<bool> = slots
            .iter()
            .filter_map(|s| match s.kind {
                ResourceKind::Texture2d { filterable } => Some(filterable),
                _ => None,
            })
            .collect();
        if !textures.is_empty() && !textures.iter().any(|&f| f) {
            if let Some(sampler) = slots
                .iter()
                .find(|s| s.kind == ResourceKind::Sampler { filtering: true })
            {
                return Err(BindingError::FilteringWithoutFilterable(sampler.name.to_string()));
            }
        }

        log::debug!("binding layout `{label}` validated ({} slots)", slots.len());
        Ok(Self { label, slots })
    }

    /// Inputs of the fullscreen resample stage: the source texture and its
    /// sampler, both read by the fragment stage.
    pub fn resample() -> Self {
        Self {
            label: "resample",
            slots: vec![
                BindingSlot {
                    name: Self::SOURCE_TEXTURE,
                    binding: 0,
                    kind: ResourceKind::Texture2d { filterable: true },
                    visibility: ShaderStage::FRAGMENT,
                },
                BindingSlot {
                    name: Self::SOURCE_SAMPLER,
                    binding: 1,
                    kind: ResourceKind::Sampler { filtering: true },
                    visibility: ShaderStage::FRAGMENT,
                },
            ],
        }
    }

    /// Uniforms read by the mesh vertex shader: the host's view and the
    /// per-mesh transform.
    pub fn mesh(view_size: u64, mesh_size: u64) -> Self {
        Self {
            label: "mesh",
            slots: vec![
                BindingSlot {
                    name: Self::VIEW,
                    binding: 0,
                    kind: ResourceKind::UniformBuffer { min_size: view_size },
                    visibility: ShaderStage::VERTEX | ShaderStage::FRAGMENT,
                },
                BindingSlot {
                    name: Self::MESH,
                    binding: 1,
                    kind: ResourceKind::UniformBuffer { min_size: mesh_size },
                    visibility: ShaderStage::VERTEX,
                },
            ],
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn slots(&self) -> &[BindingSlot] {
        &self.slots
    }

    pub fn slot(&self, name: &str) -> Option<&BindingSlot> {
        self.slots.iter().find(|s| s.name == name)
    }

    /// Check that `provided` supplies every slot with the right kind of
    /// resource and nothing else.
    pub fn check(&self, provided: &[(&str, ResourceKind)]) -> Result<(), BindingError> {
        for (name, _) in provided {
            if self.slot(name).is_none() {
                return Err(BindingError::Unexpected(name.to_string()));
            }
        }
        for slot in &self.slots {
            let (_, kind) = provided
                .iter()
                .find(|(name, _)| *name == slot.name)
                .ok_or_else(|| BindingError::Missing(slot.name.to_string()))?;
            if !kind_satisfies(slot.kind, *kind) {
                return Err(BindingError::KindMismatch {
                    name: slot.name.to_string(),
                    expected: slot.kind.to_string(),
                    actual: kind.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn kind_satisfies(required: ResourceKind, provided: ResourceKind) -> bool {
    match (required, provided) {
        (
            ResourceKind::UniformBuffer { min_size },
            ResourceKind::UniformBuffer { min_size: size },
        ) => size >= min_size,
        _ => required == provided,
    }
}
