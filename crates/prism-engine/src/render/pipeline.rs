use crate::device::PipelineDesc;
use crate::layout::UniformLayout;

/// WGSL source shared by every variant.
pub const OBJECT_WGSL: &str = include_str!("shaders/object.wgsl");

const VERTEX_ENTRY: &str = "vs_main";

/// How the fragment stage colors each triangle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum ShaderVariant {
    /// Solid fill from the object's `color` field.
    #[default]
    UniformColor,
    /// Red, green and blue corners interpolated across the triangle.
    VertexColor,
    /// 8x8 device-pixel checker of `color` and its complement.
    Checker,
}

impl ShaderVariant {
    pub const ALL: [ShaderVariant; 3] = [Self::UniformColor, Self::VertexColor, Self::Checker];

    pub fn fragment_entry(self) -> &'static str {
        match self {
            Self::UniformColor => "fs_uniform",
            Self::VertexColor => "fs_vertex_color",
            Self::Checker => "fs_checker",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::UniformColor => "prism uniform-color pipeline",
            Self::VertexColor => "prism vertex-color pipeline",
            Self::Checker => "prism checker pipeline",
        }
    }
}

/// Pipeline description for `variant`, with the uniform binding sized for
/// `layout`.
pub fn pipeline_desc(variant: ShaderVariant, layout: &UniformLayout) -> PipelineDesc<'static> {
    PipelineDesc {
        label: variant.label(),
        shader_source: OBJECT_WGSL,
        vertex_entry: VERTEX_ENTRY,
        fragment_entry: variant.fragment_entry(),
        uniform_size: layout.total_size(),
    }
}
