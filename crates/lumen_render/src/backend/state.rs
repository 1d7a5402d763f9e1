//! Fixed-function pipeline state.
//!
//! Plain hashable descriptions of the non-programmable part of a graphics
//! pipeline state. Two material blueprints may share a graphics program while
//! differing here, which is why pipeline state objects are created per
//! material blueprint and programs per shader combination.

use lumen_core::AssetId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendFactor {
    Zero,
    #[default]
    One,
    SrcColor,
    InvSrcColor,
    SrcAlpha,
    InvSrcAlpha,
    DestAlpha,
    InvDestAlpha,
    DestColor,
    InvDestColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendOperation {
    #[default]
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

/// Single render target blend state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlendState {
    pub blend_enable: bool,
    pub src_blend: BlendFactor,
    pub dest_blend: BlendFactor,
    pub blend_op: BlendOperation,
    pub src_blend_alpha: BlendFactor,
    pub dest_blend_alpha: BlendFactor,
    pub blend_op_alpha: BlendOperation,
    pub render_target_write_mask: u8,
}

impl Default for BlendState {
    fn default() -> Self {
        Self::OPAQUE
    }
}

impl BlendState {
    pub const OPAQUE: Self = Self {
        blend_enable: false,
        src_blend: BlendFactor::One,
        dest_blend: BlendFactor::Zero,
        blend_op: BlendOperation::Add,
        src_blend_alpha: BlendFactor::One,
        dest_blend_alpha: BlendFactor::Zero,
        blend_op_alpha: BlendOperation::Add,
        render_target_write_mask: 0x0f,
    };

    pub const ALPHA_BLENDING: Self = Self {
        blend_enable: true,
        src_blend: BlendFactor::SrcAlpha,
        dest_blend: BlendFactor::InvSrcAlpha,
        blend_op: BlendOperation::Add,
        src_blend_alpha: BlendFactor::One,
        dest_blend_alpha: BlendFactor::InvSrcAlpha,
        blend_op_alpha: BlendOperation::Add,
        render_target_write_mask: 0x0f,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ComparisonFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    #[default]
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Depth/stencil state. Defaults to reversed-Z depth testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DepthStencilState {
    pub depth_enable: bool,
    pub depth_write_enable: bool,
    pub depth_func: ComparisonFunc,
    pub stencil_enable: bool,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self {
            depth_enable: true,
            depth_write_enable: true,
            depth_func: ComparisonFunc::Greater,
            stencil_enable: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FillMode {
    Wireframe,
    #[default]
    Solid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CullMode {
    None,
    Front,
    #[default]
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RasterizerState {
    pub fill_mode: FillMode,
    pub cull_mode: CullMode,
    pub front_counter_clockwise: bool,
    pub depth_bias: i32,
    pub multisample_enable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    #[default]
    TriangleList,
    TriangleStrip,
    PatchList,
}

/// Everything a pipeline state object needs besides the graphics program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FixedFunctionState {
    pub blend: BlendState,
    pub depth_stencil: DepthStencilState,
    pub rasterizer: RasterizerState,
    pub primitive_topology: PrimitiveTopology,
    pub root_signature: Option<AssetId>,
}
