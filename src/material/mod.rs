//! Shared tile material and its shading template

pub mod shared;
pub mod template;

pub use shared::SharedMaterial;
pub use template::{
    BindingDecl, Interpolation, ShadingTemplate, VaryingDecl, VertexInputDecl, WgslType,
};
