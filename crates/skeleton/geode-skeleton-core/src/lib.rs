//! Geode Skeleton Core (engine-agnostic)
//!
//! Bone hierarchies whose pivot / rotation / scale / translation are either
//! constants or expression trees, plus the compositor that turns them into
//! local, world and model space matrices once per frame.
//!
//! Bones live in an arena ([`Skeleton`]) addressed by [`BoneId`]; a parent is
//! always stored before its children, so a frame is a single forward pass.

pub mod attribute;
pub mod bone;
pub mod compose;
pub mod config;
pub mod error;
pub mod ids;
pub mod model;
pub mod scratch;
pub mod skeleton;

// Re-exports for consumers (renderers, attachment listeners)
pub use attribute::{Attribute, AttributeKind};
pub use bone::{Bone, BoneDef};
pub use compose::{
    compose_local, compute_transforms, rotation_xyz_degrees, BoneMatrices, BoneTransform, Frame,
    RenderRoot,
};
pub use config::Config;
pub use error::SkeletonError;
pub use ids::BoneId;
pub use model::{load_bedrock_geometry_json, load_model_json};
pub use scratch::Scratch;
pub use skeleton::Skeleton;

pub use geode_expr_core::{BindingContext, Expr, ExprError, FunctionRegistry};
