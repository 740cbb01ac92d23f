//! Errors raised while building, loading or evaluating a skeleton.

use geode_expr_core::ExprError;
use thiserror::Error;

use crate::ids::BoneId;

#[derive(Debug, Error)]
pub enum SkeletonError {
    #[error("duplicate bone '{0}'")]
    DuplicateBone(String),
    #[error("bone '{bone}' references unknown parent '{parent}'")]
    UnknownParent { bone: String, parent: String },
    #[error("bone parents form a cycle through '{0}'")]
    ParentCycle(String),
    #[error("unknown bone {0}")]
    UnknownBone(BoneId),
    /// An expression bound to the bone failed to parse, build or evaluate.
    #[error("bone '{bone}': {source}")]
    Expr {
        bone: String,
        #[source]
        source: ExprError,
    },
    #[error("bone '{bone}' references unbound variable(s): {}", .names.join(", "))]
    UnboundVariables { bone: String, names: Vec<String> },
    #[error("model json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("model contains no bones")]
    NoGeometry,
}

impl SkeletonError {
    pub(crate) fn expr(bone: &str, source: ExprError) -> Self {
        SkeletonError::Expr {
            bone: bone.to_string(),
            source,
        }
    }
}
