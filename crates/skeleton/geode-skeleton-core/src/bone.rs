//! Bones and bone definitions.

use geode_expr_core::{BindingContext, ExprError};
use glam::{DMat4, DVec3};

use crate::attribute::{Attribute, AttributeKind};
use crate::compose::{BoneMatrices, BoneTransform};
use crate::ids::BoneId;

/// Input to [`Skeleton::add_bone`](crate::Skeleton::add_bone).
#[derive(Clone, Debug, PartialEq)]
pub struct BoneDef {
    pub name: String,
    pub pivot: Attribute,
    pub rotation: Attribute,
    pub scale: Attribute,
    pub translation: Attribute,
    pub track_matrices: bool,
}

impl BoneDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pivot: AttributeKind::Pivot.rest_value().into(),
            rotation: AttributeKind::Rotation.rest_value().into(),
            scale: AttributeKind::Scale.rest_value().into(),
            translation: AttributeKind::Translation.rest_value().into(),
            track_matrices: false,
        }
    }

    pub fn with(mut self, kind: AttributeKind, attr: impl Into<Attribute>) -> Self {
        *self.slot_mut(kind) = attr.into();
        self
    }

    pub fn pivot(self, attr: impl Into<Attribute>) -> Self {
        self.with(AttributeKind::Pivot, attr)
    }

    pub fn rotation(self, attr: impl Into<Attribute>) -> Self {
        self.with(AttributeKind::Rotation, attr)
    }

    pub fn scale(self, attr: impl Into<Attribute>) -> Self {
        self.with(AttributeKind::Scale, attr)
    }

    pub fn translation(self, attr: impl Into<Attribute>) -> Self {
        self.with(AttributeKind::Translation, attr)
    }

    pub fn tracked(mut self) -> Self {
        self.track_matrices = true;
        self
    }

    fn slot_mut(&mut self, kind: AttributeKind) -> &mut Attribute {
        match kind {
            AttributeKind::Pivot => &mut self.pivot,
            AttributeKind::Rotation => &mut self.rotation,
            AttributeKind::Scale => &mut self.scale,
            AttributeKind::Translation => &mut self.translation,
        }
    }
}

/// A node of the bone tree.
///
/// Matrix accessors return the values published by the last
/// [`Skeleton::evaluate`](crate::Skeleton::evaluate) for which this bone was
/// tracking matrices; untracked bones keep identity.
#[derive(Clone, Debug)]
pub struct Bone {
    pub(crate) name: String,
    pub(crate) parent: Option<BoneId>,
    pub(crate) children: Vec<BoneId>,
    pub(crate) pivot: Attribute,
    pub(crate) rotation: Attribute,
    pub(crate) scale: Attribute,
    pub(crate) translation: Attribute,
    pub(crate) tracking_matrices: bool,
    pub(crate) transform: BoneTransform,
    pub(crate) matrices: BoneMatrices,
}

impl Bone {
    pub(crate) fn from_def(def: BoneDef, parent: Option<BoneId>) -> Self {
        Self {
            name: def.name,
            parent,
            children: Vec::new(),
            pivot: def.pivot,
            rotation: def.rotation,
            scale: def.scale,
            translation: def.translation,
            tracking_matrices: def.track_matrices,
            transform: BoneTransform::default(),
            matrices: BoneMatrices::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<BoneId> {
        self.parent
    }

    pub fn children(&self) -> &[BoneId] {
        &self.children
    }

    pub fn attribute(&self, kind: AttributeKind) -> &Attribute {
        match kind {
            AttributeKind::Pivot => &self.pivot,
            AttributeKind::Rotation => &self.rotation,
            AttributeKind::Scale => &self.scale,
            AttributeKind::Translation => &self.translation,
        }
    }

    pub fn set_attribute(&mut self, kind: AttributeKind, attr: Attribute) {
        match kind {
            AttributeKind::Pivot => self.pivot = attr,
            AttributeKind::Rotation => self.rotation = attr,
            AttributeKind::Scale => self.scale = attr,
            AttributeKind::Translation => self.translation = attr,
        }
    }

    pub fn is_tracking_matrices(&self) -> bool {
        self.tracking_matrices
    }

    pub fn set_tracking_matrices(&mut self, tracking: bool) {
        self.tracking_matrices = tracking;
    }

    /// Evaluate all four attributes against `ctx`.
    pub fn resolve(&self, ctx: &BindingContext) -> Result<BoneTransform, ExprError> {
        Ok(BoneTransform {
            pivot: self.pivot.resolve(ctx)?,
            rotation: self.rotation.resolve(ctx)?,
            scale: self.scale.resolve(ctx)?,
            translation: self.translation.resolve(ctx)?,
        })
    }

    /// Inputs resolved during the last evaluation.
    pub fn transform(&self) -> &BoneTransform {
        &self.transform
    }

    pub fn matrices(&self) -> &BoneMatrices {
        &self.matrices
    }

    pub fn local_space_matrix(&self) -> DMat4 {
        self.matrices.local
    }

    pub fn world_space_matrix(&self) -> DMat4 {
        self.matrices.world
    }

    pub fn model_space_matrix(&self) -> DMat4 {
        self.matrices.model
    }

    pub fn local_position(&self) -> DVec3 {
        self.matrices.local.w_axis.truncate()
    }

    /// Bone origin in world coordinates, for effects attached to the bone.
    pub fn world_position(&self) -> DVec3 {
        self.matrices.world.w_axis.truncate()
    }

    pub fn model_position(&self) -> DVec3 {
        self.matrices.model.w_axis.truncate()
    }

    /// World-space location of the bone's pivot point.
    pub fn world_pivot(&self) -> DVec3 {
        self.matrices.world.transform_point3(self.transform.pivot)
    }
}
