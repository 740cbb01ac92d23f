//! Skeleton: bone arena and the per-frame evaluation pass.
//!
//! Methods:
//! - new, add_bone, bind, set_tracking (construction / binding)
//! - evaluate (resolve attributes -> compose matrices, top-down)
//! - validate_bindings (load-time check that every variable has a value)

use geode_expr_core::BindingContext;
use hashbrown::HashMap;

use crate::attribute::{Attribute, AttributeKind};
use crate::bone::{Bone, BoneDef};
use crate::compose::{compute_transforms, BoneTransform, Frame, RenderRoot};
use crate::config::Config;
use crate::error::SkeletonError;
use crate::ids::BoneId;
use crate::scratch::Scratch;

#[derive(Debug)]
pub struct Skeleton {
    bones: Vec<Bone>,
    by_name: HashMap<String, BoneId>,
    roots: Vec<BoneId>,
    track_all: bool,

    // Per-frame buffers
    transforms: Vec<BoneTransform>,
    scratch: Scratch,
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl Skeleton {
    pub fn new(cfg: &Config) -> Self {
        Self {
            bones: Vec::new(),
            by_name: HashMap::new(),
            roots: Vec::new(),
            track_all: cfg.track_all_matrices,
            transforms: Vec::with_capacity(cfg.scratch_bones),
            scratch: Scratch::new(cfg),
        }
    }

    /// Append a bone. `parent` must already be in the skeleton, which keeps
    /// the arena in top-down order and rules out cycles.
    pub fn add_bone(
        &mut self,
        def: BoneDef,
        parent: Option<BoneId>,
    ) -> Result<BoneId, SkeletonError> {
        if self.by_name.contains_key(&def.name) {
            return Err(SkeletonError::DuplicateBone(def.name));
        }
        if let Some(p) = parent {
            if p.index() >= self.bones.len() {
                return Err(SkeletonError::UnknownBone(p));
            }
        }

        let id = BoneId::from_index(self.bones.len());
        self.by_name.insert(def.name.clone(), id);
        match parent {
            Some(p) => self.bones[p.index()].children.push(id),
            None => self.roots.push(id),
        }
        self.bones.push(Bone::from_def(def, parent));
        Ok(id)
    }

    /// Replace one attribute of a bone.
    pub fn bind(
        &mut self,
        id: BoneId,
        kind: AttributeKind,
        attr: Attribute,
    ) -> Result<(), SkeletonError> {
        self.bone_mut(id)
            .ok_or(SkeletonError::UnknownBone(id))?
            .set_attribute(kind, attr);
        Ok(())
    }

    pub fn set_tracking(&mut self, id: BoneId, tracking: bool) -> Result<(), SkeletonError> {
        self.bone_mut(id)
            .ok_or(SkeletonError::UnknownBone(id))?
            .set_tracking_matrices(tracking);
        Ok(())
    }

    pub fn bone(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id.index())
    }

    pub fn bone_mut(&mut self, id: BoneId) -> Option<&mut Bone> {
        self.bones.get_mut(id.index())
    }

    pub fn find(&self, name: &str) -> Option<BoneId> {
        self.by_name.get(name).copied()
    }

    pub fn bone_by_name(&self, name: &str) -> Option<&Bone> {
        self.find(name).and_then(|id| self.bone(id))
    }

    pub fn roots(&self) -> &[BoneId] {
        &self.roots
    }

    pub fn children(&self, id: BoneId) -> &[BoneId] {
        self.bone(id).map(Bone::children).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Bones in top-down order.
    pub fn iter(&self) -> impl Iterator<Item = (BoneId, &Bone)> {
        self.bones
            .iter()
            .enumerate()
            .map(|(i, b)| (BoneId::from_index(i), b))
    }

    /// Run one frame: resolve every attribute against `ctx`, then compose
    /// matrices parent-before-child.
    ///
    /// All attributes are resolved before any bone is touched, so an
    /// evaluation error leaves the previous frame's results in place.
    pub fn evaluate(
        &mut self,
        ctx: &BindingContext,
        root: &RenderRoot,
    ) -> Result<(), SkeletonError> {
        self.transforms.clear();
        for bone in &self.bones {
            let t = bone
                .resolve(ctx)
                .map_err(|e| SkeletonError::expr(&bone.name, e))?;
            self.transforms.push(t);
        }

        let root_frame = Frame::root(root);
        self.scratch.begin_frame(self.bones.len());
        let mut published = 0usize;
        for (bone, t) in self.bones.iter_mut().zip(&self.transforms) {
            let parent = match bone.parent {
                Some(p) => self.scratch.get(p.index()).copied().unwrap_or(root_frame),
                None => root_frame,
            };
            let m = compute_transforms(t, &parent);
            self.scratch.push(Frame::from(&m));
            bone.transform = *t;
            if self.track_all || bone.tracking_matrices {
                bone.matrices = m;
                published += 1;
            }
        }
        log::trace!(
            "skeleton frame: {} bones composed, {} published",
            self.bones.len(),
            published
        );
        Ok(())
    }

    /// Check that every variable referenced by any bone is bound in `ctx`.
    ///
    /// Meant to run once at load time against a context carrying every
    /// query the host will supply, so a missing binding rejects the model
    /// instead of animating it wrong.
    pub fn validate_bindings(&self, ctx: &BindingContext) -> Result<(), SkeletonError> {
        for bone in &self.bones {
            let mut missing: Vec<String> = Vec::new();
            for kind in AttributeKind::ALL {
                for name in bone.attribute(kind).variables() {
                    if !ctx.contains(name) && !missing.iter().any(|m| m == name) {
                        missing.push(name.to_string());
                    }
                }
            }
            if !missing.is_empty() {
                return Err(SkeletonError::UnboundVariables {
                    bone: bone.name.clone(),
                    names: missing,
                });
            }
        }
        Ok(())
    }

    /// Every variable referenced anywhere in the skeleton.
    pub fn variables(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for bone in &self.bones {
            for kind in AttributeKind::ALL {
                for name in bone.attribute(kind).variables() {
                    if !out.contains(&name) {
                        out.push(name);
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    #[test]
    fn arena_keeps_parents_first() {
        let mut sk = Skeleton::default();
        let root = sk.add_bone(BoneDef::new("root"), None).unwrap();
        let a = sk.add_bone(BoneDef::new("a"), Some(root)).unwrap();
        let b = sk.add_bone(BoneDef::new("b"), Some(a)).unwrap();
        assert!(root < a && a < b);
        assert_eq!(sk.roots(), &[root]);
        assert_eq!(sk.children(root), &[a]);
        assert_eq!(sk.bone(b).unwrap().parent(), Some(a));
        assert_eq!(sk.find("b"), Some(b));
    }

    #[test]
    fn add_bone_rejects_duplicates_and_missing_parents() {
        let mut sk = Skeleton::default();
        sk.add_bone(BoneDef::new("root"), None).unwrap();
        assert!(matches!(
            sk.add_bone(BoneDef::new("root"), None),
            Err(SkeletonError::DuplicateBone(name)) if name == "root"
        ));
        assert!(matches!(
            sk.add_bone(BoneDef::new("x"), Some(BoneId(9))),
            Err(SkeletonError::UnknownBone(BoneId(9)))
        ));
        assert_eq!(sk.len(), 1);
    }

    #[test]
    fn untracked_bones_keep_identity() {
        let mut sk = Skeleton::default();
        let id = sk
            .add_bone(BoneDef::new("root").translation([1.0, 2.0, 3.0]), None)
            .unwrap();
        sk.evaluate(&BindingContext::new(), &RenderRoot::default())
            .unwrap();
        let bone = sk.bone(id).unwrap();
        assert_eq!(bone.world_position(), DVec3::ZERO);
        assert_eq!(bone.transform().translation, DVec3::new(1.0, 2.0, 3.0));

        sk.set_tracking(id, true).unwrap();
        sk.evaluate(&BindingContext::new(), &RenderRoot::default())
            .unwrap();
        assert_eq!(sk.bone(id).unwrap().world_position(), DVec3::new(1.0, 2.0, 3.0));
    }
}
