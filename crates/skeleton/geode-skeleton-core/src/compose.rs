//! Bone transform composition.
//!
//! A bone's local matrix is built in a fixed order, each step
//! post-multiplied onto the previous one:
//!
//! 1. translate by the bone's offset from its parent
//! 2. translate to the pivot
//! 3. rotate X, then Y, then Z (degrees)
//! 4. scale
//! 5. translate back from the pivot
//!
//! ```text
//! local = T(translation) · T(pivot) · Rx · Ry · Rz · S · T(-pivot)
//! world = parent.world · local      (root: T(entity position) · root transform)
//! model = parent.model · local      (root: identity)
//! ```
//!
//! Changing the order changes the rendered pose; the composition-order
//! tests pin it down.

use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};

/// Resolved (numeric) transform inputs of one bone for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneTransform {
    pub pivot: DVec3,
    /// Euler angles in degrees.
    pub rotation: DVec3,
    pub scale: DVec3,
    pub translation: DVec3,
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self {
            pivot: DVec3::ZERO,
            rotation: DVec3::ZERO,
            scale: DVec3::ONE,
            translation: DVec3::ZERO,
        }
    }
}

/// Where the model sits in the world for this frame.
///
/// `transform` carries whatever the host applies between the entity origin
/// and the model root (body yaw, render scale, ...). Entity position is
/// applied on top of it exactly once, at the root.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderRoot {
    pub position: DVec3,
    pub transform: DMat4,
}

impl Default for RenderRoot {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            transform: DMat4::IDENTITY,
        }
    }
}

impl RenderRoot {
    pub fn at(position: DVec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_transform(mut self, transform: DMat4) -> Self {
        self.transform = transform;
        self
    }

    #[inline]
    pub fn world_matrix(&self) -> DMat4 {
        DMat4::from_translation(self.position) * self.transform
    }
}

/// The parent-side matrices a child composes onto.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    pub model: DMat4,
    pub world: DMat4,
}

impl Frame {
    /// Frame seen by root bones.
    pub fn root(root: &RenderRoot) -> Self {
        Self {
            model: DMat4::IDENTITY,
            world: root.world_matrix(),
        }
    }
}

impl From<&BoneMatrices> for Frame {
    fn from(m: &BoneMatrices) -> Self {
        Self {
            model: m.model,
            world: m.world,
        }
    }
}

/// Per-bone outputs: relative to the parent, to the world origin, and to
/// the model's render root.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneMatrices {
    pub local: DMat4,
    pub world: DMat4,
    pub model: DMat4,
}

impl Default for BoneMatrices {
    fn default() -> Self {
        Self {
            local: DMat4::IDENTITY,
            world: DMat4::IDENTITY,
            model: DMat4::IDENTITY,
        }
    }
}

/// `Rx · Ry · Rz` from angles in degrees.
#[inline]
pub fn rotation_xyz_degrees(degrees: DVec3) -> DMat4 {
    DMat4::from_rotation_x(degrees.x.to_radians())
        * DMat4::from_rotation_y(degrees.y.to_radians())
        * DMat4::from_rotation_z(degrees.z.to_radians())
}

/// Local matrix of a bone relative to its parent.
pub fn compose_local(t: &BoneTransform) -> DMat4 {
    DMat4::from_translation(t.translation)
        * DMat4::from_translation(t.pivot)
        * rotation_xyz_degrees(t.rotation)
        * DMat4::from_scale(t.scale)
        * DMat4::from_translation(-t.pivot)
}

/// Local, world and model matrices of a bone given its parent's frame.
pub fn compute_transforms(t: &BoneTransform, parent: &Frame) -> BoneMatrices {
    let local = compose_local(t);
    BoneMatrices {
        local,
        world: parent.world * local,
        model: parent.model * local,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mat_approx(a: &DMat4, b: &DMat4, eps: f64) -> bool {
        a.to_cols_array()
            .iter()
            .zip(b.to_cols_array().iter())
            .all(|(x, y)| (x - y).abs() <= eps)
    }

    #[test]
    fn identity_inputs_give_identity() {
        assert_eq!(compose_local(&BoneTransform::default()), DMat4::IDENTITY);
        let pivoted = BoneTransform {
            pivot: DVec3::new(3.0, -2.0, 5.0),
            ..Default::default()
        };
        assert!(mat_approx(&compose_local(&pivoted), &DMat4::IDENTITY, 1e-12));
    }

    #[test]
    fn pivot_is_a_fixed_point_of_rotation_and_scale() {
        let t = BoneTransform {
            pivot: DVec3::new(1.0, 2.0, 3.0),
            rotation: DVec3::new(30.0, 45.0, 60.0),
            scale: DVec3::new(2.0, 0.5, 1.5),
            translation: DVec3::ZERO,
        };
        let p = compose_local(&t).transform_point3(t.pivot);
        assert!((p - t.pivot).length() < 1e-12);
    }

    #[test]
    fn translation_moves_pivot() {
        let t = BoneTransform {
            pivot: DVec3::new(1.0, 0.0, 0.0),
            rotation: DVec3::new(0.0, 90.0, 0.0),
            translation: DVec3::new(0.0, 4.0, 0.0),
            ..Default::default()
        };
        let p = compose_local(&t).transform_point3(t.pivot);
        assert!((p - DVec3::new(1.0, 4.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn rotation_applies_x_then_y_then_z() {
        let deg = DVec3::new(90.0, 90.0, 0.0);
        let r = rotation_xyz_degrees(deg);
        let expected = DMat4::from_rotation_x(std::f64::consts::FRAC_PI_2)
            * DMat4::from_rotation_y(std::f64::consts::FRAC_PI_2);
        assert!(mat_approx(&r, &expected, 1e-12));
        let reversed = DMat4::from_rotation_y(std::f64::consts::FRAC_PI_2)
            * DMat4::from_rotation_x(std::f64::consts::FRAC_PI_2);
        assert!(!mat_approx(&r, &reversed, 1e-6));
    }

    #[test]
    fn rotation_before_scale_is_preserved() {
        let t = BoneTransform {
            rotation: DVec3::new(0.0, 0.0, 90.0),
            scale: DVec3::new(2.0, 1.0, 1.0),
            ..Default::default()
        };
        let specified = compose_local(&t);
        let swapped = DMat4::from_scale(t.scale) * rotation_xyz_degrees(t.rotation);
        assert!(!mat_approx(&specified, &swapped, 1e-6));
        // Scale is applied in the bone's own frame: x stretches before the turn.
        let x = specified.transform_point3(DVec3::X);
        assert!((x - DVec3::new(0.0, 2.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn root_frame_applies_position_once() {
        let root = RenderRoot::at(DVec3::new(10.0, 64.0, -3.0));
        let t = BoneTransform {
            translation: DVec3::new(0.0, 1.0, 0.0),
            ..Default::default()
        };
        let m = compute_transforms(&t, &Frame::root(&root));
        assert_eq!(m.model.w_axis.truncate(), DVec3::new(0.0, 1.0, 0.0));
        assert_eq!(m.world.w_axis.truncate(), DVec3::new(10.0, 65.0, -3.0));
        let child = compute_transforms(&t, &Frame::from(&m));
        assert_eq!(child.world.w_axis.truncate(), DVec3::new(10.0, 66.0, -3.0));
    }
}
