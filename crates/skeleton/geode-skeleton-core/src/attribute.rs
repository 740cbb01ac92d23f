//! Bone attributes: constants or per-frame expressions.

use geode_expr_core::{BindingContext, Expr, ExprError};
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Which of a bone's four transform inputs an [`Attribute`] feeds.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    Pivot,
    Rotation,
    Scale,
    Translation,
}

impl AttributeKind {
    pub const ALL: [AttributeKind; 4] = [
        AttributeKind::Pivot,
        AttributeKind::Rotation,
        AttributeKind::Scale,
        AttributeKind::Translation,
    ];

    /// Value used when a model leaves the attribute out.
    pub fn rest_value(self) -> DVec3 {
        match self {
            AttributeKind::Scale => DVec3::ONE,
            _ => DVec3::ZERO,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Attribute {
    Constant(DVec3),
    /// One expression per component (x, y, z), re-evaluated every frame.
    Driven([Expr; 3]),
}

impl Attribute {
    pub fn constant(x: f64, y: f64, z: f64) -> Self {
        Attribute::Constant(DVec3::new(x, y, z))
    }

    pub fn driven(x: Expr, y: Expr, z: Expr) -> Self {
        Attribute::Driven([x, y, z])
    }

    pub fn resolve(&self, ctx: &BindingContext) -> Result<DVec3, ExprError> {
        match self {
            Attribute::Constant(v) => Ok(*v),
            Attribute::Driven([x, y, z]) => Ok(DVec3::new(
                x.evaluate(ctx)?,
                y.evaluate(ctx)?,
                z.evaluate(ctx)?,
            )),
        }
    }

    pub fn is_driven(&self) -> bool {
        matches!(self, Attribute::Driven(_))
    }

    /// Variables referenced by any component.
    pub fn variables(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        if let Attribute::Driven(components) = self {
            for e in components {
                for name in e.variables() {
                    if !out.contains(&name) {
                        out.push(name);
                    }
                }
            }
        }
        out
    }

    /// Fold constant sub-expressions; a fully constant `Driven` becomes `Constant`.
    pub fn simplify(self) -> Self {
        match self {
            Attribute::Driven([x, y, z]) => {
                let (x, y, z) = (x.fold_constants(), y.fold_constants(), z.fold_constants());
                match (&x, &y, &z) {
                    (Expr::Constant(a), Expr::Constant(b), Expr::Constant(c)) => {
                        Attribute::constant(*a, *b, *c)
                    }
                    _ => Attribute::Driven([x, y, z]),
                }
            }
            constant => constant,
        }
    }
}

impl From<DVec3> for Attribute {
    fn from(v: DVec3) -> Self {
        Attribute::Constant(v)
    }
}

impl From<[f64; 3]> for Attribute {
    fn from(v: [f64; 3]) -> Self {
        Attribute::Constant(DVec3::from_array(v))
    }
}
