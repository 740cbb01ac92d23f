//! Function table: one closed enum with a single dispatch.
//!
//! - operator functions (the lowered form of `+`, `<`, `?:`, ...)
//! - degree trigonometry (angles are authored in degrees)
//! - rounding / arithmetic helpers
//! - interpolation and easing curves
//! - `Custom` for rules registered at runtime

use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use crate::error::ExprError;

/// Threshold used by the equality operators.
pub const EQ_EPSILON: f64 = 1e-5;

type Rule = dyn Fn(&[f64]) -> f64 + Send + Sync;

/// A named, fixed-arity pure rule supplied by the host.
#[derive(Clone)]
pub struct CustomFunction {
    name: String,
    arity: usize,
    rule: Arc<Rule>,
}

impl CustomFunction {
    pub fn new<F>(name: impl Into<String>, arity: usize, rule: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        Self {
            name: name.into().to_ascii_lowercase(),
            arity,
            rule: Arc::new(rule),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }
}

impl fmt::Debug for CustomFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CustomFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.arity == other.arity && Arc::ptr_eq(&self.rule, &other.rule)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Function {
    // Operators
    Add,
    Sub,
    Mul,
    Div,
    Neg,
    Not,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Conditional,

    // Trigonometry in degrees
    SinDegrees,
    CosDegrees,
    TanDegrees,
    AsinDegrees,
    AcosDegrees,
    AtanDegrees,
    Atan2Degrees,

    // Arithmetic
    Abs,
    Ceil,
    Floor,
    Round,
    Trunc,
    Sqrt,
    Exp,
    Ln,
    Pow,
    Mod,
    Min,
    Max,
    Clamp,
    Sign,
    Pi,

    // Interpolation / easing
    Lerp,
    LerpRotate,
    HermiteBlend,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
    CubicBezier,

    Custom(CustomFunction),
}

impl Function {
    /// Every built-in, in registration order.
    pub const BUILTINS: &'static [Function] = &[
        Function::Add,
        Function::Sub,
        Function::Mul,
        Function::Div,
        Function::Neg,
        Function::Not,
        Function::Eq,
        Function::Ne,
        Function::Lt,
        Function::Le,
        Function::Gt,
        Function::Ge,
        Function::And,
        Function::Or,
        Function::Conditional,
        Function::SinDegrees,
        Function::CosDegrees,
        Function::TanDegrees,
        Function::AsinDegrees,
        Function::AcosDegrees,
        Function::AtanDegrees,
        Function::Atan2Degrees,
        Function::Abs,
        Function::Ceil,
        Function::Floor,
        Function::Round,
        Function::Trunc,
        Function::Sqrt,
        Function::Exp,
        Function::Ln,
        Function::Pow,
        Function::Mod,
        Function::Min,
        Function::Max,
        Function::Clamp,
        Function::Sign,
        Function::Pi,
        Function::Lerp,
        Function::LerpRotate,
        Function::HermiteBlend,
        Function::EaseInQuad,
        Function::EaseOutQuad,
        Function::EaseInOutQuad,
        Function::EaseInCubic,
        Function::EaseOutCubic,
        Function::EaseInOutCubic,
        Function::EaseInSine,
        Function::EaseOutSine,
        Function::EaseInOutSine,
        Function::CubicBezier,
    ];

    /// Lookup name. Operators use an `op.` namespace so they never collide
    /// with authored identifiers.
    pub fn name(&self) -> &str {
        match self {
            Function::Add => "op.add",
            Function::Sub => "op.sub",
            Function::Mul => "op.mul",
            Function::Div => "op.div",
            Function::Neg => "op.neg",
            Function::Not => "op.not",
            Function::Eq => "op.eq",
            Function::Ne => "op.ne",
            Function::Lt => "op.lt",
            Function::Le => "op.le",
            Function::Gt => "op.gt",
            Function::Ge => "op.ge",
            Function::And => "op.and",
            Function::Or => "op.or",
            Function::Conditional => "op.conditional",
            Function::SinDegrees => "math.sin",
            Function::CosDegrees => "math.cos",
            Function::TanDegrees => "math.tan",
            Function::AsinDegrees => "math.asin",
            Function::AcosDegrees => "math.acos",
            Function::AtanDegrees => "math.atan",
            Function::Atan2Degrees => "math.atan2",
            Function::Abs => "math.abs",
            Function::Ceil => "math.ceil",
            Function::Floor => "math.floor",
            Function::Round => "math.round",
            Function::Trunc => "math.trunc",
            Function::Sqrt => "math.sqrt",
            Function::Exp => "math.exp",
            Function::Ln => "math.ln",
            Function::Pow => "math.pow",
            Function::Mod => "math.mod",
            Function::Min => "math.min",
            Function::Max => "math.max",
            Function::Clamp => "math.clamp",
            Function::Sign => "math.sign",
            Function::Pi => "math.pi",
            Function::Lerp => "math.lerp",
            Function::LerpRotate => "math.lerprotate",
            Function::HermiteBlend => "math.hermite_blend",
            Function::EaseInQuad => "math.ease_in_quad",
            Function::EaseOutQuad => "math.ease_out_quad",
            Function::EaseInOutQuad => "math.ease_in_out_quad",
            Function::EaseInCubic => "math.ease_in_cubic",
            Function::EaseOutCubic => "math.ease_out_cubic",
            Function::EaseInOutCubic => "math.ease_in_out_cubic",
            Function::EaseInSine => "math.ease_in_sine",
            Function::EaseOutSine => "math.ease_out_sine",
            Function::EaseInOutSine => "math.ease_in_out_sine",
            Function::CubicBezier => "math.cubic_bezier",
            Function::Custom(c) => c.name(),
        }
    }

    /// Required argument count.
    pub fn arity(&self) -> usize {
        match self {
            Function::Pi => 0,
            Function::Neg
            | Function::Not
            | Function::SinDegrees
            | Function::CosDegrees
            | Function::TanDegrees
            | Function::AsinDegrees
            | Function::AcosDegrees
            | Function::AtanDegrees
            | Function::Abs
            | Function::Ceil
            | Function::Floor
            | Function::Round
            | Function::Trunc
            | Function::Sqrt
            | Function::Exp
            | Function::Ln
            | Function::Sign
            | Function::HermiteBlend
            | Function::EaseInQuad
            | Function::EaseOutQuad
            | Function::EaseInOutQuad
            | Function::EaseInCubic
            | Function::EaseOutCubic
            | Function::EaseInOutCubic
            | Function::EaseInSine
            | Function::EaseOutSine
            | Function::EaseInOutSine => 1,
            Function::Add
            | Function::Sub
            | Function::Mul
            | Function::Div
            | Function::Eq
            | Function::Ne
            | Function::Lt
            | Function::Le
            | Function::Gt
            | Function::Ge
            | Function::And
            | Function::Or
            | Function::Atan2Degrees
            | Function::Pow
            | Function::Mod
            | Function::Min
            | Function::Max => 2,
            Function::Conditional | Function::Clamp | Function::Lerp | Function::LerpRotate => 3,
            Function::CubicBezier => 5,
            Function::Custom(c) => c.arity(),
        }
    }

    /// Apply the rule to already-evaluated arguments, checking the count.
    pub fn try_apply(&self, args: &[f64]) -> Result<f64, ExprError> {
        let expected = self.arity();
        if args.len() != expected {
            return Err(ExprError::ArityMismatch {
                function: self.name().to_string(),
                expected,
                found: args.len(),
            });
        }
        Ok(self.apply(args))
    }

    /// Unchecked form of [`Function::try_apply`]; call nodes already hold
    /// exactly `arity()` arguments.
    pub(crate) fn apply(&self, args: &[f64]) -> f64 {
        let a = |i: usize| args[i];
        match self {
            Function::Add => a(0) + a(1),
            Function::Sub => a(0) - a(1),
            Function::Mul => a(0) * a(1),
            // Division by zero leaves the numerator untouched.
            Function::Div => {
                let d = a(1);
                a(0) / if d == 0.0 { 1.0 } else { d }
            }
            Function::Neg => -a(0),
            Function::Not => truth(a(0) == 0.0),
            Function::Eq => truth((a(0) - a(1)).abs() < EQ_EPSILON),
            Function::Ne => truth((a(0) - a(1)).abs() >= EQ_EPSILON),
            Function::Lt => truth(a(0) < a(1)),
            Function::Le => truth(a(0) <= a(1)),
            Function::Gt => truth(a(0) > a(1)),
            Function::Ge => truth(a(0) >= a(1)),
            Function::And => truth(a(0) != 0.0 && a(1) != 0.0),
            Function::Or => truth(a(0) != 0.0 || a(1) != 0.0),
            Function::Conditional => {
                if a(0) != 0.0 {
                    a(1)
                } else {
                    a(2)
                }
            }

            Function::SinDegrees => radians(a(0)).sin(),
            Function::CosDegrees => radians(a(0)).cos(),
            Function::TanDegrees => radians(a(0)).tan(),
            Function::AsinDegrees => a(0).asin().to_degrees(),
            Function::AcosDegrees => a(0).acos().to_degrees(),
            Function::AtanDegrees => a(0).atan().to_degrees(),
            Function::Atan2Degrees => a(0).atan2(a(1)).to_degrees(),

            Function::Abs => a(0).abs(),
            Function::Ceil => a(0).ceil(),
            Function::Floor => a(0).floor(),
            Function::Round => a(0).round(),
            Function::Trunc => a(0).trunc(),
            Function::Sqrt => a(0).sqrt(),
            Function::Exp => a(0).exp(),
            Function::Ln => a(0).ln(),
            Function::Pow => a(0).powf(a(1)),
            Function::Mod => a(0) % a(1),
            Function::Min => a(0).min(a(1)),
            Function::Max => a(0).max(a(1)),
            Function::Clamp => clamp(a(0), a(1), a(2)),
            Function::Sign => {
                if a(0) > 0.0 {
                    1.0
                } else if a(0) < 0.0 {
                    -1.0
                } else {
                    0.0
                }
            }
            Function::Pi => PI,

            Function::Lerp => lerp(a(0), a(1), a(2)),
            Function::LerpRotate => lerp_rotate(a(0), a(1), a(2)),
            Function::HermiteBlend => {
                let t = a(0);
                3.0 * t * t - 2.0 * t * t * t
            }
            Function::EaseInQuad => a(0) * a(0),
            Function::EaseOutQuad => {
                let t = a(0);
                1.0 - (1.0 - t) * (1.0 - t)
            }
            Function::EaseInOutQuad => {
                let t = a(0);
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Function::EaseInCubic => a(0).powi(3),
            Function::EaseOutCubic => 1.0 - (1.0 - a(0)).powi(3),
            Function::EaseInOutCubic => {
                let t = a(0);
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Function::EaseInSine => 1.0 - (a(0) * PI / 2.0).cos(),
            Function::EaseOutSine => (a(0) * PI / 2.0).sin(),
            Function::EaseInOutSine => -((PI * a(0)).cos() - 1.0) / 2.0,
            Function::CubicBezier => bezier_ease(a(4), a(0), a(1), a(2), a(3)),

            Function::Custom(c) => (c.rule)(args),
        }
    }
}

#[inline]
fn truth(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Clamp that tolerates swapped bounds instead of panicking like `f64::clamp`.
#[inline]
fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    v.max(lo).min(hi)
}

#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Degrees to radians as `deg / 180 * PI`, the arithmetic authoring tools use.
#[inline]
pub fn radians(deg: f64) -> f64 {
    deg / 180.0 * PI
}

/// Wrap an angle in degrees into [-180, 180).
#[inline]
pub fn wrap_degrees(deg: f64) -> f64 {
    let m = (deg + 180.0).rem_euclid(360.0);
    m - 180.0
}

/// Interpolate between two angles (degrees) along the shortest arc.
#[inline]
pub fn lerp_rotate(a: f64, b: f64, t: f64) -> f64 {
    let a = wrap_degrees(a);
    let diff = wrap_degrees(b - a);
    a + diff * t
}

#[inline]
fn cubic_bezier(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// CSS-style timing curve: invert the x bezier by bisection, return y.
fn bezier_ease(t: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if x1 == 0.0 && y1 == 0.0 && x2 == 1.0 && y2 == 1.0 {
        return t;
    }
    let mut lo = 0.0f64;
    let mut hi = 1.0f64;
    let mut mid = t;
    for _ in 0..48 {
        let x = cubic_bezier(0.0, x1, x2, 1.0, mid);
        if (x - t).abs() < 1e-12 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(0.0, y1, y2, 1.0, mid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn builtin_names_are_unique() {
        let mut names: Vec<&str> = Function::BUILTINS.iter().map(|f| f.name()).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len());
    }

    #[test]
    fn inverse_trig_returns_degrees() {
        assert!(approx(Function::AsinDegrees.apply(&[1.0]), 90.0, 1e-9));
        assert!(approx(Function::AcosDegrees.apply(&[-1.0]), 180.0, 1e-9));
        assert!(approx(Function::AtanDegrees.apply(&[1.0]), 45.0, 1e-9));
        assert!(approx(Function::Atan2Degrees.apply(&[1.0, 0.0]), 90.0, 1e-9));
    }

    #[test]
    fn try_apply_checks_argument_count() {
        assert_eq!(
            Function::CosDegrees.try_apply(&[]),
            Err(ExprError::ArityMismatch {
                function: "math.cos".into(),
                expected: 1,
                found: 0,
            })
        );
        assert!(Function::Clamp.try_apply(&[1.0, 2.0]).is_err());
        assert_eq!(Function::CosDegrees.try_apply(&[180.0]), Ok(-1.0));
    }

    #[test]
    fn division_by_zero_keeps_numerator() {
        assert_eq!(Function::Div.apply(&[7.0, 0.0]), 7.0);
        assert_eq!(Function::Div.apply(&[7.0, 2.0]), 3.5);
    }

    #[test]
    fn lerp_rotate_takes_short_way() {
        assert!(approx(lerp_rotate(170.0, -170.0, 0.5), 180.0, 1e-9));
        assert!(approx(lerp_rotate(10.0, 30.0, 0.5), 20.0, 1e-9));
    }

    #[test]
    fn clamp_accepts_swapped_bounds() {
        assert_eq!(Function::Clamp.apply(&[5.0, 3.0, 1.0]), 3.0);
        assert_eq!(Function::Clamp.apply(&[-5.0, 1.0, 3.0]), 1.0);
    }

    #[test]
    fn easing_curves_hit_endpoints() {
        let curves = [
            Function::HermiteBlend,
            Function::EaseInQuad,
            Function::EaseOutQuad,
            Function::EaseInOutQuad,
            Function::EaseInCubic,
            Function::EaseOutCubic,
            Function::EaseInOutCubic,
            Function::EaseInSine,
            Function::EaseOutSine,
            Function::EaseInOutSine,
        ];
        for f in curves {
            assert!(approx(f.apply(&[0.0]), 0.0, 1e-9), "{} at 0", f.name());
            assert!(approx(f.apply(&[1.0]), 1.0, 1e-9), "{} at 1", f.name());
        }
    }

    #[test]
    fn cubic_bezier_linear_fast_path() {
        assert_eq!(Function::CubicBezier.apply(&[0.0, 0.0, 1.0, 1.0, 0.3]), 0.3);
        let eased = Function::CubicBezier.apply(&[0.42, 0.0, 0.58, 1.0, 0.5]);
        assert!(approx(eased, 0.5, 1e-6));
    }
}
