use std::f64::consts::PI;

use geode_expr_core::{BindingContext, Expr, ExprError, Function, FunctionRegistry};
use proptest::prelude::*;

fn approx(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

fn apply1(f: Function, x: f64) -> f64 {
    Expr::call(f, vec![Expr::constant(x)])
        .expect("one-argument call")
        .evaluate(&BindingContext::new())
        .expect("constant tree evaluates")
}

#[test]
fn cos_degrees_reference_points() {
    assert!(approx(apply1(Function::CosDegrees, 180.0), -1.0, 1e-9));
    assert!(approx(apply1(Function::CosDegrees, 0.0), 1.0, 1e-9));
    assert!(approx(apply1(Function::CosDegrees, 90.0), 0.0, 1e-9));
    assert!(approx(apply1(Function::SinDegrees, 90.0), 1.0, 1e-9));
    assert!(approx(apply1(Function::TanDegrees, 45.0), 1.0, 1e-9));
}

fn finite_f64() -> impl Strategy<Value = f64> {
    prop::num::f64::NORMAL | prop::num::f64::SUBNORMAL | prop::num::f64::ZERO
}

proptest! {
    #[test]
    fn forward_trig_matches_radian_functions(x in finite_f64()) {
        let radians = x / 180.0 * PI;
        prop_assert_eq!(apply1(Function::CosDegrees, x).to_bits(), radians.cos().to_bits());
        prop_assert_eq!(apply1(Function::SinDegrees, x).to_bits(), radians.sin().to_bits());
        prop_assert_eq!(apply1(Function::TanDegrees, x).to_bits(), radians.tan().to_bits());
    }

    #[test]
    fn forward_trig_agrees_with_to_radians(x in -1.0e6f64..1.0e6) {
        let got = apply1(Function::CosDegrees, x);
        prop_assert!(approx(got, x.to_radians().cos(), 1e-9), "cos at {x}: {got}");
        let got = apply1(Function::SinDegrees, x);
        prop_assert!(approx(got, x.to_radians().sin(), 1e-9), "sin at {x}: {got}");
    }

    #[test]
    fn inverse_trig_answers_in_degrees(deg in -89.0f64..89.0) {
        let s = apply1(Function::SinDegrees, deg);
        prop_assert!(approx(apply1(Function::AsinDegrees, s), deg, 1e-9));
        let t = apply1(Function::TanDegrees, deg);
        prop_assert!(approx(apply1(Function::AtanDegrees, t), deg, 1e-9));
        let c = apply1(Function::CosDegrees, deg.abs());
        prop_assert!(approx(apply1(Function::AcosDegrees, c), deg.abs(), 1e-5));
    }
}

#[test]
fn inverse_trig_returns_degrees_not_radians() {
    let reg = FunctionRegistry::default();
    let eval = |src: &str| {
        geode_expr_core::parse(src, &reg)
            .expect("parses")
            .evaluate(&BindingContext::new())
            .expect("constant")
    };
    assert!(approx(eval("math.asin(1)"), 90.0, 1e-9));
    assert!(approx(eval("math.acos(0)"), 90.0, 1e-9));
    assert!(approx(eval("math.atan(1)"), 45.0, 1e-9));
    assert!(approx(eval("math.atan2(1, 1)"), 45.0, 1e-9));
    assert!(approx(eval("math.asin(math.sin(30))"), 30.0, 1e-9));
}

#[test]
fn try_apply_rejects_short_argument_lists() {
    assert!(matches!(
        Function::CosDegrees.try_apply(&[]),
        Err(ExprError::ArityMismatch { expected: 1, found: 0, .. })
    ));
    assert!(approx(Function::CosDegrees.try_apply(&[60.0]).expect("arity 1"), 0.5, 1e-9));
}

#[test]
fn every_function_rejects_wrong_arity() {
    for f in Function::BUILTINS {
        let arity = f.arity();
        for count in [arity + 1, arity + 2]
            .into_iter()
            .chain(arity.checked_sub(1))
        {
            let args = vec![Expr::constant(1.0); count];
            match Expr::call(f.clone(), args) {
                Err(ExprError::ArityMismatch {
                    expected, found, ..
                }) => {
                    assert_eq!(expected, arity);
                    assert_eq!(found, count);
                }
                other => panic!("{} with {count} args: {other:?}", f.name()),
            }
        }
        let ok = Expr::call(f.clone(), vec![Expr::constant(0.5); arity]);
        assert!(ok.is_ok(), "{} with exact arity", f.name());
    }
}

#[test]
fn variable_with_empty_context_is_unbound() {
    let e = Expr::variable("query.anim_time");
    assert_eq!(
        e.evaluate(&BindingContext::new()),
        Err(ExprError::UnboundVariable("query.anim_time".into()))
    );
}

#[test]
fn registry_lookup_feeds_calls() {
    let reg = FunctionRegistry::default();
    let cos = reg.get("math.cos").cloned().expect("cos registered");
    let e = Expr::call(cos, vec![Expr::variable("q.anim_time")]).expect("arity 1");
    let ctx = BindingContext::new().with("query.anim_time", 60.0);
    assert!(approx(e.evaluate(&ctx).expect("bound"), 0.5, 1e-9));
}
