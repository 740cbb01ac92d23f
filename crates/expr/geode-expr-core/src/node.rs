//! Expression tree nodes and evaluation.

use std::fmt;

use crate::context::{canonical_name, BindingContext};
use crate::error::ExprError;
use crate::function::Function;

/// Arguments up to this count are evaluated into a stack buffer.
const INLINE_ARGS: usize = 8;

/// Deepest tree [`Expr::call`] will build. Evaluation, folding and drop all
/// recurse once per level.
pub const MAX_TREE_DEPTH: usize = 256;

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Constant(f64),
    /// Variable reference, stored in canonical form (see [`Expr::variable`]).
    Variable(String),
    Call(Call),
}

/// A function applied to an ordered argument list.
///
/// Fields are private: the only way to build one is [`Expr::call`], which
/// rejects argument counts that differ from the function's arity.
#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    function: Function,
    args: Vec<Expr>,
    depth: usize,
}

impl Call {
    fn new(function: Function, args: Vec<Expr>) -> Self {
        let depth = 1 + args.iter().map(Expr::depth).max().unwrap_or(0);
        Self {
            function,
            args,
            depth,
        }
    }

    pub fn function(&self) -> &Function {
        &self.function
    }

    pub fn args(&self) -> &[Expr] {
        &self.args
    }
}

impl Expr {
    pub fn constant(value: f64) -> Self {
        Expr::Constant(value)
    }

    pub fn variable(name: &str) -> Self {
        Expr::Variable(canonical_name(name))
    }

    /// Build a call node, checking the argument count first.
    ///
    /// Trees deeper than [`MAX_TREE_DEPTH`] are rejected with
    /// [`ExprError::TooDeep`].
    pub fn call(function: Function, args: Vec<Expr>) -> Result<Self, ExprError> {
        let expected = function.arity();
        if args.len() != expected {
            return Err(ExprError::ArityMismatch {
                function: function.name().to_string(),
                expected,
                found: args.len(),
            });
        }
        let call = Call::new(function, args);
        if call.depth > MAX_TREE_DEPTH {
            return Err(ExprError::TooDeep {
                limit: MAX_TREE_DEPTH,
            });
        }
        Ok(Expr::Call(call))
    }

    /// Evaluate against `ctx`. Arguments are evaluated left to right.
    pub fn evaluate(&self, ctx: &BindingContext) -> Result<f64, ExprError> {
        match self {
            Expr::Constant(v) => Ok(*v),
            Expr::Variable(name) => ctx
                .get_canonical(name)
                .or_else(|| ctx.get(name))
                .ok_or_else(|| ExprError::UnboundVariable(name.clone())),
            Expr::Call(call) => {
                let n = call.args.len();
                if n <= INLINE_ARGS {
                    let mut buf = [0.0f64; INLINE_ARGS];
                    for (slot, arg) in buf.iter_mut().zip(&call.args) {
                        *slot = arg.evaluate(ctx)?;
                    }
                    Ok(call.function.apply(&buf[..n]))
                } else {
                    let values = call
                        .args
                        .iter()
                        .map(|arg| arg.evaluate(ctx))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(call.function.apply(&values))
                }
            }
        }
    }

    /// True when the tree references no variables.
    pub fn is_constant(&self) -> bool {
        match self {
            Expr::Constant(_) => true,
            Expr::Variable(_) => false,
            Expr::Call(call) => call.args.iter().all(Expr::is_constant),
        }
    }

    /// Collapse every variable-free subtree into a constant.
    pub fn fold_constants(self) -> Self {
        match self {
            Expr::Call(Call { function, args, .. }) => {
                let args: Vec<Expr> = args.into_iter().map(Expr::fold_constants).collect();
                if args.iter().all(|a| matches!(a, Expr::Constant(_))) {
                    let values: Vec<f64> = args
                        .iter()
                        .map(|a| match a {
                            Expr::Constant(v) => *v,
                            _ => 0.0,
                        })
                        .collect();
                    Expr::Constant(function.apply(&values))
                } else {
                    Expr::Call(Call::new(function, args))
                }
            }
            other => other,
        }
    }

    /// Variable names referenced by the tree, deduplicated, in first-use order.
    pub fn variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Constant(_) => {}
            Expr::Variable(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name.as_str());
                }
            }
            Expr::Call(call) => {
                for arg in &call.args {
                    arg.collect_variables(out);
                }
            }
        }
    }

    /// Height of the tree; a leaf is 1.
    pub fn depth(&self) -> usize {
        match self {
            Expr::Call(call) => call.depth,
            _ => 1,
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Constant(value)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(v) => write!(f, "{v}"),
            Expr::Variable(name) => f.write_str(name),
            Expr::Call(call) => {
                write!(f, "{}(", call.function.name())?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::CustomFunction;

    #[test]
    fn call_rejects_wrong_arity() {
        let err = Expr::call(Function::CosDegrees, vec![]).unwrap_err();
        assert_eq!(
            err,
            ExprError::ArityMismatch {
                function: "math.cos".into(),
                expected: 1,
                found: 0,
            }
        );
        assert!(Expr::call(Function::Lerp, vec![1.0.into(), 2.0.into()]).is_err());
    }

    #[test]
    fn arguments_evaluate_left_to_right() {
        let sub = Expr::call(
            Function::Sub,
            vec![Expr::variable("q.a"), Expr::variable("q.b")],
        )
        .unwrap();
        let ctx = BindingContext::new().with("q.a", 10.0).with("q.b", 4.0);
        assert_eq!(sub.evaluate(&ctx).unwrap(), 6.0);
    }

    #[test]
    fn first_unbound_variable_is_reported() {
        let e = Expr::call(
            Function::Add,
            vec![Expr::variable("q.first"), Expr::variable("q.second")],
        )
        .unwrap();
        let err = e.evaluate(&BindingContext::new()).unwrap_err();
        assert_eq!(err, ExprError::UnboundVariable("query.first".into()));
    }

    #[test]
    fn wide_custom_call_uses_heap_path() {
        let sum = CustomFunction::new("sum10", 10, |xs| xs.iter().sum());
        let args = (1..=10).map(|i| Expr::constant(i as f64)).collect();
        let e = Expr::call(Function::Custom(sum), args).unwrap();
        assert_eq!(e.evaluate(&BindingContext::new()).unwrap(), 55.0);
    }

    #[test]
    fn fold_keeps_variable_subtrees() {
        let inner = Expr::call(Function::Mul, vec![2.0.into(), 3.0.into()]).unwrap();
        let e = Expr::call(Function::Add, vec![inner, Expr::variable("q.x")]).unwrap();
        assert!(!e.is_constant());
        let folded = e.fold_constants();
        match &folded {
            Expr::Call(call) => assert_eq!(call.args()[0], Expr::Constant(6.0)),
            other => panic!("expected call, got {other:?}"),
        }
        assert_eq!(folded.variables(), vec!["query.x"]);
        assert_eq!(folded.depth(), 2);
    }

    #[test]
    fn call_rejects_trees_past_depth_cap() {
        let mut e = Expr::variable("q.x");
        for _ in 1..MAX_TREE_DEPTH {
            e = Expr::call(Function::Neg, vec![e]).unwrap();
        }
        assert_eq!(e.depth(), MAX_TREE_DEPTH);
        assert_eq!(
            Expr::call(Function::Neg, vec![e]),
            Err(ExprError::TooDeep {
                limit: MAX_TREE_DEPTH
            })
        );
    }

    #[test]
    fn display_uses_function_names() {
        let e = Expr::call(Function::CosDegrees, vec![Expr::variable("q.anim_time")]).unwrap();
        assert_eq!(e.to_string(), "math.cos(query.anim_time)");
    }
}
