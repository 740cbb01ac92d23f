//! Text front end: a pest grammar (`expr.pest`) for the token sequence and
//! a Pratt pass for precedence.
//!
//! Precedence, lowest first:
//!
//! | level       | operators            |
//! |-------------|----------------------|
//! | conditional | `c ? a : b` (right)  |
//! | or          | `\|\|`               |
//! | and         | `&&`                 |
//! | equality    | `==` `!=`            |
//! | comparison  | `<` `<=` `>` `>=`    |
//! | additive    | `+` `-`              |
//! | term        | `*` `/`              |
//! | unary       | `-` `!` `+`          |
//!
//! Operators lower onto the `op.*` built-ins, so the output is an ordinary
//! [`Expr`] tree. A leading `return` and trailing `;` are accepted.

use once_cell::sync::Lazy;
use pest::error::InputLocation;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest::Parser;
use pest_derive::Parser;
use serde::{Deserialize, Serialize};

use crate::context::canonical_name;
use crate::error::ExprError;
use crate::function::Function;
use crate::node::{Expr, MAX_TREE_DEPTH};
use crate::registry::FunctionRegistry;

#[derive(Parser)]
#[grammar = "expr.pest"]
struct ExprParser;

static PRATT: Lazy<PrattParser<Rule>> = Lazy::new(|| {
    PrattParser::new()
        .op(Op::infix(Rule::ternary, Assoc::Right))
        .op(Op::infix(Rule::or, Assoc::Left))
        .op(Op::infix(Rule::and, Assoc::Left))
        .op(Op::infix(Rule::eq, Assoc::Left) | Op::infix(Rule::ne, Assoc::Left))
        .op(Op::infix(Rule::lt, Assoc::Left)
            | Op::infix(Rule::le, Assoc::Left)
            | Op::infix(Rule::gt, Assoc::Left)
            | Op::infix(Rule::ge, Assoc::Left))
        .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
        .op(Op::infix(Rule::mul, Assoc::Left) | Op::infix(Rule::div, Assoc::Left))
        .op(Op::prefix(Rule::neg) | Op::prefix(Rule::not) | Op::prefix(Rule::pos))
});

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParseConfig {
    /// Maximum nesting (brackets, `?:` branches and tree height) before
    /// parsing gives up. Capped at [`MAX_TREE_DEPTH`].
    pub max_depth: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self { max_depth: 64 }
    }
}

/// Parse `source` with the default [`ParseConfig`].
pub fn parse(source: &str, registry: &FunctionRegistry) -> Result<Expr, ExprError> {
    parse_with_config(source, registry, &ParseConfig::default())
}

pub fn parse_with_config(
    source: &str,
    registry: &FunctionRegistry,
    cfg: &ParseConfig,
) -> Result<Expr, ExprError> {
    let limit = cfg.max_depth.min(MAX_TREE_DEPTH);
    check_nesting(source, limit)?;

    let program = ExprParser::parse(Rule::program, source)
        .map_err(syntax_error)?
        .next()
        .ok_or_else(|| ExprError::parse(0, "empty input"))?;
    let body = program
        .into_inner()
        .find(|p| p.as_rule() == Rule::expr)
        .ok_or_else(|| ExprError::parse(0, "expected an expression"))?;

    let expr = Builder { registry, limit }.expr(body)?;
    log::trace!("parsed '{}' -> {}", source, expr);
    Ok(expr)
}

fn syntax_error(e: pest::error::Error<Rule>) -> ExprError {
    let position = match e.location {
        InputLocation::Pos(p) => p,
        InputLocation::Span((start, _)) => start,
    };
    ExprError::parse(position, e.variant.message())
}

/// Brackets and `?` open a level, `)` and `:` close one. The grammar
/// recurses once per level, so this runs before pest sees the input.
fn check_nesting(source: &str, limit: usize) -> Result<(), ExprError> {
    let mut level = 0usize;
    for b in source.bytes() {
        match b {
            b'(' | b'?' => {
                level += 1;
                if level > limit {
                    return Err(ExprError::TooDeep { limit });
                }
            }
            b')' | b':' => level = level.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

struct Builder<'a> {
    registry: &'a FunctionRegistry,
    limit: usize,
}

impl Builder<'_> {
    fn expr(&self, pair: Pair<'_, Rule>) -> Result<Expr, ExprError> {
        self.check_sequence(pair.clone().into_inner())?;
        PRATT
            .map_primary(|p| self.primary(p))
            .map_prefix(|op, rhs| self.prefix(op, rhs?))
            .map_infix(|lhs, op, rhs| self.infix(lhs?, op, rhs?))
            .parse(pair.into_inner())
    }

    /// Prefix runs and `?:` chains recurse inside the Pratt pass, so they
    /// are bounded before it runs. Flat binary chains are bounded by tree
    /// height as they are built.
    fn check_sequence(&self, pairs: Pairs<'_, Rule>) -> Result<(), ExprError> {
        let mut run = 0usize;
        let mut ternaries = 0usize;
        for p in pairs {
            match p.as_rule() {
                Rule::neg | Rule::not | Rule::pos => run += 1,
                Rule::ternary => {
                    ternaries += 1;
                    run = 0;
                }
                _ => run = 0,
            }
            if run > self.limit || ternaries > self.limit {
                return Err(self.too_deep());
            }
        }
        Ok(())
    }

    fn primary(&self, pair: Pair<'_, Rule>) -> Result<Expr, ExprError> {
        match pair.as_rule() {
            Rule::number => number(&pair),
            Rule::ident => self.name(pair.as_str()),
            Rule::call => self.call(pair),
            Rule::expr => self.expr(pair),
            other => Err(ExprError::parse(
                pair.as_span().start(),
                format!("unexpected {other:?}"),
            )),
        }
    }

    fn name(&self, text: &str) -> Result<Expr, ExprError> {
        let name = text.to_ascii_lowercase();
        match name.as_str() {
            "true" => return Ok(Expr::Constant(1.0)),
            "false" => return Ok(Expr::Constant(0.0)),
            _ => {}
        }
        match self.registry.get(&name) {
            // `math.pi` and other zero-argument functions may drop the parens;
            // anything else without them fails the arity check.
            Some(function) => Expr::call(function.clone(), Vec::new()),
            None => Ok(Expr::Variable(canonical_name(&name))),
        }
    }

    fn call(&self, pair: Pair<'_, Rule>) -> Result<Expr, ExprError> {
        let mut inner = pair.into_inner();
        let name = inner
            .next()
            .map(|p| p.as_str().to_ascii_lowercase())
            .unwrap_or_default();
        let function = self
            .registry
            .get(&name)
            .cloned()
            .ok_or(ExprError::UnknownFunction(name))?;
        let args = inner
            .map(|arg| self.expr(arg))
            .collect::<Result<Vec<_>, _>>()?;
        self.bounded(Expr::call(function, args)?)
    }

    fn prefix(&self, op: Pair<'_, Rule>, rhs: Expr) -> Result<Expr, ExprError> {
        let e = match op.as_rule() {
            Rule::neg => match rhs {
                Expr::Constant(v) => Expr::Constant(-v),
                inner => Expr::call(Function::Neg, vec![inner])?,
            },
            Rule::not => Expr::call(Function::Not, vec![rhs])?,
            _ => rhs,
        };
        self.bounded(e)
    }

    fn infix(&self, lhs: Expr, op: Pair<'_, Rule>, rhs: Expr) -> Result<Expr, ExprError> {
        let at = op.as_span().start();
        let function = match op.as_rule() {
            Rule::ternary => {
                let then = op
                    .into_inner()
                    .next()
                    .ok_or_else(|| ExprError::parse(at, "expected an expression after '?'"))?;
                let then = self.expr(then)?;
                return self.bounded(Expr::call(Function::Conditional, vec![lhs, then, rhs])?);
            }
            Rule::or => Function::Or,
            Rule::and => Function::And,
            Rule::eq => Function::Eq,
            Rule::ne => Function::Ne,
            Rule::lt => Function::Lt,
            Rule::le => Function::Le,
            Rule::gt => Function::Gt,
            Rule::ge => Function::Ge,
            Rule::add => Function::Add,
            Rule::sub => Function::Sub,
            Rule::mul => Function::Mul,
            Rule::div => Function::Div,
            other => return Err(ExprError::parse(at, format!("unexpected {other:?}"))),
        };
        self.bounded(Expr::call(function, vec![lhs, rhs])?)
    }

    fn bounded(&self, e: Expr) -> Result<Expr, ExprError> {
        if e.depth() > self.limit {
            return Err(self.too_deep());
        }
        Ok(e)
    }

    fn too_deep(&self) -> ExprError {
        ExprError::TooDeep { limit: self.limit }
    }
}

fn number(pair: &Pair<'_, Rule>) -> Result<Expr, ExprError> {
    let text = pair.as_str().trim_end_matches(['f', 'F']);
    text.parse().map(Expr::Constant).map_err(|_| {
        ExprError::parse(pair.as_span().start(), format!("invalid number '{text}'"))
    })
}
