//! Geode Expression Core (engine-agnostic)
//!
//! A small interpreted arithmetic language used to drive bone attributes
//! procedurally. Expressions are trees of constants, variable references and
//! function calls; authored operators (`+`, `*`, `?:`, ...) are lowered onto
//! built-in functions so every node is one of those three kinds.
//!
//! Function arity is checked when a call node is built, so a tree that
//! exists is always well formed. Evaluation only fails when a referenced
//! variable has no value in the [`BindingContext`].

pub mod context;
pub mod error;
pub mod function;
pub mod node;
pub mod parser;
pub mod registry;

// Re-exports for consumers (skeleton/model loaders)
pub use context::BindingContext;
pub use error::ExprError;
pub use function::{CustomFunction, Function};
pub use node::{Call, Expr, MAX_TREE_DEPTH};
pub use parser::{parse, parse_with_config, ParseConfig};
pub use registry::FunctionRegistry;
