//! Name -> function lookup used by the parser.

use hashbrown::HashMap;

use crate::function::{CustomFunction, Function};

/// Maps lowercase function names to their [`Function`].
///
/// `FunctionRegistry::default()` holds every built-in; hosts add their own
/// pure rules with [`register`](Self::register).
#[derive(Clone, Debug)]
pub struct FunctionRegistry {
    by_name: HashMap<String, Function>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        let mut by_name = HashMap::with_capacity(Function::BUILTINS.len());
        for f in Function::BUILTINS {
            by_name.insert(f.name().to_string(), f.clone());
        }
        Self { by_name }
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with no named functions. Operators still parse; they do
    /// not go through the registry.
    pub fn empty() -> Self {
        Self {
            by_name: HashMap::new(),
        }
    }

    /// Register (or replace) a custom function. Returns the previous entry.
    pub fn register(&mut self, custom: CustomFunction) -> Option<Function> {
        let name = custom.name().to_string();
        log::debug!("registering expression function '{}' ({} args)", name, custom.arity());
        self.by_name.insert(name, Function::Custom(custom))
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        match self.by_name.get(name) {
            Some(f) => Some(f),
            None => self.by_name.get(&name.to_ascii_lowercase()),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }
}
