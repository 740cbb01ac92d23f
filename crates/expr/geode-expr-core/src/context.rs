//! Per-evaluation variable bindings.

use hashbrown::HashMap;

/// Short namespace prefixes and their canonical spelling.
const PREFIX_ALIASES: [(&str, &str); 4] = [
    ("q.", "query."),
    ("v.", "variable."),
    ("t.", "temp."),
    ("c.", "context."),
];

/// Canonical form of a variable name: lowercase with the short namespace
/// prefixes expanded (`q.anim_time` -> `query.anim_time`).
pub fn canonical_name(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    for (short, long) in PREFIX_ALIASES {
        if let Some(rest) = lower.strip_prefix(short) {
            return format!("{long}{rest}");
        }
    }
    lower
}

/// Named runtime values available to an expression during one pass
/// (tick count, velocity, ...). Filled by the host once per frame.
#[derive(Clone, Debug, Default)]
pub struct BindingContext {
    values: HashMap<String, f64>,
}

impl BindingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(canonical_name(name), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(&canonical_name(name)).copied()
    }

    /// Lookup for names already in canonical form (skips re-normalising).
    #[inline]
    pub(crate) fn get_canonical(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(&canonical_name(name))
    }

    pub fn remove(&mut self, name: &str) -> Option<f64> {
        self.values.remove(&canonical_name(name))
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
