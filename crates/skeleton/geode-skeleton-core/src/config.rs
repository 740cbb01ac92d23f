//! Core configuration for geode-skeleton-core.

use geode_expr_core::ParseConfig;
use serde::{Deserialize, Serialize};

/// Pixels per block in the authored model formats.
pub const PIXELS_PER_BLOCK: f64 = 16.0;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Factor applied by the loaders to authored pivots and translations
    /// (pixel units -> block units). The compositor itself is unit-free.
    pub unit_scale: f64,

    /// Publish local/world/model matrices for every bone, not just the
    /// ones flagged as tracking.
    pub track_all_matrices: bool,

    /// Initial capacity hint for the per-frame pose buffer.
    pub scratch_bones: usize,

    /// Limits for expressions parsed by the loaders.
    pub parse: ParseConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            unit_scale: 1.0 / PIXELS_PER_BLOCK,
            track_all_matrices: false,
            scratch_bones: 64,
            parse: ParseConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "track_all_matrices": true }"#).unwrap();
        assert!(cfg.track_all_matrices);
        assert_eq!(cfg.unit_scale, 1.0 / 16.0);
        assert_eq!(cfg.parse.max_depth, 64);
    }
}
