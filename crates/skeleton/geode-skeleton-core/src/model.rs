//! Model definition loaders.
//!
//! Two JSON formats produce a [`Skeleton`]:
//!
//! - Geode models: `{ "bones": [...] }` where every vector component is a
//!   number or an expression string. Expressions are parsed here, so an
//!   unknown function or a wrong argument count rejects the whole model.
//! - Bedrock geometry (`"minecraft:geometry"`): constant rest poses only.
//!
//! In both formats bones may appear in any order and name their parent.
//! Pivots and translations are authored in pixels and multiplied by
//! [`Config::unit_scale`].

use geode_expr_core::{parse_with_config, Expr, ExprError, Function, FunctionRegistry};
use glam::DVec3;
use hashbrown::{HashMap, HashSet};
use serde::Deserialize;

use crate::attribute::{Attribute, AttributeKind};
use crate::bone::BoneDef;
use crate::config::Config;
use crate::error::SkeletonError;
use crate::ids::BoneId;
use crate::skeleton::Skeleton;

/// Parse a Geode model JSON document into a skeleton.
pub fn load_model_json(
    s: &str,
    registry: &FunctionRegistry,
    cfg: &Config,
) -> Result<Skeleton, SkeletonError> {
    let file: ModelFile = serde_json::from_str(s)?;

    let mut defs = Vec::with_capacity(file.bones.len());
    for raw in file.bones {
        let name = raw.name;
        let attr = |kind: AttributeKind,
                    components: Option<[RawComponent; 3]>|
         -> Result<Attribute, SkeletonError> {
            let Some(components) = components else {
                return Ok(kind.rest_value().into());
            };
            let attr = to_attribute(components, registry, cfg).and_then(|attr| match kind {
                AttributeKind::Pivot | AttributeKind::Translation => {
                    scale_units(attr, cfg.unit_scale)
                }
                AttributeKind::Rotation | AttributeKind::Scale => Ok(attr),
            });
            attr.map_err(|e| SkeletonError::expr(&name, e))
        };
        let pivot = attr(AttributeKind::Pivot, raw.pivot)?;
        let rotation = attr(AttributeKind::Rotation, raw.rotation)?;
        let scale = attr(AttributeKind::Scale, raw.scale)?;
        let translation = attr(AttributeKind::Translation, raw.translation)?;

        let def = BoneDef {
            name,
            pivot,
            rotation,
            scale,
            translation,
            track_matrices: raw.track_matrices,
        };
        defs.push((def, raw.parent));
    }

    let skeleton = assemble(defs, cfg)?;
    log::debug!(
        "loaded model: {} bones, {} roots, {} variables",
        skeleton.len(),
        skeleton.roots().len(),
        skeleton.variables().len()
    );
    Ok(skeleton)
}

/// Parse Bedrock geometry JSON (first geometry entry) into a skeleton.
pub fn load_bedrock_geometry_json(s: &str, cfg: &Config) -> Result<Skeleton, SkeletonError> {
    let file: BedrockFile = serde_json::from_str(s)?;
    let geometry_count = file.geometry.len();
    let geometry = file
        .geometry
        .into_iter()
        .next()
        .ok_or(SkeletonError::NoGeometry)?;
    if geometry_count > 1 {
        log::warn!(
            "bedrock file holds {} geometries; using '{}'",
            geometry_count,
            geometry.description.identifier
        );
    }

    let defs: Vec<(BoneDef, Option<String>)> = geometry
        .bones
        .into_iter()
        .map(|b| {
            let mut def = BoneDef::new(b.name)
                .pivot(DVec3::from_array(b.pivot) * cfg.unit_scale)
                .rotation(DVec3::from_array(b.rotation.unwrap_or([0.0; 3])));
            def.track_matrices = b.track_matrices;
            (def, b.parent)
        })
        .collect();

    let skeleton = assemble(defs, cfg)?;
    log::debug!(
        "loaded bedrock geometry '{}': {} bones, {} roots",
        geometry.description.identifier,
        skeleton.len(),
        skeleton.roots().len()
    );
    Ok(skeleton)
}

/// Insert bones so every parent precedes its children.
fn assemble(
    defs: Vec<(BoneDef, Option<String>)>,
    cfg: &Config,
) -> Result<Skeleton, SkeletonError> {
    if defs.is_empty() {
        return Err(SkeletonError::NoGeometry);
    }

    {
        let mut names: HashSet<&str> = HashSet::with_capacity(defs.len());
        for (def, _) in &defs {
            if !names.insert(def.name.as_str()) {
                return Err(SkeletonError::DuplicateBone(def.name.clone()));
            }
        }
        for (def, parent) in &defs {
            if let Some(parent) = parent {
                if !names.contains(parent.as_str()) {
                    return Err(SkeletonError::UnknownParent {
                        bone: def.name.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }
    }

    let mut skeleton = Skeleton::new(cfg);
    let mut inserted: HashMap<String, BoneId> = HashMap::with_capacity(defs.len());
    let mut pending = defs;
    while !pending.is_empty() {
        let before = pending.len();
        let mut waiting = Vec::with_capacity(before);
        for (def, parent) in pending {
            let parent_id = match &parent {
                None => None,
                Some(p) => match inserted.get(p) {
                    Some(id) => Some(*id),
                    None => {
                        waiting.push((def, parent));
                        continue;
                    }
                },
            };
            let name = def.name.clone();
            let id = skeleton.add_bone(def, parent_id)?;
            inserted.insert(name, id);
        }
        if waiting.len() == before {
            // Every remaining parent exists but none got placed: a cycle.
            let name = waiting
                .first()
                .map(|(def, _)| def.name.clone())
                .unwrap_or_default();
            return Err(SkeletonError::ParentCycle(name));
        }
        pending = waiting;
    }
    Ok(skeleton)
}

fn to_attribute(
    components: [RawComponent; 3],
    registry: &FunctionRegistry,
    cfg: &Config,
) -> Result<Attribute, ExprError> {
    if let [RawComponent::Number(x), RawComponent::Number(y), RawComponent::Number(z)] =
        &components
    {
        return Ok(Attribute::constant(*x, *y, *z));
    }
    let [x, y, z] = components;
    let to_expr = |c: RawComponent| match c {
        RawComponent::Number(n) => Ok(Expr::Constant(n)),
        RawComponent::Expr(src) => parse_with_config(&src, registry, &cfg.parse),
    };
    Ok(Attribute::driven(to_expr(x)?, to_expr(y)?, to_expr(z)?).simplify())
}

fn scale_units(attr: Attribute, factor: f64) -> Result<Attribute, ExprError> {
    if factor == 1.0 {
        return Ok(attr);
    }
    match attr {
        Attribute::Constant(v) => Ok(Attribute::Constant(v * factor)),
        Attribute::Driven([x, y, z]) => {
            let scale = |e: Expr| match e {
                Expr::Constant(v) => Ok(Expr::Constant(v * factor)),
                other => Expr::call(Function::Mul, vec![other, Expr::Constant(factor)]),
            };
            Ok(Attribute::Driven([scale(x)?, scale(y)?, scale(z)?]))
        }
    }
}

// ----- Geode model JSON schema (serde) -----

#[derive(Debug, Deserialize)]
struct ModelFile {
    bones: Vec<RawBone>,
}

#[derive(Debug, Deserialize)]
struct RawBone {
    name: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    pivot: Option<[RawComponent; 3]>,
    #[serde(default)]
    rotation: Option<[RawComponent; 3]>,
    #[serde(default)]
    scale: Option<[RawComponent; 3]>,
    #[serde(default)]
    translation: Option<[RawComponent; 3]>,
    #[serde(default)]
    track_matrices: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawComponent {
    Number(f64),
    Expr(String),
}

// ----- Bedrock geometry JSON schema (serde) -----

#[derive(Debug, Deserialize)]
struct BedrockFile {
    #[serde(rename = "minecraft:geometry")]
    geometry: Vec<BedrockGeometry>,
}

#[derive(Debug, Deserialize)]
struct BedrockGeometry {
    #[serde(default)]
    description: BedrockDescription,
    #[serde(default)]
    bones: Vec<BedrockBone>,
}

#[derive(Debug, Default, Deserialize)]
struct BedrockDescription {
    #[serde(default)]
    identifier: String,
}

#[derive(Debug, Deserialize)]
struct BedrockBone {
    name: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    pivot: [f64; 3],
    #[serde(default)]
    rotation: Option<[f64; 3]>,
    /// Not part of the Bedrock schema; lets a geometry file opt bones into
    /// matrix tracking without a separate pass.
    #[serde(default, rename = "geode:track_matrices")]
    track_matrices: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driven_translation_is_scaled() {
        let reg = FunctionRegistry::default();
        let attr = to_attribute(
            [
                RawComponent::Expr("q.x".into()),
                RawComponent::Number(16.0),
                RawComponent::Expr("2 * 8".into()),
            ],
            &reg,
            &Config::default(),
        )
        .unwrap();
        let scaled = scale_units(attr, 1.0 / 16.0).unwrap();
        let ctx = geode_expr_core::BindingContext::new().with("q.x", 32.0);
        assert_eq!(scaled.resolve(&ctx).unwrap(), DVec3::new(2.0, 1.0, 1.0));
    }

    #[test]
    fn all_number_components_stay_constant() {
        let reg = FunctionRegistry::default();
        let attr = to_attribute(
            [
                RawComponent::Number(1.0),
                RawComponent::Number(2.0),
                RawComponent::Number(3.0),
            ],
            &reg,
            &Config::default(),
        )
        .unwrap();
        assert_eq!(attr, Attribute::constant(1.0, 2.0, 3.0));
    }
}
