//! Composition of references, payloads, inherits and instancing.
//!
//! Arcs are resolved inside one layer. The target's composed subtree is
//! grafted under the prim that holds the arc, with paths and relationship
//! targets rewritten to where the opinions now live, so instance proxies get
//! ordinary paths under their instance. Local opinions are stronger than arc
//! opinions and earlier arcs are stronger than later ones. An instanceable prim
//! keeps only the children its arcs bring in.
//!
//! Arcs into other layers are not followed; they are logged and skipped.

use robot_types::{NormalizeError, Result};

use crate::stage::{CompositionArc, Prim, Specifier, Stage};

/// Compose every root of `layer`.
pub(crate) fn compose(layer: &Stage) -> Result<Stage> {
    let mut composer = Composer {
        layer,
        active: Vec::new(),
    };
    let roots = layer
        .roots
        .iter()
        .map(|root| composer.prim(root, ""))
        .collect::<Result<Vec<_>>>()?;
    Ok(Stage {
        default_prim: layer.default_prim.clone(),
        roots,
    })
}

struct Composer<'a> {
    layer: &'a Stage,
    /// Arc targets being composed, innermost last.
    active: Vec<&'a str>,
}

impl<'a> Composer<'a> {
    fn prim(&mut self, spec: &'a Prim, parent_path: &str) -> Result<Prim> {
        let path = format!("{parent_path}/{}", spec.name);
        let mut prim = Prim {
            specifier: spec.specifier,
            type_name: spec.type_name.clone(),
            name: spec.name.clone(),
            path: path.clone(),
            line: spec.line,
            api_schemas: spec.api_schemas.clone(),
            arcs: spec.arcs.clone(),
            instanceable: spec.instanceable,
            attributes: spec.attributes.clone(),
            relationships: spec.relationships.clone(),
            children: Vec::new(),
        };

        if !spec.instanceable {
            for child in &spec.children {
                prim.children.push(self.prim(child, &path)?);
            }
        } else if !spec.children.is_empty() {
            tracing::debug!(prim = %path, "ignoring local children of an instanceable prim");
        }

        for arc in &spec.arcs {
            let target = match arc {
                CompositionArc::Internal(target) => target.as_str(),
                CompositionArc::External { asset, prim: target } => {
                    tracing::warn!(
                        prim = %path,
                        asset = %asset,
                        target = target.as_deref().unwrap_or("<defaultPrim>"),
                        "arc into another layer is not followed"
                    );
                    continue;
                }
            };
            if self.active.contains(&target) {
                return Err(NormalizeError::semantic(format!(
                    "composition cycle: {path} reaches {target} again"
                )));
            }
            let source = self.layer.prim(target).ok_or_else(|| {
                NormalizeError::semantic(format!("{path} composes {target}, which does not exist"))
            })?;
            let target_parent = target.rsplit_once('/').map_or("", |(parent, _)| parent);

            self.active.push(target);
            let mut weaker = self.prim(source, target_parent)?;
            self.active.pop();

            reroot(&mut weaker, target, &path);
            merge_weaker(&mut prim, weaker);
        }
        Ok(prim)
    }
}

/// Move a composed subtree from `from` to `to`.
fn reroot(prim: &mut Prim, from: &str, to: &str) {
    prim.path = rebase(&prim.path, from, to);
    for targets in prim.relationships.values_mut() {
        for target in targets.iter_mut() {
            *target = rebase(target, from, to);
        }
    }
    for child in &mut prim.children {
        reroot(child, from, to);
    }
}

fn rebase(path: &str, from: &str, to: &str) -> String {
    match path.strip_prefix(from) {
        Some(rest) if rest.is_empty() || rest.starts_with(['/', '.']) => format!("{to}{rest}"),
        _ => path.to_string(),
    }
}

/// Fill in whatever `strong` does not say from `weak`.
fn merge_weaker(strong: &mut Prim, weak: Prim) {
    if strong.specifier == Specifier::Over {
        strong.specifier = weak.specifier;
    }
    if strong.type_name.is_none() {
        strong.type_name = weak.type_name;
    }
    for schema in weak.api_schemas {
        if !strong.api_schemas.contains(&schema) {
            strong.api_schemas.push(schema);
        }
    }
    for (name, attribute) in weak.attributes {
        strong.attributes.entry(name).or_insert(attribute);
    }
    for (name, targets) in weak.relationships {
        strong.relationships.entry(name).or_insert(targets);
    }
    for child in weak.children {
        match strong.children.iter_mut().find(|c| c.name == child.name) {
            Some(existing) => merge_weaker(existing, child),
            None => strong.children.push(child),
        }
    }
}
