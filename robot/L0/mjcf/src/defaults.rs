//! MJCF default classes.
//!
//! `<default>` elements form a forest: each class may nest further classes
//! that inherit from it. Nodes are stored in a flat arena with parent indices,
//! and attribute lookups walk from a class up to its root, taking the first
//! value found. An attribute set on the element itself always wins, so a
//! child class overriding one attribute keeps every other inherited one.

use std::collections::BTreeMap;

use robot_types::{NormalizeError, Result};
use robot_xml::Element;

/// Name given to a top-level `<default>` without a `class` attribute.
pub const MAIN_CLASS: &str = "main";

/// Element kinds that carry class defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// `<joint>`
    Joint,
    /// `<geom>`
    Geom,
}

#[derive(Debug, Clone)]
struct ClassNode {
    name: String,
    parent: Option<usize>,
    joint: Vec<(String, String)>,
    geom: Vec<(String, String)>,
}

impl ClassNode {
    fn attrs(&self, kind: Kind) -> &[(String, String)] {
        match kind {
            Kind::Joint => &self.joint,
            Kind::Geom => &self.geom,
        }
    }
}

/// All default classes of one document.
#[derive(Debug, Clone, Default)]
pub struct ClassForest {
    nodes: Vec<ClassNode>,
    index: BTreeMap<String, usize>,
}

/// Handle to a class in a [`ClassForest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassId(usize);

impl ClassForest {
    /// Collect every `<default>` under the document root.
    ///
    /// # Errors
    ///
    /// Semantic error for a nested `<default>` without a class name or for a
    /// class name declared twice.
    pub fn from_root(root: &Element) -> Result<Self> {
        let mut forest = Self::default();
        for elem in root.children_named("default") {
            forest.add(elem, None)?;
        }
        tracing::trace!(classes = forest.nodes.len(), "collected default classes");
        Ok(forest)
    }

    fn add(&mut self, elem: &Element, parent: Option<usize>) -> Result<()> {
        let name = match (elem.attr("class"), parent) {
            (Some(name), _) => name,
            (None, None) => MAIN_CLASS,
            (None, Some(_)) => {
                return Err(NormalizeError::semantic(format!(
                    "nested <default> at line {} must name a class",
                    elem.line
                )));
            }
        };
        if self.index.contains_key(name) {
            return Err(NormalizeError::duplicate("default class", name));
        }

        let id = self.nodes.len();
        self.nodes.push(ClassNode {
            name: name.to_string(),
            parent,
            joint: elem.child("joint").map(|e| e.attributes.clone()).unwrap_or_default(),
            geom: elem.child("geom").map(|e| e.attributes.clone()).unwrap_or_default(),
        });
        self.index.insert(name.to_string(), id);
        tracing::trace!(class = name, parent = ?parent.map(|p| &self.nodes[p].name), "default class");

        for child in elem.children_named("default") {
            self.add(child, Some(id))?;
        }
        Ok(())
    }

    /// Look up a class by name.
    ///
    /// # Errors
    ///
    /// Semantic error when no class of that name was declared.
    pub fn lookup(&self, name: &str) -> Result<ClassId> {
        self.index
            .get(name)
            .copied()
            .map(ClassId)
            .ok_or_else(|| NormalizeError::semantic(format!("undefined default class '{name}'")))
    }

    /// The `main` class, if the document declares a top-level default.
    pub fn main(&self) -> Option<ClassId> {
        self.index.get(MAIN_CLASS).copied().map(ClassId)
    }

    /// Name of a class.
    pub fn name(&self, id: ClassId) -> &str {
        &self.nodes[id.0].name
    }

    fn ancestry(&self, id: ClassId) -> impl Iterator<Item = &ClassNode> {
        std::iter::successors(Some(&self.nodes[id.0]), |node| {
            node.parent.map(|p| &self.nodes[p])
        })
    }

    /// Value of `attr` for an element of `kind`, walking leaf to root.
    pub fn resolve(&self, id: ClassId, kind: Kind, attr: &str) -> Option<&str> {
        self.ancestry(id).find_map(|node| {
            node.attrs(kind)
                .iter()
                .find(|(key, _)| key == attr)
                .map(|(_, value)| value.as_str())
        })
    }

    /// Whether `id` is the class `ancestor` or inherits from it.
    pub fn descends_from(&self, id: ClassId, ancestor: &str) -> bool {
        self.ancestry(id).any(|node| node.name == ancestor)
    }
}

/// An element together with the default class that applies to it.
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'a> {
    /// The element.
    pub elem: &'a Element,
    forest: &'a ClassForest,
    class: Option<ClassId>,
    kind: Kind,
}

impl<'a> Resolved<'a> {
    /// Resolve the effective class of `elem`: its own `class` attribute, else
    /// the inherited `childclass`, else `main`.
    ///
    /// # Errors
    ///
    /// Semantic error when the named class does not exist.
    pub fn new(
        elem: &'a Element,
        kind: Kind,
        forest: &'a ClassForest,
        childclass: Option<ClassId>,
    ) -> Result<Self> {
        let class = match elem.attr("class") {
            Some(name) => Some(forest.lookup(name)?),
            None => childclass.or_else(|| forest.main()),
        };
        tracing::trace!(
            element = %elem.name,
            line = elem.line,
            class = class.map(|id| forest.name(id)),
            "resolved default class"
        );
        Ok(Self {
            elem,
            forest,
            class,
            kind,
        })
    }

    /// Effective class.
    pub fn class(&self) -> Option<ClassId> {
        self.class
    }

    /// Attribute from the element or, failing that, from its class chain.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.elem.attr(name).or_else(|| {
            self.class
                .and_then(|id| self.forest.resolve(id, self.kind, name))
        })
    }
}
