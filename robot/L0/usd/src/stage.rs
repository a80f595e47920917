//! USD layer parsing into a prim tree.
//!
//! This is a reader for the subset of `.usda` that robot exports use: layer
//! metadata, nested `def`/`over`/`class` prims, API schema list ops, typed
//! attributes, relationships and composition arcs. Binary crate layers land in
//! the same [`Stage`] through [`Stage::read_crate`].
//!
//! Both readers finish by composing the layer: in-layer references, payloads,
//! inherits and specializes are grafted into the prims that hold them.
//! Variant sets are skipped.

use std::collections::BTreeMap;

use nalgebra::{Matrix4, Vector3, Vector4};
use robot_types::{NormalizeError, Result};

use crate::compose::compose;
use crate::crate_file;
use crate::lexer::{Token, TokenKind, tokenize};

/// An attribute or metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `None`, an explicitly blocked value.
    None,
    /// Any number.
    Number(f64),
    /// Quoted string.
    String(String),
    /// Bare word such as `true` or an enum token.
    Token(String),
    /// `@asset@` path, with the prim path that may follow it in a reference.
    Asset(String, Option<String>),
    /// `</scene/path>`.
    Path(String),
    /// `( ... )`
    Tuple(Vec<Value>),
    /// `[ ... ]`
    List(Vec<Value>),
    /// `{ ... }` dictionary or time samples, kept opaque.
    Dictionary,
}

impl Value {
    /// Numeric value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// String or token text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Token(s) => Some(s),
            _ => None,
        }
    }

    /// Numbers of a tuple.
    pub fn as_floats(&self) -> Option<Vec<f64>> {
        match self {
            Self::Tuple(items) => items.iter().map(Self::as_f64).collect(),
            _ => None,
        }
    }

    /// Strings of a list.
    pub fn as_strings(&self) -> Option<Vec<&str>> {
        match self {
            Self::List(items) => items.iter().map(Self::as_str).collect(),
            _ => None,
        }
    }

    /// Row-major 4×4 matrix written as a tuple of four row tuples.
    pub fn as_matrix4(&self) -> Option<Matrix4<f64>> {
        let Self::Tuple(rows) = self else {
            return None;
        };
        if rows.len() != 4 {
            return None;
        }
        let mut values = Vec::with_capacity(16);
        for row in rows {
            let row = row.as_floats()?;
            if row.len() != 4 {
                return None;
            }
            values.extend(row);
        }
        Some(Matrix4::from_row_slice(&values))
    }
}

/// Prim specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specifier {
    /// `def`
    Def,
    /// `over`
    Over,
    /// `class`
    Class,
}

/// A reference, payload, inherit or specialize arc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositionArc {
    /// A prim of the same layer, by absolute path.
    Internal(String),
    /// A prim of another layer; `prim` is `None` for its default prim.
    External {
        /// Asset path as written.
        asset: String,
        /// Target prim inside the asset.
        prim: Option<String>,
    },
}

/// A typed attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Declared value type, `double3`, `token[]`, …
    pub type_name: String,
    /// Default value, `None` when declared without one.
    pub value: Option<Value>,
    /// Line of the declaration. Crate files carry no lines.
    pub line: Option<usize>,
}

/// A scene-graph node.
#[derive(Debug, Clone, PartialEq)]
pub struct Prim {
    /// How the prim was introduced.
    pub specifier: Specifier,
    /// Schema type (`Xform`, `Mesh`, `PhysicsRevoluteJoint`), if any.
    pub type_name: Option<String>,
    /// Prim name.
    pub name: String,
    /// Absolute scene path, `/robot/base_link`.
    pub path: String,
    /// Line of the prim header. Crate files carry no lines.
    pub line: Option<usize>,
    /// Applied API schemas after list-op resolution.
    pub api_schemas: Vec<String>,
    /// Composition arcs, strongest first: inherits, references, payloads,
    /// specializes.
    pub arcs: Vec<CompositionArc>,
    /// `instanceable = true`. Only arcs contribute children to an instance.
    pub instanceable: bool,
    /// Attributes by full name.
    pub attributes: BTreeMap<String, Attribute>,
    /// Relationship targets by name, as absolute paths.
    pub relationships: BTreeMap<String, Vec<String>>,
    /// Child prims in document order.
    pub children: Vec<Prim>,
}

impl Prim {
    /// Direct child by name.
    pub fn child(&self, name: &str) -> Option<&Prim> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Whether an API schema is applied.
    pub fn has_api(&self, schema: &str) -> bool {
        self.api_schemas.iter().any(|s| s == schema)
    }

    /// Authored value of an attribute. Declarations without a value and
    /// blocked (`None`) values are not authored.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.attributes
            .get(name)
            .and_then(|a| a.value.as_ref())
            .filter(|v| **v != Value::None)
    }

    /// Whether an attribute has an authored value.
    pub fn is_authored(&self, name: &str) -> bool {
        self.value(name).is_some()
    }

    fn type_error(&self, name: &str, expected: &str) -> NormalizeError {
        let line = self.attributes.get(name).and_then(|a| a.line).or(self.line);
        format_error(
            format!("attribute '{name}' on {} must be {expected}", self.path),
            line,
        )
    }

    /// Numeric attribute.
    pub fn attr_f64(&self, name: &str) -> Result<Option<f64>> {
        self.value(name)
            .map(|v| v.as_f64().ok_or_else(|| self.type_error(name, "a number")))
            .transpose()
    }

    /// Attribute holding a tuple of exactly `n` numbers.
    pub fn attr_floats(&self, name: &str, n: usize) -> Result<Option<Vec<f64>>> {
        self.value(name)
            .map(|v| {
                v.as_floats()
                    .filter(|f| f.len() == n)
                    .ok_or_else(|| self.type_error(name, &format!("a tuple of {n} numbers")))
            })
            .transpose()
    }

    /// 3-vector attribute.
    pub fn attr_vec3(&self, name: &str) -> Result<Option<Vector3<f64>>> {
        Ok(self
            .attr_floats(name, 3)?
            .map(|v| Vector3::from_column_slice(&v)))
    }

    /// Quaternion attribute, `(w, x, y, z)` as written in USDA.
    pub fn attr_quat(&self, name: &str) -> Result<Option<Vector4<f64>>> {
        Ok(self
            .attr_floats(name, 4)?
            .map(|v| Vector4::from_column_slice(&v)))
    }

    /// Token or string attribute.
    pub fn attr_token(&self, name: &str) -> Result<Option<&str>> {
        self.value(name)
            .map(|v| v.as_str().ok_or_else(|| self.type_error(name, "a token")))
            .transpose()
    }

    /// Token array attribute.
    pub fn attr_tokens(&self, name: &str) -> Result<Option<Vec<&str>>> {
        self.value(name)
            .map(|v| v.as_strings().ok_or_else(|| self.type_error(name, "a token array")))
            .transpose()
    }

    /// Matrix attribute.
    pub fn attr_matrix4(&self, name: &str) -> Result<Option<Matrix4<f64>>> {
        self.value(name)
            .map(|v| v.as_matrix4().ok_or_else(|| self.type_error(name, "a 4x4 matrix")))
            .transpose()
    }

    /// Targets of a relationship, empty when it is not authored.
    pub fn targets(&self, name: &str) -> &[String] {
        self.relationships.get(name).map_or(&[], Vec::as_slice)
    }

    /// This prim and every prim below it, depth first.
    pub fn descendants(&self) -> impl Iterator<Item = &Prim> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let prim = stack.pop()?;
            stack.extend(prim.children.iter().rev());
            Some(prim)
        })
    }
}

/// A parsed layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stage {
    /// `defaultPrim` layer metadata.
    pub default_prim: Option<String>,
    /// Root prims in document order.
    pub roots: Vec<Prim>,
}

impl Stage {
    /// Parse and compose a `.usda` layer.
    ///
    /// # Errors
    ///
    /// Format error with a line number for anything that is not valid USDA.
    /// Semantic error for a composition arc that targets a missing prim or
    /// loops back on itself.
    pub fn parse(source: &str) -> Result<Self> {
        let tokens = tokenize(source)?;
        let layer = Parser { tokens, pos: 0 }.layer()?;
        compose(&layer)
    }

    /// Read and compose a binary crate (`.usdc`) layer.
    ///
    /// # Errors
    ///
    /// Format error for a truncated or malformed crate file, Semantic error
    /// for a broken composition arc.
    pub fn read_crate(bytes: &[u8]) -> Result<Self> {
        let layer = crate_file::read(bytes)?;
        compose(&layer)
    }

    /// Prim at an absolute path.
    pub fn prim(&self, path: &str) -> Option<&Prim> {
        let mut names = path.split('/').filter(|s| !s.is_empty());
        let first = names.next()?;
        let mut prim = self.roots.iter().find(|p| p.name == first)?;
        for name in names {
            prim = prim.child(name)?;
        }
        Some(prim)
    }

    /// The prim named by `defaultPrim`.
    ///
    /// # Errors
    ///
    /// Semantic error when the layer has no `defaultPrim` or it names no root prim.
    pub fn default_prim(&self) -> Result<&Prim> {
        let name = self
            .default_prim
            .as_deref()
            .ok_or_else(|| NormalizeError::semantic("no default prim found in USD stage"))?;
        self.roots.iter().find(|p| p.name == name).ok_or_else(|| {
            NormalizeError::semantic(format!("default prim '{name}' does not exist"))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListOp {
    Explicit,
    Prepend,
    Append,
    Delete,
}

impl ListOp {
    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "prepend" => Some(Self::Prepend),
            "append" | "add" => Some(Self::Append),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    pub(crate) fn apply<T: PartialEq>(self, current: &mut Vec<T>, items: Vec<T>) {
        match self {
            Self::Explicit => *current = items,
            Self::Prepend => {
                current.retain(|c| !items.contains(c));
                current.splice(0..0, items);
            }
            Self::Append => {
                current.retain(|c| !items.contains(c));
                current.extend(items);
            }
            Self::Delete => current.retain(|c| !items.contains(c)),
        }
    }
}

struct MetadataEntry {
    op: ListOp,
    key: String,
    value: Value,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &TokenKind {
        self.tokens
            .get(self.pos)
            .map_or(&TokenKind::Eof, |t| &t.kind)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn next(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        kind
    }

    fn error(&self, expected: &str) -> NormalizeError {
        NormalizeError::format_at(
            format!("expected {expected}, found {}", self.peek().describe()),
            self.line(),
        )
    }

    fn at_punct(&self, c: char) -> bool {
        *self.peek() == TokenKind::Punct(c)
    }

    fn eat_punct(&mut self, c: char) -> bool {
        let found = self.at_punct(c);
        if found {
            self.pos += 1;
        }
        found
    }

    fn expect_punct(&mut self, c: char) -> Result<()> {
        if self.eat_punct(c) {
            Ok(())
        } else {
            Err(self.error(&format!("'{c}'")))
        }
    }

    fn ident(&mut self) -> Result<String> {
        match self.peek() {
            TokenKind::Ident(_) => match self.next() {
                TokenKind::Ident(s) => Ok(s),
                _ => Err(self.error("a name")),
            },
            _ => Err(self.error("a name")),
        }
    }

    fn peek_ident(&self) -> Option<&str> {
        match self.peek() {
            TokenKind::Ident(s) => Some(s),
            _ => None,
        }
    }

    fn layer(mut self) -> Result<Stage> {
        let mut stage = Stage::default();
        if self.at_punct('(') {
            for entry in self.metadata()? {
                if entry.key == "defaultPrim" {
                    stage.default_prim = entry.value.as_str().map(str::to_string);
                }
            }
        }
        loop {
            match self.peek() {
                TokenKind::Eof => break,
                TokenKind::Ident(word) if is_specifier(word) => {
                    let prim = self.prim("")?;
                    if stage.roots.iter().any(|p| p.name == prim.name) {
                        return Err(duplicate_prim(&prim));
                    }
                    stage.roots.push(prim);
                }
                _ => return Err(self.error("a prim definition")),
            }
        }
        Ok(stage)
    }

    /// `( ... )` metadata block. A bare string is documentation.
    fn metadata(&mut self) -> Result<Vec<MetadataEntry>> {
        self.expect_punct('(')?;
        let mut entries = Vec::new();
        loop {
            match self.peek() {
                TokenKind::Punct(')') => {
                    self.pos += 1;
                    return Ok(entries);
                }
                TokenKind::Punct(';') | TokenKind::Str(_) => {
                    self.pos += 1;
                }
                TokenKind::Ident(_) => {
                    let mut key = self.ident()?;
                    let mut op = ListOp::Explicit;
                    if let Some(list_op) = ListOp::from_keyword(&key) {
                        op = list_op;
                        key = self.ident()?;
                    } else if key == "reorder" {
                        key = self.ident()?;
                    }
                    self.expect_punct('=')?;
                    let value = self.value()?;
                    entries.push(MetadataEntry { op, key, value });
                }
                _ => return Err(self.error("metadata or ')'")),
            }
        }
    }

    fn prim(&mut self, parent_path: &str) -> Result<Prim> {
        let line = self.line();
        let specifier = match self.ident()?.as_str() {
            "def" => Specifier::Def,
            "over" => Specifier::Over,
            _ => Specifier::Class,
        };
        let type_name = match self.peek() {
            TokenKind::Ident(_) => Some(self.ident()?),
            _ => None,
        };
        let name = match self.next() {
            TokenKind::Str(name) if !name.is_empty() => name,
            _ => {
                self.pos -= 1;
                return Err(self.error("a quoted prim name"));
            }
        };

        let mut prim = Prim {
            specifier,
            type_name,
            path: format!("{parent_path}/{name}"),
            name,
            line: Some(line),
            api_schemas: Vec::new(),
            arcs: Vec::new(),
            instanceable: false,
            attributes: BTreeMap::new(),
            relationships: BTreeMap::new(),
            children: Vec::new(),
        };

        if self.at_punct('(') {
            let mut arcs: [Vec<CompositionArc>; 4] = Default::default();
            for entry in self.metadata()? {
                if let Some(slot) = arc_slot(&entry.key) {
                    let items = composition_arcs(&entry.value, &prim.path).ok_or_else(|| {
                        NormalizeError::format_at(
                            format!("'{}' on {} must be paths or asset references", entry.key, prim.path),
                            line,
                        )
                    })?;
                    entry.op.apply(&mut arcs[slot], items);
                    continue;
                }
                match entry.key.as_str() {
                    "apiSchemas" => {
                        let items = entry
                            .value
                            .as_strings()
                            .unwrap_or_default()
                            .into_iter()
                            .map(str::to_string)
                            .collect();
                        entry.op.apply(&mut prim.api_schemas, items);
                    }
                    "instanceable" => prim.instanceable = is_true(&entry.value),
                    _ => {}
                }
            }
            prim.arcs = arcs.into_iter().flatten().collect();
        }

        self.expect_punct('{')?;
        loop {
            match self.peek() {
                TokenKind::Punct('}') => {
                    self.pos += 1;
                    return Ok(prim);
                }
                TokenKind::Punct(';') => self.pos += 1,
                TokenKind::Ident(word) if is_specifier(word) => {
                    let child = self.prim(&prim.path)?;
                    if prim.child(&child.name).is_some() {
                        return Err(duplicate_prim(&child));
                    }
                    prim.children.push(child);
                }
                TokenKind::Ident(word) if word == "variantSet" => self.variant_set()?,
                TokenKind::Ident(word) if word == "reorder" => {
                    self.pos += 1;
                    self.ident()?;
                    self.expect_punct('=')?;
                    self.value()?;
                }
                TokenKind::Ident(_) => self.property(&mut prim)?,
                _ => return Err(self.error("a property, a child prim or '}'")),
            }
        }
    }

    fn variant_set(&mut self) -> Result<()> {
        self.ident()?;
        if !matches!(self.next(), TokenKind::Str(_)) {
            self.pos -= 1;
            return Err(self.error("a variant set name"));
        }
        self.expect_punct('=')?;
        self.skip_braces()
    }

    fn property(&mut self, prim: &mut Prim) -> Result<()> {
        let line = self.line();
        let mut op = ListOp::Explicit;
        let mut word = self.ident()?;
        loop {
            if let Some(list_op) = ListOp::from_keyword(&word) {
                op = list_op;
            } else if !matches!(word.as_str(), "custom" | "uniform" | "varying" | "config") {
                break;
            }
            word = self.ident()?;
        }

        if word == "rel" {
            let name = self.ident()?;
            let mut targets = Vec::new();
            if self.eat_punct('=') {
                let value = self.value()?;
                targets = relationship_targets(&value, &prim.path)
                    .ok_or_else(|| NormalizeError::format_at(
                        format!("relationship '{name}' must target paths"),
                        line,
                    ))?;
            }
            if self.at_punct('(') {
                self.metadata()?;
            }
            op.apply(prim.relationships.entry(name).or_default(), targets);
            return Ok(());
        }

        let mut type_name = word;
        if self.eat_punct('[') {
            self.expect_punct(']')?;
            type_name.push_str("[]");
        }
        let name = self.ident()?;
        let value = if self.eat_punct('=') {
            if self.at_punct('{') {
                self.skip_braces()?;
                Some(Value::Dictionary)
            } else {
                Some(self.value()?)
            }
        } else {
            None
        };
        if self.at_punct('(') {
            self.metadata()?;
        }

        // time samples and connections do not give a default value
        if name.ends_with(".timeSamples") || name.ends_with(".connect") || name.ends_with(".spline") {
            return Ok(());
        }
        prim.attributes.insert(
            name,
            Attribute {
                type_name,
                value,
                line: Some(line),
            },
        );
        Ok(())
    }

    fn value(&mut self) -> Result<Value> {
        match self.next() {
            TokenKind::Number(n) => Ok(Value::Number(n)),
            TokenKind::Str(s) => Ok(Value::String(s)),
            TokenKind::Path(p) => Ok(Value::Path(p)),
            TokenKind::Asset(a) => {
                // a reference may name a prim inside the asset
                let prim = match self.peek() {
                    TokenKind::Path(_) => match self.next() {
                        TokenKind::Path(p) => Some(p),
                        _ => None,
                    },
                    _ => None,
                };
                if prim.is_some() && self.at_punct('(') {
                    // layer offset and scale
                    self.metadata()?;
                }
                Ok(Value::Asset(a, prim))
            }
            TokenKind::Ident(word) => Ok(match word.as_str() {
                "None" => Value::None,
                "inf" => Value::Number(f64::INFINITY),
                "nan" => Value::Number(f64::NAN),
                _ => Value::Token(word),
            }),
            TokenKind::Punct('(') => Ok(Value::Tuple(self.sequence(')')?)),
            TokenKind::Punct('[') => Ok(Value::List(self.sequence(']')?)),
            TokenKind::Punct('{') => {
                self.pos -= 1;
                self.skip_braces()?;
                Ok(Value::Dictionary)
            }
            _ => {
                self.pos -= 1;
                Err(self.error("a value"))
            }
        }
    }

    /// Comma separated values up to `close`. The opening bracket is consumed.
    fn sequence(&mut self, close: char) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        loop {
            if self.eat_punct(close) {
                return Ok(items);
            }
            items.push(self.value()?);
            if !self.eat_punct(',') && !self.at_punct(close) {
                return Err(self.error(&format!("',' or '{close}'")));
            }
        }
    }

    fn skip_braces(&mut self) -> Result<()> {
        self.expect_punct('{')?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.next() {
                TokenKind::Punct('{') => depth += 1,
                TokenKind::Punct('}') => depth -= 1,
                TokenKind::Eof => return Err(self.error("'}'")),
                _ => {}
            }
        }
        Ok(())
    }
}

fn is_specifier(word: &str) -> bool {
    matches!(word, "def" | "over" | "class")
}

fn duplicate_prim(prim: &Prim) -> NormalizeError {
    format_error(format!("duplicate prim {}", prim.path), prim.line)
}

pub(crate) fn format_error(message: String, line: Option<usize>) -> NormalizeError {
    match line {
        Some(line) => NormalizeError::format_at(message, line),
        None => NormalizeError::format(message),
    }
}

pub(crate) fn is_true(value: &Value) -> bool {
    match value {
        Value::Token(t) => t == "true",
        Value::Number(n) => *n != 0.0,
        _ => false,
    }
}

/// Position of an arc kind in strength order.
pub(crate) fn arc_slot(key: &str) -> Option<usize> {
    match key {
        "inherits" => Some(0),
        "references" => Some(1),
        "payload" | "payloads" => Some(2),
        "specializes" => Some(3),
        _ => None,
    }
}

fn composition_arcs(value: &Value, owner: &str) -> Option<Vec<CompositionArc>> {
    let arc = |item: &Value| match item {
        Value::Path(p) => Some(CompositionArc::Internal(absolute_path(p, owner))),
        Value::Asset(asset, prim) if asset.is_empty() => {
            prim.as_deref().map(|p| CompositionArc::Internal(absolute_path(p, owner)))
        }
        Value::Asset(asset, prim) => Some(CompositionArc::External {
            asset: asset.clone(),
            prim: prim.clone(),
        }),
        _ => None,
    };
    match value {
        Value::None => Some(Vec::new()),
        Value::List(items) => items.iter().map(arc).collect(),
        item => arc(item).map(|a| vec![a]),
    }
}

fn relationship_targets(value: &Value, owner: &str) -> Option<Vec<String>> {
    match value {
        Value::None => Some(Vec::new()),
        Value::Path(p) => Some(vec![absolute_path(p, owner)]),
        Value::List(items) => items
            .iter()
            .map(|item| match item {
                Value::Path(p) => Some(absolute_path(p, owner)),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

/// Resolve a target path against the prim that owns the relationship.
fn absolute_path(path: &str, owner: &str) -> String {
    if path.starts_with('/') {
        return path.to_string();
    }
    let mut parts: Vec<&str> = owner.split('/').filter(|s| !s.is_empty()).collect();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            name => parts.push(name),
        }
    }
    format!("/{}", parts.join("/"))
}
