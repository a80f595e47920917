//! Declarative structural grammars for XML robot formats.
//!
//! A [`Grammar`] is a static table of [`ElementRule`]s. Validation walks the
//! whole document and collects every violation before failing, so a user sees
//! all problems with a file at once.
//!
//! Rules are looked up by `parent/name` first and then by `name`, which lets a
//! format give the same tag different shapes in different places (SDF `<limit>`
//! under `<axis>` versus a generic fallback).

use robot_types::{NormalizeError, Result};

use crate::document::{Document, Element};
use crate::values::parse_floats;

/// Expected shape of an attribute value or of text content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Anything.
    Any,
    /// A non-empty token.
    Name,
    /// A single number.
    Number,
    /// Whitespace-separated numbers, with one of the listed counts.
    Vector(&'static [usize]),
    /// At least this many numbers.
    AtLeast(usize),
    /// One of the listed words.
    Choice(&'static [&'static str]),
    /// `true`/`false`/`1`/`0`.
    Boolean,
}

impl ValueKind {
    fn check(self, value: &str) -> std::result::Result<(), String> {
        match self {
            Self::Any => Ok(()),
            Self::Name => {
                if value.trim().is_empty() {
                    Err("expected a non-empty name".into())
                } else {
                    Ok(())
                }
            }
            Self::Number => match parse_floats(value) {
                Ok(v) if v.len() == 1 => Ok(()),
                _ => Err(format!("'{value}' is not a number")),
            },
            Self::Vector(counts) => {
                let values = parse_floats(value).map_err(|e| format!("{e} in '{value}'"))?;
                if counts.contains(&values.len()) {
                    Ok(())
                } else {
                    Err(format!(
                        "expected {} numbers, got {}: '{value}'",
                        join_counts(counts),
                        values.len()
                    ))
                }
            }
            Self::AtLeast(n) => {
                let values = parse_floats(value).map_err(|e| format!("{e} in '{value}'"))?;
                if values.len() >= n {
                    Ok(())
                } else {
                    Err(format!("expected at least {n} numbers, got {}: '{value}'", values.len()))
                }
            }
            Self::Choice(options) => {
                if options.contains(&value) {
                    Ok(())
                } else {
                    Err(format!("'{value}' is not one of: {}", options.join(", ")))
                }
            }
            Self::Boolean => match value {
                "true" | "false" | "1" | "0" => Ok(()),
                _ => Err(format!("'{value}' is not a boolean")),
            },
        }
    }
}

fn join_counts(counts: &[usize]) -> String {
    counts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Rule for one attribute.
#[derive(Debug, Clone, Copy)]
pub struct AttrRule {
    name: &'static str,
    kind: ValueKind,
    required: bool,
}

/// Optional attribute.
#[must_use]
pub const fn attr(name: &'static str, kind: ValueKind) -> AttrRule {
    AttrRule {
        name,
        kind,
        required: false,
    }
}

/// Required attribute.
#[must_use]
pub const fn required(name: &'static str, kind: ValueKind) -> AttrRule {
    AttrRule {
        name,
        kind,
        required: true,
    }
}

/// Rule for one kind of child element.
#[derive(Debug, Clone, Copy)]
pub struct ChildRule {
    name: &'static str,
    min: usize,
    max: Option<usize>,
}

/// Child that must appear exactly once.
#[must_use]
pub const fn one(name: &'static str) -> ChildRule {
    ChildRule {
        name,
        min: 1,
        max: Some(1),
    }
}

/// Child that may appear at most once.
#[must_use]
pub const fn opt(name: &'static str) -> ChildRule {
    ChildRule {
        name,
        min: 0,
        max: Some(1),
    }
}

/// Child that may appear any number of times.
#[must_use]
pub const fn many(name: &'static str) -> ChildRule {
    ChildRule {
        name,
        min: 0,
        max: None,
    }
}

/// Child that must appear at least once.
#[must_use]
pub const fn some(name: &'static str) -> ChildRule {
    ChildRule {
        name,
        min: 1,
        max: None,
    }
}

/// Shape of one element.
#[derive(Debug, Clone, Copy)]
pub struct ElementRule {
    key: &'static str,
    attrs: &'static [AttrRule],
    children: &'static [ChildRule],
    text: Option<ValueKind>,
    open: bool,
    exactly_one_child: bool,
}

impl ElementRule {
    /// New rule for `name` or `parent/name`, with no attributes or children.
    #[must_use]
    pub const fn new(key: &'static str) -> Self {
        Self {
            key,
            attrs: &[],
            children: &[],
            text: None,
            open: false,
            exactly_one_child: false,
        }
    }

    /// Allowed attributes.
    #[must_use]
    pub const fn attrs(mut self, attrs: &'static [AttrRule]) -> Self {
        self.attrs = attrs;
        self
    }

    /// Allowed children.
    #[must_use]
    pub const fn children(mut self, children: &'static [ChildRule]) -> Self {
        self.children = children;
        self
    }

    /// Expected text content.
    #[must_use]
    pub const fn text(mut self, kind: ValueKind) -> Self {
        self.text = Some(kind);
        self
    }

    /// Accept unlisted attributes and children without checking them.
    #[must_use]
    pub const fn open(mut self) -> Self {
        self.open = true;
        self
    }

    /// Require exactly one child element out of the listed ones.
    #[must_use]
    pub const fn choice(mut self) -> Self {
        self.exactly_one_child = true;
        self
    }
}

/// A complete grammar for one format.
#[derive(Debug, Clone, Copy)]
pub struct Grammar {
    /// Format name used in messages.
    pub format: &'static str,
    /// Required root tag.
    pub root: &'static str,
    /// Element rules.
    pub rules: &'static [ElementRule],
}

impl Grammar {
    /// Validate a document, collecting every violation.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::Validation`] listing all violations in
    /// document order.
    pub fn validate(&self, doc: &Document) -> Result<()> {
        let mut violations = Vec::new();
        if doc.root.name == self.root {
            self.check_element(&doc.root, None, &mut violations);
        } else {
            violations.push(format!(
                "line {}: root element must be <{}>, found <{}>",
                doc.root.line, self.root, doc.root.name
            ));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            tracing::debug!(
                format = self.format,
                count = violations.len(),
                "document failed validation"
            );
            Err(NormalizeError::Validation {
                messages: violations,
            })
        }
    }

    fn lookup(&self, parent: Option<&str>, name: &str) -> Option<&ElementRule> {
        if let Some(parent) = parent {
            let scoped = self.rules.iter().find(|r| {
                r.key
                    .split_once('/')
                    .is_some_and(|(p, n)| p == parent && n == name)
            });
            if scoped.is_some() {
                return scoped;
            }
        }
        self.rules.iter().find(|r| r.key == name)
    }

    fn check_element(&self, element: &Element, parent: Option<&str>, out: &mut Vec<String>) {
        let Some(rule) = self.lookup(parent, &element.name) else {
            out.push(violation(element, &format!("<{}> has no rule", element.name)));
            return;
        };

        for attr_rule in rule.attrs {
            match element.attr(attr_rule.name) {
                Some(value) => {
                    if let Err(msg) = attr_rule.kind.check(value) {
                        out.push(violation(
                            element,
                            &format!("attribute '{}': {msg}", attr_rule.name),
                        ));
                    }
                }
                None if attr_rule.required => out.push(violation(
                    element,
                    &format!("missing required attribute '{}'", attr_rule.name),
                )),
                None => {}
            }
        }
        if !rule.open {
            for (key, _) in &element.attributes {
                let namespaced = key.starts_with("xmlns") || key.contains(':');
                if !namespaced && !rule.attrs.iter().any(|a| a.name == key) {
                    out.push(violation(element, &format!("unexpected attribute '{key}'")));
                }
            }
        }

        if let Some(kind) = rule.text {
            if let Err(msg) = kind.check(element.text().unwrap_or("")) {
                out.push(violation(element, &format!("text content: {msg}")));
            }
        }

        for child in &element.children {
            if rule.children.iter().any(|c| c.name == child.name) {
                self.check_element(child, Some(&element.name), out);
            } else if !rule.open {
                out.push(violation(
                    child,
                    &format!("<{}> is not allowed inside <{}>", child.name, element.name),
                ));
            }
        }

        for child_rule in rule.children {
            let count = element.children_named(child_rule.name).count();
            if count < child_rule.min {
                out.push(violation(
                    element,
                    &format!("missing required child <{}>", child_rule.name),
                ));
            }
            if let Some(max) = child_rule.max {
                if count > max {
                    out.push(violation(
                        element,
                        &format!("<{}> may appear at most {max} time(s), found {count}", child_rule.name),
                    ));
                }
            }
        }

        if rule.exactly_one_child {
            let count = element
                .children
                .iter()
                .filter(|c| rule.children.iter().any(|r| r.name == c.name))
                .count();
            if count != 1 {
                let options: Vec<_> = rule.children.iter().map(|c| c.name).collect();
                out.push(violation(
                    element,
                    &format!("expected exactly one of <{}>, found {count}", options.join(">, <")),
                ));
            }
        }
    }
}

fn violation(element: &Element, message: &str) -> String {
    format!("line {}: {}: {message}", element.line, element.locator)
}
