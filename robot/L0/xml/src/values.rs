//! Numeric attribute and text parsing with line-aware errors.

use nalgebra::{Vector3, Vector4};
use robot_types::{NormalizeError, Result};

use crate::document::Element;

/// Parse whitespace-separated numbers.
pub fn parse_floats(text: &str) -> std::result::Result<Vec<f64>, String> {
    text.split_whitespace()
        .map(|p| p.parse::<f64>().map_err(|_| format!("'{p}' is not a number")))
        .collect()
}

/// Parse exactly `n` whitespace-separated numbers.
pub fn parse_exact(text: &str, n: usize) -> std::result::Result<Vec<f64>, String> {
    let values = parse_floats(text)?;
    if values.len() != n {
        return Err(format!(
            "expected {n} space-separated values, got {}: '{}'",
            values.len(),
            text.trim()
        ));
    }
    Ok(values)
}

impl Element {
    fn value_error(&self, what: &str, message: &str) -> NormalizeError {
        NormalizeError::format_at(
            format!("invalid {what} on <{}> ({}): {message}", self.name, self.locator),
            self.line,
        )
    }

    /// Numeric attribute, or `default` when absent.
    pub fn attr_f64(&self, name: &str, default: f64) -> Result<f64> {
        self.attr(name)
            .map(|s| parse_exact(s, 1).map(|v| v[0]))
            .transpose()
            .map_err(|m| self.value_error(&format!("attribute '{name}'"), &m))
            .map(|v| v.unwrap_or(default))
    }

    /// Attribute holding exactly `n` numbers.
    pub fn attr_floats(&self, name: &str, n: usize) -> Result<Option<Vec<f64>>> {
        self.attr(name)
            .map(|s| parse_exact(s, n))
            .transpose()
            .map_err(|m| self.value_error(&format!("attribute '{name}'"), &m))
    }

    /// 3-vector attribute, or `default` when absent.
    pub fn attr_vec3(&self, name: &str, default: Vector3<f64>) -> Result<Vector3<f64>> {
        Ok(self
            .attr_floats(name, 3)?
            .map_or(default, |v| Vector3::from_column_slice(&v)))
    }

    /// 4-vector attribute.
    pub fn attr_vec4(&self, name: &str) -> Result<Option<Vector4<f64>>> {
        Ok(self
            .attr_floats(name, 4)?
            .map(|v| Vector4::from_column_slice(&v)))
    }

    /// Numeric text content, or `default` when empty.
    pub fn text_f64(&self, default: f64) -> Result<f64> {
        self.text()
            .map(|s| parse_exact(s, 1).map(|v| v[0]))
            .transpose()
            .map_err(|m| self.value_error("text", &m))
            .map(|v| v.unwrap_or(default))
    }

    /// Text content holding exactly `n` numbers.
    pub fn text_floats(&self, n: usize) -> Result<Option<Vec<f64>>> {
        self.text()
            .map(|s| parse_exact(s, n))
            .transpose()
            .map_err(|m| self.value_error("text", &m))
    }

    /// Numeric text of a child element, or `default` when the child or its text is absent.
    pub fn child_f64(&self, name: &str, default: f64) -> Result<f64> {
        match self.child(name) {
            Some(child) => child.text_f64(default),
            None => Ok(default),
        }
    }

    /// 3-vector text of a child element, or `default`.
    pub fn child_vec3(&self, name: &str, default: Vector3<f64>) -> Result<Vector3<f64>> {
        match self.child(name) {
            Some(child) => Ok(child
                .text_floats(3)?
                .map_or(default, |v| Vector3::from_column_slice(&v))),
            None => Ok(default),
        }
    }

    /// 4-vector text of a child element.
    pub fn child_vec4(&self, name: &str) -> Result<Option<Vector4<f64>>> {
        match self.child(name) {
            Some(child) => Ok(child
                .text_floats(4)?
                .map(|v| Vector4::from_column_slice(&v))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::document::Document;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_exact() {
        assert_eq!(parse_exact(" 1 2.5\t-3 ", 3).unwrap(), vec![1.0, 2.5, -3.0]);
        assert!(parse_exact("1 2", 3).is_err());
        assert!(parse_exact("1 x 3", 3).is_err());
        assert_eq!(parse_floats("").unwrap(), Vec::<f64>::new());
    }

    #[test]
    fn test_attribute_helpers() {
        let doc = Document::parse(r#"<origin xyz="1 2 3" rpy="0 0" m="2.5" rgba="1 0 0 1"/>"#).unwrap();
        let e = &doc.root;
        assert_relative_eq!(e.attr_vec3("xyz", Vector3::zeros()).unwrap(), Vector3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(e.attr_vec3("absent", Vector3::x()).unwrap(), Vector3::x());
        assert_relative_eq!(e.attr_f64("m", 0.0).unwrap(), 2.5);
        assert_relative_eq!(e.attr_f64("absent", 7.0).unwrap(), 7.0);
        assert_eq!(e.attr_vec4("rgba").unwrap(), Some(Vector4::new(1.0, 0.0, 0.0, 1.0)));

        let err = e.attr_vec3("rpy", Vector3::zeros()).unwrap_err();
        assert!(matches!(err, NormalizeError::Format { line: Some(1), .. }));
        assert!(err.to_string().contains("rpy"));
    }

    #[test]
    fn test_child_text_helpers() {
        let doc = Document::parse("<inertial><mass>4</mass><xyz>0 1 0</xyz><empty/></inertial>").unwrap();
        let e = &doc.root;
        assert_relative_eq!(e.child_f64("mass", 0.0).unwrap(), 4.0);
        assert_relative_eq!(e.child_f64("ixx", 0.0).unwrap(), 0.0);
        assert_relative_eq!(e.child_f64("empty", 3.0).unwrap(), 3.0);
        assert_relative_eq!(e.child_vec3("xyz", Vector3::x()).unwrap(), Vector3::y());
        assert_eq!(e.child_vec4("diffuse").unwrap(), None);
    }
}
