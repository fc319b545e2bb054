//! Inline `style` attribute helpers.
//!
//! Authored styles vary in case and spacing (`color:#FF8C00;` vs
//! `color: #ff8c00`), so declarations are compared after lower-casing and
//! removing all whitespace.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One `property: value` pair in normalised form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDeclaration {
    pub property: String,
    pub value: String,
}

impl StyleDeclaration {
    pub fn new(property: &str, value: &str) -> Self {
        Self {
            property: squash(property),
            value: squash(value),
        }
    }

    /// Parse a single `property: value` declaration. A trailing `;` is allowed.
    pub fn parse(decl: &str) -> Option<Self> {
        let decl = decl.trim().trim_end_matches(';');
        let (property, value) = decl.split_once(':')?;
        let d = Self::new(property, value);
        (!d.property.is_empty() && !d.value.is_empty()).then_some(d)
    }
}

impl fmt::Display for StyleDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.value)
    }
}

/// Parse every declaration in a `style` attribute value, in order.
pub fn declarations(style: &str) -> Vec<StyleDeclaration> {
    style.split(';').filter_map(StyleDeclaration::parse).collect()
}

/// True if `style` contains exactly this declaration.
pub fn declares(style: &str, wanted: &StyleDeclaration) -> bool {
    declarations(style).iter().any(|d| d == wanted)
}

/// Value of `property` in `style`, last declaration winning.
pub fn property(style: &str, property: &str) -> Option<String> {
    let property = squash(property);
    declarations(style)
        .into_iter()
        .rev()
        .find(|d| d.property == property)
        .map(|d| d.value)
}

fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_authored_variants() {
        let decls = declarations("color:#FF8C00; font-size : 14px;");
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0], StyleDeclaration::new("color", "#ff8c00"));
        assert_eq!(decls[1].value, "14px");
    }

    #[test]
    fn declares_ignores_case_and_spacing() {
        let indent = StyleDeclaration::parse("margin-left: 40px").unwrap();
        assert!(declares("MARGIN-LEFT:40px", &indent));
        assert!(declares("text-align: left; margin-left:  40px ;", &indent));
        assert!(!declares("margin-left: 80px", &indent));
    }

    #[test]
    fn property_lookup_prefers_last() {
        assert_eq!(
            property("color: red; color: #FF8C00", "color").as_deref(),
            Some("#ff8c00")
        );
        assert_eq!(property("font-weight: bold", "color"), None);
    }

    #[test]
    fn rejects_incomplete_declarations() {
        assert!(StyleDeclaration::parse("color").is_none());
        assert!(StyleDeclaration::parse("color:").is_none());
        assert!(declarations("").is_empty());
    }
}
