//! Closed set of element roles, resolved once from the tag name.
//!
//! Later stages match on [`Role`] instead of comparing tag strings, so a new
//! tag only has to be taught here.

/// Inline text-style elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextStyle {
    /// `span`
    Span,
    /// `strong`, `b`
    Bold,
    /// `em`, `i`
    Italic,
}

/// What an element means to the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    TextStyle(TextStyle),
    /// Generic block wrapper with no meaning of its own (`div`, `section`, `article`).
    Grouping,
    Paragraph,
    /// `h1`..`h6`, carrying the level.
    Heading(u8),
    List,
    ListItem,
    Break,
    Image,
    Other,
}

impl Role {
    /// Resolve the role of a lower-cased tag name.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "span" => Role::TextStyle(TextStyle::Span),
            "strong" | "b" => Role::TextStyle(TextStyle::Bold),
            "em" | "i" => Role::TextStyle(TextStyle::Italic),
            "div" | "section" | "article" => Role::Grouping,
            "p" => Role::Paragraph,
            "h1" => Role::Heading(1),
            "h2" => Role::Heading(2),
            "h3" => Role::Heading(3),
            "h4" => Role::Heading(4),
            "h5" => Role::Heading(5),
            "h6" => Role::Heading(6),
            "ul" | "ol" => Role::List,
            "li" => Role::ListItem,
            "br" => Role::Break,
            "img" => Role::Image,
            _ => Role::Other,
        }
    }

    /// Bold or italic: the wrappers that can participate in a heading.
    pub fn is_emphasis(self) -> bool {
        matches!(
            self,
            Role::TextStyle(TextStyle::Bold) | Role::TextStyle(TextStyle::Italic)
        )
    }

    pub fn is_bold(self) -> bool {
        self == Role::TextStyle(TextStyle::Bold)
    }

    pub fn is_text_style(self) -> bool {
        matches!(self, Role::TextStyle(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_and_canonical_bold_share_a_role() {
        assert_eq!(Role::from_tag("b"), Role::from_tag("strong"));
        assert_eq!(Role::from_tag("i"), Role::from_tag("em"));
        assert!(Role::from_tag("b").is_bold());
        assert!(Role::from_tag("em").is_emphasis());
        assert!(!Role::from_tag("span").is_emphasis());
    }

    #[test]
    fn headings_carry_their_level() {
        assert_eq!(Role::from_tag("h3"), Role::Heading(3));
        assert_eq!(Role::from_tag("h4"), Role::Heading(4));
        assert_eq!(Role::from_tag("h7"), Role::Other);
    }

    #[test]
    fn unknown_tags_are_other() {
        assert_eq!(Role::from_tag("table"), Role::Other);
        assert_eq!(Role::from_tag("a"), Role::Other);
    }
}
