//! Playwright selector strings composed without a live page

use std::fmt;

/// A selector in Playwright's chained selector syntax
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator(String);

impl Locator {
    pub fn new(selector: impl Into<String>) -> Self {
        Self(selector.into())
    }

    /// `text=` selector
    pub fn text(text: &str) -> Self {
        Self(format!("text={}", text))
    }

    /// ARIA role with an optional accessible name
    pub fn role(role: &str, name: Option<&str>) -> Self {
        match name {
            Some(name) => Self(format!("role={}[name=\"{}\"]", role, name)),
            None => Self(format!("role={}", role)),
        }
    }

    pub fn nth(&self, index: usize) -> Self {
        Self(format!("{} >> nth={}", self.0, index))
    }

    pub fn first(&self) -> Self {
        self.nth(0)
    }

    /// Scope `child` inside this locator
    pub fn locator(&self, child: &str) -> Self {
        Self(format!("{} >> {}", self.0, child))
    }

    pub fn has_text(&self, text: &str) -> Self {
        Self(format!("{}:has-text(\"{}\")", self.0, text))
    }

    pub fn selector(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Locator {
    fn from(selector: &str) -> Self {
        Self::new(selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Locator::new(".cart_description").nth(2), ".cart_description >> nth=2" ; "nth")]
    #[test_case(Locator::new("#cartModal").first(), "#cartModal >> nth=0" ; "first")]
    #[test_case(Locator::new("tr").locator("h4 a"), "tr >> h4 a" ; "scoped")]
    #[test_case(Locator::new("a").has_text("View Cart"), "a:has-text(\"View Cart\")" ; "has text")]
    #[test_case(Locator::text("Congratulations!"), "text=Congratulations!" ; "text")]
    #[test_case(Locator::role("link", None), "role=link" ; "role")]
    fn test_selector(locator: Locator, expected: &str) {
        assert_eq!(locator.selector(), expected);
    }

    #[test]
    fn test_chaining_preserves_order() {
        let row = Locator::new("#cart_info_table tbody tr").nth(1).locator(".cart_quantity button");
        assert_eq!(
            row.to_string(),
            "#cart_info_table tbody tr >> nth=1 >> .cart_quantity button"
        );
    }
}
