use crate::{Theme, ThemeEnvelope};
use std::fmt::Write;

impl Theme {
    /// Flattens the palette and radii into a `:root` style-variable block.
    ///
    /// This is a pure function of the theme, so the same theme always
    /// renders the same text.
    ///
    /// # Example
    ///
    /// ```text
    /// :root {
    ///   --color-primary: #8b5cf6;
    ///   ...
    ///   --radius-box: 12px;
    /// }
    /// ```
    #[must_use]
    pub fn css_variables(&self) -> String {
        let mut css = String::from(":root {\n");

        for (role, value) in self.color_roles() {
            // writing into a String cannot fail
            let _ = writeln!(css, "  --color-{role}: {value};");
        }

        for (name, px) in [
            ("box", self.radius.box_),
            ("field", self.radius.field),
            ("selector", self.radius.selector),
        ] {
            let _ = writeln!(css, "  --radius-{name}: {px}px;");
        }

        css.push_str("}\n");
        css
    }

    /// The palette as `(role, color)` pairs in declaration order.
    #[must_use]
    pub fn color_roles(&self) -> [(&'static str, &str); 8] {
        let c = &self.colors;
        [
            ("primary", c.primary.as_str()),
            ("secondary", c.secondary.as_str()),
            ("accent", c.accent.as_str()),
            ("neutral", c.neutral.as_str()),
            ("info", c.info.as_str()),
            ("success", c.success.as_str()),
            ("warning", c.warning.as_str()),
            ("error", c.error.as_str()),
        ]
    }
}

/// Short variable names kept for stylesheets that predate the
/// `--color-*` scheme.
#[must_use]
pub fn legacy_aliases(theme: &Theme) -> Vec<(&'static str, &str)> {
    let c = &theme.colors;
    vec![
        ("--primary", c.primary.as_str()),
        ("--secondary", c.secondary.as_str()),
        ("--accent", c.accent.as_str()),
        ("--destructive", c.error.as_str()),
        ("--success", c.success.as_str()),
        ("--warning", c.warning.as_str()),
    ]
}

impl ThemeEnvelope {
    /// Value pullers compare against the last applied envelope to decide
    /// whether anything changed. Falls back to the theme id when the
    /// envelope was never timestamped.
    #[must_use]
    pub fn change_marker(&self) -> String {
        self.timestamp
            .clone()
            .unwrap_or_else(|| self.theme_id.clone())
    }
}
