use crate::utils::{encode_path, escape_attr, join_url};

/// Component for the navigation bar shown on every page
#[derive(Debug, Clone)]
pub struct NavigationComponent {
    base: String,
    home: String,
    has_tags: bool,
}

impl NavigationComponent {
    pub fn new(base: &str, home: &str, has_tags: bool) -> Self {
        Self { base: base.to_string(), home: home.to_string(), has_tags }
    }

    /// Home link, tags link when any tag exists, and the theme toggle
    pub fn build_nav_html(&self) -> String {
        let mut html = String::from("<nav class=\"nav-bar\">");
        html.push_str(&format!(
            "<a class=\"nav-home\" href=\"{}\">Home</a>",
            escape_attr(&encode_path(&join_url(&self.base, &self.home)))
        ));
        if self.has_tags {
            html.push_str(&format!(
                "<a class=\"nav-tags\" href=\"{}\">Tags</a>",
                escape_attr(&join_url(&self.base, "/tags"))
            ));
        }
        html.push_str("<button id=\"theme-toggle\" type=\"button\" aria-label=\"Toggle theme\">&#9680;</button>");
        html.push_str("</nav>");
        html
    }
}
