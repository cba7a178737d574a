use std::fs;

use log::info;

use crate::config::Config;
use crate::errors::WikiError;
use crate::registry::Page;
use crate::types::{History, Link, TemplateContext};
use crate::utils::{escape_attr, escape_html, format_time};

/// Built-in HTML shell
pub const DEFAULT_SHELL: &str = r##"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{TITLE}}</title>
<link rel="stylesheet" href="/assets/css/style.css">
<link rel="stylesheet" href="/syntax.css">
<script>
(function () {
  var theme = localStorage.getItem("theme");
  if (theme) { document.documentElement.dataset.theme = theme; }
})();
</script>
</head>
<body>
<header class="nav">{{NAV}}</header>
<main class="content">
{{ACTIONS}}
{{CONTENT}}
</main>
<footer class="footer"><span>Powered by sam</span></footer>
<script>
document.addEventListener("click", function (e) {
  if (!e.target.closest("#theme-toggle")) { return; }
  var root = document.documentElement;
  var dark = root.dataset.theme === "dark" ||
    (!root.dataset.theme && window.matchMedia("(prefers-color-scheme: dark)").matches);
  root.dataset.theme = dark ? "light" : "dark";
  localStorage.setItem("theme", root.dataset.theme);
});
</script>
</body>
</html>
"##;

/// Component for handling HTML template rendering
#[derive(Debug, Clone)]
pub struct TemplateComponent {
    shell: String,
}

impl TemplateComponent {
    /// Use the built-in shell
    pub fn new() -> Self {
        Self { shell: DEFAULT_SHELL.to_string() }
    }

    pub fn with_shell(shell: String) -> Self {
        Self { shell }
    }

    /// Use `index.html` from the wiki root when present, else the built-in shell
    pub fn load(config: &Config) -> Result<Self, WikiError> {
        let custom = config.custom_template();
        if custom.is_file() {
            info!("Custom template found");
            let shell = fs::read_to_string(&custom)?;
            if !shell.contains("{{CONTENT}}") {
                return Err(WikiError::TemplateError(format!(
                    "{} has no {{{{CONTENT}}}} placeholder",
                    custom.display()
                )));
            }
            return Ok(Self::with_shell(shell));
        }
        Ok(Self::new())
    }

    /// Fill the shell placeholders in a single pass
    pub fn render_shell_template(&self, context: &TemplateContext) -> String {
        render_shell(&self.shell, context)
    }
}

impl Default for TemplateComponent {
    fn default() -> Self {
        Self::new()
    }
}

/// Substitute `{{TITLE}}`, `{{NAV}}`, `{{ACTIONS}}` and `{{CONTENT}}` in `shell`.
/// Inserted values are never scanned for placeholders again.
pub fn render_shell(shell: &str, context: &TemplateContext) -> String {
    let title = escape_html(&context.title);
    let mut out = String::with_capacity(shell.len() + context.content.len());
    let mut rest = shell;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start..];
        let value = match after {
            a if a.starts_with("{{TITLE}}") => Some(("{{TITLE}}", title.as_str())),
            a if a.starts_with("{{NAV}}") => Some(("{{NAV}}", context.nav.as_str())),
            a if a.starts_with("{{ACTIONS}}") => Some(("{{ACTIONS}}", context.actions.as_str())),
            a if a.starts_with("{{CONTENT}}") => Some(("{{CONTENT}}", context.content.as_str())),
            _ => None,
        };
        match value {
            Some((token, text)) => {
                out.push_str(text);
                rest = &after[token.len()..];
            }
            None => {
                out.push_str("{{");
                rest = &after[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Body of the article view
pub fn article_html(page: &Page, html: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("<h1 class=\"page-title\">{}</h1>\n", escape_html(&page.name)));
    if page.is_draft() {
        out.push_str("<p class=\"badge draft\">Draft</p>\n");
    }
    out.push_str("<article class=\"markdown-body\">\n");
    out.push_str(html);
    out.push_str("</article>\n");
    out
}

/// Body of the history view
pub fn history_html(page: &Page, history: &[History]) -> String {
    let mut out = String::new();
    out.push_str(&format!("<h1 class=\"page-title\">History - {}</h1>\n", escape_html(&page.name)));
    if history.is_empty() {
        out.push_str("<p class=\"empty\">No recorded changes.</p>\n");
        return out;
    }
    out.push_str("<table class=\"history\">\n<thead><tr><th></th><th>Author</th><th>Date</th><th>Change</th><th>Commit</th></tr></thead>\n<tbody>\n");
    for h in history {
        out.push_str(&format!(
            "<tr><td><img class=\"avatar\" src=\"https://www.gravatar.com/avatar/{}?s=40&amp;d=identicon\" alt=\"\" width=\"20\" height=\"20\"></td><td title=\"{}\">{}</td><td><time datetime=\"{}\">{}</time></td><td>{}</td><td><code title=\"{}\">{}</code></td></tr>\n",
            escape_attr(&h.email_hash),
            escape_attr(&h.author_email),
            escape_html(&h.author_name),
            escape_attr(&format_time(&h.time)),
            escape_html(&format_time(&h.time)),
            escape_html(&h.summary),
            escape_attr(&h.id),
            escape_html(&h.short_id),
        ));
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

/// Body of a tag listing or of the tag index
pub fn links_html(title: &str, links: &[Link]) -> String {
    let mut out = format!("<h1 class=\"page-title\">{}</h1>\n<ul class=\"links\">\n", escape_html(title));
    for link in links {
        out.push_str(&format!(
            "  <li><a href=\"{}\">{}</a></li>\n",
            escape_attr(&link.uri),
            escape_html(&link.name)
        ));
    }
    out.push_str("</ul>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::metadata_service::Meta;
    use std::path::Path;
    use tempfile::TempDir;
    use time::OffsetDateTime;

    fn context(title: &str, content: &str) -> TemplateContext {
        TemplateContext {
            title: title.to_string(),
            nav: "<nav></nav>".to_string(),
            content: content.to_string(),
            actions: String::new(),
        }
    }

    #[test]
    fn test_render_shell_fills_placeholders() {
        let html = render_shell("<t>{{TITLE}}</t>{{NAV}}{{CONTENT}}{{UNKNOWN}}", &context("A & B", "<p>x</p>"));
        assert_eq!(html, "<t>A &amp; B</t><nav></nav><p>x</p>{{UNKNOWN}}");
    }

    #[test]
    fn test_content_is_not_rescanned() {
        let html = render_shell("{{CONTENT}}|{{TITLE}}", &context("T", "{{TITLE}}"));
        assert_eq!(html, "{{TITLE}}|T");
    }

    #[test]
    fn test_default_shell_keeps_theme_script() {
        assert!(DEFAULT_SHELL.contains("closest(\"#theme-toggle\")"));
        assert!(DEFAULT_SHELL.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_default_shell_has_all_placeholders() {
        for token in ["{{TITLE}}", "{{NAV}}", "{{ACTIONS}}", "{{CONTENT}}"] {
            assert!(DEFAULT_SHELL.contains(token), "{token}");
        }
    }

    #[test]
    fn test_load_custom_template() {
        let dir = TempDir::new().unwrap();
        let config = Config::new(dir.path());
        let html = TemplateComponent::load(&config).unwrap().render_shell_template(&context("T", "<p>x</p>"));
        assert!(html.starts_with("<!doctype html>"));

        fs::write(dir.path().join("index.html"), "<html>{{CONTENT}}</html>").unwrap();
        let html = TemplateComponent::load(&config).unwrap().render_shell_template(&context("T", "<p>x</p>"));
        assert_eq!(html, "<html><p>x</p></html>");
    }

    #[test]
    fn test_custom_template_without_content_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.html"), "<html>{{TITLE}}</html>").unwrap();
        let result = TemplateComponent::load(&Config::new(dir.path()));
        assert!(matches!(result, Err(WikiError::TemplateError(_))));
    }

    #[test]
    fn test_article_marks_drafts() {
        let root = Path::new("/wiki");
        let meta = Meta { tags: vec![], draft: true };
        let page = Page::new(root, root.join("WIP.md"), meta).unwrap();
        let html = article_html(&page, "<p>body</p>");
        assert!(html.contains("Draft"));
        assert!(html.contains("<p>body</p>"));
    }

    #[test]
    fn test_history_table() {
        let root = Path::new("/wiki");
        let page = Page::new(root, root.join("Home.md"), Meta::default()).unwrap();
        let entry = History {
            id: "0123456789abcdef".into(),
            short_id: "0123456".into(),
            author_name: "Ada <admin>".into(),
            author_email: "ada@example.com".into(),
            email_hash: "abc".into(),
            time: OffsetDateTime::from_unix_timestamp(0).unwrap(),
            summary: "Fix typo".into(),
        };
        let html = history_html(&page, &[entry]);
        assert!(html.contains("History - Home"));
        assert!(html.contains("avatar/abc"));
        assert!(html.contains("Ada &lt;admin&gt;"));
        assert!(html.contains("Fix typo"));
        assert!(history_html(&page, &[]).contains("No recorded changes"));
    }

    #[test]
    fn test_links_html() {
        let links = vec![Link { name: "Page <1>".into(), uri: "/wiki/Page 1".into() }];
        let html = links_html("draft", &links);
        assert!(html.contains("<a href=\"/wiki/Page 1\">Page &lt;1&gt;</a>"));
    }
}
