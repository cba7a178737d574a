use crate::utils::{encode_path, escape_attr, escape_html, join_url};

/// A link in the page action bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FabAction {
    pub href: String,
    pub title: String,
    pub class: String,
}

/// Component for the per-page action bar
pub struct FabComponent;

impl FabComponent {
    pub fn new() -> Self {
        Self
    }

    /// Actions for a page: switch between the article and its history
    pub fn generate_actions(&self, base: &str, uri: &str, showing_history: bool) -> Vec<FabAction> {
        let canonical = encode_path(&join_url(base, uri));
        if showing_history {
            vec![FabAction { href: canonical, title: "Article".to_string(), class: "fab-action-article".to_string() }]
        } else {
            vec![FabAction {
                href: format!("{}?history", canonical),
                title: "History".to_string(),
                class: "fab-action-history".to_string(),
            }]
        }
    }

    pub fn generate_fab_html(&self, actions: &[FabAction]) -> String {
        if actions.is_empty() {
            return String::new();
        }
        let mut html = String::from("<div class=\"fab\" id=\"fab\">");
        for action in actions {
            html.push_str(&format!(
                "<a href=\"{}\" class=\"{}\">{}</a>",
                escape_attr(&action.href),
                escape_attr(&action.class),
                escape_html(&action.title)
            ));
        }
        html.push_str("</div>");
        html
    }
}

impl Default for FabComponent {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_links_to_history() {
        let fab = FabComponent::new();
        let actions = fab.generate_actions("/wiki", "/Home", false);
        assert_eq!(actions[0].href, "/wiki/Home?history");
        assert!(fab.generate_fab_html(&actions).contains(">History</a>"));
    }

    #[test]
    fn test_history_links_to_article() {
        let actions = FabComponent::new().generate_actions("/", "/notes/Page", true);
        assert_eq!(actions[0].href, "/notes/Page");
        assert_eq!(actions[0].title, "Article");
    }

    #[test]
    fn test_hrefs_are_percent_encoded() {
        let fab = FabComponent::new();
        let actions = fab.generate_actions("/", "/C# Notes", false);
        assert_eq!(actions[0].href, "/C%23%20Notes?history");
        let actions = fab.generate_actions("/", "/C# Notes", true);
        assert_eq!(actions[0].href, "/C%23%20Notes");
    }

    #[test]
    fn test_no_actions_no_html() {
        assert!(FabComponent::new().generate_fab_html(&[]).is_empty());
    }
}
