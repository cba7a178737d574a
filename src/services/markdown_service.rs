use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use log::debug;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use regex::{Captures, Regex};
use syntect::highlighting::ThemeSet;
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::errors::WikiError;
use crate::services::metadata_service::strip_front_matter;
use crate::utils::{escape_attr, escape_html};

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

/// Wikilinks, emoji shortcodes and bare URLs inside plain text
static INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?P<wiki>(?P<embed>!)?\[\[(?P<target>[^\[\]|#]*)(?:#(?P<frag>[^\[\]|]*))?(?:\|(?P<label>[^\[\]]*))?\]\])",
        r"|(?P<emoji>:(?P<code>[a-z0-9_+\-]+):)",
        r#"|(?P<url>\b(?:https?://|www\.)[^\s<>]*[^\s<>.,;:!?)\]'"*_~])"#,
    ))
    .expect("inline pattern is valid")
});

const RAW_HTML_OMITTED: &str = "<!-- raw HTML omitted -->";
const RAW_HTML_OMITTED_BLOCK: &str = "<!-- raw HTML omitted -->\n";

const LIGHT_THEME: &str = "InspiredGitHub";
const DARK_THEME: &str = "base16-ocean.dark";

const MERMAID_LOADER: &str = "<script type=\"module\">import mermaid from \"https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.esm.min.mjs\";mermaid.initialize({ startOnLoad: true });</script>\n";

/// Service for handling markdown rendering
pub struct MarkdownService {
    options: Options,
}

impl MarkdownService {
    /// Create a new markdown service
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_FOOTNOTES);
        Self { options }
    }

    /// Read a Markdown file and render it
    pub fn render_file(&self, path: &Path) -> Result<String, WikiError> {
        let bytes = std::fs::read(path)?;
        let content = String::from_utf8(bytes)
            .map_err(|e| WikiError::RenderError(format!("{} is not UTF-8: {}", path.display(), e)))?;
        self.render(&content)
    }

    /// Render Markdown to an HTML fragment, dropping any front matter block
    pub fn render(&self, content: &str) -> Result<String, WikiError> {
        let body = strip_front_matter(content);
        let events: Vec<Event<'_>> = Parser::new_ext(body, self.options).collect();
        let ids = heading_ids(&events);

        let mut writer = EventWriter::new(ids);
        for ev in events {
            writer.push(ev)?;
        }
        let (events, has_mermaid) = writer.finish();

        let mut out = String::with_capacity(body.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());
        if has_mermaid {
            out.push_str(MERMAID_LOADER);
        }
        debug!("Rendered {} bytes of Markdown into {} bytes of HTML", body.len(), out.len());
        Ok(out)
    }
}

impl Default for MarkdownService {
    fn default() -> Self {
        Self::new()
    }
}

/// Rewrites the parser's event stream before it reaches the HTML writer
struct EventWriter<'a> {
    out: Vec<Event<'a>>,
    ids: Vec<String>,
    next_heading: usize,
    heading_ids: Vec<String>,
    text: String,
    code: Option<(String, String)>,
    link_depth: usize,
    image_depth: usize,
    has_mermaid: bool,
}

impl<'a> EventWriter<'a> {
    fn new(ids: Vec<String>) -> Self {
        Self {
            out: Vec::new(),
            ids,
            next_heading: 0,
            heading_ids: Vec::new(),
            text: String::new(),
            code: None,
            link_depth: 0,
            image_depth: 0,
            has_mermaid: false,
        }
    }

    fn push(&mut self, ev: Event<'a>) -> Result<(), WikiError> {
        if self.code.is_some() {
            match ev {
                Event::Text(t) => {
                    if let Some((_, buf)) = self.code.as_mut() {
                        buf.push_str(&t);
                    }
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, code)) = self.code.take() {
                        let block = self.code_block(&lang, &code)?;
                        self.out.push(Event::Html(CowStr::from(block)));
                    }
                }
                _ => {}
            }
            return Ok(());
        }

        if self.image_depth > 0 {
            match ev {
                Event::Start(Tag::Image { .. }) => self.image_depth += 1,
                Event::End(TagEnd::Image) => self.image_depth -= 1,
                _ => {}
            }
            self.out.push(ev);
            return Ok(());
        }

        if let Event::Text(t) = ev {
            self.text.push_str(&t);
            return Ok(());
        }
        self.flush_text();

        match ev {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split(|c: char| c.is_whitespace() || c == ',')
                        .next()
                        .unwrap_or("")
                        .to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                self.code = Some((lang, String::new()));
            }
            Event::Start(Tag::Heading { level, .. }) => {
                let id = self.ids.get(self.next_heading).cloned().unwrap_or_default();
                self.next_heading += 1;
                self.out.push(Event::Html(CowStr::from(format!(
                    "<h{} id=\"{}\">",
                    heading_level_to_u32(level),
                    escape_attr(&id)
                ))));
                self.heading_ids.push(id);
            }
            Event::End(TagEnd::Heading(level)) => {
                let id = self.heading_ids.pop().unwrap_or_default();
                self.out.push(Event::Html(CowStr::from(format!(
                    "<a class=\"hlink\" href=\"#{}\" aria-label=\"Link to this section\">#</a></h{}>\n",
                    escape_attr(&id),
                    heading_level_to_u32(level)
                ))));
            }
            Event::Start(Tag::Link { .. }) => {
                self.link_depth += 1;
                self.out.push(ev);
            }
            Event::End(TagEnd::Link) => {
                self.link_depth = self.link_depth.saturating_sub(1);
                self.out.push(ev);
            }
            Event::Start(Tag::Image { .. }) => {
                self.image_depth = 1;
                self.out.push(ev);
            }
            Event::SoftBreak => self.out.push(Event::HardBreak),
            // Raw HTML from page source is never emitted
            Event::Start(Tag::HtmlBlock) => {
                self.out.push(Event::Html(CowStr::Borrowed(RAW_HTML_OMITTED_BLOCK)));
            }
            Event::End(TagEnd::HtmlBlock) | Event::Html(_) => {}
            Event::InlineHtml(_) => {
                self.out.push(Event::InlineHtml(CowStr::Borrowed(RAW_HTML_OMITTED)));
            }
            _ => self.out.push(ev),
        }
        Ok(())
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.text);
        let html = render_inline(&text, self.link_depth == 0);
        self.out.push(Event::InlineHtml(CowStr::from(html)));
    }

    fn code_block(&mut self, lang: &str, code: &str) -> Result<String, WikiError> {
        if lang == "mermaid" {
            self.has_mermaid = true;
            return Ok(format!("<pre class=\"mermaid\">{}</pre>\n", escape_html(code)));
        }
        if lang.is_empty() {
            return Ok(format!("<pre><code>{}</code></pre>\n", escape_html(code)));
        }
        let body = match highlight(lang, code)? {
            Some(html) => html,
            None => escape_html(code),
        };
        Ok(format!(
            "<pre class=\"highlight\"><code class=\"language-{}\">{}</code></pre>\n",
            escape_attr(lang),
            body
        ))
    }

    fn finish(mut self) -> (Vec<Event<'a>>, bool) {
        self.flush_text();
        (self.out, self.has_mermaid)
    }
}

/// Highlight `code` into class-annotated spans; `None` for unknown languages
fn highlight(lang: &str, code: &str) -> Result<Option<String>, WikiError> {
    let Some(syntax) = SYNTAXES.find_syntax_by_token(lang) else {
        return Ok(None);
    };
    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAXES, ClassStyle::Spaced);
    for line in LinesWithEndings::from(code) {
        generator
            .parse_html_for_line_which_includes_newline(line)
            .map_err(|e| WikiError::RenderError(format!("highlighting {} failed: {}", lang, e)))?;
    }
    Ok(Some(generator.finalize()))
}

/// Stylesheet for highlighted code: light theme, dark theme under `prefers-color-scheme`
pub fn syntax_css() -> Result<String, WikiError> {
    let themes = ThemeSet::load_defaults();
    let css_for = |name: &str| {
        let theme = themes
            .themes
            .get(name)
            .ok_or_else(|| WikiError::RenderError(format!("theme {} missing", name)))?;
        css_for_theme_with_class_style(theme, ClassStyle::Spaced)
            .map_err(|e| WikiError::RenderError(e.to_string()))
    };
    let light = css_for(LIGHT_THEME)?;
    let dark = css_for(DARK_THEME)?;
    Ok(format!("{}\n@media (prefers-color-scheme: dark) {{\n{}\n}}\n", light, dark))
}

/// Escape `text`, replacing wikilinks, emoji shortcodes and bare URLs
fn render_inline(text: &str, allow_links: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut pos = 0;
    while let Some(caps) = INLINE.captures_at(text, pos) {
        let Some(m) = caps.get(0) else { break };
        match render_token(&caps, allow_links) {
            Some(html) => {
                out.push_str(&escape_html(&text[last..m.start()]));
                out.push_str(&html);
                last = m.end();
                pos = m.end();
            }
            // A rejected token may share its tail with the next one, as in `1:1:rocket:`
            None => {
                pos = m.start() + text[m.start()..].chars().next().map_or(1, char::len_utf8);
            }
        }
        if pos >= text.len() {
            break;
        }
    }
    out.push_str(&escape_html(&text[last..]));
    out
}

fn render_token(caps: &Captures<'_>, allow_links: bool) -> Option<String> {
    if let Some(code) = caps.name("code") {
        return emojis::get_by_shortcode(code.as_str()).map(|e| e.as_str().to_string());
    }
    if !allow_links {
        return None;
    }
    if let Some(url) = caps.name("url") {
        let url = url.as_str();
        let href = if url.starts_with("www.") { format!("http://{}", url) } else { url.to_string() };
        return Some(format!("<a href=\"{}\">{}</a>", escape_attr(&href), escape_html(url)));
    }
    caps.name("wiki")?;
    let target = caps.name("target").map_or("", |m| m.as_str()).trim();
    let fragment = caps.name("frag").map(|m| m.as_str().trim()).filter(|f| !f.is_empty());
    if target.is_empty() && fragment.is_none() {
        return None;
    }
    let dest = resolve_wikilink(target, fragment);
    let raw_target = match fragment {
        Some(f) => format!("{}#{}", target, f),
        None => target.to_string(),
    };
    let label = caps
        .name("label")
        .map(|m| m.as_str().trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .unwrap_or(raw_target);

    if caps.name("embed").is_some() {
        Some(format!("<img src=\"{}\" alt=\"{}\" />", escape_attr(&dest), escape_attr(&label)))
    } else {
        Some(format!("<a href=\"{}\">{}</a>", escape_attr(&dest), escape_html(&label)))
    }
}

/// `Target` or `Target#Fragment`
pub fn resolve_wikilink(target: &str, fragment: Option<&str>) -> String {
    match fragment {
        Some(f) if !f.is_empty() => format!("{}#{}", target, f),
        _ => target.to_string(),
    }
}

/// Slug ids for every heading, in document order
fn heading_ids(events: &[Event<'_>]) -> Vec<String> {
    let mut ids = Vec::new();
    let mut in_heading: Option<u32> = None;
    let mut buf = String::new();
    let mut id_counts: HashMap<String, usize> = HashMap::new();

    for ev in events {
        match ev {
            Event::Start(Tag::Heading { level, .. }) => {
                in_heading = Some(heading_level_to_u32(*level));
                buf.clear();
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(lvl) = in_heading.take() {
                    let mut id = slugify(&buf);
                    if id.is_empty() {
                        id = format!("h{}", lvl);
                    }
                    let count = id_counts.entry(id.clone()).or_insert(0);
                    if *count > 0 {
                        id = format!("{}-{}", id, *count);
                    }
                    *count += 1;
                    ids.push(id);
                }
                buf.clear();
            }
            Event::Text(t) | Event::Code(t) => {
                if in_heading.is_some() {
                    buf.push_str(t);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if in_heading.is_some() {
                    buf.push(' ');
                }
            }
            _ => {}
        }
    }
    ids
}

/// Convert heading level to u32
fn heading_level_to_u32(level: HeadingLevel) -> u32 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Create URL-friendly slug from text
fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_dash = false;
    for ch in text.chars() {
        let c = ch.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_dash = false;
        } else if (c.is_ascii_whitespace() || c == '-' || c == '_') && !last_dash && !out.is_empty() {
            out.push('-');
            last_dash = true;
        }
    }
    if out.ends_with('-') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(md: &str) -> String {
        MarkdownService::new().render(md).unwrap()
    }

    #[test]
    fn test_heading_gets_id_and_anchor() {
        let html = render("# Hi");
        assert!(html.contains("<h1 id=\"hi\">Hi<a class=\"hlink\" href=\"#hi\""), "{html}");
        assert!(html.contains("</h1>"));
    }

    #[test]
    fn test_duplicate_heading_ids() {
        let html = render("## Setup\n\n## Setup\n");
        assert!(html.contains("id=\"setup\""));
        assert!(html.contains("id=\"setup-1\""));
    }

    #[test]
    fn test_front_matter_is_stripped() {
        let html = render("---\ntags: [a]\n---\nBody text\n");
        assert!(!html.contains("tags"));
        assert!(html.contains("<p>Body text</p>"));
    }

    #[test]
    fn test_hard_wraps() {
        let html = render("line one\nline two\n");
        assert!(html.contains("line one<br />"), "{html}");
    }

    #[test]
    fn test_gfm_extensions() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n\n- [x] done\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<th>a</th>"));
        assert!(html.contains("<del>gone</del>"));
        assert!(html.contains("checkbox"));
    }

    #[test]
    fn test_wikilinks() {
        let html = render("See [[Target]] and [[Other#Part]] and [[Page#Sec|the section]].");
        assert!(html.contains("<a href=\"Target\">Target</a>"), "{html}");
        assert!(html.contains("<a href=\"Other#Part\">Other#Part</a>"));
        assert!(html.contains("<a href=\"Page#Sec\">the section</a>"));
    }

    #[test]
    fn test_wikilink_embed() {
        let html = render("![[diagram.png|Overview]]");
        assert!(html.contains("<img src=\"diagram.png\" alt=\"Overview\" />"), "{html}");
    }

    #[test]
    fn test_resolve_wikilink() {
        assert_eq!(resolve_wikilink("Target", None), "Target");
        assert_eq!(resolve_wikilink("Target", Some("Fragment")), "Target#Fragment");
        assert_eq!(resolve_wikilink("Target", Some("")), "Target");
    }

    #[test]
    fn test_emoji_shortcodes() {
        let html = render("Ship it :rocket: at 12:30:45");
        assert!(html.contains('🚀'), "{html}");
        assert!(html.contains("12:30:45"));
        assert!(render(":not_an_emoji_name:").contains(":not_an_emoji_name:"));
    }

    #[test]
    fn test_raw_html_is_omitted() {
        let html = render("<div onclick=\"x()\">block</div>\n\nText <script>alert(1)</script> here\n");
        assert!(!html.contains("<div"), "{html}");
        assert!(!html.contains("<script>alert"), "{html}");
        assert!(html.contains("<!-- raw HTML omitted -->"));
        assert!(html.contains("Text "));
    }

    #[test]
    fn test_emoji_after_rejected_shortcode() {
        let html = render("1:1:rocket:");
        assert!(html.contains("1:1🚀"), "{html}");
    }

    #[test]
    fn test_autolinks() {
        let html = render("Visit https://example.com/docs. Or www.rust-lang.org");
        assert!(html.contains("<a href=\"https://example.com/docs\">https://example.com/docs</a>."), "{html}");
        assert!(html.contains("<a href=\"http://www.rust-lang.org\">www.rust-lang.org</a>"));
    }

    #[test]
    fn test_no_nested_links() {
        let html = render("[see https://example.com](https://example.com)");
        assert_eq!(html.matches("<a ").count(), 1, "{html}");
    }

    #[test]
    fn test_code_is_left_alone() {
        let html = render("`[[NotALink]]`\n\n```\n:rocket: [[Nope]]\n```\n");
        assert!(!html.contains("href=\"NotALink\""));
        assert!(!html.contains('🚀'));
        assert!(html.contains("[[Nope]]"));
    }

    #[test]
    fn test_highlighted_code_block() {
        let html = render("```rust\nfn main() {}\n```\n");
        assert!(html.contains("<pre class=\"highlight\"><code class=\"language-rust\">"), "{html}");
        assert!(html.contains("<span class="));
    }

    #[test]
    fn test_unknown_language_is_escaped() {
        let html = render("```nosuchlang\n<b>\n```\n");
        assert!(html.contains("language-nosuchlang"));
        assert!(html.contains("&lt;b&gt;"));
    }

    #[test]
    fn test_mermaid_block() {
        let html = render("```mermaid\ngraph TD; A-->B;\n```\n");
        assert!(html.contains("<pre class=\"mermaid\">graph TD; A--&gt;B;"), "{html}");
        assert_eq!(html.matches("mermaid.initialize").count(), 1);
        assert!(!render("plain").contains("mermaid"));
    }

    #[test]
    fn test_text_is_escaped() {
        let html = render("a < b & c");
        assert!(html.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn test_syntax_css() {
        let css = syntax_css().unwrap();
        assert!(css.contains("prefers-color-scheme: dark"));
    }

    #[test]
    fn test_render_file_rejects_non_utf8() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bin.md");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        let err = MarkdownService::new().render_file(&path).unwrap_err();
        assert!(matches!(err, WikiError::RenderError(_)));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  a  b "), "a-b");
    }
}
