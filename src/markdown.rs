//! Markdown to HTML for posts and replies.
//!
//! Fenced code keeps its `language-*` class for the browser-side highlighter
//! and is wrapped with a copy button. Raw HTML in user content is escaped.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

const CODE_BLOCK_OPEN: &str = "<div class=\"code-block\">\n";
const CODE_BLOCK_CLOSE: &str = "<button type=\"button\" class=\"copy-code\" aria-label=\"Copy code\" title=\"Copy code\">Copy</button></div>";

pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options).flat_map(|event| match event {
        Event::Start(Tag::CodeBlock(kind)) => vec![
            Event::Html(CowStr::Borrowed(CODE_BLOCK_OPEN)),
            Event::Start(Tag::CodeBlock(kind)),
        ],
        Event::End(Tag::CodeBlock(kind)) => vec![
            Event::End(Tag::CodeBlock(kind)),
            Event::Html(CowStr::Borrowed(CODE_BLOCK_CLOSE)),
        ],
        Event::Html(raw) => vec![Event::Text(raw)],
        Event::Start(Tag::Link(kind, url, title)) => {
            vec![Event::Start(Tag::Link(kind, safe_url(url), title))]
        }
        Event::End(Tag::Link(kind, url, title)) => {
            vec![Event::End(Tag::Link(kind, safe_url(url), title))]
        }
        Event::Start(Tag::Image(kind, url, title)) => {
            vec![Event::Start(Tag::Image(kind, safe_url(url), title))]
        }
        Event::End(Tag::Image(kind, url, title)) => {
            vec![Event::End(Tag::Image(kind, safe_url(url), title))]
        }
        other => vec![other],
    });

    let mut html_output = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut html_output, parser);
    html_output
}

/// Relative URLs and http, https or mailto pass; any other scheme becomes "#".
pub fn is_safe_url(url: &str) -> bool {
    let url = url.trim_start();
    match url.find(':') {
        None => true,
        Some(colon) => {
            // A colon after a path, query or fragment delimiter is not a scheme.
            if url[..colon].contains(|c: char| c == '/' || c == '?' || c == '#') {
                return true;
            }
            let scheme = url[..colon].to_ascii_lowercase();
            matches!(scheme.as_str(), "http" | "https" | "mailto")
        }
    }
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    if is_safe_url(&url) {
        url
    } else {
        CowStr::Borrowed("#")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text() {
        assert!(render_markdown("Hello, world!").contains("<p>Hello, world!</p>"));
        assert!(render_markdown("").is_empty());
    }

    #[test]
    fn fenced_code_keeps_language_and_gets_copy_button() {
        let html = render_markdown("```powershell\nGet-Process\n```");
        assert!(html.starts_with(
            "<div class=\"code-block\">\n<pre><code class=\"language-powershell\">"
        ));
        assert!(html.contains("Get-Process"));
        assert!(html.contains("class=\"copy-code\""));
        assert!(html.trim_end().ends_with("</button></div>"));
    }

    #[test]
    fn indented_code_is_wrapped_too() {
        let html = render_markdown("    let x = 1;\n");
        assert!(html.contains("<div class=\"code-block\">\n<pre><code>"));
    }

    #[test]
    fn code_is_escaped() {
        let html = render_markdown("```html\n<b>bold</b>\n```");
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;"));
    }

    #[test]
    fn raw_html_is_escaped() {
        let html = render_markdown("<script>alert('xss')</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));

        let html = render_markdown("inline <img src=x onerror=alert(1)> html");
        assert!(!html.contains("<img"));
    }

    #[test]
    fn gfm_extensions() {
        assert!(render_markdown("~~gone~~").contains("<del>gone</del>"));
        assert!(render_markdown("| A | B |\n|---|---|\n| 1 | 2 |").contains("<table>"));
        assert!(render_markdown("- [x] done").contains("checkbox"));
    }

    #[test]
    fn script_links_are_neutralised() {
        let html = render_markdown("[click](javascript:alert(1))");
        assert!(html.contains("<a href=\"#\">click</a>"));

        let html = render_markdown("[docs](https://example.com/a)");
        assert!(html.contains("<a href=\"https://example.com/a\">docs</a>"));
    }

    #[test]
    fn safe_urls() {
        assert!(is_safe_url("https://example.com"));
        assert!(is_safe_url("HTTP://example.com"));
        assert!(is_safe_url("mailto:someone@example.com"));
        assert!(is_safe_url("/post/1"));
        assert!(is_safe_url("#anchor"));
        assert!(is_safe_url("docs/page?x=a:b"));
        assert!(!is_safe_url("javascript:alert(1)"));
        assert!(!is_safe_url(" JavaScript:alert(1)"));
        assert!(!is_safe_url("data:text/html,hi"));
    }
}
