use pulldown_cmark::{html, Options, Parser};
use regex::Regex;
use std::collections::HashSet;

/// Strips all HTML tags from input (for titles, summaries, form fields).
pub fn strip_all_html(input: &str) -> String {
    ammonia::Builder::new()
        .tags(HashSet::new())
        .clean(input)
        .to_string()
}

/// Renders Markdown to HTML and sanitizes the result with ammonia's default
/// whitelist. Used for news bodies and seminar abstracts on detail pages.
pub fn render_markdown(markdown_input: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown_input, options);
    let mut unsafe_html = String::new();
    html::push_html(&mut unsafe_html, parser);

    ammonia::clean(&unsafe_html)
}

/// Produces a plain-text teaser: markup stripped, entities decoded,
/// whitespace collapsed, truncated to `budget` characters with an ellipsis.
pub fn summarize(body: &str, budget: usize) -> String {
    let stripped = strip_all_html(body);
    let decoded = html_escape::decode_html_entities(&stripped);
    let text = decoded.split_whitespace().collect::<Vec<_>>().join(" ");

    if text.chars().count() <= budget {
        return text;
    }
    let truncated: String = text.chars().take(budget).collect();
    format!("{}…", truncated.trim_end())
}

/// Lowercases and collapses everything that is not [a-z0-9] into single
/// dashes.
pub fn slugify(input: &str) -> String {
    let re = Regex::new(r"[^a-z0-9]+").unwrap();
    let lowered = input.to_lowercase();
    re.replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

/// Slug assigned at creation time: slugified title plus a Unix-timestamp
/// suffix so two items with the same title never collide. Immutable after
/// assignment.
pub fn make_slug(title: &str) -> String {
    let base = slugify(title);
    let suffix = chrono::Utc::now().timestamp();
    if base.is_empty() {
        format!("item-{}", suffix)
    } else {
        format!("{}-{}", base, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_strips_markup_and_truncates() {
        let body = "<p>The consortium <b>announces</b> a new grant.</p>";
        assert_eq!(summarize(body, 200), "The consortium announces a new grant.");

        let long = "word ".repeat(100);
        let teaser = summarize(&long, 20);
        assert!(teaser.ends_with('…'));
        // Budget plus the ellipsis character.
        assert!(teaser.chars().count() <= 21);
    }

    #[test]
    fn summarize_short_text_has_no_ellipsis() {
        assert_eq!(summarize("short", 200), "short");
        assert_eq!(summarize("", 200), "");
    }

    #[test]
    fn slugify_is_url_safe() {
        assert_eq!(slugify("Annual Meeting 2026!"), "annual-meeting-2026");
        assert_eq!(slugify("  Dr. Müller's Talk  "), "dr-m-ller-s-talk");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn make_slug_appends_timestamp_suffix() {
        let slug = make_slug("Annual Meeting");
        assert!(slug.starts_with("annual-meeting-"));
        let suffix = slug.rsplit('-').next().unwrap();
        assert!(suffix.parse::<i64>().is_ok());

        // A title with no usable characters still produces a valid slug.
        assert!(make_slug("???").starts_with("item-"));
    }

    #[test]
    fn render_markdown_escapes_scripts() {
        let rendered = render_markdown("# Title\n\n<script>alert(1)</script>");
        assert!(rendered.contains("<h1>"));
        assert!(!rendered.contains("<script>"));
    }
}
