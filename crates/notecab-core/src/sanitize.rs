use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use ammonia::Builder;

const ALLOWED_TAGS: &[&str] = &[
    "p",
    "div",
    "span",
    "h1",
    "h2",
    "h3",
    "strong",
    "em",
    "u",
    "s",
    "ul",
    "ol",
    "li",
    "pre",
    "code",
    "blockquote",
    "a",
    "input",
];

const ALLOWED_ATTRIBUTES: &[&str] = &["href", "class", "style", "data-type", "type", "checked"];

const ALLOWED_STYLES: &[&str] = &[
    "color",
    "background-color",
    "font-family",
    "font-size",
    "text-align",
    "margin",
    "margin-left",
    "padding",
];

static SANITIZER: LazyLock<Builder<'static>> = LazyLock::new(|| {
    let mut builder = Builder::default();
    builder
        .tags(ALLOWED_TAGS.iter().copied().collect::<HashSet<_>>())
        .tag_attributes(HashMap::new())
        .generic_attributes(ALLOWED_ATTRIBUTES.iter().copied().collect::<HashSet<_>>())
        .filter_style_properties(ALLOWED_STYLES.iter().copied().collect::<HashSet<_>>())
        .link_rel(None);
    builder
});

/// Strips everything outside the editor's allow-list. `script` and `style`
/// elements are dropped together with their text.
pub fn sanitize_content(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    SANITIZER.clean(html).to_string()
}

/// Normalizes content loaded from the server before it reaches an editor.
pub fn clean_content(content: &str) -> String {
    content.trim().to_string()
}
