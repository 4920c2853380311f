use std::collections::HashSet;

use ammonia::Builder;
use html_escape::decode_html_entities;
use lazy_static::lazy_static;

pub const EXCERPT_LEN: usize = 200;

lazy_static! {
    // Formatting the editor emits: starter kit, tables, task lists, sub/sup,
    // underline, highlight, text color and alignment.
    static ref EDITOR_HTML: Builder<'static> = {
        let mut b = Builder::default();
        b.add_tags(&["input", "label"])
            .add_tag_attributes("input", &["type", "checked", "disabled"])
            .add_tag_attributes("td", &["colspan", "rowspan", "colwidth"])
            .add_tag_attributes("th", &["colspan", "rowspan", "colwidth"])
            .add_generic_attributes(&["style", "data-type", "data-checked", "data-color"])
            .filter_style_properties(HashSet::from(["text-align", "color", "background-color"]))
            .url_schemes(HashSet::from(["http", "https", "mailto"]))
            .link_rel(Some("noopener noreferrer"));
        b
    };

    static ref TEXT_ONLY: Builder<'static> = Builder::empty();
}

/// Cleans editor output before it is stored.
pub fn sanitize_html(raw: &str) -> String {
    EDITOR_HTML.clean(raw).to_string()
}

/// Plain-text preview of already sanitized HTML.
///
/// The cleaner re-serializes as HTML, so entities are decoded before the
/// cut; the result is text and never ends in half an entity.
pub fn derive_excerpt(html: &str) -> String {
    let cleaned = TEXT_ONLY.clean(html).to_string();
    let text = decode_html_entities(&cleaned);
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(EXCERPT_LEN).collect()
}
