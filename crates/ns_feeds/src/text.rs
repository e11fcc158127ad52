use scraper::Html;

/// Decode HTML entities (`&amp;`, `&#8211;`, `&nbsp;` ...) and trim.
pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).trim().to_string()
}

/// Reduce an HTML fragment to its visible text, with whitespace runs
/// collapsed to a single space.
pub fn strip_markup(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&text)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn clean_title(raw: &str) -> String {
    collapse_whitespace(&decode_entities(raw))
}

/// Descriptions are often escaped twice, once for HTML and once for the
/// feed, so entities are decoded again after the markup is gone.
pub fn clean_summary(raw: &str) -> String {
    decode_entities(&strip_markup(raw))
}
