//! Body text cleanup ahead of analysis.

use std::sync::LazyLock;

use regex::Regex;

/// Anything between `<` and the next `>`. Not an HTML parser.
static MARKUP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("markup tag pattern is valid"));

/// Strip markup tags and collapse every whitespace run to a single space.
///
/// Idempotent: cleaning cleaned text returns it unchanged.
pub fn clean_content(body: &str) -> String {
    let stripped = MARKUP_TAG.replace_all(body, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
