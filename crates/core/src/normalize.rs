use std::sync::LazyLock;

use regex::Regex;

static THINK_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<think>.*?</think>").expect("valid think regex"));

static THINKING_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<thinking>.*?</thinking>").expect("valid thinking regex"));

/// Strip `<think>`/`<thinking>` reasoning spans from a model response and
/// trim the rest.
///
/// Removal repeats until nothing matches, so spans that only form once an
/// inner span is cut out are removed too and `clean(clean(x)) == clean(x)`.
pub fn clean_summary(raw: &str) -> String {
    let mut text = raw.to_string();
    loop {
        let without_think = THINK_SPAN.replace_all(&text, "");
        let stripped = THINKING_SPAN.replace_all(&without_think, "").into_owned();
        if stripped.len() == text.len() {
            break;
        }
        text = stripped;
    }
    text.trim().to_string()
}
