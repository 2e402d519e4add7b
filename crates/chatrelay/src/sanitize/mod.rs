//! Plain-text normalization of model output
//!
//! Model replies routinely arrive with Markdown, HTML and emoji even when
//! the instructions ask for plain text. The sanitizer strips all of it with
//! an ordered table of pattern stages. Order matters: later stages assume
//! earlier ones already removed the structure they would otherwise trip on
//! (code fences before emphasis, emphasis before bullets, and so on).

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// A single named pattern substitution in the pipeline
#[derive(Debug)]
pub struct Stage {
    name: &'static str,
    pattern: Regex,
    replacement: &'static str,
}

impl Stage {
    /// Stage name, stable across releases (used in tests and logs)
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Apply this stage to every match in `text`
    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        self.pattern.replace_all(text, self.replacement)
    }
}

/// Keycap sequences such as `1\u{FE0F}\u{20E3}`. The base is optional so a
/// keycap left behind by an earlier stage (`#` eaten as a heading) goes too.
const KEYCAP: &str = r"[0-9#*]?\u{FE0F}?\u{20E3}";

/// Modifiers that belong to the preceding pictograph: text/emoji
/// presentation selectors and skin tones.
const EMOJI_MODIFIERS: &str = r"[\u{FE0E}\u{FE0F}\u{1F3FB}-\u{1F3FF}]*";

static STAGES: LazyLock<Vec<Stage>> = LazyLock::new(|| {
    let pictographs = format!(
        r"{KEYCAP}|\p{{Extended_Pictographic}}{EMOJI_MODIFIERS}(?:\u{{200D}}\p{{Extended_Pictographic}}{EMOJI_MODIFIERS})*|[\u{{1F1E6}}-\u{{1F1FF}}]"
    );

    let table: Vec<(&'static str, String, &'static str)> = vec![
        ("fenced_code", r"(?s)```.*?```".into(), ""),
        ("inline_code", r"`([^`]+)`".into(), "${1}"),
        ("images", r"!\[[^\]]*\]\([^)]*\)".into(), ""),
        ("links", r"\[([^\]]+)\]\([^)]*\)".into(), "${1}"),
        ("bold_asterisks", r"\*\*(.*?)\*\*".into(), "${1}"),
        ("bold_underscores", r"__(.*?)__".into(), "${1}"),
        ("italic_asterisks", r"\*(.*?)\*".into(), "${1}"),
        ("italic_underscores", r"_(.*?)_".into(), "${1}"),
        ("headings", r"(?m)^#{1,6}[^\S\r\n]*".into(), ""),
        ("bullets", r"(?m)^[^\S\r\n]*[-*•●][^\S\r\n]+".into(), "- "),
        ("pictographs", pictographs, ""),
        ("html_tags", r"<[^>]+>".into(), ""),
        ("double_quotes", r"[“”]".into(), "\""),
        ("single_quotes", r"[‘’]".into(), "'"),
        ("spaces", r"[^\S\r\n]+".into(), " "),
        ("blank_lines", r"\n{3,}".into(), "\n\n"),
    ];

    table
        .into_iter()
        .map(|(name, pattern, replacement)| Stage {
            name,
            // Patterns are static, so a compile failure is a bug
            pattern: Regex::new(&pattern)
                .unwrap_or_else(|e| panic!("sanitizer stage '{name}' is invalid: {e}")),
            replacement,
        })
        .collect()
});

/// The ordered stage table
pub fn stages() -> &'static [Stage] {
    &STAGES
}

/// Convert raw model output to plain text
///
/// Total: never fails, and empty input yields an empty string. The result
/// is a fixed point, so `sanitize(sanitize(x)) == sanitize(x)`.
///
/// # Examples
/// ```
/// use chatrelay::sanitize;
///
/// assert_eq!(sanitize("**bold** and _em_ and `code`"), "bold and em and code");
/// ```
pub fn sanitize(raw: &str) -> String {
    let mut current = sanitize_once(raw);

    // A later stage can expose structure an earlier one handles, e.g. tag
    // removal joining `[a]` and `(b)` into a link. Every pass that changes
    // the text either shortens it or rewrites whitespace and bullets into
    // their canonical form, so this terminates.
    loop {
        let next = sanitize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Run every stage once, in order, then trim
fn sanitize_once(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let mut text = raw.to_string();
    for stage in stages() {
        if let Cow::Owned(replaced) = stage.apply(&text) {
            text = replaced;
        }
    }

    text.trim().to_string()
}
