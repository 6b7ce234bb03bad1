/// Number of words a list item shows before "read more".
pub const PREVIEW_WORDS: usize = 20;

/// Separator used by the tag text inputs.
pub const TAG_SEPARATOR: &str = "; ";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preview {
    pub text: String,
    /// More words follow; the UI shows a "read more" affordance.
    pub truncated: bool,
}

/// Shorten `content` to its first [`PREVIEW_WORDS`] whitespace-delimited words.
///
/// Display only; the note content itself is never rewritten.
pub fn preview(content: &str) -> Preview {
    let mut words = content.split_whitespace();
    let head: Vec<&str> = words.by_ref().take(PREVIEW_WORDS).collect();
    if words.next().is_some() {
        Preview {
            text: format!("{}...", head.join(" ")),
            truncated: true,
        }
    } else {
        Preview {
            text: content.to_string(),
            truncated: false,
        }
    }
}

/// Split the tag field as typed (`"work; home"`).
pub fn parse_tag_input(input: &str) -> Vec<String> {
    input
        .split(';')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn format_tag_input(tags: &[String]) -> String {
    tags.join(TAG_SEPARATOR)
}
