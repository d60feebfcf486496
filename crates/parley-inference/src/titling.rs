//! Conversation title generation.

use std::sync::Arc;

use parley_core::defaults::{TITLE_MAX_LENGTH, TITLE_MIN_LENGTH};
use parley_core::{ConversationTurn, GenerationBackend, Result};

/// Cap on how much of each turn is quoted into the prompt.
const TURN_EXCERPT_CHARS: usize = 500;

/// Build the title-generation prompt from a conversation's opening turns.
pub fn title_prompt(turns: &[ConversationTurn]) -> String {
    let mut excerpt = String::new();
    for turn in turns {
        let content: String = turn.content.chars().take(TURN_EXCERPT_CHARS).collect();
        excerpt.push_str(&format!("{}: {}\n", turn.role, content));
    }

    format!(
        r#"Generate a short, descriptive title for the following conversation between an advisor and an assistant.

Conversation:
{excerpt}
Requirements:
- At most {TITLE_MAX_LENGTH} characters
- No quotes, no trailing punctuation
- Describe the topic, not the participants

Output only the title, nothing else."#
    )
}

/// Clean a generated title: first line only, quotes stripped, whitespace
/// collapsed, length capped. Returns None when nothing usable remains.
pub fn sanitize_title(raw: &str) -> Option<String> {
    let line = raw.lines().next()?.trim();
    let line = line.trim_matches(|c| c == '"' || c == '\'' || c == '`');
    let line = line.trim().trim_end_matches('.');

    let collapsed: String = line.split_whitespace().collect::<Vec<_>>().join(" ");

    let capped: String = collapsed.chars().take(TITLE_MAX_LENGTH).collect();
    let capped = capped.trim().to_string();

    if capped.chars().count() < TITLE_MIN_LENGTH {
        return None;
    }
    Some(capped)
}

/// Title generation service over a pluggable generation backend.
pub struct TitleService {
    backend: Arc<dyn GenerationBackend>,
}

impl TitleService {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Generate a title from the conversation's opening turns.
    ///
    /// Returns `Ok(None)` when generation produced nothing usable; the
    /// caller leaves the existing title in place.
    pub async fn generate(&self, turns: &[ConversationTurn]) -> Result<Option<String>> {
        if turns.is_empty() {
            return Ok(None);
        }

        let prompt = title_prompt(turns);
        let response = self.backend.generate(&prompt).await?;
        Ok(sanitize_title(&response))
    }
}
