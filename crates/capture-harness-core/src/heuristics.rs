//! Keyword overrides applied on top of the classifier.
//!
//! These run on the raw capture text and win over whatever the model said.
//! They need no network and no classification result.

const URGENT_KEYWORDS: [&str; 3] = ["urgente", "urgent", "pra ontem"];

const IN_PROGRESS_PREFIX: &str = "estou ";
const IN_PROGRESS_KEYWORDS: [&str; 2] = ["fazendo", "andamento"];

/// True when the text asks for urgent handling ("urgente", "urgent", "pra ontem").
pub fn is_urgent(text: &str) -> bool {
    let lower = text.to_lowercase();
    URGENT_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// True when the text describes work already under way.
///
/// Matches text starting with "estou " ("I am") or containing "fazendo" /
/// "andamento" ("doing" / "in progress"). The prefix check skips leading
/// whitespace, so "  estou lendo" counts too. That deliberately widens a
/// strict starts-with rule.
pub fn is_in_progress(text: &str) -> bool {
    let lower = text.trim_start().to_lowercase();
    lower.starts_with(IN_PROGRESS_PREFIX) || IN_PROGRESS_KEYWORDS.iter().any(|k| lower.contains(k))
}
