//! Prompt construction for the five analysis calls.

use crate::analysis::vocab::{Category, EntityKind, Intent, Sentiment};

/// Cut the email text down to `max_chars` characters when a limit is set.
fn email_text(content: &str, max_chars: Option<usize>) -> String {
    match max_chars {
        Some(max) => content.chars().take(max).collect(),
        None => content.to_string(),
    }
}

pub fn classification_prompt(content: &str, max_chars: Option<usize>) -> String {
    format!(
        "Classify the following email into one of these categories: {}.\n\
         Provide *only* the category name.\n\
         Email: {}",
        Category::LABELS.join(", "),
        email_text(content, max_chars)
    )
}

pub fn entity_prompt(content: &str, max_chars: Option<usize>) -> String {
    let fields: Vec<String> = EntityKind::ALL
        .iter()
        .map(|kind| format!("{}:", kind.as_str()))
        .collect();
    format!(
        "Extract the following information from the email. \
         If a piece of information is not present, output 'N/A'.\n\
         {}\n\
         Email: {}",
        fields.join("\n"),
        email_text(content, max_chars)
    )
}

pub fn intent_prompt(content: &str, max_chars: Option<usize>) -> String {
    format!(
        "What is the primary intent of this email? Choose one of the following: {}.\n\
         Email: {}",
        Intent::LABELS.join(", "),
        email_text(content, max_chars)
    )
}

pub fn sentiment_prompt(content: &str, max_chars: Option<usize>) -> String {
    format!(
        "What is the sentiment of this email? Choose one of the following: {}.\n\
         Email: {}",
        Sentiment::LABELS.join(", "),
        email_text(content, max_chars)
    )
}

pub fn summary_prompt(content: &str, max_chars: Option<usize>) -> String {
    format!(
        "Summarize the following email in three sentences or less:\n{}",
        email_text(content, max_chars)
    )
}
