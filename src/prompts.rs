//! Prompt templates for topic extraction and topic summaries.
//!
//! Both templates are pure functions of their inputs so tests can check the
//! exact text sent to the model without a provider.

/// Instruction placed before the page text when asking for topics.
pub const TOPIC_EXTRACTION_INSTRUCTION: &str = "Extract only the main topic names discussed in the following text. \
List each topic name on a new line without any additional formatting or numbering:";

/// Render the topic-extraction prompt for the aggregated page text.
pub fn topic_extraction_prompt(text: &str) -> String {
    format!("{TOPIC_EXTRACTION_INSTRUCTION}\n{text}\n")
}

/// Render the summary prompt for one topic of the aggregated page text.
///
/// The topic is inserted verbatim between double quotes.
pub fn summary_prompt(topic: &str, text: &str) -> String {
    format!(
        "Generate a concise summary for educational purposes on the topic of \"{topic}\" \
based on the following text:\n{text}\n"
    )
}
