//! Classification prompt construction and response parsing.

pub mod parser;

pub use parser::{extract, ClassificationResult};

/// Builds the classification prompt for `utterance`.
///
/// `capabilities` are `(description, identifier)` pairs; their order is kept so
/// identical inputs always produce an identical prompt.
pub fn build_prompt(utterance: &str, capabilities: &[(String, String)]) -> String {
    let mut prompt = format!("Refer to this sentence:\n {utterance}\n");
    for (desc, name) in capabilities {
        prompt.push_str(&format!(
            "If want you to do {desc}, return `[SKILL]: {name}` brief and clear. \
             For instance: [SKILL]: {name}\n"
        ));
    }
    prompt.push_str(
        "If the preceding text presents a complete question and solution, rewrite and return \
         `[SOLUTION]: {problem}` brief and clear. For instance: [SOLUTION]: Solution for distributing watermelon\n",
    );
    prompt.push_str(
        "If the preceding text presents an unresolved issue and its corresponding discussion, \
         rewrite and return `[PROBLEM]: {problem}` brief and clear. For instance: [PROBLEM]: How to distribute watermelon?\n",
    );
    prompt.push_str(
        "Otherwise, rewrite and return `[TALK]: {talk}` brief and clear. For instance: [TALK]: distribute watermelon",
    );
    prompt
}
