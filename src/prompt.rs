//! Prompt construction for draft generation and draft arbitration.

use crate::provider::ChatMessage;

/// Conversation asking for one candidate draft of chapter `unit`.
pub fn draft_conversation(title: &str, unit: u32, context: &str) -> Vec<ChatMessage> {
    let prompt = format!(
        "You are an imaginative novelist. Based on the existing content of the novel below, \
         write chapter {unit}.\n\n\
         [Title]: {title}\n\n\
         [Existing content]:\n{context}"
    );
    vec![ChatMessage::user(prompt)]
}

/// Conversation asking the model to pick one of `candidates` verbatim.
///
/// Candidates are presented in input order, numbered from 1.
pub fn selection_conversation(
    title: &str,
    unit: u32,
    context: &str,
    candidates: &[String],
) -> Vec<ChatMessage> {
    let mut prompt = format!(
        "You are a senior editor. From the {count} drafts below, written for chapter {unit} of \
         the novel \"{title}\", choose the one that follows most naturally from the context, \
         has the most compelling plot and the best prose. Do not add any comment or \
         explanation: output the full text of the draft you chose, exactly as written.\n\n\
         [Context (previous content)]:\n{context}\n\n",
        count = candidates.len(),
    );
    for (index, candidate) in candidates.iter().enumerate() {
        prompt.push_str(&format!("--- Draft {} ---\n{}\n\n", index + 1, candidate));
    }
    prompt.push_str("---");
    vec![ChatMessage::user(prompt)]
}
