//! Answer-synthesis prompt construction.
//!
//! Retrieved chunks are joined into a bounded context block and substituted,
//! together with the user's question, into a fixed template that constrains
//! the model to the provided context. Each question is answered
//! independently; nothing here carries state between calls.

use crate::error::Result;
use crate::provider::{LlmProvider, Message};

/// Upper bound on the rendered context block, in characters.
pub const MAX_CONTEXT_CHARS: usize = 12_000;

/// Join retrieved chunk texts into a single context block, bounded by
/// [`MAX_CONTEXT_CHARS`]. Truncation happens at a char boundary.
pub fn context_block<'a>(texts: impl IntoIterator<Item = &'a str>) -> String {
    let mut block = String::new();
    for text in texts {
        if !block.is_empty() {
            block.push_str("\n\n");
        }
        block.push_str(text);
        if block.len() >= MAX_CONTEXT_CHARS {
            break;
        }
    }

    if block.len() > MAX_CONTEXT_CHARS {
        let mut cut = MAX_CONTEXT_CHARS;
        while !block.is_char_boundary(cut) {
            cut -= 1;
        }
        block.truncate(cut);
    }

    block
}

/// Render the fixed answer-synthesis template.
pub fn build_answer_prompt(context: &str, question: &str) -> String {
    format!(
        "Answer the question based only on the provided context.\n\
         If the answer isn't in the code say you don't know.\n\
         \n\
         <context>\n\
         {context}\n\
         </context>\n\
         \n\
         Question: {question}"
    )
}

/// Answer `question` from the given context texts with a single chat call.
///
/// # Errors
///
/// Propagates any provider failure unchanged; there are no retries.
pub async fn synthesize_answer(
    provider: &impl LlmProvider,
    question: &str,
    contexts: &[&str],
) -> Result<String> {
    let context = context_block(contexts.iter().copied());
    let prompt = build_answer_prompt(&context, question);

    tracing::debug!(
        provider = provider.name(),
        prompt_chars = prompt.len(),
        "sending answer-synthesis prompt"
    );

    provider.chat(&[Message::user(prompt)]).await
}
