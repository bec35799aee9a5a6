//! The question-answering prompt.

const QA_INSTRUCTIONS: &str = "\
Use the following pieces of context to answer the question at the end.
If you don't know the answer, just say that you don't know, don't try to make up an answer.
Use three sentences maximum and keep the answer as concise as possible.";

/// Render the QA prompt. Passages are joined by blank lines, in the order
/// given.
pub fn build_qa_prompt<S: AsRef<str>>(context: &[S], question: &str) -> String {
    let context = context
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{QA_INSTRUCTIONS}\n\n{context}\nQuestion: {question}\nHelpful Answer:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_matches_template() {
        let prompt = build_qa_prompt(&["Alpha.", "Beta."], "What comes first?");
        assert_eq!(
            prompt,
            "Use the following pieces of context to answer the question at the end.\n\
             If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\
             Use three sentences maximum and keep the answer as concise as possible.\n\
             \n\
             Alpha.\n\
             \n\
             Beta.\n\
             Question: What comes first?\n\
             Helpful Answer:"
        );
    }

    #[test]
    fn empty_context_still_asks_the_question() {
        let prompt = build_qa_prompt::<&str>(&[], "Anything?");
        assert!(prompt.contains("\n\n\nQuestion: Anything?\n"));
    }

    #[test]
    fn placeholders_in_question_are_left_alone() {
        let prompt = build_qa_prompt(&["{question}"], "what is {context}?");
        assert!(prompt.contains("\n{question}\nQuestion: what is {context}?\n"));
    }
}
