//! Prompt templates for each pipeline stage.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever template content
//! changes. This makes it possible to trace which prompt version produced a
//! given response when debugging regressions in stage behavior.

use crate::config::CitationStyle;

/// Prompt version. Bump on any template content change.
pub const PROMPT_VERSION: &str = "1.2.0";

/// Three broad queries to open a general-mode session.
pub fn broad_queries(task: &str) -> String {
    format!(
        "You are a researcher.\n\
         User Task: {task}\n\n\
         Generate 3 broad search queries to start researching this topic.\n\
         Return ONLY a JSON list of strings, e.g., [\"query1\", \"query2\", \"query3\"]."
    )
}

/// Three scholarly queries to open an academic-mode session.
pub fn scholarly_queries(task: &str) -> String {
    format!(
        "You are an academic researcher.\n\
         User Task: {task}\n\n\
         Generate 3 search queries biased toward scholarly literature on this topic. \
         Each query must target peer-reviewed, citable sources (journal articles, \
         conference papers, preprints).\n\
         Return ONLY a JSON list of strings, e.g., [\"query1\", \"query2\", \"query3\"]."
    )
}

/// Two targeted queries addressing the critic's feedback.
pub fn targeted_queries(task: &str, critique: &str) -> String {
    format!(
        "You are a researcher.\n\
         User Task: {task}\n\
         Critique on previous draft: {critique}\n\n\
         Generate 2 specific search queries to gather the missing information \
         addressed in the critique.\n\
         Return ONLY a JSON list of strings, e.g., [\"query1\", \"query2\"]."
    )
}

/// Inline-citation instruction for the requested style.
pub fn citation_instruction(style: CitationStyle) -> &'static str {
    match style {
        CitationStyle::Ieee => {
            "Cite sources inline with numeric brackets matching the note numbers, e.g., [1], [2]."
        }
        CitationStyle::Apa => {
            "Cite sources inline in APA author-date form, e.g., (Author, Year)."
        }
        CitationStyle::Bibtex => {
            "Cite sources inline with BibTeX keys, e.g., \\cite{author2021}."
        }
    }
}

/// Writer prompt: task plus numbered research notes.
pub fn report(task: &str, context: &str, style: CitationStyle) -> String {
    format!(
        "You are a technical researcher. Write a detailed report on: {task}\n\n\
         Use the following research notes:\n\
         {context}\n\
         {instruction}\n\
         Do NOT include a references or bibliography section; citations stay inline.\n\
         Return ONLY the report.",
        instruction = citation_instruction(style),
    )
}

/// Critic prompt: strict review returning a JSON verdict object.
pub fn review(draft: &str) -> String {
    format!(
        "You are a strict editor. Review this draft:\n\
         {draft}\n\n\
         Critique strictness: High.\n\n\
         Decide between these actions:\n\
         - \"APPROVE\": If the draft is excellent and complete.\n\
         - \"RESEARCH_MORE\": If the draft is missing crucial facts or citations.\n\
         - \"REWRITE\": If the facts are there but the writing style/structure needs work.\n\n\
         Return ONLY a JSON object:\n\
         {{\n\
             \"critique\": \"Your specific feedback here...\",\n\
             \"action\": \"APPROVE\" | \"RESEARCH_MORE\" | \"REWRITE\"\n\
         }}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_prompts_state_expected_counts() {
        assert!(broad_queries("rust").contains("Generate 3 broad"));
        assert!(scholarly_queries("rust").contains("Generate 3 search queries"));
        assert!(scholarly_queries("rust").contains("peer-reviewed"));
        assert!(targeted_queries("rust", "missing numbers").contains("Generate 2 specific"));
        assert!(targeted_queries("rust", "missing numbers").contains("missing numbers"));
    }

    #[test]
    fn test_report_prompt_carries_style_instruction() {
        let prompt = report("rust", "[1] A (2023)\n", CitationStyle::Apa);
        assert!(prompt.contains("(Author, Year)"));
        assert!(prompt.contains("bibliography"));
    }

    #[test]
    fn test_review_prompt_lists_all_verdicts() {
        let prompt = review("some draft");
        assert!(prompt.contains("APPROVE"));
        assert!(prompt.contains("RESEARCH_MORE"));
        assert!(prompt.contains("REWRITE"));
        assert!(prompt.contains("some draft"));
    }
}
