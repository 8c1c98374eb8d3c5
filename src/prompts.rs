//! Centralized prompt definitions for the analysis pipeline
//!
//! Each function builds the full prompt sent to the model for one
//! operation. Keeping them here makes the contract with the model easy
//! to review and test.

/// Streaming analysis prompt: asks for the whole tree as raw NDJSON,
/// one flat node per line, parent before child.
pub fn analysis_prompt(testimony: &str) -> String {
    format!(
        r#"You are an AI legal analyst powering an interactive mind-mapping tool. The user has provided a deposition testimony and your task is to analyze it.

**CRITICAL INSTRUCTION: RAW NDJSON STREAMING**
Your output **MUST** be a raw stream of **newline-delimited JSON objects (ndjson)**.
- Each line of your output must be a single, complete, valid JSON object.
- Do **NOT** wrap the entire output in a JSON array (`[]`).
- Do **NOT** include markdown fences like ```json or ```.
- Output **ONLY** the raw JSON objects, one per line.

**NODE STRUCTURE**
Each JSON object must have this structure:
- `id`: (string) A unique ID for the node.
- `parentId`: (string | null) The ID of the parent node. The root node's parentId MUST be `null`.
- `title`: (string) A short, descriptive title for the analysis point.
- `content`: (string) Detailed analysis or description.
- `sourceText`: (string, optional) The *exact verbatim quote* from the provided document that this analysis is based on. ONLY include this for specific, granular points. OMIT this for high-level categories.
- `veracity`: (string, optional) One of: 'VERIFIED', 'LIKELY_TRUE', 'UNCERTAIN', 'CONTRADICTORY', 'UNSUPPORTED'.
- `tone`: (string[], optional) Array of keywords describing the deponent's tone.
- `indicators`: (string[], optional) Array of legal significance keywords. ONLY use these specific keywords: 'EXCULPATORY', 'INCULPATORY', 'HEARSAY'.
- `sourceNodeId`: (string, optional) For 'Suggested Motion' nodes only. The ID of the node that justifies the motion.

**LEGAL SIGNIFICANCE INDICATORS**
- **EXCULPATORY:** Apply this tag if a statement, if true, would tend to clear the deponent of blame or guilt.
- **INCULPATORY:** Apply this tag if a statement, if true, would tend to suggest the deponent's involvement in wrongdoing or guilt.
- **HEARSAY:** Apply this tag to statements where the deponent is recounting what someone else said outside of the current legal proceeding.

**ANALYSIS STRUCTURE & ORDER**
You must generate nodes in a valid tree order (parent first, then children).
1.  **Root Node:** Start with a root node titled 'Testimony Summary'.
2.  **Main Categories:** Create children for the root node. Generate them in this order:
    - **Deponent Profile:** A single node. The `content` field must be a brief, narrative summary of the deponent's overall demeanor, credibility, and pattern of testimony, synthesizing the various tones and veracity assessments you make elsewhere.
    - **Assumed Prosecution Profile:** A single node. The `content` should speculate on the prosecution's likely strategy, arguments, and objectives based on the provided document.
    - **Assumed Defense Profile:** A single node. The `content` should speculate on the defense's likely strategy, counter-arguments, and objectives based on the provided document.
    - **Court's Perspective:** A single node. The `content` should analyze the testimony from a neutral judicial viewpoint, highlighting points a judge might find persuasive, problematic, or requiring clarification.
    - **Key Claims Made:** A category node. Create children for each distinct claim.
    - **Potential Inconsistencies & Vagueness:** A category node. Create children for each identified issue.
    - **Key Individuals & Relationships:** A category node. For each person mentioned in the provided document, create a child node where the `title` is their full name and the `content` field is their role or relationship to the events/deponent.
    - **Suggested Motions:** A category node. If the analysis reveals grounds for a legal motion (e.g., to compel discovery due to evasive answers, to strike testimony as hearsay), create a child node for each. The `title` must be the motion type (e.g., "Motion to Compel Further Testimony") and the `content` field must be the justification. IMPORTANT: For each motion, you MUST include a `sourceNodeId` field, referencing the `id` of the specific analysis node (e.g., a Key Claim or Inconsistency) that justifies this motion.
    - **Underlying Assumptions:** A category node. Create children for each assumption.
    - **Questions for Cross-Examination:** A category node. Create children for each suggested question.
    - **Observed Emotional Tone:** A category node. Create children for specific moments where tone is notable.

**DEPOSITION TESTIMONY TO ANALYZE:**
---
{testimony}
---

Begin streaming the raw ndjson output now, starting with the root node.
"#
    )
}

/// Devil's-advocate prompt used by the explore operation.
pub fn counter_argument_prompt(node_title: &str, node_content: &str, testimony: &str) -> String {
    format!(
        r#"You are an expert debater and critical thinker AI. Your role is to act as a "devil's advocate" against a specific point made in a legal analysis. You must challenge the given assertion by providing a well-reasoned counter-argument or an alternative perspective.

Original Testimony Context:
---
{testimony}
---

Point to Challenge:
- Title: "{node_title}"
- Content: "{node_content}"

Your task:
Provide a concise, critical counter-argument. For example, if the point relies on large numbers to claim something is impossible (like a hash collision), you could argue that the sheer volume of daily operations worldwide could make rare events more plausible than presented. Focus on finding logical flaws, unstated assumptions, or alternative interpretations.

Return only the text of your counter-argument. Do not include any preamble like "Here is a counter-argument:".
"#
    )
}

/// Fact-check prompt; the request also enables the search tool so the
/// model can ground its summary.
pub fn fact_check_prompt(claim_title: &str, claim_content: &str) -> String {
    format!(
        r#"Please act as a neutral fact-checker. Use Google Search to find information about the following claim and provide a brief summary of your findings based ONLY on the search results.
Claim: "{claim_title}: {claim_content}"
Provide only the summary of your findings. Do not include any preamble."#
    )
}

/// Motion drafting prompt. Counter-argument and fact-check context are
/// folded in when the caller has them.
pub fn motion_prompt(
    motion_type: &str,
    justification: &str,
    counter_argument: Option<&str>,
    fact_check: Option<&str>,
) -> String {
    let mut prompt = format!(
        r#"You are an expert legal assistant AI. Your task is to draft a formal, high-quality legal motion. The motion should be well-structured, professional, and ready for a lawyer to review and file.

**Motion Details:**
- **Type of Motion:** {motion_type}
- **Primary Justification:** {justification}"#
    );

    if let Some(counter) = counter_argument {
        prompt.push_str(&format!(
            "\n- **Additional Context (User-Generated Counter-Argument to Consider):** {counter}"
        ));
    }
    if let Some(fact_check) = fact_check {
        prompt.push_str(&format!(
            "\n- **Additional Context (User-Generated Fact-Check to Consider):** {fact_check}"
        ));
    }

    prompt.push_str(
        r#"

**Instructions:**
1.  Create a standard motion heading (court, case name, case number, etc.) using placeholder values like "[Court Name]", "[Plaintiff Name]", "[Case Number]".
2.  Write a clear introduction stating the motion's purpose.
3.  Develop the main body of the motion. Use the **Primary Justification** as the core of your argument.
4.  **Crucially, you must intelligently synthesize the "Additional Context" (if provided) to strengthen the main argument.** For example, if the justification is that testimony is hearsay, and the fact-check shows the source is unreliable, weave that fact-check finding into the argument to make it more compelling. Do not simply list the context; integrate it logically.
5.  Include distinct sections for "Legal Standard" and "Argument".
6.  Conclude with a "Conclusion" section summarizing the requested relief.
7.  Add a placeholder for the signature block: "[Your Name], Attorney for [Plaintiff/Defendant]".
8.  The entire output must be plain text suitable for a document. Do not use Markdown.

Generate the full text of the motion now."#,
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_prompt_embeds_testimony_and_contract() {
        let prompt = analysis_prompt("Q: Where were you?\nA: At the warehouse.");
        assert!(prompt.contains("At the warehouse."));
        assert!(prompt.contains("ndjson"));
        assert!(prompt.contains("parentId"));
        assert!(prompt.contains("Testimony Summary"));
    }

    #[test]
    fn test_analysis_prompt_names_every_category() {
        let prompt = analysis_prompt("t");
        for category in [
            "Deponent Profile",
            "Assumed Prosecution Profile",
            "Assumed Defense Profile",
            "Court's Perspective",
            "Key Claims Made",
            "Potential Inconsistencies & Vagueness",
            "Key Individuals & Relationships",
            "Suggested Motions",
            "Underlying Assumptions",
            "Questions for Cross-Examination",
            "Observed Emotional Tone",
        ] {
            assert!(prompt.contains(category), "missing category {category}");
        }
    }

    #[test]
    fn test_counter_argument_prompt_quotes_the_point() {
        let prompt = counter_argument_prompt("Claim 1", "X said Y", "full testimony");
        assert!(prompt.contains("\"Claim 1\""));
        assert!(prompt.contains("\"X said Y\""));
        assert!(prompt.contains("full testimony"));
    }

    #[test]
    fn test_motion_prompt_context_is_optional() {
        let bare = motion_prompt("Motion to Compel", "evasive answers", None, None);
        assert!(!bare.contains("Counter-Argument to Consider"));
        assert!(!bare.contains("Fact-Check to Consider"));

        let full = motion_prompt(
            "Motion to Compel",
            "evasive answers",
            Some("the counter"),
            Some("the fact check"),
        );
        assert!(full.contains("the counter"));
        assert!(full.contains("the fact check"));
    }
}
