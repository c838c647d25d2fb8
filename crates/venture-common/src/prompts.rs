//! Prompt text for each AI flow.
//!
//! The idea and canvas prompts pin down a labelled response format so the
//! completion parsers have something to anchor on; models do not always comply.

use std::fmt::Write as _;

/// Rejected suggestions older than this are not echoed back to the model.
pub const MAX_PREVIOUS_ATTEMPTS: usize = 5;

pub fn startup_ideas_prompt(problem: &str, category: &str, count: u32) -> String {
    format!(
        "Generate exactly {count} startup ideas for this problem: \"{problem}\" in the {category} category.\n\
\n\
For each idea, provide:\n\
1. A creative title\n\
2. A brief summary (2-3 sentences)\n\
3. A market potential score from 1-10\n\
\n\
Format each idea exactly like this:\n\
Title: [Your title]\n\
Summary: [Your summary]\n\
Score: [1-10]\n\
\n\
Separate each idea with a blank line."
    )
}

#[derive(Debug, Clone, Default)]
pub struct CanvasPromptInput<'a> {
    pub block_name: &'a str,
    pub coaching_hint: Option<&'a str>,
    pub current_content: &'a str,
    /// Oldest first; only the last [`MAX_PREVIOUS_ATTEMPTS`] are used.
    pub previous_attempts: &'a [String],
    pub startup_name: &'a str,
    pub startup_description: &'a str,
}

pub fn canvas_block_prompt(input: &CanvasPromptInput<'_>) -> String {
    let mut prompt =
        String::from("You are an expert startup coach helping founders improve their Lean Canvas.\n\n");

    if !input.startup_name.is_empty() && !input.startup_description.is_empty() {
        let _ = write!(
            prompt,
            "The startup you're helping is called \"{}\".\n\nDescription:\n{}\n\n",
            input.startup_name, input.startup_description
        );
    }

    let _ = write!(
        prompt,
        "You are currently helping the user with the \"{}\" block.\n",
        input.block_name
    );
    if let Some(hint) = input.coaching_hint {
        let _ = writeln!(prompt, "The founder asked: {hint}");
    }

    let current = input.current_content.trim();
    let _ = write!(
        prompt,
        "\nHere's the current content of this block:\n{}\n",
        if current.is_empty() { "(empty)" } else { current }
    );

    let attempts = recent_attempts(input.previous_attempts);
    if !attempts.is_empty() {
        prompt.push_str("\nHere are previous suggestions the user didn't like:\n");
        for attempt in attempts {
            let _ = writeln!(prompt, "- {}", attempt.trim());
        }
    }

    prompt.push_str(
        "\nPlease generate a better suggestion that is:\n\
- Concise\n\
- Practical\n\
- Startup-relevant\n\
- Unique (not similar to previous attempts)\n\
\n\
Also explain briefly why your suggestion fits well.\n\
\n\
Respond in the following format:\n\
\n\
Suggestion:\n\
<your suggestion here>\n\
\n\
Reasoning:\n\
<why this works>\n",
    );
    prompt
}

fn recent_attempts(attempts: &[String]) -> &[String] {
    let start = attempts.len().saturating_sub(MAX_PREVIOUS_ATTEMPTS);
    &attempts[start..]
}

pub fn pitch_deck_slide_prompt(topic: &str, existing_content: Option<&str>) -> String {
    let mut prompt = format!(
        "You are an AI assistant helping generate content for a pitch deck slide.\n\n\
The topic of the slide is: {topic}.\n"
    );
    if let Some(existing) = existing_content.map(str::trim).filter(|s| !s.is_empty()) {
        let _ = write!(
            prompt,
            "\nHere is some existing content on the slide that you should improve or expand upon:\n{existing}\n"
        );
    }
    prompt.push_str(
        "\nGenerate compelling content for this slide. Focus on making it concise and persuasive.\n",
    );
    prompt
}

pub fn problem_statement_prompt(target_customer: &str) -> String {
    format!(
        "List the top 3 recurring problems faced by {target_customer}. Focus on what tasks are \
frustrating, what blockers exist, and why these problems are painful for them. Return results \
as bullet points."
    )
}
