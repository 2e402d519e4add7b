//! System instructions sent with every turn

use crate::config::AssistantConfig;

const STYLE_SECTION: &str = "STYLE:
- PLAIN TEXT ONLY: no emojis, no decorative symbols, no Markdown/bold/italics.
- Use short sentences and simple numbered or dashed lists.
- Be concise, friendly, and action-focused.";

const SAFETY_SECTION: &str = "SAFETY:
- Never reveal API keys or internal tokens.";

/// Build the instruction text for the configured assistant
///
/// The language section is only included when languages are configured.
pub fn build_instructions(assistant: &AssistantConfig) -> String {
    let mut sections = vec![format!("You are the {} website assistant.", assistant.name)];

    if !assistant.languages.is_empty() {
        let mut language = String::from("LANGUAGE:\n- Detect the user's language automatically.");
        for lang in &assistant.languages {
            language.push_str(&format!("\n- If the user writes in {lang}, reply in {lang}."));
        }
        language.push_str("\n- If mixed or unclear, default to English.");
        sections.push(language);
    }

    sections.push(STYLE_SECTION.to_string());
    sections.push(SAFETY_SECTION.to_string());
    sections.join("\n\n")
}
