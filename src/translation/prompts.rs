/*!
 * Prompt templates for chunk translation.
 *
 * Templates are opaque configuration strings. Rendering only substitutes the
 * `{source_lang}`, `{target_lang}` and `{input_text}` placeholders.
 */

use crate::app_config::PromptConfig;
use crate::translation::item::Chunk;

/// A prompt template with placeholders
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Render the template with the given variables.
    pub fn render(&self, source_lang: &str, target_lang: &str, input_text: &str) -> String {
        self.template
            .replace("{source_lang}", source_lang)
            .replace("{target_lang}", target_lang)
            .replace("{input_text}", input_text)
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }
}

/// Builds the system and user prompts for a chunk
#[derive(Debug, Clone)]
pub struct TranslationPromptBuilder {
    system: PromptTemplate,
    user: PromptTemplate,
}

impl TranslationPromptBuilder {
    pub fn new(system_template: &str, user_template: &str) -> Self {
        Self {
            system: PromptTemplate::new(system_template),
            user: PromptTemplate::new(user_template),
        }
    }

    pub fn from_config(config: &PromptConfig) -> Self {
        Self::new(&config.system_prompt, &config.user_prompt)
    }

    /// One `- {content}` line per item, in chunk order
    pub fn format_input_lines(chunk: &Chunk) -> String {
        chunk
            .contents()
            .map(|content| format!("- {}", content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Build the (system, user) prompt pair for a chunk
    pub fn build(&self, chunk: &Chunk) -> (String, String) {
        let input_text = Self::format_input_lines(chunk);
        // The system template gets no input text
        let system = self.system.render(chunk.source_lang(), chunk.target_lang(), "");
        let user = self
            .user
            .render(chunk.source_lang(), chunk.target_lang(), &input_text);
        (system, user)
    }
}

impl Default for TranslationPromptBuilder {
    fn default() -> Self {
        Self::from_config(&PromptConfig::default())
    }
}
