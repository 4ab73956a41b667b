pub const FILE_PATH_PLACEHOLDER: &str = "{file_path}";
pub const CONTENT_PLACEHOLDER: &str = "{content}";

pub const DEFAULT_PROMPT_TEMPLATE: &str = "
You are an expert QA automation engineer. Critique this file. Be concise.

File path: {file_path}
File content:
{content}

Tasks:
- Point out potential bugs or fragile code.
- Suggest improvements and refactoring ideas.
- Give folder/organization suggestions if relevant.

Output your response as plain text.
";

/// Instruction text wrapped around every chunk sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT_TEMPLATE)
    }
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Substitutes the placeholders in a single left-to-right pass. Placeholder
    /// text that appears inside the path or the chunk is copied verbatim.
    pub fn render(&self, file_path: &str, chunk: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + chunk.len() + file_path.len());
        let mut rest = self.template.as_str();

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            if let Some(after) = tail.strip_prefix(FILE_PATH_PLACEHOLDER) {
                out.push_str(file_path);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(CONTENT_PLACEHOLDER) {
                out.push_str(chunk);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}
