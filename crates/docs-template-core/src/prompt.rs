//! Instructions sent to the generative rewrite service.

const SYSTEM_PREAMBLE: &str = "You are a documentation expert specializing in Elastic documentation templates.
Your task is to transform the provided README file to conform to the new template structure. This is intended to be an additive process,
so do not remove any existing content, only restructure it to fit the new template.

Here is some context for you to reference for your task, read it carefully as you will get questions about it later:";

const USER_PROMPT: &str = r#"I need to update this README.md file to match our new documentation template.

Follow these exact guidelines:
1. Always utilize the original content of the README.md file where possible
2. Restructure the document to follow the new template format provided
3. If any content is not relevant to the new template, copy it to the Reference section and add a note in a code comment explaining why it should be removed
4. Do not include the following from the template: initial comment from the template, the header placeholder, or the Reference -> ECS field reference section
5. Always organize the datastreams together under Reference section. For each datastream there should be
a brief summary, exported fields, and sample events sections all separated with an empty line.
6. Always prefix sample event placeholders with 'An example event for "data_stream_name" looks as following:'.
7. Format your response appropriately for a Markdown file
8. Replace any 'Exported fields' sections with the mustache placeholder: {{fields "data_stream_name"}}
9. Replace any 'Sample event' sections with the mustache placeholder: {{event "data_stream_name"}}
10. If there is no content for a section, you must add a code comment with some guidance to the user on what to add.
11. Sync the document with the new template structure

Return ONLY the updated Markdown content, without any explanation or commentary."#;

/// System instruction embedding both documents.
pub fn system_prompt(original: &str, template: &str) -> String {
    format!(
        "{SYSTEM_PREAMBLE}\n# Original README content:\n{original}\n\n# New template structure:\n{template}\n"
    )
}

/// The formatting rules the rewritten document must follow.
pub fn user_prompt() -> &'static str {
    USER_PROMPT
}

/// Single text prompt: system instruction, blank line, user instruction.
pub fn build_prompt(original: &str, template: &str) -> String {
    format!("{}\n\n{}", system_prompt(original, template), USER_PROMPT)
}
