// Prompt-building utilities shared by the model-backed collaborators.
// Each collaborator keeps its own templates in a prompts.rs alongside it.

/// Fills `{name}` placeholders in a prompt template.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |prompt, (key, value)| {
        prompt.replace(&format!("{{{key}}}"), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template_replaces_every_placeholder() {
        let prompt = fill_template(
            "Summary:\n{summary}\n\nJob:\n{job_description}\n{summary}",
            &[("summary", "S"), ("job_description", "J")],
        );
        assert_eq!(prompt, "Summary:\nS\n\nJob:\nJ\nS");
    }
}
