use crate::core::config::settings::PipelineSettings;

/// Retrieval templates with `{query}` and `{context}` placeholders.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    query: String,
    response: String,
}

impl PromptTemplates {
    pub fn new(query: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
        }
    }

    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self::new(
            settings.rag_query_template.clone(),
            settings.rag_response_template.clone(),
        )
    }

    pub fn render_query(&self, query: &str) -> String {
        fill(&self.query, &[("query", query)])
    }

    pub fn render_response(&self, query: &str, context: &str) -> String {
        fill(&self.response, &[("query", query), ("context", context)])
    }
}

/// Single-pass substitution; placeholders inside substituted values stay as-is.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let hit = values.iter().find_map(|&(name, value)| {
            let token_len = name.len() + 2;
            let matches = tail.len() >= token_len
                && tail[1..].starts_with(name)
                && tail[1 + name.len()..].starts_with('}');
            matches.then_some((token_len, value))
        });
        match hit {
            Some((token_len, value)) => {
                out.push_str(value);
                rest = &tail[token_len..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AppSettings;

    #[test]
    fn default_templates_splice_query_and_context() {
        let templates = PromptTemplates::from_settings(&AppSettings::default().pipeline);

        let query = templates.render_query("Is it painful?");
        assert!(query.ends_with("only reply NIL\n Is it painful?"));

        let response = templates.render_response("Is it painful?", "snippet a\nsnippet b");
        assert!(response.starts_with("The following is the USER's last message: Is it painful?.Only"));
        assert!(response.ends_with("\n snippet a\nsnippet b"));
    }

    #[test]
    fn placeholders_in_context_are_not_expanded() {
        let templates = PromptTemplates::new("{query}", "{context} | {query} {other}");
        assert_eq!(
            templates.render_response("q", "see {query}"),
            "see {query} | q {other}"
        );
        assert_eq!(templates.render_query("{context}"), "{context}");
    }
}
