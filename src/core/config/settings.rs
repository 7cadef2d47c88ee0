//! Typed settings extracted from the merged YAML config.
//!
//! Every field has a default so an empty `config.yml` is a valid deployment
//! (only the LLM API key has to come from somewhere).

use std::env;

use serde::Serialize;
use serde_json::Value;

use super::defaults;

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub chat_agent: ChatAgentSettings,
    pub score_agent: ScoreAgentSettings,
    pub rag: RagSettings,
    pub pipeline: PipelineSettings,
    pub faq: Vec<FaqEntry>,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct ChatAgentSettings {
    pub model: String,
    pub system_prompt: String,
    pub greeting: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct ScoreAgentSettings {
    pub model: String,
    pub system_prompt: String,
    pub beliefs_path: Option<String>,
    pub temperature: Option<f64>,
    /// Sends `tool_choice` naming the belief tool instead of `auto`.
    pub force_tool_call: bool,
}

#[derive(Debug, Clone)]
pub struct RagSettings {
    pub embedding_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub min_score: Option<f32>,
    pub collection: String,
    pub clear_on_reset: bool,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub rag_query_template: String,
    pub rag_response_template: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FaqEntry {
    pub key: String,
    pub question: String,
}

impl AppSettings {
    pub fn from_config(config: &Value) -> Self {
        let server = section(config, "server");
        let llm = section(config, "llm");
        let chat = section(config, "chat_agent");
        let score = section(config, "score_agent");
        let rag = section(config, "rag");
        let pipeline = section(config, "pipeline");

        Self {
            server: ServerSettings {
                host: string_or(server, "host", defaults::DEFAULT_HOST),
                port: server
                    .and_then(|s| s.get("port"))
                    .and_then(Value::as_u64)
                    .and_then(|p| u16::try_from(p).ok())
                    .unwrap_or(defaults::DEFAULT_PORT),
                cors_allowed_origins: string_list(server, "cors_allowed_origins"),
            },
            llm: LlmSettings {
                base_url: string_or(llm, "base_url", defaults::DEFAULT_LLM_BASE_URL),
                api_key: optional_string(llm, "api_key"),
                request_timeout_secs: u64_or(
                    llm,
                    "request_timeout_secs",
                    defaults::DEFAULT_REQUEST_TIMEOUT_SECS,
                ),
            },
            chat_agent: ChatAgentSettings {
                model: string_or(chat, "model", defaults::DEFAULT_CHAT_MODEL),
                system_prompt: string_or(
                    chat,
                    "system_prompt",
                    defaults::DEFAULT_CHAT_SYSTEM_PROMPT,
                ),
                greeting: match chat.and_then(|c| c.get("greeting")) {
                    Some(Value::String(text)) if !text.trim().is_empty() => Some(text.clone()),
                    Some(_) => None,
                    None => Some(defaults::DEFAULT_CHAT_GREETING.to_string()),
                },
                temperature: chat.and_then(|c| c.get("temperature")).and_then(Value::as_f64),
                max_tokens: chat
                    .and_then(|c| c.get("max_tokens"))
                    .and_then(Value::as_i64)
                    .and_then(|v| i32::try_from(v).ok()),
            },
            score_agent: ScoreAgentSettings {
                model: string_or(score, "model", defaults::DEFAULT_SCORE_MODEL),
                system_prompt: string_or(
                    score,
                    "system_prompt",
                    defaults::DEFAULT_SCORE_SYSTEM_PROMPT,
                ),
                beliefs_path: optional_string(score, "beliefs_path"),
                temperature: score
                    .and_then(|s| s.get("temperature"))
                    .and_then(Value::as_f64)
                    .or(Some(0.0)),
                force_tool_call: score
                    .and_then(|s| s.get("force_tool_call"))
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            },
            rag: RagSettings {
                embedding_model: string_or(
                    rag,
                    "embedding_model",
                    defaults::DEFAULT_EMBEDDING_MODEL,
                ),
                chunk_size: u64_or(rag, "chunk_size", defaults::DEFAULT_CHUNK_SIZE as u64)
                    as usize,
                chunk_overlap: u64_or(
                    rag,
                    "chunk_overlap",
                    defaults::DEFAULT_CHUNK_OVERLAP as u64,
                ) as usize,
                top_k: u64_or(rag, "top_k", defaults::DEFAULT_TOP_K as u64) as usize,
                min_score: rag
                    .and_then(|r| r.get("min_score"))
                    .and_then(Value::as_f64)
                    .map(|v| v as f32),
                collection: string_or(rag, "collection", defaults::DEFAULT_COLLECTION),
                clear_on_reset: rag
                    .and_then(|r| r.get("clear_on_reset"))
                    .and_then(Value::as_bool)
                    .unwrap_or(true),
            },
            pipeline: PipelineSettings {
                rag_query_template: string_or(
                    pipeline,
                    "rag_query_template",
                    defaults::DEFAULT_RAG_QUERY_TEMPLATE,
                ),
                rag_response_template: string_or(
                    pipeline,
                    "rag_response_template",
                    defaults::DEFAULT_RAG_RESPONSE_TEMPLATE,
                ),
            },
            faq: faq_entries(config),
        }
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                self.llm.api_key = Some(key);
            }
        }
        if let Some(port) = env::var("PORT").ok().and_then(|v| v.parse::<u16>().ok()) {
            self.server.port = port;
        }
        self
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self::from_config(&Value::Null)
    }
}

fn section<'a>(config: &'a Value, key: &str) -> Option<&'a Value> {
    config.get(key).filter(|v| v.is_object())
}

fn optional_string(section: Option<&Value>, key: &str) -> Option<String> {
    section
        .and_then(|s| s.get(key))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn string_or(section: Option<&Value>, key: &str, default: &str) -> String {
    optional_string(section, key).unwrap_or_else(|| default.to_string())
}

fn u64_or(section: Option<&Value>, key: &str, default: u64) -> u64 {
    section
        .and_then(|s| s.get(key))
        .and_then(Value::as_u64)
        .unwrap_or(default)
}

fn string_list(section: Option<&Value>, key: &str) -> Vec<String> {
    section
        .and_then(|s| s.get(key))
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn faq_entries(config: &Value) -> Vec<FaqEntry> {
    match config.get("faq").and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .filter_map(|item| {
                let key = item.get("key")?.as_str()?.trim();
                let question = item.get("question")?.as_str()?.trim();
                if key.is_empty() || question.is_empty() {
                    return None;
                }
                Some(FaqEntry {
                    key: key.to_string(),
                    question: question.to_string(),
                })
            })
            .collect(),
        None => defaults::default_faq()
            .into_iter()
            .map(|(key, question)| FaqEntry {
                key: key.to_string(),
                question: question.to_string(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_config_yields_defaults() {
        let settings = AppSettings::default();

        assert_eq!(settings.server.port, defaults::DEFAULT_PORT);
        assert_eq!(settings.rag.chunk_size, 1024);
        assert_eq!(settings.rag.chunk_overlap, 100);
        assert_eq!(settings.rag.top_k, 4);
        assert!(settings.rag.clear_on_reset);
        assert_eq!(settings.chat_agent.model, "gpt-4-0125-preview");
        assert!(settings.chat_agent.greeting.is_some());
        assert_eq!(settings.faq.len(), 3);
        assert_eq!(settings.faq[0].key, "faq_cost");
        assert!(settings.llm.api_key.is_none());
    }

    #[test]
    fn reads_overrides_from_config() {
        let config = json!({
            "server": { "port": 9100, "cors_allowed_origins": ["http://ui.local", " "] },
            "llm": { "base_url": "http://localhost:11434", "api_key": "sk-1" },
            "chat_agent": { "greeting": "", "temperature": 0.2 },
            "rag": { "top_k": 2, "min_score": 0.25, "clear_on_reset": false },
            "faq": [{ "key": "faq_time", "question": "How long does it take?" }, { "key": "" }]
        });

        let settings = AppSettings::from_config(&config);

        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.server.cors_allowed_origins, vec!["http://ui.local"]);
        assert_eq!(settings.llm.api_key.as_deref(), Some("sk-1"));
        assert_eq!(settings.chat_agent.greeting, None);
        assert_eq!(settings.chat_agent.temperature, Some(0.2));
        assert_eq!(settings.rag.top_k, 2);
        assert_eq!(settings.rag.min_score, Some(0.25));
        assert!(!settings.rag.clear_on_reset);
        assert_eq!(
            settings.faq,
            vec![FaqEntry {
                key: "faq_time".to_string(),
                question: "How long does it take?".to_string()
            }]
        );
    }
}
