use serde_json::{Map, Value};
use super::defaults::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::core::errors::ApiError;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = match config {
        Value::Null => return Ok(()),
        Value::Object(map) => map,
        _ => return Err(config_type_error("root", "object")),
    };

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 1, 65535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    if let Some(llm) = expect_optional_object(root, "llm")? {
        validate_optional_string_field(llm, "llm.base_url", "base_url")?;
        validate_optional_string_field(llm, "llm.api_key", "api_key")?;
        validate_u64_field(
            llm,
            "llm.request_timeout_secs",
            "request_timeout_secs",
            1,
            3_600,
        )?;
    }

    for agent in ["chat_agent", "score_agent"] {
        if let Some(section) = expect_optional_object(root, agent)? {
            validate_optional_string_field(section, &format!("{}.model", agent), "model")?;
            validate_optional_string_field(
                section,
                &format!("{}.system_prompt", agent),
                "system_prompt",
            )?;
            validate_f64_field(
                section,
                &format!("{}.temperature", agent),
                "temperature",
                0.0,
                2.0,
            )?;
        }
    }

    if let Some(chat) = expect_optional_object(root, "chat_agent")? {
        validate_optional_string_field(chat, "chat_agent.greeting", "greeting")?;
        validate_i64_field(chat, "chat_agent.max_tokens", "max_tokens", 1, 128_000)?;
    }

    if let Some(score) = expect_optional_object(root, "score_agent")? {
        validate_optional_string_field(score, "score_agent.beliefs_path", "beliefs_path")?;
        validate_bool_field(score, "score_agent.force_tool_call", "force_tool_call")?;
    }

    if let Some(rag) = expect_optional_object(root, "rag")? {
        validate_optional_string_field(rag, "rag.embedding_model", "embedding_model")?;
        validate_optional_string_field(rag, "rag.collection", "collection")?;
        validate_u64_field(rag, "rag.chunk_size", "chunk_size", 1, 1_000_000)?;
        validate_u64_field(rag, "rag.chunk_overlap", "chunk_overlap", 0, 1_000_000)?;
        validate_u64_field(rag, "rag.top_k", "top_k", 1, 100)?;
        validate_f64_field(rag, "rag.min_score", "min_score", -1.0, 1.0)?;
        validate_bool_field(rag, "rag.clear_on_reset", "clear_on_reset")?;

        // Unset keys fall back to the defaults at startup, so compare effective values.
        let chunk_size = rag
            .get("chunk_size")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_CHUNK_SIZE as u64);
        let chunk_overlap = rag
            .get("chunk_overlap")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_CHUNK_OVERLAP as u64);
        if chunk_overlap >= chunk_size {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at 'rag.chunk_overlap': must be smaller than rag.chunk_size ({})",
                chunk_size
            )));
        }

        if let Some(collection) = rag.get("collection").and_then(Value::as_str) {
            let collection = collection.trim();
            if collection.is_empty()
                || !collection
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                return Err(ApiError::BadRequest(
                    "Invalid config at 'rag.collection': use only letters, digits and '_'"
                        .to_string(),
                ));
            }
        }
    }

    if let Some(pipeline) = expect_optional_object(root, "pipeline")? {
        validate_template_field(
            pipeline,
            "pipeline.rag_query_template",
            "rag_query_template",
            &["{query}"],
        )?;
        validate_template_field(
            pipeline,
            "pipeline.rag_response_template",
            "rag_response_template",
            &["{query}", "{context}"],
        )?;
    }

    if let Some(faq) = root.get("faq") {
        let items = faq
            .as_array()
            .ok_or_else(|| config_type_error("faq", "array"))?;
        for (index, item) in items.iter().enumerate() {
            let path = format!("faq[{}]", index);
            let entry = item
                .as_object()
                .ok_or_else(|| config_type_error(&path, "object"))?;
            validate_required_string_field(entry, &format!("{}.key", path), "key")?;
            validate_required_string_field(entry, &format!("{}.question", path), "question")?;
        }
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_bool_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_bool().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "boolean"))
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_i64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: i64,
    max: i64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_i64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_required_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let value = section.get(key).ok_or_else(|| {
        ApiError::BadRequest(format!("Invalid config at '{}': value is required", path))
    })?;
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() || value.as_str().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "string"))
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() {
        return Ok(());
    }
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_template_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    placeholders: &[&str],
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(template) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    for placeholder in placeholders {
        if !template.contains(placeholder) {
            return Err(ApiError::BadRequest(format!(
                "Invalid config at '{}': template must contain {}",
                path, placeholder
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::BadRequest(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}
