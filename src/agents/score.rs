//! Belief-scoring agent.
//!
//! Asks the model to call `update_beliefs` with a score per belief key, merges
//! the result into a fresh round and renders the belief prompt for the chat
//! agent.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tokio::sync::Mutex;

use crate::beliefs::{render_belief_prompt, BeliefMap, ScoreHistory, ScoreRound};
use crate::core::config::settings::ScoreAgentSettings;
use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider, Role, ToolDefinition};

pub const BELIEF_TOOL_NAME: &str = "update_beliefs";

/// Result of scoring one turn.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub round: ScoreRound,
    pub belief_prompt: String,
}

pub struct ScoreAgent {
    llm: Arc<dyn LlmProvider>,
    beliefs: Arc<BeliefMap>,
    model: String,
    system_prompt: String,
    temperature: Option<f64>,
    force_tool_call: bool,
    history: Mutex<ScoreHistory>,
}

impl ScoreAgent {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        beliefs: Arc<BeliefMap>,
        settings: &ScoreAgentSettings,
    ) -> Self {
        let listing = beliefs
            .beliefs()
            .iter()
            .map(|b| format!("- {}: {}", b.key, b.statement))
            .collect::<Vec<_>>()
            .join("\n");
        let system_prompt = format!("{}\n{}", settings.system_prompt.trim_end(), listing);

        Self {
            llm,
            beliefs,
            model: settings.model.clone(),
            system_prompt,
            temperature: settings.temperature,
            force_tool_call: settings.force_tool_call,
            history: Mutex::new(ScoreHistory::new()),
        }
    }

    pub fn beliefs(&self) -> &BeliefMap {
        &self.beliefs
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// One integer property per belief key, constrained to -1/0/1.
    pub fn tool_definition(&self) -> ToolDefinition {
        let properties: Map<String, Value> = self
            .beliefs
            .beliefs()
            .iter()
            .map(|belief| {
                (
                    belief.key.clone(),
                    json!({
                        "type": "integer",
                        "enum": [-1, 0, 1],
                        "description": format!("The user believes that {}.", belief.statement),
                    }),
                )
            })
            .collect();

        ToolDefinition {
            name: BELIEF_TOOL_NAME.to_string(),
            description: "Record how strongly the user's messages affirm (1) or reject (-1) \
                each health belief. Use 0 or omit a belief when there is no evidence."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": properties,
                "additionalProperties": false,
            }),
        }
    }

    /// Scores the conversation so far and records the round.
    ///
    /// Incoming `system` messages are the chat agent's persona and greeting
    /// instructions, not evidence about the user; the scoring prompt takes
    /// their place so the model only ever sees one set of instructions.
    pub async fn assess(&self, messages: &[ChatMessage]) -> Result<Assessment, ApiError> {
        let mut transcript = Vec::with_capacity(messages.len() + 1);
        transcript.push(ChatMessage::system(self.system_prompt.clone()));
        transcript.extend(messages.iter().filter(|m| m.role != Role::System).cloned());

        let request = ChatRequest::new(transcript)
            .with_temperature(self.temperature)
            .with_tool(self.tool_definition())
            .with_forced_tool(self.force_tool_call.then(|| BELIEF_TOOL_NAME.to_string()));
        let completion = self.llm.chat(request, &self.model).await?;

        let mut round = ScoreRound::seeded(&self.beliefs);
        for call in &completion.tool_calls {
            if call.name != BELIEF_TOOL_NAME {
                tracing::warn!(tool = %call.name, "Ignoring unexpected tool call");
                continue;
            }
            match serde_json::from_str::<Value>(&call.arguments) {
                Ok(arguments) => {
                    let applied = round.apply_tool_arguments(&arguments);
                    tracing::debug!(applied, "Applied belief scores");
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Ignoring malformed belief tool arguments");
                }
            }
        }

        let mut history = self.history.lock().await;
        round.carry_forward(history.latest());
        let belief_prompt = render_belief_prompt(&self.beliefs, &round);
        history.push(round.clone());
        tracing::info!(round = history.len(), "Recorded belief scores");

        Ok(Assessment {
            round,
            belief_prompt,
        })
    }

    pub async fn clear(&self) {
        self.history.lock().await.clear();
    }

    pub async fn scores(&self) -> Vec<ScoreRound> {
        self.history.lock().await.rounds().to_vec()
    }

    pub async fn rounds(&self) -> usize {
        self.history.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beliefs::BeliefScore;
    use crate::core::config::AppSettings;
    use crate::llm::testing::ScriptedProvider;
    use crate::llm::{ChatCompletion, ToolCall};

    fn tool_call(arguments: &str) -> ChatCompletion {
        ChatCompletion {
            content: None,
            tool_calls: vec![ToolCall {
                name: BELIEF_TOOL_NAME.to_string(),
                arguments: arguments.to_string(),
            }],
        }
    }

    fn agent(provider: Arc<ScriptedProvider>) -> ScoreAgent {
        ScoreAgent::new(
            provider,
            Arc::new(BeliefMap::builtin().unwrap()),
            &AppSettings::default().score_agent,
        )
    }

    #[test]
    fn tool_schema_covers_every_belief() {
        let agent = agent(Arc::new(ScriptedProvider::new()));
        let tool = agent.tool_definition();

        assert_eq!(tool.name, "update_beliefs");
        let properties = tool.parameters["properties"].as_object().unwrap();
        assert_eq!(properties.len(), agent.beliefs().len());
        assert_eq!(properties["financial_concerns"]["enum"], json!([-1, 0, 1]));
        assert!(agent.system_prompt().contains("- gain_control: "));
    }

    #[tokio::test]
    async fn assess_merges_tool_output_and_carries_forward() {
        let provider = Arc::new(ScriptedProvider::new());
        provider
            .push(tool_call(r#"{"financial_concerns": 1, "gain_control": -1}"#))
            .push(tool_call(r#"{"gain_control": 1, "not_a_belief": 1}"#));
        let agent = agent(provider.clone());

        let first = agent
            .assess(&[ChatMessage::user("Screening sounds expensive")])
            .await
            .unwrap();
        assert_eq!(first.round.get("financial_concerns"), BeliefScore::Affirm);
        assert!(first
            .belief_prompt
            .contains("The user does not believe that"));

        let second = agent
            .assess(&[ChatMessage::user("Actually I want to take charge of my health")])
            .await
            .unwrap();
        assert_eq!(second.round.get("financial_concerns"), BeliefScore::Affirm);
        assert_eq!(second.round.get("gain_control"), BeliefScore::Affirm);
        assert_eq!(agent.rounds().await, 2);

        let requests = provider.requests();
        assert_eq!(requests[0].0, "gpt-4-0125-preview");
        assert_eq!(requests[0].1.tools[0].name, BELIEF_TOOL_NAME);
        assert_eq!(requests[0].1.temperature, Some(0.0));
        assert_eq!(requests[0].1.messages[0].role, Role::System);
    }

    #[tokio::test]
    async fn tool_choice_follows_settings_and_zero_keeps_earlier_calls() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push(ChatCompletion {
            content: None,
            tool_calls: vec![
                ToolCall {
                    name: BELIEF_TOOL_NAME.to_string(),
                    arguments: r#"{"gain_control": 1}"#.to_string(),
                },
                ToolCall {
                    name: BELIEF_TOOL_NAME.to_string(),
                    arguments: r#"{"gain_control": 0, "time_constraints": -1}"#.to_string(),
                },
            ],
        });
        let mut settings = AppSettings::default().score_agent;
        settings.force_tool_call = true;
        let forced = ScoreAgent::new(
            provider.clone(),
            Arc::new(BeliefMap::builtin().unwrap()),
            &settings,
        );

        let assessment = forced
            .assess(&[ChatMessage::user("I like being in charge")])
            .await
            .unwrap();

        assert_eq!(assessment.round.get("gain_control"), BeliefScore::Affirm);
        assert_eq!(assessment.round.get("time_constraints"), BeliefScore::Disagree);
        let requests = provider.requests();
        assert_eq!(requests[0].1.forced_tool.as_deref(), Some(BELIEF_TOOL_NAME));

        agent(provider.clone())
            .assess(&[ChatMessage::user("hi")])
            .await
            .unwrap();
        assert_eq!(provider.requests()[1].1.forced_tool, None);
    }

    #[tokio::test]
    async fn no_tool_calls_repeats_previous_round() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push(tool_call(r#"{"time_constraints": 1}"#));
        let agent = agent(provider);

        let first = agent.assess(&[ChatMessage::user("I am busy")]).await.unwrap();
        let second = agent.assess(&[ChatMessage::user("ok")]).await.unwrap();

        assert_eq!(first.round, second.round);
        assert_eq!(first.belief_prompt, second.belief_prompt);
    }

    #[tokio::test]
    async fn malformed_arguments_and_other_tools_are_ignored() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push(ChatCompletion {
            content: Some("thinking".to_string()),
            tool_calls: vec![
                ToolCall {
                    name: BELIEF_TOOL_NAME.to_string(),
                    arguments: "{not json".to_string(),
                },
                ToolCall {
                    name: "other_tool".to_string(),
                    arguments: r#"{"gain_control": 1}"#.to_string(),
                },
            ],
        });
        let agent = agent(provider);

        let assessment = agent.assess(&[ChatMessage::user("hi")]).await.unwrap();

        assert!(assessment.round.iter().all(|(_, s)| s.is_unknown()));
        assert_eq!(agent.rounds().await, 1);
    }

    #[tokio::test]
    async fn system_messages_are_not_forwarded_and_clear_resets_history() {
        let provider = Arc::new(ScriptedProvider::new());
        let agent = agent(provider.clone());

        agent
            .assess(&[
                ChatMessage::system("chat persona"),
                ChatMessage::assistant("Hello!"),
                ChatMessage::user("hi"),
            ])
            .await
            .unwrap();

        let requests = provider.requests();
        let sent = &requests[0].1.messages;
        assert_eq!(sent.len(), 3);
        assert!(sent.iter().all(|m| m.content != "chat persona"));

        agent.clear().await;
        assert!(agent.scores().await.is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_records_nothing() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push_error("rate limited");
        let agent = agent(provider);

        let result = agent.assess(&[ChatMessage::user("hi")]).await;

        assert!(matches!(result, Err(ApiError::Upstream(_))));
        assert_eq!(agent.rounds().await, 0);
    }
}
