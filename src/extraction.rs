use crate::types::{AggregatorError, AwardDetails, Result};
use async_trait::async_trait;
use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::debug;

/// Seam for the external text-understanding collaborator that turns one
/// paragraph of award text into a validated `AwardDetails` payload.
#[async_trait]
pub trait AwardExtractor: Send + Sync {
    async fn extract_award(&self, text: &str) -> Result<AwardDetails>;
}

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

const SYSTEM_PROMPT: &str = "Extract the contract award details from the announcement \
paragraph. List every contractor with its contract number and location, the purpose of \
the work, the award amount in dollars, and the contracting agency with its location.";

/// Structured-extraction client for an OpenAI-compatible chat completions
/// endpoint, using strict structured output with a schema derived from
/// `AwardDetails`.
pub struct OpenAiExtractor {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiExtractor {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: OPENAI_API_URL.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl AwardExtractor for OpenAiExtractor {
    async fn extract_award(&self, text: &str) -> Result<AwardDetails> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": text },
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "award_details",
                    "strict": true,
                    "schema": strict_schema::<AwardDetails>(),
                },
            },
        });

        debug!(model = %self.model, "Structured extraction request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AggregatorError::ExtractionFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AggregatorError::ExtractionFailed(format!(
                "service returned {}: {}",
                status, body
            )));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| AggregatorError::ExtractionFailed(e.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AggregatorError::ExtractionFailed("empty completion".to_string()))?;

        serde_json::from_str(&content).map_err(|e| {
            AggregatorError::ExtractionFailed(format!("payload failed validation: {}", e))
        })
    }
}

/// JSON schema for `T`, normalized to what strict structured output expects:
/// every object closed to extra properties, every property required, no
/// `$ref` indirection left behind.
pub fn strict_schema<T: JsonSchema>() -> serde_json::Value {
    let mut value = serde_json::to_value(schema_for!(T)).unwrap_or_default();
    let definitions = value
        .get("definitions")
        .cloned()
        .unwrap_or(serde_json::Value::Null);

    normalize(&mut value, &definitions);

    if let serde_json::Value::Object(map) = &mut value {
        map.remove("definitions");
        map.remove("$schema");
    }
    value
}

fn normalize(value: &mut serde_json::Value, definitions: &serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::String(path)) = map.get("$ref").cloned() {
                if let Some(definition) = definitions.get(path.trim_start_matches("#/definitions/"))
                {
                    *value = definition.clone();
                    normalize(value, definitions);
                    return;
                }
            }

            if let Some(serde_json::Value::Array(all_of)) = map.get("allOf").cloned() {
                if let [single] = all_of.as_slice() {
                    *value = single.clone();
                    normalize(value, definitions);
                    return;
                }
            }

            if map.get("type") == Some(&serde_json::Value::String("object".to_string())) {
                map.insert(
                    "additionalProperties".to_string(),
                    serde_json::Value::Bool(false),
                );
                if let Some(serde_json::Value::Object(properties)) = map.get("properties") {
                    let keys = properties
                        .keys()
                        .cloned()
                        .map(serde_json::Value::String)
                        .collect();
                    map.insert("required".to_string(), serde_json::Value::Array(keys));
                }
            }

            for (_, nested) in map.iter_mut() {
                normalize(nested, definitions);
            }
        }
        serde_json::Value::Array(items) => {
            for item in items.iter_mut() {
                normalize(item, definitions);
            }
        }
        _ => {}
    }
}

/// Scripted extractor for tests and offline runs. Responses are popped in
/// call order; an exhausted script fails the call.
pub struct MockAwardExtractor {
    responses: Mutex<VecDeque<Result<AwardDetails>>>,
}

impl MockAwardExtractor {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push_ok(&self, details: AwardDetails) {
        self.responses.lock().unwrap().push_back(Ok(details));
    }

    pub fn push_err(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(AggregatorError::ExtractionFailed(message.to_string())));
    }

    /// Number of scripted responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

impl Default for MockAwardExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AwardExtractor for MockAwardExtractor {
    async fn extract_award(&self, _text: &str) -> Result<AwardDetails> {
        self.responses.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(AggregatorError::ExtractionFailed(
                "mock extractor has no scripted response".to_string(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_closes_objects_and_requires_all_properties() {
        let schema = strict_schema::<AwardDetails>();
        let root = schema.as_object().unwrap();

        assert!(!root.contains_key("definitions"));
        assert!(!root.contains_key("$schema"));
        assert_eq!(
            root.get("additionalProperties"),
            Some(&serde_json::Value::Bool(false))
        );

        let required: Vec<&str> = root
            .get("required")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert!(required.contains(&"contractors"));
        assert!(required.contains(&"purpose"));
        assert!(required.contains(&"amount"));
        assert!(required.contains(&"contracting_agency"));
    }

    #[test]
    fn schema_inlines_nested_types() {
        let schema = strict_schema::<AwardDetails>();
        let serialized = serde_json::to_string(&schema).unwrap();
        assert!(!serialized.contains("$ref"));

        let agency = schema
            .pointer("/properties/contracting_agency")
            .and_then(|v| v.as_object())
            .unwrap();
        assert_eq!(
            agency.get("type"),
            Some(&serde_json::Value::String("object".to_string()))
        );
    }
}
