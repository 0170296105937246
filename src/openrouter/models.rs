use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A model entry as listed by `GET /models`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<Map<String, Value>>,
    /// Remaining fields, kept so cached listings round-trip unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Model {
    /// Model with only an identifier set.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            canonical_slug: None,
            name: None,
            description: None,
            pricing: None,
            extra: Map::new(),
        }
    }

    /// Attach `prompt`/`completion` prices.
    pub fn priced(mut self, prompt: Value, completion: Value) -> Self {
        let mut pricing = Map::new();
        pricing.insert("prompt".into(), prompt);
        pricing.insert("completion".into(), completion);
        self.pricing = Some(pricing);
        self
    }

    /// Identifier used to address the model: its `id`, falling back to the canonical slug.
    pub fn expert_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.canonical_slug.as_deref())
    }

    /// A model is free when both the prompt and completion prices are numerically zero.
    ///
    /// Missing pricing or non-numeric prices never count as free.
    pub fn is_free(&self) -> bool {
        let Some(pricing) = &self.pricing else {
            return false;
        };
        match (price_value(pricing, "prompt"), price_value(pricing, "completion")) {
            (Some(prompt), Some(completion)) => prompt == 0.0 && completion == 0.0,
            _ => false,
        }
    }
}

/// Interpret `pricing[key]` as a number; OpenRouter sends prices as decimal strings.
pub fn price_value(pricing: &Map<String, Value>, key: &str) -> Option<f64> {
    match pricing.get(key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Listing payload; OpenRouter wraps it in `data`, some proxies return the bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ModelListing {
    Wrapped { data: Vec<Model> },
    Bare(Vec<Model>),
}

impl From<ModelListing> for Vec<Model> {
    fn from(value: ModelListing) -> Self {
        match value {
            ModelListing::Wrapped { data } => data,
            ModelListing::Bare(models) => models,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    /// Model id.
    pub model: &'a str,
    /// Conversation, a single user turn.
    pub messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    /// Author role.
    pub role: &'static str,
    /// Message text.
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    /// Generated message.
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn model(value: Value) -> Model {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn zero_prices_are_free() {
        assert!(Model::with_id("m").priced(json!(0), json!(0)).is_free());
        assert!(Model::with_id("m").priced(json!("0"), json!("0.0")).is_free());
        assert!(Model::with_id("m").priced(json!(-0.0), json!(0)).is_free());
    }

    #[test]
    fn any_cost_is_not_free() {
        assert!(!Model::with_id("m").priced(json!(0.001), json!(0)).is_free());
        assert!(!Model::with_id("m").priced(json!("0"), json!("0.000002")).is_free());
    }

    #[test]
    fn missing_or_invalid_pricing_is_not_free() {
        assert!(!Model::with_id("m").is_free());
        assert!(!Model::with_id("m").priced(json!("abc"), json!(0)).is_free());
        assert!(!Model::with_id("m").priced(json!(null), json!(0)).is_free());
        assert!(!model(json!({"id": "m", "pricing": {"prompt": 0}})).is_free());
    }

    #[test]
    fn price_value_accepts_numbers_and_numeric_strings() {
        let pricing = json!({"a": 3, "b": -2.5, "c": " 1e-3 ", "d": {"x": 1}, "e": "abc"});
        let pricing = pricing.as_object().unwrap();

        assert_eq!(price_value(pricing, "a"), Some(3.0));
        assert_eq!(price_value(pricing, "b"), Some(-2.5));
        assert_eq!(price_value(pricing, "c"), Some(0.001));
        assert_eq!(price_value(pricing, "d"), None);
        assert_eq!(price_value(pricing, "e"), None);
        assert_eq!(price_value(pricing, "missing"), None);
    }

    #[test]
    fn expert_id_falls_back_to_canonical_slug() {
        let m = model(json!({"canonical_slug": "vendor/model"}));
        assert_eq!(m.expert_id(), Some("vendor/model"));
        assert_eq!(model(json!({"name": "x"})).expert_id(), None);
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let raw = json!({"id": "m", "context_length": 8192, "pricing": {"prompt": "0", "completion": "0"}});
        let m = model(raw.clone());
        assert_eq!(serde_json::to_value(&m).unwrap(), raw);
    }

    #[test]
    fn listing_accepts_wrapped_and_bare_arrays() {
        let wrapped: ModelListing = serde_json::from_value(json!({"data": [{"id": "a"}]})).unwrap();
        let bare: ModelListing = serde_json::from_value(json!([{"id": "b"}])).unwrap();

        assert_eq!(Vec::<Model>::from(wrapped)[0].id.as_deref(), Some("a"));
        assert_eq!(Vec::<Model>::from(bare)[0].id.as_deref(), Some("b"));
    }
}
