//! Turns a free-text shopping request into a structured search intent.
//!
//! Two language model calls are made per query: a yes/no classification and a
//! JSON extraction. The extraction reply is free text, so the first balanced
//! `{...}` span is cut out before decoding.

use crate::amazon::parser::parse_price_text;
use crate::llm::TextModel;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

const CLASSIFY_PROMPT: &str =
    "Return True if it could be a query for regarding a product on ecommerce platform else False.: ";

const EXTRACT_PROMPT: &str = "Given the following query for indian context, extract and return the following information in JSON format:\n\
- rephrased_query: A rephrased version of the optimal query to be used on shopping platform.\n\
- category: The category inferred from the query.\n\
- maximum_price: The maximum price inferred from the query.\n\
- minimum_price: The minimum price inferred from the query.\n\n\
Query: {query}\n\n\
Response:";

/// Structured reading of a shopping query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryIntent {
    pub rephrased_query: String,
    pub category: String,
    #[serde(rename = "minimum_price", default, deserialize_with = "lenient_price")]
    pub min_price: Option<u64>,
    #[serde(rename = "maximum_price", default, deserialize_with = "lenient_price")]
    pub max_price: Option<u64>,
}

/// Reasons a query cannot be turned into a [`QueryIntent`].
///
/// The messages are written for the chat model, which relays them to the user.
#[derive(Debug, Error)]
pub enum InterpretError {
    #[error("query is not related to online shopping; apologise to the user")]
    NotShopping,

    #[error("insufficient information: ask the user for a price")]
    MissingPrice,

    #[error("please provide the correct query ({0})")]
    Malformed(String),

    #[error("language model request failed: {0:#}")]
    Model(anyhow::Error),
}

/// Classifies and extracts shopping queries with a language model.
#[derive(Clone)]
pub struct QueryInterpreter {
    model: Arc<dyn TextModel>,
}

impl QueryInterpreter {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }

    /// Returns the intent behind `query`, or why there is none.
    pub async fn interpret(&self, query: &str) -> Result<QueryIntent, InterpretError> {
        if !self.is_shopping_query(query).await? {
            info!("Rejected non-shopping query: {:?}", query);
            return Err(InterpretError::NotShopping);
        }

        let prompt = EXTRACT_PROMPT.replace("{query}", query);
        let response = self.model.complete(&prompt).await.map_err(InterpretError::Model)?;
        debug!("Extraction response: {}", response);

        let intent = parse_intent(&response)?;
        info!(
            "Interpreted {:?} as {:?} [{}] price {:?} - {:?}",
            query, intent.rephrased_query, intent.category, intent.min_price, intent.max_price
        );
        Ok(intent)
    }

    async fn is_shopping_query(&self, query: &str) -> Result<bool, InterpretError> {
        let prompt = format!("{}{}", CLASSIFY_PROMPT, query);
        let answer = self.model.complete(&prompt).await.map_err(InterpretError::Model)?;
        debug!("Classification answer: {:?}", answer);
        Ok(is_affirmative(&answer))
    }
}

/// True when a classification answer reads as "true", ignoring case,
/// surrounding whitespace and trailing punctuation.
pub fn is_affirmative(answer: &str) -> bool {
    answer
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .eq_ignore_ascii_case("true")
}

/// Decodes an extraction reply into an intent.
pub fn parse_intent(response: &str) -> Result<QueryIntent, InterpretError> {
    let object = extract_json_object(response)
        .ok_or_else(|| InterpretError::Malformed("no JSON object in model output".to_string()))?;

    let intent: QueryIntent =
        serde_json::from_str(object).map_err(|e| InterpretError::Malformed(e.to_string()))?;

    if intent.min_price.is_none() && intent.max_price.is_none() {
        return Err(InterpretError::MissingPrice);
    }

    Ok(intent)
}

/// Returns the first balanced `{...}` span of `text`.
///
/// Closing braces before the first opening brace are ignored. Braces inside
/// JSON strings are counted like any other, so a brace in a value can end the
/// span early; the decode step then reports it as malformed.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;

    for (offset, c) in text[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

fn lenient_price<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(price_from_value))
}

/// Reads a price given as an integer, a float (truncated) or a price string
/// such as "₹20,000" or "Rs. 80000". Negative and non-numeric values count as
/// absent.
fn price_from_value(value: &Value) -> Option<u64> {
    let truncate = |f: f64| (f.is_finite() && f >= 0.0).then(|| f.trunc() as u64);

    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(truncate)),
        Value::String(s) => {
            let s = s.trim();
            if s.starts_with('-') || !s.chars().any(|c| c.is_ascii_digit()) {
                return None;
            }
            Some(parse_price_text(s))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Model that replays canned answers and records the prompts it saw.
    struct ScriptedModel {
        answers: Mutex<VecDeque<anyhow::Result<String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(answers: Vec<anyhow::Result<String>>) -> Arc<Self> {
            Arc::new(Self { answers: Mutex::new(answers.into()), prompts: Mutex::new(Vec::new()) })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextModel for ScriptedModel {
        async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted answer")))
        }
    }

    #[tokio::test]
    async fn test_interpret_success() {
        let model = ScriptedModel::new(vec![
            Ok("True".to_string()),
            Ok(r#"Sure! {"rephrased_query": "gaming laptop", "category": "Laptops", "maximum_price": 80000, "minimum_price": null} Hope this helps."#.to_string()),
        ]);
        let interpreter = QueryInterpreter::new(model.clone());

        let intent = interpreter.interpret("gaming laptop under 80000").await.unwrap();
        assert_eq!(intent.rephrased_query, "gaming laptop");
        assert_eq!(intent.category, "Laptops");
        assert_eq!(intent.max_price, Some(80000));
        assert_eq!(intent.min_price, None);

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 2);
        assert_eq!(
            prompts[0],
            "Return True if it could be a query for regarding a product on ecommerce platform else False.: gaming laptop under 80000"
        );
        assert!(prompts[1].starts_with("Given the following query for indian context"));
        assert!(prompts[1].contains("Query: gaming laptop under 80000\n\nResponse:"));
    }

    #[tokio::test]
    async fn test_interpret_rejects_non_shopping() {
        let model = ScriptedModel::new(vec![Ok("False.".to_string())]);
        let interpreter = QueryInterpreter::new(model.clone());

        let err = interpreter.interpret("what is the capital of France").await.unwrap_err();
        assert!(matches!(err, InterpretError::NotShopping));
        // Extraction is never attempted.
        assert_eq!(model.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_interpret_missing_price() {
        let model = ScriptedModel::new(vec![
            Ok("true".to_string()),
            Ok(r#"{"rephrased_query": "running shoes", "category": "Footwear", "maximum_price": null, "minimum_price": null}"#.to_string()),
        ]);
        let interpreter = QueryInterpreter::new(model);

        let err = interpreter.interpret("running shoes").await.unwrap_err();
        assert!(matches!(err, InterpretError::MissingPrice));
        assert!(err.to_string().contains("insufficient information"));
    }

    #[tokio::test]
    async fn test_interpret_no_json() {
        let model = ScriptedModel::new(vec![
            Ok("True".to_string()),
            Ok("I could not understand that.".to_string()),
        ]);
        let interpreter = QueryInterpreter::new(model);

        let err = interpreter.interpret("phone").await.unwrap_err();
        assert!(matches!(err, InterpretError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_interpret_model_failure() {
        let model = ScriptedModel::new(vec![Err(anyhow::anyhow!("connection reset"))]);
        let interpreter = QueryInterpreter::new(model);

        let err = interpreter.interpret("phone under 10000").await.unwrap_err();
        assert!(matches!(err, InterpretError::Model(_)));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_is_affirmative() {
        assert!(is_affirmative("True"));
        assert!(is_affirmative("  true.\n"));
        assert!(is_affirmative("TRUE!"));
        assert!(!is_affirmative("False"));
        assert!(!is_affirmative("True, it is a product query"));
        assert!(!is_affirmative(""));
    }

    #[test]
    fn test_extract_json_object_nested() {
        let text = r#"Here: {"a": {"b": 1}, "c": 2} and {"d": 3}"#;
        assert_eq!(extract_json_object(text), Some(r#"{"a": {"b": 1}, "c": 2}"#));
    }

    #[test]
    fn test_extract_json_object_ignores_leading_close() {
        assert_eq!(extract_json_object("} noise {\"x\": 1}"), Some("{\"x\": 1}"));
    }

    #[test]
    fn test_extract_json_object_unbalanced() {
        assert_eq!(extract_json_object("{\"x\": {\"y\": 1}"), None);
        assert_eq!(extract_json_object("no braces"), None);
    }

    #[test]
    fn test_parse_intent_lenient_prices() {
        let intent = parse_intent(
            r#"{"rephrased_query": "tv", "category": "Electronics", "minimum_price": "₹20,000", "maximum_price": 45999.99}"#,
        )
        .unwrap();
        assert_eq!(intent.min_price, Some(20000));
        assert_eq!(intent.max_price, Some(45999));
    }

    #[test]
    fn test_parse_intent_rupee_prefixes() {
        for (raw, expected) in
            [("Rs. 80000", 80000), ("Rs.80000", 80000), ("INR 80,000", 80000), ("80000", 80000)]
        {
            let json = format!(
                r#"{{"rephrased_query": "laptop", "category": "Laptops", "maximum_price": "{}", "minimum_price": null}}"#,
                raw
            );
            let intent = parse_intent(&json).unwrap();
            assert_eq!(intent.max_price, Some(expected), "price text {:?}", raw);
        }
    }

    #[test]
    fn test_parse_intent_negative_price_string_is_absent() {
        let err = parse_intent(
            r#"{"rephrased_query": "tv", "category": "TV", "minimum_price": "-500", "maximum_price": null}"#,
        )
        .unwrap_err();
        assert!(matches!(err, InterpretError::MissingPrice));
    }

    #[test]
    fn test_parse_intent_absent_keys_and_negatives() {
        let intent =
            parse_intent(r#"{"rephrased_query": "tv", "category": "TV", "minimum_price": 1000}"#)
                .unwrap();
        assert_eq!(intent.min_price, Some(1000));
        assert_eq!(intent.max_price, None);

        let err = parse_intent(
            r#"{"rephrased_query": "tv", "category": "TV", "minimum_price": -5, "maximum_price": "cheap"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, InterpretError::MissingPrice));
    }

    #[test]
    fn test_parse_intent_requires_query_and_category() {
        let err = parse_intent(r#"{"category": "TV", "maximum_price": 1000}"#).unwrap_err();
        assert!(matches!(err, InterpretError::Malformed(_)));
    }
}
