use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    Result, StreamError,
    common::Vars,
    runtime::FlowSnapshot,
    stream::NexusSubtype,
};

use super::Capability;

/// Comparison operators supported by condition nexuses.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComparisonOperator {
    Is,
    IsNot,
    Contains,
    NotContains,
    Empty,
    NotEmpty,
    Gt,
    Lt,
    Ge,
    Le,
}

#[derive(Deserialize)]
struct ConditionConfig {
    /// `<nexus_id>.<output_key>` path into the flow context.
    field: String,
    operator: ComparisonOperator,
    #[serde(default)]
    value: Option<Value>,
}

/// Evaluates a single comparison over the flow-context snapshot.
///
/// The output carries `result` plus a `selected` handle name ("true" or
/// "false") so downstream tooling can map the verdict onto output ports.
pub struct ConditionCapability;

impl ConditionCapability {
    fn lookup<'a>(
        field: &str,
        context: &'a FlowSnapshot,
    ) -> Option<&'a Value> {
        let (nid, key) = field.split_once('.')?;
        context.get(nid)?.get_value(key)
    }

    fn evaluate(
        actual: Option<&Value>,
        operator: ComparisonOperator,
        expected: &Option<Value>,
    ) -> bool {
        match operator {
            ComparisonOperator::Empty => match actual {
                None => true,
                Some(Value::Null) => true,
                Some(Value::String(s)) => s.is_empty(),
                Some(Value::Array(arr)) => arr.is_empty(),
                Some(Value::Object(obj)) => obj.is_empty(),
                _ => false,
            },
            ComparisonOperator::NotEmpty => !Self::evaluate(actual, ComparisonOperator::Empty, expected),
            _ => {
                let (Some(actual), Some(expected)) = (actual, expected) else {
                    return false;
                };
                Self::evaluate_with_value(actual, operator, expected)
            }
        }
    }

    fn evaluate_with_value(
        actual: &Value,
        operator: ComparisonOperator,
        expected: &Value,
    ) -> bool {
        match operator {
            ComparisonOperator::Is => actual == expected,
            ComparisonOperator::IsNot => actual != expected,
            ComparisonOperator::Contains => Self::eval_contains(actual, expected),
            ComparisonOperator::NotContains => !Self::eval_contains(actual, expected),
            ComparisonOperator::Gt => Self::eval_cmp(actual, expected, |a, b| a > b),
            ComparisonOperator::Lt => Self::eval_cmp(actual, expected, |a, b| a < b),
            ComparisonOperator::Ge => Self::eval_cmp(actual, expected, |a, b| a >= b),
            ComparisonOperator::Le => Self::eval_cmp(actual, expected, |a, b| a <= b),
            ComparisonOperator::Empty | ComparisonOperator::NotEmpty => unreachable!(),
        }
    }

    fn eval_contains(
        actual: &Value,
        expected: &Value,
    ) -> bool {
        match (actual, expected) {
            (Value::String(s), Value::String(e)) => s.contains(e),
            (Value::Array(arr), e) => arr.iter().any(|v| v == e),
            _ => false,
        }
    }

    fn eval_cmp(
        actual: &Value,
        expected: &Value,
        cmp: impl Fn(f64, f64) -> bool,
    ) -> bool {
        match (actual.as_f64(), expected.as_f64()) {
            (Some(a), Some(b)) => cmp(a, b),
            _ => false,
        }
    }
}

#[async_trait]
impl Capability for ConditionCapability {
    fn subtype(&self) -> NexusSubtype {
        NexusSubtype::Condition
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "required": ["field", "operator"],
            "properties": {
                "field": {
                    "type": "string",
                    "description": "Context path '<nexus_id>.<output_key>' to compare"
                },
                "operator": {
                    "type": "string",
                    "enum": ["is", "is_not", "contains", "not_contains", "empty", "not_empty", "gt", "lt", "ge", "le"]
                },
                "value": {
                    "description": "Expected value for binary operators"
                }
            }
        })
    }

    async fn execute(
        &self,
        config: &Vars,
        context: &FlowSnapshot,
    ) -> Result<Vars> {
        let config_value: Value = config.clone().into();
        let condition: ConditionConfig = serde_json::from_value(config_value).map_err(|e| StreamError::Capability(format!("invalid condition config: {}", e)))?;

        let actual = Self::lookup(&condition.field, context);
        let result = Self::evaluate(actual, condition.operator, &condition.value);

        let mut output = Vars::new();
        output.set("result", result);
        output.set("selected", if result { "true" } else { "false" });
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn context_with(
        nid: &str,
        key: &str,
        value: Value,
    ) -> FlowSnapshot {
        let mut vars = Vars::new();
        vars.set(key, value);
        let mut context = HashMap::new();
        context.insert(nid.to_string(), vars);
        context
    }

    fn config(
        field: &str,
        operator: &str,
        value: Option<Value>,
    ) -> Vars {
        let mut config = Vars::new();
        config.set("field", field);
        config.set("operator", operator);
        if let Some(value) = value {
            config.set("value", value);
        }
        config
    }

    #[tokio::test]
    async fn test_is_operator() {
        let context = context_with("t1", "source", json!("webhook"));
        let output = ConditionCapability.execute(&config("t1.source", "is", Some(json!("webhook"))), &context).await.unwrap();

        assert_eq!(output.get::<bool>("result"), Some(true));
        assert_eq!(output.get::<String>("selected"), Some("true".to_string()));
    }

    #[tokio::test]
    async fn test_gt_operator() {
        let context = context_with("n1", "count", json!(7));
        let output = ConditionCapability.execute(&config("n1.count", "gt", Some(json!(3))), &context).await.unwrap();
        assert_eq!(output.get::<bool>("result"), Some(true));
    }

    #[tokio::test]
    async fn test_missing_field_is_empty() {
        let context = HashMap::new();
        let output = ConditionCapability.execute(&config("ghost.value", "empty", None), &context).await.unwrap();
        assert_eq!(output.get::<bool>("result"), Some(true));
    }

    #[tokio::test]
    async fn test_invalid_config_fails() {
        let mut config = Vars::new();
        config.set("operator", "is");
        let err = ConditionCapability.execute(&config, &HashMap::new()).await.unwrap_err();
        assert!(matches!(err, StreamError::Capability(_)));
    }
}
