use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single hit returned by the search index.
///
/// The record is passed through as-is so that schema changes on the index
/// side never break the widget. Accessors only peek at fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultItem(Value);

impl ResultItem {
    pub fn new(record: Value) -> Self {
        Self(record)
    }

    pub fn id(&self) -> Option<&Value> {
        self.0.get("id")
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for ResultItem {
    fn from(record: Value) -> Self {
        Self(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_fields_survive_serialization() {
        let record = json!({"id": 7, "title": "What is recursion?", "score": {"votes": 3}});
        let item: ResultItem = serde_json::from_value(record.clone()).unwrap();
        assert_eq!(item.id(), Some(&json!(7)));
        assert_eq!(item.get("title"), Some(&json!("What is recursion?")));
        assert_eq!(serde_json::to_value(&item).unwrap(), record);
    }

    #[test]
    fn non_object_records_have_no_fields() {
        let item = ResultItem::new(json!("plain"));
        assert!(item.id().is_none());
        assert_eq!(item.into_value(), json!("plain"));
    }
}
