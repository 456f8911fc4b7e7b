//! Conversion of analysis REST field objects into the `{kind, properties}` item shape.
//!
//! The REST API tags every field with `type` and stores its value under a type-specific key
//! (`valueString`, `valueCurrency`, `valueObject`, ...). Clients expect one uniform shape:
//!
//! ```text
//! { "kind": "string", "value": "Milk", "content": "MILK", "confidence": 0.98 }
//! { "kind": "object", "properties": { "totalPrice": { ... } } }
//! { "kind": "array",  "values": [ ... ] }
//! ```
//!
//! Property names are converted to lower camel case (`TotalPrice` → `totalPrice`).

use super::{AnalysisError, AnalysisResult};
use api_shared::AnalyzedItem;
use serde_json::{Map, Value};

/// Returns the normalised `Items` field of the first document in an `analyzeResult`.
///
/// # Errors
///
/// Returns [`AnalysisError::NoDocument`] when the result has no documents at all.
pub fn first_document_items(analyze_result: &Value) -> AnalysisResult<Option<Vec<AnalyzedItem>>> {
    let document = analyze_result
        .get("documents")
        .and_then(Value::as_array)
        .and_then(|docs| docs.first())
        .ok_or(AnalysisError::NoDocument)?;

    let Some(fields) = document.get("fields").and_then(Value::as_object) else {
        return Ok(None);
    };
    let Some(items) = fields.get("Items").or_else(|| fields.get("items")) else {
        return Ok(None);
    };

    let values = items
        .get("valueArray")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    Ok(Some(values.iter().map(to_item).collect()))
}

fn to_item(field: &Value) -> AnalyzedItem {
    let kind = field_kind(field).to_string();
    let properties = match field.get("valueObject").and_then(Value::as_object) {
        Some(object) => normalize_object(object),
        None => Map::new(),
    };
    AnalyzedItem { kind, properties }
}

/// Normalises a single REST field object.
pub fn normalize_field(field: &Value) -> Value {
    let kind = field_kind(field);
    let mut out = Map::new();
    out.insert("kind".into(), Value::String(kind.to_string()));

    match kind {
        "object" => {
            let properties = field
                .get("valueObject")
                .and_then(Value::as_object)
                .map(normalize_object)
                .unwrap_or_default();
            out.insert("properties".into(), Value::Object(properties));
        }
        "array" => {
            let values = field
                .get("valueArray")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(normalize_field).collect())
                .unwrap_or_default();
            out.insert("values".into(), Value::Array(values));
        }
        other => {
            if let Some(value) = value_key(other).and_then(|key| field.get(key)) {
                out.insert("value".into(), value.clone());
            }
        }
    }

    for key in ["content", "confidence"] {
        if let Some(v) = field.get(key) {
            out.insert(key.into(), v.clone());
        }
    }

    Value::Object(out)
}

fn normalize_object(object: &Map<String, Value>) -> Map<String, Value> {
    object
        .iter()
        .map(|(name, field)| (lower_camel(name), normalize_field(field)))
        .collect()
}

fn field_kind(field: &Value) -> &str {
    field.get("type").and_then(Value::as_str).unwrap_or("unknown")
}

fn value_key(kind: &str) -> Option<&'static str> {
    Some(match kind {
        "string" => "valueString",
        "date" => "valueDate",
        "time" => "valueTime",
        "phoneNumber" => "valuePhoneNumber",
        "number" => "valueNumber",
        "integer" => "valueInteger",
        "selectionMark" => "valueSelectionMark",
        "countryRegion" => "valueCountryRegion",
        "signature" => "valueSignature",
        "currency" => "valueCurrency",
        "address" => "valueAddress",
        "boolean" => "valueBoolean",
        _ => return None,
    })
}

fn lower_camel(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn receipt_result() -> Value {
        json!({
            "documents": [{
                "docType": "receipt.retailMeal",
                "fields": {
                    "MerchantName": {"type": "string", "valueString": "Corner Shop", "content": "CORNER SHOP"},
                    "Items": {
                        "type": "array",
                        "valueArray": [{
                            "type": "object",
                            "valueObject": {
                                "Description": {"type": "string", "valueString": "Milk", "content": "MILK", "confidence": 0.98},
                                "TotalPrice": {
                                    "type": "currency",
                                    "valueCurrency": {"amount": 1.29, "currencyCode": "EUR"},
                                    "content": "1,29"
                                },
                                "Quantity": {"type": "number", "valueNumber": 1}
                            }
                        }]
                    }
                }
            }]
        })
    }

    #[test]
    fn extracts_items_of_first_document() {
        let items = first_document_items(&receipt_result()).unwrap().unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, "object");
        assert_eq!(
            items[0].properties["description"],
            json!({"kind": "string", "value": "Milk", "content": "MILK", "confidence": 0.98})
        );
        assert_eq!(
            items[0].properties["totalPrice"]["value"],
            json!({"amount": 1.29, "currencyCode": "EUR"})
        );
        assert_eq!(items[0].properties["quantity"]["value"], json!(1));
    }

    #[test]
    fn missing_items_field_is_none() {
        let result = json!({"documents": [{"fields": {"Total": {"type": "number", "valueNumber": 3}}}]});
        assert_eq!(first_document_items(&result).unwrap(), None);
    }

    #[test]
    fn empty_items_array_is_empty_list() {
        let result = json!({"documents": [{"fields": {"Items": {"type": "array"}}}]});
        assert_eq!(first_document_items(&result).unwrap(), Some(vec![]));
    }

    #[test]
    fn no_documents_is_an_error() {
        let result = json!({"documents": []});
        assert!(matches!(
            first_document_items(&result),
            Err(AnalysisError::NoDocument)
        ));
        assert!(matches!(
            first_document_items(&json!({})),
            Err(AnalysisError::NoDocument)
        ));
    }

    #[test]
    fn nested_arrays_are_normalised() {
        let field = json!({
            "type": "array",
            "valueArray": [{"type": "string", "valueString": "a"}]
        });
        assert_eq!(
            normalize_field(&field),
            json!({"kind": "array", "values": [{"kind": "string", "value": "a"}]})
        );
    }

    #[test]
    fn unknown_type_keeps_content() {
        let field = json!({"content": "???"});
        assert_eq!(
            normalize_field(&field),
            json!({"kind": "unknown", "content": "???"})
        );
    }
}
