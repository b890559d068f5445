//! Datasets and their examples.

use serde::{Deserialize, Serialize};

use super::{JsonMap, Run};
use crate::multipart::MultipartForm;
use crate::time::LangsmithTime;

/// A named collection of examples.
///
/// `example_count` and `session_count` are maintained by the service; the
/// client only echoes whatever it was given.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: LangsmithTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs_schema_definition: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs_schema_definition: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub externally_managed: Option<bool>,
    #[serde(default, deserialize_with = "super::null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub transformations: Vec<DatasetTransformation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    pub tenant_id: String,
    pub example_count: i64,
    pub session_count: i64,
    pub modified_at: LangsmithTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_session_start_time: Option<LangsmithTime>,
}

/// A post-processing rule applied to one field path of every row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatasetTransformation {
    pub path: Vec<String>,
    pub transformation_type: DatasetTransformationType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DatasetTransformationType {
    RemoveSystemMessages,
    #[serde(rename = "convert_to_openai_message")]
    ConvertToOpenAiMessage,
    #[serde(rename = "convert_to_openai_tool")]
    ConvertToOpenAiTool,
    RemoveExtraFields,
    ExtractToolsFromRun,
}

/// Shape of the rows in a dataset.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    #[default]
    Kv,
    Llm,
    Csv,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Kv => "kv",
            DataType::Llm => "llm",
            DataType::Csv => "csv",
        }
    }
}

/// A CSV file to be uploaded as a new dataset.
///
/// `input_keys` and `output_keys` name the CSV columns that become example
/// inputs and outputs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetCsv {
    /// Raw CSV contents.
    pub file: String,
    pub input_keys: Vec<String>,
    pub name: Option<String>,
    pub data_type: DataType,
    pub output_keys: Vec<String>,
    pub description: Option<String>,
}

impl DatasetCsv {
    /// Encodes the upload form, returning the body and its content type.
    ///
    /// Parts are written in a fixed order: `file` (when non-empty), one
    /// `input_keys` per key, `name`, `data_type`, one `output_keys` per key,
    /// `description`. Repeated keys keep their original order.
    pub fn to_multipart(&self) -> (Vec<u8>, String) {
        let mut form = MultipartForm::new();
        if !self.file.is_empty() {
            form.file("file", "dataset.csv", "text/csv", self.file.as_bytes());
        }
        for key in &self.input_keys {
            form.text("input_keys", key);
        }
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            form.text("name", name);
        }
        form.text("data_type", self.data_type.as_str());
        for key in &self.output_keys {
            form.text("output_keys", key);
        }
        if let Some(description) = self.description.as_deref().filter(|d| !d.is_empty()) {
            form.text("description", description);
        }
        form.finish()
    }
}

/// One input/output pair of a dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Example {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<LangsmithTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<LangsmithTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub dataset_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonMap>,
    pub inputs: JsonMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<JsonMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_urls: Option<JsonMap>,
    /// Runs of the requested sessions; only filled by "examples with runs".
    #[serde(default, deserialize_with = "super::null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub runs: Vec<Run>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dataset() -> Dataset {
        Dataset {
            id: "6f0b2c1e-0000-4000-8000-000000000001".to_string(),
            name: "qa-pairs".to_string(),
            description: Some("questions and answers".to_string()),
            created_at: "2024-05-01T10:00:00".parse().unwrap(),
            inputs_schema_definition: None,
            outputs_schema_definition: None,
            externally_managed: Some(false),
            transformations: vec![DatasetTransformation {
                path: vec!["inputs".to_string(), "messages".to_string()],
                transformation_type: DatasetTransformationType::ConvertToOpenAiMessage,
            }],
            data_type: Some(DataType::Kv),
            tenant_id: "tenant-1".to_string(),
            example_count: 0,
            session_count: 0,
            modified_at: "2024-05-01T10:00:00".parse().unwrap(),
            last_session_start_time: None,
        }
    }

    #[test]
    fn dataset_round_trips() {
        let original = dataset();
        let encoded = serde_json::to_string(&original).unwrap();
        let back: Dataset = serde_json::from_str(&encoded).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn dataset_always_sends_id_and_tenant() {
        let mut ds = dataset();
        ds.id = String::new();
        ds.tenant_id = String::new();
        let body = serde_json::to_value(&ds).unwrap();
        assert_eq!(body["id"], "");
        assert_eq!(body["tenant_id"], "");
        assert!(body.get("last_session_start_time").is_none());
    }

    #[test]
    fn transformation_types_use_wire_names() {
        let names: Vec<serde_json::Value> = [
            DatasetTransformationType::RemoveSystemMessages,
            DatasetTransformationType::ConvertToOpenAiMessage,
            DatasetTransformationType::ConvertToOpenAiTool,
            DatasetTransformationType::RemoveExtraFields,
            DatasetTransformationType::ExtractToolsFromRun,
        ]
        .iter()
        .map(|t| serde_json::to_value(t).unwrap())
        .collect();
        assert_eq!(
            names,
            vec![
                json!("remove_system_messages"),
                json!("convert_to_openai_message"),
                json!("convert_to_openai_tool"),
                json!("remove_extra_fields"),
                json!("extract_tools_from_run"),
            ]
        );
    }

    #[test]
    fn example_decodes_minimal_body() {
        let example: Example =
            serde_json::from_str(r#"{"id":"ex-1","dataset_id":"ds-1","inputs":{"a":1}}"#).unwrap();
        assert_eq!(example.id, "ex-1");
        assert_eq!(example.inputs["a"], 1);
        assert!(example.outputs.is_none());
        assert!(example.runs.is_empty());
    }

    #[test]
    fn null_collections_decode_as_empty() {
        let example: Example = serde_json::from_value(json!({
            "id": "ex-1",
            "dataset_id": "ds-1",
            "inputs": {},
            "runs": null,
        }))
        .unwrap();
        assert!(example.runs.is_empty());

        let mut body = serde_json::to_value(dataset()).unwrap();
        body["transformations"] = serde_json::Value::Null;
        let ds: Dataset = serde_json::from_value(body).unwrap();
        assert!(ds.transformations.is_empty());
    }

    #[test]
    fn example_round_trips() {
        let original = Example {
            id: "ex-2".to_string(),
            created_at: Some("2024-05-01T10:00:00".parse().unwrap()),
            dataset_id: "ds-1".to_string(),
            metadata: Some(json!({"split": "test"}).as_object().unwrap().clone()),
            inputs: json!({"q": "hi"}).as_object().unwrap().clone(),
            outputs: Some(json!({"a": "hello"}).as_object().unwrap().clone()),
            ..Default::default()
        };
        let encoded = serde_json::to_value(&original).unwrap();
        assert!(encoded.get("runs").is_none());
        assert!(encoded.get("name").is_none());
        let back: Example = serde_json::from_value(encoded).unwrap();
        assert_eq!(back, original);
    }

    fn part_names(body: &str) -> Vec<String> {
        body.split("Content-Disposition: form-data; name=\"")
            .skip(1)
            .map(|rest| rest.split('"').next().unwrap().to_string())
            .collect()
    }

    #[test]
    fn csv_form_repeats_keys_in_order() {
        let csv = DatasetCsv {
            file: "q,a\nhi,hello\n".to_string(),
            input_keys: vec!["q".to_string(), "context".to_string()],
            name: Some("greetings".to_string()),
            data_type: DataType::Kv,
            output_keys: vec!["a".to_string()],
            description: None,
        };
        let (body, content_type) = csv.to_multipart();
        let body = String::from_utf8(body).unwrap();

        assert!(content_type.starts_with("multipart/form-data; boundary="));
        assert_eq!(
            part_names(&body),
            vec!["file", "input_keys", "input_keys", "name", "data_type", "output_keys"]
        );
        let q = body.find("\r\n\r\nq\r\n").unwrap();
        let context = body.find("\r\n\r\ncontext\r\n").unwrap();
        assert!(q < context);
        assert!(body.contains("filename=\"dataset.csv\""));
        assert!(body.contains("q,a\nhi,hello\n"));
    }

    #[test]
    fn csv_form_skips_empty_file_and_optional_fields() {
        let csv = DatasetCsv {
            data_type: DataType::Llm,
            ..Default::default()
        };
        let (body, _) = csv.to_multipart();
        let body = String::from_utf8(body).unwrap();
        assert_eq!(part_names(&body), vec!["data_type"]);
        assert!(body.contains("\r\n\r\nllm\r\n"));
    }
}
