use anyhow::{Context, Result};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_yaml::Value;
use tracing::warn;

/// Every object of a YAML file: one per document, or the `items` of a list
/// document. Empty documents are skipped.
pub(crate) fn read_documents(path: &str) -> Result<Vec<Value>> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("cannot read file {path}"))?;

    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(&contents) {
        let value =
            Value::deserialize(document).with_context(|| format!("cannot parse file {path}"))?;
        if value.is_null() {
            continue;
        }
        if let Some(Value::Sequence(items)) = value.get("items") {
            documents.extend(items.iter().cloned());
            continue;
        }
        documents.push(value);
    }
    Ok(documents)
}

pub(crate) fn kind_of(document: &Value) -> Option<&str> {
    document.get("kind").and_then(Value::as_str)
}

pub(crate) fn api_version_of(document: &Value) -> Option<&str> {
    document.get("apiVersion").and_then(Value::as_str)
}

fn name_of(document: &Value) -> &str {
    document
        .get("metadata")
        .and_then(|metadata| metadata.get("name"))
        .and_then(Value::as_str)
        .unwrap_or_default()
}

pub(crate) fn from_document<T: DeserializeOwned>(document: Value, path: &str) -> Result<T> {
    let name = name_of(&document).to_string();
    serde_yaml::from_value(document).with_context(|| format!("invalid object {name:?} in {path}"))
}

/// `documents` read from `path`, deserialized as `T`. Documents declaring a
/// kind other than `kind` are skipped.
pub(crate) fn objects_of_kind<T: DeserializeOwned>(
    documents: Vec<Value>,
    path: &str,
    kind: &str,
) -> Result<Vec<T>> {
    documents
        .into_iter()
        .filter(|document| match kind_of(document) {
            Some(found) if found != kind => {
                warn!(
                    path,
                    kind = found,
                    name = name_of(document),
                    "skipping object, expected kind {kind}"
                );
                false
            }
            _ => true,
        })
        .map(|document| from_document(document, path))
        .collect()
}

/// Objects of `path` deserialized as `T`, see `objects_of_kind`.
pub(crate) fn read_objects<T: DeserializeOwned>(path: &str, kind: &str) -> Result<Vec<T>> {
    objects_of_kind(read_documents(path)?, path, kind)
}

/// Renders `objects` as a stream of YAML documents.
pub(crate) fn to_yaml_documents<T: Serialize>(objects: &[T]) -> Result<String> {
    let mut out = String::new();
    for object in objects {
        out.push_str("---\n");
        out.push_str(&serde_yaml::to_string(object)?);
    }
    Ok(out)
}

pub(crate) fn print_documents<T: Serialize>(objects: &[T]) -> Result<()> {
    print!("{}", to_yaml_documents(objects)?);
    Ok(())
}
