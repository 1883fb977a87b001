//! Plist tree walker: XML document to [`Dictionary`]
//!
//! Only the first `<dict>` in document order is read. Inside a dict body,
//! a `<key>` element sets the pending key and the next element is taken as
//! its value. An element without a pending key is descended into, and its
//! key/value pairs land in the same dictionary.

use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::number::{parse_float_prefix, parse_int_prefix};
use crate::value::{Dictionary, Value};
use crate::xml::{Document, Element, Parser};

/// Parse SEB XML text into a dictionary using default limits
pub fn parse_str(xml: &str) -> Result<Dictionary> {
    parse_str_with_config(xml, Config::default())
}

/// Parse SEB XML text into a dictionary
pub fn parse_str_with_config(xml: &str, config: Config) -> Result<Dictionary> {
    let document = Parser::with_config(xml.as_bytes(), config).parse()?;
    Ok(parse_document(&document))
}

/// Walk an already parsed document
pub fn parse_document(document: &Document) -> Dictionary {
    match document.root.find_first("dict") {
        Some(dict) => collect_entries(dict, Dictionary::new()),
        None => {
            debug!(root = %document.root.name, "document has no <dict> element");
            Dictionary::new()
        }
    }
}

/// Convert a single value element
pub fn value_of(element: &Element) -> Value {
    match element.name.as_str() {
        "array" => Value::Array(
            element
                .child_elements()
                .map(value_of)
                .filter(Value::is_defined)
                .collect(),
        ),
        "data" | "string" => Value::String(element.text_content().trim().to_string()),
        "dict" => Value::Dict(collect_entries(element, Dictionary::new())),
        "false" => Value::Bool(false),
        "true" => Value::Bool(true),
        "integer" => Value::Number(parse_int_prefix(&element.text_content()).unwrap_or(0.0)),
        "real" => Value::Number(parse_float_prefix(&element.text_content()).unwrap_or(0.0)),
        _ => Value::Undefined,
    }
}

fn collect_entries(element: &Element, dict: Dictionary) -> Dictionary {
    let (dict, dangling) = element
        .child_elements()
        .fold((dict, None), |(dict, pending), child| step(dict, pending, child));

    if let Some(key) = dangling {
        debug!(%key, "dropping key without value");
    }
    dict
}

fn step(mut dict: Dictionary, pending: Option<String>, child: &Element) -> (Dictionary, Option<String>) {
    if child.name == "key" {
        if let Some(previous) = pending {
            debug!(key = %previous, "key replaced by following key");
        }
        return (dict, Some(child.text_content()));
    }

    match pending {
        Some(key) => {
            let value = value_of(child);
            if value.is_defined() {
                dict.insert(key, value);
            } else {
                debug!(%key, tag = %child.name, "unrecognized value element");
            }
            (dict, None)
        }
        None => (collect_entries(child, dict), None),
    }
}
