//! Named result fields printed for a parsed SEB file

use serde::Serialize;

use sebkey::seb::{CONFIG_KEY_HASH_HEADER, REFERER_HEADER, REQUEST_HASH_HEADER};
use sebkey::SebFile;

pub const FILE_NAME_FIELD: &str = "File-Name";
pub const SERIALIZED_FIELD: &str = "Serialized";
pub const DICTIONARY_FIELD: &str = "Dictionary";

/// Name reported when the caller gives none
pub const DEFAULT_FILE_NAME: &str = "config.seb";

/// Which optional fields to emit. `File-Name` is always emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseConfig {
    pub show_start_url: bool,
    pub show_request_hash: bool,
    pub show_config_key: bool,
    pub show_serialized: bool,
    pub show_dictionary: bool,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            show_start_url: true,
            show_request_hash: true,
            show_config_key: true,
            show_serialized: false,
            show_dictionary: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseField {
    pub name: &'static str,
    pub value: Option<String>,
}

impl ResponseField {
    fn new(name: &'static str, value: Option<String>) -> Self {
        Self { name, value }
    }
}

/// Build the enabled fields in their fixed order
pub fn build_response_fields(
    seb: &SebFile,
    file_name: &str,
    config: &ResponseConfig,
) -> serde_json::Result<Vec<ResponseField>> {
    let mut fields = Vec::new();

    if config.show_start_url {
        fields.push(ResponseField::new(
            REFERER_HEADER,
            seb.start_url().map(str::to_owned),
        ));
    }
    if config.show_request_hash {
        fields.push(ResponseField::new(
            REQUEST_HASH_HEADER,
            Some(seb.request_hash().to_owned()),
        ));
    }
    if config.show_config_key {
        fields.push(ResponseField::new(
            CONFIG_KEY_HASH_HEADER,
            Some(seb.config_key_for_start_url()),
        ));
    }

    let file_name = if file_name.is_empty() {
        DEFAULT_FILE_NAME
    } else {
        file_name
    };
    fields.push(ResponseField::new(FILE_NAME_FIELD, Some(file_name.to_owned())));

    if config.show_serialized {
        fields.push(ResponseField::new(
            SERIALIZED_FIELD,
            Some(seb.serialized_json().to_owned()),
        ));
    }
    if config.show_dictionary {
        let dictionary = serde_json::to_string(seb.dictionary())?;
        fields.push(ResponseField::new(DICTIONARY_FIELD, Some(dictionary)));
    }

    Ok(fields)
}
