//! Parsed SEB configuration file with its derived hashes

use tracing::{debug, instrument};

use crate::canonical::serialize;
use crate::config::Config;
use crate::digest::{config_hash, config_key, request_hash};
use crate::error::{Error, Result};
use crate::plist::parse_str_with_config;
use crate::value::{Dictionary, Value};

/// Dictionary key holding the exam start URL
pub const START_URL: &str = "startURL";

/// Header carrying the start URL
pub const REFERER_HEADER: &str = "Referer";
/// Header carrying the request hash
pub const REQUEST_HASH_HEADER: &str = "X-SafeExamBrowser-RequestHash";
/// Header carrying the config key hash
pub const CONFIG_KEY_HASH_HEADER: &str = "X-SafeExamBrowser-ConfigKeyHash";

/// An immutable, fully derived SEB configuration.
///
/// The only way to obtain one is to parse XML, so the hashes always
/// match the dictionary.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "PascalCase"))]
pub struct SebFile {
    dictionary: Dictionary,
    serialized_json: String,
    start_url: Option<String>,
    config_hash: String,
    request_hash: String,
}

impl SebFile {
    /// Parse SEB XML text with default limits
    pub fn from_xml(xml: &str) -> Result<Self> {
        Self::from_xml_with_config(xml, Config::default())
    }

    /// Parse SEB XML bytes, which must be UTF-8
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let xml = std::str::from_utf8(bytes).map_err(|err| Error::invalid_utf8(bytes, err))?;
        Self::from_xml(xml)
    }

    /// Parse SEB XML text with custom limits
    #[instrument(level = "debug", skip_all, fields(len = xml.len()))]
    pub fn from_xml_with_config(xml: &str, config: Config) -> Result<Self> {
        let dictionary = parse_str_with_config(xml, config)?;
        Ok(Self::from_dictionary(dictionary))
    }

    fn from_dictionary(dictionary: Dictionary) -> Self {
        let serialized_json = serialize(&dictionary);
        let start_url = match dictionary.get(START_URL) {
            Some(Value::String(url)) => Some(url.clone()),
            _ => None,
        };
        let config_hash = config_hash(&serialized_json);
        let request_hash = request_hash(&dictionary);

        debug!(
            keys = dictionary.len(),
            has_start_url = start_url.is_some(),
            %config_hash,
            "derived seb hashes"
        );

        Self {
            dictionary,
            serialized_json,
            start_url,
            config_hash,
            request_hash,
        }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn serialized_json(&self) -> &str {
        &self.serialized_json
    }

    /// The `startURL` entry, if it is a string
    pub fn start_url(&self) -> Option<&str> {
        self.start_url.as_deref()
    }

    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    pub fn request_hash(&self) -> &str {
        &self.request_hash
    }

    /// SHA-256 of `url` followed by the config hash
    pub fn config_key(&self, url: &str) -> String {
        config_key(url, &self.config_hash)
    }

    /// Config key for this file's own start URL, or `""` without one
    pub fn config_key_for_start_url(&self) -> String {
        self.config_key(self.start_url().unwrap_or_default())
    }
}
