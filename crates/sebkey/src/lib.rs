//! sebkey - Safe Exam Browser configuration parser
//!
//! Reads the plist XML of a `.seb` file into a [`Dictionary`], renders its
//! canonical serialization and derives the config key hash and request
//! hash from it.
//!
//! # Quick Start
//!
//! ```
//! use sebkey::SebFile;
//! # fn main() -> Result<(), sebkey::Error> {
//! let seb = SebFile::from_xml(
//!     "<plist><dict><key>startURL</key><string>https://example.com</string></dict></plist>",
//! )?;
//! assert_eq!(seb.start_url(), Some("https://example.com"));
//! assert_eq!(seb.serialized_json(), r#"{"startURL":"https://example.com"}"#);
//! let key = seb.config_key_for_start_url();
//! assert_eq!(key.len(), 64);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result, Span};

pub mod config;
pub use config::Config;

mod cursor;

pub mod xml;
pub use xml::{
    Content as XmlContent, Document as XmlDocument, Element as XmlElement, Parser as XmlParser,
};

pub mod number;

pub mod value;
pub use value::{Dictionary, Value};

pub mod plist;

pub mod canonical;
pub use canonical::serialize;

pub mod digest;
pub use digest::sha256_hex;

pub mod seb;
pub use seb::SebFile;

/// Parse SEB XML into a dictionary
pub fn from_str(s: &str) -> Result<Dictionary> {
    plist::parse_str(s)
}

/// Parse SEB XML into a dictionary with custom limits
pub fn from_str_with_config(s: &str, config: Config) -> Result<Dictionary> {
    plist::parse_str_with_config(s, config)
}

/// Parse an XML document without interpreting it as a plist
pub fn from_xml_str(s: &str) -> Result<XmlDocument> {
    let mut parser = XmlParser::new(s.as_bytes());
    parser.parse()
}
