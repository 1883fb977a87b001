//! XML parser implementation

use indexmap::IndexMap;

use crate::config::Config;
use crate::cursor::Cursor;
use crate::error::{Error, ErrorKind, Pos, Result, Span};
use crate::xml::model::{Content, Document, Element};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// XML parser
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    config: Config,
    depth: u16,
}

impl<'a> Parser<'a> {
    /// Create a new XML parser with default limits
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, Config::default())
    }

    /// Create a new XML parser with custom limits
    pub const fn with_config(input: &'a [u8], config: Config) -> Self {
        Self {
            cursor: Cursor::new(input),
            config,
            depth: 0,
        }
    }

    /// Parse an XML document
    pub fn parse(&mut self) -> Result<Document> {
        let len = self.cursor.remaining().len();
        if self.config.max_size > 0 && len > self.config.max_size {
            return Err(Error::at(
                ErrorKind::MaxSizeExceeded {
                    max: self.config.max_size,
                },
                self.cursor.position(),
            ));
        }

        let input = self.cursor.remaining();
        if let Err(err) = std::str::from_utf8(input) {
            return Err(Error::invalid_utf8(input, err));
        }
        if self.cursor.starts_with(UTF8_BOM) {
            self.cursor.advance_by(UTF8_BOM.len());
        }

        self.skip_misc()?;
        if self.cursor.is_eof() {
            return Err(Error::with_message(
                ErrorKind::UnexpectedEof,
                Span::at(self.cursor.position()),
                "no root element",
            ));
        }

        let root = self.parse_element()?;
        self.skip_misc()?;

        if !self.cursor.is_eof() {
            return Err(self.error_here("content after root element"));
        }

        Ok(Document { root })
    }

    /// Skip whitespace, comments, processing instructions and doctype
    fn skip_misc(&mut self) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.starts_with(b"<?") {
                self.cursor.advance_by(2);
                self.skip_until(b"?>")?;
            } else if self.cursor.starts_with(b"<!--") {
                self.cursor.advance_by(4);
                self.skip_until(b"-->")?;
            } else if self.cursor.starts_with(b"<!") && !self.cursor.starts_with(b"<![CDATA[") {
                self.cursor.advance_by(2);
                self.skip_doctype()?;
            } else {
                return Ok(());
            }
        }
    }

    fn parse_element(&mut self) -> Result<Element> {
        self.expect_byte(b'<')?;

        if self.cursor.current() == Some(b'/') {
            return Err(self.error_here("unexpected closing tag"));
        }

        self.enter()?;
        let name = self.parse_name()?;
        let attributes = self.parse_attributes()?;

        if self.cursor.consume(b'/') {
            self.expect_byte(b'>')?;
            self.leave();
            return Ok(Element {
                name,
                attributes,
                children: Vec::new(),
            });
        }

        self.expect_byte(b'>')?;

        let mut children = Vec::new();
        loop {
            if self.cursor.starts_with(b"</") {
                let start = self.cursor.position();
                self.cursor.advance_by(2);
                let close_name = self.parse_name()?;
                if close_name != name {
                    return Err(Error::at(
                        ErrorKind::MismatchedTag {
                            expected: name,
                            found: close_name,
                        },
                        start,
                    ));
                }
                self.cursor.skip_whitespace();
                self.expect_byte(b'>')?;
                break;
            }

            if self.cursor.starts_with(b"<!--") {
                self.cursor.advance_by(4);
                self.skip_until(b"-->")?;
                continue;
            }

            if self.cursor.starts_with(b"<![CDATA[") {
                self.cursor.advance_by(9);
                let text = self.take_until(b"]]>")?;
                if !text.is_empty() {
                    children.push(Content::Text(text));
                }
                continue;
            }

            if self.cursor.starts_with(b"<?") {
                self.cursor.advance_by(2);
                self.skip_until(b"?>")?;
                continue;
            }

            if self.cursor.current() == Some(b'<') {
                let child = self.parse_element()?;
                children.push(Content::Element(child));
                continue;
            }

            if self.cursor.is_eof() {
                return Err(Error::with_message(
                    ErrorKind::UnexpectedEof,
                    Span::at(self.cursor.position()),
                    format!("unterminated element <{name}>"),
                ));
            }

            let text = self.parse_text()?;
            if !text.is_empty() {
                children.push(Content::Text(text));
            }
        }

        self.leave();
        Ok(Element {
            name,
            attributes,
            children,
        })
    }

    fn enter(&mut self) -> Result<()> {
        let max = self.config.effective_max_depth();
        if self.depth >= max {
            return Err(Error::at(
                ErrorKind::MaxDepthExceeded { max },
                self.cursor.position(),
            ));
        }
        self.depth = self.depth.saturating_add(1);
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn parse_attributes(&mut self) -> Result<IndexMap<String, String>> {
        let mut attrs = IndexMap::new();

        loop {
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/') | Some(b'>') => break,
                Some(_) => {}
                None => return Err(self.eof_here()),
            }

            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attrs.contains_key(&name) {
                return Err(self.error_here("duplicate attribute"));
            }
            attrs.insert(name, value);
        }

        Ok(attrs)
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(b'"') => b'"',
            Some(b'\'') => b'\'',
            _ => return Err(self.error_here("expected quoted attribute value")),
        };
        self.cursor.advance();

        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance();
                return decode_entities(self.to_str(raw, start)?, self.cursor.position_at(start));
            }
            if b == b'<' {
                return Err(self.error_here("'<' in attribute value"));
            }
            self.cursor.advance();
        }

        Err(self.eof_here())
    }

    fn parse_text(&mut self) -> Result<String> {
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }

        let raw = self.cursor.slice_from(start);
        decode_entities(self.to_str(raw, start)?, self.cursor.position_at(start))
    }

    fn parse_name(&mut self) -> Result<String> {
        let start = self.cursor.pos();

        match self.cursor.current() {
            Some(first) if is_name_start(first) => self.cursor.advance(),
            Some(_) => return Err(self.error_here("expected name")),
            None => return Err(self.eof_here()),
        }

        while let Some(b) = self.cursor.current() {
            if is_name_char(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        self.to_str(self.cursor.slice_from(start), start)
            .map(str::to_string)
    }

    fn skip_doctype(&mut self) -> Result<()> {
        // cursor is past "<!"; an internal subset may contain '>'
        let mut brackets = 0usize;
        while let Some(b) = self.cursor.current() {
            self.cursor.advance();
            match b {
                b'[' => brackets += 1,
                b']' => brackets = brackets.saturating_sub(1),
                b'>' if brackets == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(self.eof_here())
    }

    fn skip_until(&mut self, pattern: &[u8]) -> Result<()> {
        self.take_raw_until(pattern).map(|_| ())
    }

    fn take_until(&mut self, pattern: &[u8]) -> Result<String> {
        let start = self.cursor.pos();
        let raw = self.take_raw_until(pattern)?;
        self.to_str(raw, start).map(str::to_string)
    }

    fn take_raw_until(&mut self, pattern: &[u8]) -> Result<&'a [u8]> {
        let start = self.cursor.pos();
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(pattern) {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance_by(pattern.len());
                return Ok(raw);
            }
            self.cursor.advance();
        }
        Err(Error::with_message(
            ErrorKind::UnexpectedEof,
            Span::at(self.cursor.position()),
            "unterminated markup",
        ))
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.consume(expected) {
            Ok(())
        } else if self.cursor.is_eof() {
            Err(self.eof_here())
        } else {
            Err(self.error_here("unexpected token"))
        }
    }

    fn to_str(&self, raw: &'a [u8], start: usize) -> Result<&'a str> {
        std::str::from_utf8(raw).map_err(|err| {
            Error::at(
                ErrorKind::InvalidUtf8,
                self.cursor.position_at(start + err.valid_up_to()),
            )
        })
    }

    fn eof_here(&self) -> Error {
        Error::at(ErrorKind::UnexpectedEof, self.cursor.position())
    }

    fn error_here(&self, message: &str) -> Error {
        Error::with_message(
            ErrorKind::InvalidToken,
            Span::at(self.cursor.position()),
            message,
        )
    }
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

fn decode_entities(input: &str, pos: Pos) -> Result<String> {
    if !input.contains('&') {
        return Ok(input.to_string());
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        let (before, after) = rest.split_at(amp);
        result.push_str(before);
        let after = after.get(1..).unwrap_or_default();

        let Some(semi) = after.find(';') else {
            return Err(Error::new(
                ErrorKind::InvalidEntity {
                    entity: after.to_string(),
                },
                Span::at(pos),
            ));
        };
        let (entity, tail) = after.split_at(semi);

        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => decode_numeric_entity(entity),
        };

        match decoded {
            Some(ch) => result.push(ch),
            None => {
                return Err(Error::new(
                    ErrorKind::InvalidEntity {
                        entity: entity.to_string(),
                    },
                    Span::at(pos),
                ));
            }
        }
        rest = tail.get(1..).unwrap_or_default();
    }
    result.push_str(rest);

    Ok(result)
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_NESTING_DEPTH;

    fn ensure_eq<T: PartialEq + std::fmt::Debug>(left: T, right: T) -> Result<()> {
        if left == right {
            Ok(())
        } else {
            Err(Error::with_message(
                ErrorKind::InvalidToken,
                Span::empty(),
                format!("assertion failed: left={left:?} right={right:?}"),
            ))
        }
    }

    #[test]
    fn test_parse_plist_boilerplate() -> Result<()> {
        let input = br#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0"><dict/></plist>
<!-- trailing comment -->
"#;
        let doc = Parser::new(input).parse()?;

        ensure_eq(doc.root.name.as_str(), "plist")?;
        ensure_eq(doc.root.attributes.get("version"), Some(&"1.0".to_string()))?;
        ensure_eq(doc.root.child_elements().count(), 1)?;
        Ok(())
    }

    #[test]
    fn test_parse_nested_text() -> Result<()> {
        let doc = Parser::new(b"<dict><key>startURL</key></dict>").parse()?;

        let key = doc.root.child_elements().next();
        ensure_eq(key.map(|k| k.name.as_str()), Some("key"))?;
        ensure_eq(key.map(Element::text_content), Some("startURL".to_string()))?;
        Ok(())
    }

    #[test]
    fn test_parse_self_closing() -> Result<()> {
        let doc = Parser::new(b"<array><true/><false /></array>").parse()?;

        let names: Vec<_> = doc.root.child_elements().map(|e| e.name.clone()).collect();
        ensure_eq(names, vec!["true".to_string(), "false".to_string()])?;
        Ok(())
    }

    #[test]
    fn test_entities_and_cdata() -> Result<()> {
        let doc =
            Parser::new(b"<string>a &amp; b &#x41;&#66;<![CDATA[<raw>]]><!-- c --></string>")
                .parse()?;
        ensure_eq(doc.root.text_content(), "a & b AB<raw>".to_string())?;
        Ok(())
    }

    #[test]
    fn test_doctype_internal_subset() -> Result<()> {
        let doc = Parser::new(b"<!DOCTYPE plist [<!ENTITY x \"y\">]><plist/>").parse()?;
        ensure_eq(doc.root.name.as_str(), "plist")?;
        Ok(())
    }

    #[test]
    fn test_mismatched_closing_tag() {
        let err = Parser::new(b"<dict><key>a</string></dict>").parse().err();
        assert!(matches!(
            err.map(|e| e.kind().clone()),
            Some(ErrorKind::MismatchedTag { ref expected, ref found })
                if expected == "key" && found == "string"
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(Parser::new(b"not xml at all").parse().is_err());
        assert!(Parser::new(b"").parse().is_err());
        assert!(Parser::new(b"<dict>").parse().is_err());
        assert!(Parser::new(b"<a/><b/>").parse().is_err());
        assert!(Parser::new(b"<a>&bogus;</a>").parse().is_err());
    }

    #[test]
    fn test_depth_limit() {
        let nested = "<a>".repeat(5) + &"</a>".repeat(5);
        let err = Parser::with_config(nested.as_bytes(), Config::new(4, 0))
            .parse()
            .err();
        assert_eq!(
            err.map(|e| e.kind().clone()),
            Some(ErrorKind::MaxDepthExceeded { max: 4 })
        );
        assert!(Parser::with_config(nested.as_bytes(), Config::new(5, 0))
            .parse()
            .is_ok());
    }

    #[test]
    fn test_size_limit() {
        let err = Parser::with_config(b"<dict></dict>", Config::new(0, 4))
            .parse()
            .err();
        assert_eq!(
            err.map(|e| e.kind().clone()),
            Some(ErrorKind::MaxSizeExceeded { max: 4 })
        );
    }

    #[test]
    fn test_unlimited_config_still_caps_depth() {
        let depth = usize::from(MAX_NESTING_DEPTH) + 1;
        let nested = "<array>".repeat(depth) + &"</array>".repeat(depth);
        let err = Parser::with_config(nested.as_bytes(), Config::unlimited())
            .parse()
            .err();
        assert_eq!(
            err.map(|e| e.kind().clone()),
            Some(ErrorKind::MaxDepthExceeded {
                max: MAX_NESTING_DEPTH
            })
        );
    }

    #[test]
    fn test_skips_byte_order_mark() -> Result<()> {
        let doc = Parser::new(b"\xEF\xBB\xBF<?xml version=\"1.0\"?><plist><dict/></plist>").parse()?;
        ensure_eq(doc.root.name.as_str(), "plist")?;
        Ok(())
    }

    #[test]
    fn test_byte_order_mark_only_at_start() {
        assert!(Parser::new(b"<plist>\xEF\xBB\xBF</plist>").parse().is_ok());
        assert!(Parser::new(b" \xEF\xBB\xBF<plist/>").parse().is_err());
    }

    #[test]
    fn test_invalid_utf8_position() {
        let err = Parser::new(b"<plist>\n  <key>\xC3(</key></plist>").parse().err();
        assert_eq!(err.as_ref().map(|e| e.kind().clone()), Some(ErrorKind::InvalidUtf8));
        assert_eq!(err.map(|e| e.span().start), Some(Pos::new(15, 2, 8)));
    }

    #[test]
    fn test_unknown_entity_position() {
        let err = Parser::new(b"<a>\n<b>x &nbsp;</b></a>").parse().err();
        assert_eq!(
            err.as_ref().map(|e| e.kind().clone()),
            Some(ErrorKind::InvalidEntity {
                entity: "nbsp".to_string()
            })
        );
        assert_eq!(err.map(|e| e.span().start), Some(Pos::new(7, 2, 4)));
    }
}
