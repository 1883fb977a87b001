//! Canonical serialization used as the config-key hash preimage
//!
//! The output looks like compact JSON but is not meant to be parsed back:
//! strings are quoted without escaping, so a value containing `"` yields
//! text that is not valid JSON. The hash only needs it to be stable.

use std::cmp::Ordering;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use time::macros::format_description;
use time::UtcOffset;

use crate::number::format_number;
use crate::value::{Dictionary, Value};

/// Key that never takes part in the config key
pub const EXCLUDED_KEY: &str = "originatorversion";

/// Serialize a dictionary into its canonical form
pub fn serialize(dict: &Dictionary) -> String {
    let mut out = String::new();
    write_dict(dict, &mut out);
    out
}

fn write_dict(dict: &Dictionary, out: &mut String) {
    let mut entries: Vec<(&String, &Value)> = dict
        .iter()
        .filter(|(key, value)| !is_excluded(key, value))
        .collect();
    // stable, so keys comparing equal keep insertion order
    entries.sort_by(|(a, _), (b, _)| compare_keys(a, b));

    out.push('{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push('"');
        out.push_str(key);
        out.push_str("\":");
        write_value(value, out);
    }
    out.push('}');
}

fn is_excluded(key: &str, value: &Value) -> bool {
    if key.to_lowercase() == EXCLUDED_KEY {
        return true;
    }
    // objects without own keys: empty dicts, empty buffers and dates
    match value {
        Value::Dict(dict) => dict.is_empty(),
        Value::Data(bytes) => bytes.is_empty(),
        Value::Date(_) => true,
        Value::Undefined
        | Value::Bool(_)
        | Value::Number(_)
        | Value::String(_)
        | Value::Array(_) => false,
    }
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Data(bytes) => {
            out.push('"');
            out.push_str(&STANDARD.encode(bytes));
            out.push('"');
        }
        Value::Date(date) => {
            let iso = date
                .to_offset(UtcOffset::UTC)
                .format(format_description!(
                    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
                ))
                .unwrap_or_default();
            out.push('"');
            out.push_str(&iso);
            out.push('"');
        }
        Value::Dict(dict) => write_dict(dict, out),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&format_number(*n)),
        Value::String(s) => {
            out.push('"');
            out.push_str(s);
            out.push('"');
        }
        Value::Undefined => out.push_str("\"\""),
    }
}

/// Case- and accent-insensitive key ordering.
///
/// ASCII punctuation and symbols sort first, currency signs last among
/// them, then digits, then letters, then everything else by folded code
/// point. Control characters and combining marks are ignored. Latin
/// letters with diacritics compare equal to their base letter, and
/// `ß`, `æ`, `œ` and vulgar fractions expand to several characters.
/// Exact for ASCII keys; scripts beyond Latin fall back to code point
/// order.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    weights(a).cmp(&weights(b))
}

const PUNCTUATION_ORDER: &str = " _-,;:!?.'\"()[]{}@*/\\&#%`^+<=>|~$¢£¤¥€";

fn weights(s: &str) -> Vec<u32> {
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars() {
        if c.is_control() || is_combining_mark(c) {
            continue;
        }
        let lower = c.to_lowercase().next().unwrap_or(c);
        match expansion(lower) {
            Some(expanded) => out.extend(expanded.chars().map(primary_weight)),
            None => out.push(primary_weight(fold(lower))),
        }
    }
    out
}

fn primary_weight(c: char) -> u32 {
    if let Some(index) = PUNCTUATION_ORDER.chars().position(|p| p == c) {
        return u32::try_from(index).unwrap_or(0) + 1;
    }
    if let Some(digit) = c.to_digit(10) {
        return 100 + digit;
    }
    // letters take even slots so a few letters can sort right after theirs
    let letter = |base: char| 200 + 2 * (u32::from(base) - u32::from('a'));
    match c {
        'a'..='z' => letter(c),
        'ð' => letter('d') + 1,
        'ı' => letter('i') + 1,
        'þ' => letter('z') + 1,
        _ => 1000 + u32::from(c),
    }
}

fn is_combining_mark(c: char) -> bool {
    matches!(
        c,
        '\u{0300}'..='\u{036F}'
            | '\u{1AB0}'..='\u{1AFF}'
            | '\u{1DC0}'..='\u{1DFF}'
            | '\u{20D0}'..='\u{20FF}'
    )
}

fn expansion(c: char) -> Option<&'static str> {
    match c {
        'ß' => Some("ss"),
        'æ' => Some("ae"),
        'œ' => Some("oe"),
        'ĳ' => Some("ij"),
        '¼' => Some("1/4"),
        '½' => Some("1/2"),
        '¾' => Some("3/4"),
        _ => None,
    }
}

/// Strip Latin-1 and Latin Extended-A diacritics from a lowercase char
fn fold(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => 'a',
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => 'c',
        'ď' | 'đ' => 'd',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => 'e',
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => 'g',
        'ĥ' | 'ħ' => 'h',
        'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' => 'i',
        'ĵ' => 'j',
        'ķ' => 'k',
        'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => 'l',
        'ñ' | 'ń' | 'ņ' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => 'o',
        'ŕ' | 'ŗ' | 'ř' => 'r',
        'ś' | 'ŝ' | 'ş' | 'š' => 's',
        'ţ' | 'ť' | 'ŧ' => 't',
        'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => 'u',
        'ŵ' => 'w',
        'ý' | 'ÿ' | 'ŷ' => 'y',
        'ź' | 'ż' | 'ž' => 'z',
        '⁰' => '0',
        '¹' => '1',
        '²' => '2',
        '³' => '3',
        '⁴' => '4',
        '⁵' => '5',
        '⁶' => '6',
        '⁷' => '7',
        '⁸' => '8',
        '⁹' => '9',
        other => other,
    }
}
