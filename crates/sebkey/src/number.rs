//! Number parsing and formatting with ECMAScript semantics
//!
//! Hash preimages depend on the exact digits, so these follow the
//! ECMA-262 algorithms (`parseInt`, `parseFloat`, `Number()`, `ToUint32`,
//! `Number::toString`) rather than Rust's own `FromStr`/`Display`.

/// `parseInt(text, 10)`: leading whitespace, optional sign, decimal digits.
/// Returns `None` when no digit is found.
pub fn parse_int_prefix(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let (negative, rest) = split_sign(text);
    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    let value: f64 = rest.get(..digits)?.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// `parseFloat(text)`: longest decimal literal prefix after leading whitespace.
/// Returns `None` when no literal is found.
pub fn parse_float_prefix(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let (negative, rest) = split_sign(text);
    let magnitude = if rest.starts_with("Infinity") {
        f64::INFINITY
    } else {
        let len = decimal_literal_len(rest);
        if len == 0 {
            return None;
        }
        rest.get(..len)?.parse().ok()?
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// `Number(text)`: the whole trimmed text must be a numeric literal,
/// the empty string is zero, anything else is NaN.
pub fn to_number(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = text.strip_prefix(prefix) {
            return parse_radix(digits, radix);
        }
    }

    let (negative, rest) = split_sign(text);
    let magnitude = if rest == "Infinity" {
        f64::INFINITY
    } else if !rest.is_empty() && decimal_literal_len(rest) == rest.len() {
        rest.parse().unwrap_or(f64::NAN)
    } else {
        return f64::NAN;
    };
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// `ToUint32`: NaN and infinities map to zero, otherwise truncate and wrap.
#[allow(clippy::as_conversions)]
pub fn to_uint32(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    // rem_euclid keeps the result in [0, 2^32), so the cast is exact
    value.trunc().rem_euclid(4_294_967_296.0) as u32
}

/// `Number.prototype.toString()` for base 10
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let sign = if value < 0.0 { "-" } else { "" };
    // `{:e}` yields the shortest round-tripping digits, e.g. "1.2345e3"
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);

    let k = i32::try_from(digits.len()).unwrap_or(i32::MAX);
    let n = exponent + 1;

    let body = if k <= n && n <= 21 {
        format!("{digits}{}", "0".repeat(usize::try_from(n - k).unwrap_or(0)))
    } else if 0 < n && n <= 21 {
        let split = usize::try_from(n).unwrap_or(0);
        let (int_part, frac_part) = digits.split_at(split.min(digits.len()));
        format!("{int_part}.{frac_part}")
    } else if -6 < n && n <= 0 {
        format!("0.{}{digits}", "0".repeat(usize::try_from(-n).unwrap_or(0)))
    } else {
        let exp_sign = if n - 1 >= 0 { "+" } else { "-" };
        let (first, rest) = digits.split_at(1.min(digits.len()));
        if rest.is_empty() {
            format!("{first}e{exp_sign}{}", (n - 1).abs())
        } else {
            format!("{first}.{rest}e{exp_sign}{}", (n - 1).abs())
        }
    };

    format!("{sign}{body}")
}

fn split_sign(text: &str) -> (bool, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else {
        (false, text.strip_prefix('+').unwrap_or(text))
    }
}

fn parse_radix(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }
    digits
        .chars()
        .try_fold(0.0f64, |acc, c| {
            c.to_digit(radix)
                .map(|d| acc * f64::from(radix) + f64::from(d))
        })
        .unwrap_or(f64::NAN)
}

/// Length of the longest `digits [. digits] [e [sign] digits]` prefix
/// with at least one mantissa digit.
fn decimal_literal_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let count_digits = |from: usize| {
        bytes
            .get(from..)
            .map_or(0, |rest| rest.iter().take_while(|b| b.is_ascii_digit()).count())
    };

    let int_digits = count_digits(0);
    let mut len = int_digits;
    let mut frac_digits = 0;
    if bytes.get(len) == Some(&b'.') {
        frac_digits = count_digits(len + 1);
        if int_digits > 0 || frac_digits > 0 {
            len += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return 0;
    }

    if matches!(bytes.get(len), Some(b'e' | b'E')) {
        let mut exp_start = len + 1;
        if matches!(bytes.get(exp_start), Some(b'+' | b'-')) {
            exp_start += 1;
        }
        let exp_digits = count_digits(exp_start);
        if exp_digits > 0 {
            len = exp_start + exp_digits;
        }
    }
    len
}
