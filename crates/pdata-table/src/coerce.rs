//! Best-effort conversions between cell text and the primitive column types.
//!
//! None of these raise: anything that doesn't parse yields the caller-supplied fallback,
//! which the table passes in as the column's missing value.

pub fn parse_int(text: &str, otherwise: i32) -> i32 {
    let text = text.trim();
    if let Ok(v) = text.parse::<i32>() {
        return v;
    }
    // "12.5" reads as 12: only the integral part counts.
    match text.split_once('.') {
        Some((int_part, _)) => int_part.parse::<i32>().unwrap_or(otherwise),
        None => otherwise,
    }
}

pub fn parse_long(text: &str, otherwise: i64) -> i64 {
    text.trim().parse::<i64>().unwrap_or(otherwise)
}

pub fn parse_float(text: &str, otherwise: f32) -> f32 {
    text.trim().parse::<f32>().unwrap_or(otherwise)
}

pub fn parse_double(text: &str, otherwise: f64) -> f64 {
    text.trim().parse::<f64>().unwrap_or(otherwise)
}

pub(crate) fn parse_opt_int(text: Option<&str>, missing_string: Option<&str>, otherwise: i32) -> i32 {
    match text {
        Some(s) if Some(s) != missing_string => parse_int(s, otherwise),
        _ => otherwise,
    }
}

pub(crate) fn parse_opt_long(
    text: Option<&str>,
    missing_string: Option<&str>,
    otherwise: i64,
) -> i64 {
    match text {
        Some(s) if Some(s) != missing_string => parse_long(s, otherwise),
        _ => otherwise,
    }
}

pub(crate) fn parse_opt_float(
    text: Option<&str>,
    missing_string: Option<&str>,
    otherwise: f32,
) -> f32 {
    match text {
        Some(s) if Some(s) != missing_string => parse_float(s, otherwise),
        _ => otherwise,
    }
}

pub(crate) fn parse_opt_double(
    text: Option<&str>,
    missing_string: Option<&str>,
    otherwise: f64,
) -> f64 {
    match text {
        Some(s) if Some(s) != missing_string => parse_double(s, otherwise),
        _ => otherwise,
    }
}

/// Truncating float -> int conversion; non-finite input maps to `otherwise`.
pub(crate) fn float_to_int(v: f64, otherwise: i32) -> i32 {
    if v.is_finite() {
        v as i32
    } else {
        otherwise
    }
}

pub(crate) fn float_to_long(v: f64, otherwise: i64) -> i64 {
    if v.is_finite() {
        v as i64
    } else {
        otherwise
    }
}

/// Strip every character found in `tokens` from `text`.
pub fn remove_tokens(text: &str, tokens: &str) -> String {
    text.chars().filter(|c| !tokens.contains(*c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_parse_keeps_integral_part() {
        assert_eq!(parse_int("42", -1), 42);
        assert_eq!(parse_int(" +7 ", -1), 7);
        assert_eq!(parse_int("12.9", -1), 12);
        assert_eq!(parse_int("not-a-number", -1), -1);
        assert_eq!(parse_int("", -1), -1);
    }

    #[test]
    fn long_parse_rejects_fractions() {
        assert_eq!(parse_long("9000000000", 0), 9_000_000_000);
        assert_eq!(parse_long("1.5", 3), 3);
    }

    #[test]
    fn float_parse_is_locale_invariant() {
        assert_eq!(parse_float("1.5", 0.0), 1.5);
        assert_eq!(parse_float("1,5", -1.0), -1.0);
        assert!(parse_double("NaN", 0.0).is_nan());
        assert_eq!(parse_double("1e3", 0.0), 1000.0);
    }

    #[test]
    fn missing_string_reads_as_fallback() {
        assert_eq!(parse_opt_int(Some("NA"), Some("NA"), -9), -9);
        assert_eq!(parse_opt_int(None, None, -9), -9);
        assert_eq!(parse_opt_int(Some("5"), Some("NA"), -9), 5);
    }

    #[test]
    fn non_finite_floats_narrow_to_fallback() {
        assert_eq!(float_to_int(f64::NAN, 7), 7);
        assert_eq!(float_to_int(3.99, 7), 3);
        assert_eq!(float_to_long(f64::INFINITY, 1), 1);
    }

    #[test]
    fn remove_tokens_strips_each_character() {
        assert_eq!(remove_tokens("$1,234", "$,"), "1234");
    }
}
