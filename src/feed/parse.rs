//! Text extraction for the gcpgraph / gcpindex payloads.
//!
//! The bulk payload carries one self-closing tag per pixel column:
//!
//! ```text
//! <p i="12" a="0.4312" t="0.9120" q1="0.5511" q3="0.3302" b="0.0402" />
//! ```
//!
//! Anything that does not match that exact shape is skipped. The index page
//! only exposes bare decimals, which [`coarse_high`] scans for.

use crate::series::{QuantileRecord, Series};

const TAG_OPEN: &str = "<p ";
const TAG_CLOSE: &str = " />";
const FIELDS: [&str; 6] = ["i", "a", "t", "q1", "q3", "b"];

/// Bulk parse. Records come back in source order; malformed tags contribute nothing.
pub fn parse_series(text: &str) -> Series {
    let mut records = Vec::new();
    let mut cursor = 0;

    while let Some(found) = text[cursor..].find(TAG_OPEN) {
        let start = cursor + found;
        match match_record(&text[start..]) {
            Some((record, consumed)) => {
                records.push(record);
                cursor = start + consumed;
            }
            None => cursor = start + TAG_OPEN.len(),
        }
    }

    Series::new(records)
}

/// Try to match one tag at the start of `s`. Returns the record and bytes consumed.
fn match_record(s: &str) -> Option<(QuantileRecord, usize)> {
    let mut pos = TAG_OPEN.len();
    let mut values: [&str; 6] = [""; 6];

    for (n, name) in FIELDS.iter().enumerate() {
        if n > 0 {
            pos += expect(&s[pos..], " ")?;
        }
        pos += expect(&s[pos..], name)?;
        pos += expect(&s[pos..], "=\"")?;
        let len = s[pos..]
            .bytes()
            .take_while(|b| b.is_ascii_digit() || (n > 0 && *b == b'.'))
            .count();
        if len == 0 {
            return None;
        }
        values[n] = &s[pos..pos + len];
        pos += len;
        pos += expect(&s[pos..], "\"")?;
    }
    pos += expect(&s[pos..], TAG_CLOSE)?;

    let record = QuantileRecord {
        index: values[0].parse().ok()?,
        average: parse_float_prefix(values[1])?,
        top: parse_float_prefix(values[2])?,
        q1: parse_float_prefix(values[3])?,
        q3: parse_float_prefix(values[4])?,
        bottom: parse_float_prefix(values[5])?,
    };
    Some((record, pos))
}

fn expect(s: &str, token: &str) -> Option<usize> {
    s.starts_with(token).then_some(token.len())
}

/// Parse the longest numeric prefix of a `[0-9.]+` run, so `1.2.3` reads as `1.2`.
fn parse_float_prefix(s: &str) -> Option<f64> {
    let end = match s.find('.') {
        Some(dot) => s[dot + 1..].find('.').map(|n| dot + 1 + n).unwrap_or(s.len()),
        None => s.len(),
    };
    let head = s[..end].trim_end_matches('.');
    if head.is_empty() {
        return None;
    }
    head.parse().ok()
}

/// Coarse scan: the largest `0.<digits>` substring in the payload, or 0.
pub fn coarse_high(text: &str) -> f64 {
    let bytes = text.as_bytes();
    let mut high = 0.0_f64;
    let mut i = 0;

    while i + 2 < bytes.len() {
        if bytes[i] == b'0' && bytes[i + 1] == b'.' && bytes[i + 2].is_ascii_digit() {
            let mut j = i + 2;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if let Ok(v) = text[i..j].parse::<f64>() {
                if v > high {
                    high = v;
                }
            }
            i = j;
        } else {
            i += 1;
        }
    }

    high
}

/// Dot position on the gcpchart page, `<div id="gcpdot12" style="position: absolute; top: 37.5px;`,
/// mapped to a 0-100 percentage (`100 - top`, clamped).
pub fn parse_dot_position(text: &str) -> Option<f64> {
    const PREFIX: &str = "<div id=\"gcpdot";
    const STYLE: &str = "\" style=\"position: absolute; top: ";

    let mut cursor = 0;
    while let Some(found) = text[cursor..].find(PREFIX) {
        let start = cursor + found + PREFIX.len();
        let rest = &text[start..];
        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 {
            if let Some(after) = rest[digits..].strip_prefix(STYLE) {
                let len = after
                    .bytes()
                    .take_while(|b| b.is_ascii_digit() || *b == b'.')
                    .count();
                if len > 0 && after[len..].starts_with("px;") {
                    if let Some(top) = parse_float_prefix(&after[..len]) {
                        return Some((100.0 - top).clamp(0.0, 100.0));
                    }
                }
            }
        }
        cursor = start;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(i: u32, a: f64, t: f64, q1: f64, q3: f64, b: f64) -> String {
        format!(r#"<p i="{}" a="{}" t="{}" q1="{}" q3="{}" b="{}" />"#, i, a, t, q1, q3, b)
    }

    #[test]
    fn test_parses_records_in_order() {
        let text = format!(
            "<gcpstats>\n{}\n{}\n</gcpstats>",
            tag(0, 0.1, 0.05, 0.08, 0.12, 0.15),
            tag(1, 0.2, 0.15, 0.18, 0.22, 0.25)
        );
        let s = parse_series(&text);
        assert_eq!(s.len(), 2);
        let r = s.records();
        assert_eq!(r[0].index, 0);
        assert!((r[0].average - 0.1).abs() < 1e-12);
        assert!((r[0].top - 0.05).abs() < 1e-12);
        assert!((r[0].q1 - 0.08).abs() < 1e-12);
        assert!((r[0].q3 - 0.12).abs() < 1e-12);
        assert!((r[0].bottom - 0.15).abs() < 1e-12);
        assert_eq!(r[1].index, 1);
        assert!((r[1].bottom - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_skips_malformed_tags() {
        let text = concat!(
            r#"<p i="0" a="0.1" t="0.2" />"#,
            r#"<p i="x" a="0.1" t="0.2" q1="0.3" q3="0.4" b="0.5" />"#,
            r#"<p i="2" a="0.1" t="0.2" q1="0.3" q3="0.4" b="0.5" />"#,
            r#"<p i="3" a="" t="0.2" q1="0.3" q3="0.4" b="0.5" />"#,
        );
        let s = parse_series(text);
        assert_eq!(s.len(), 1);
        assert_eq!(s.records()[0].index, 2);
    }

    #[test]
    fn test_keeps_source_order_and_duplicates() {
        let text = format!(
            "{}{}{}",
            tag(5, 0.1, 0.1, 0.1, 0.1, 0.1),
            tag(2, 0.2, 0.2, 0.2, 0.2, 0.2),
            tag(5, 0.3, 0.3, 0.3, 0.3, 0.3)
        );
        let idx: Vec<u32> = parse_series(&text).iter().map(|r| r.index).collect();
        assert_eq!(idx, vec![5, 2, 5]);
    }

    #[test]
    fn test_empty_payload_is_empty_series() {
        assert!(parse_series("").is_empty());
        assert!(parse_series("<html>nothing here</html>").is_empty());
    }

    #[test]
    fn test_float_prefix() {
        assert_eq!(parse_float_prefix("1.2.3"), Some(1.2));
        assert_eq!(parse_float_prefix("0.5"), Some(0.5));
        assert_eq!(parse_float_prefix("7"), Some(7.0));
        assert_eq!(parse_float_prefix("."), None);
    }

    #[test]
    fn test_coarse_high_takes_max() {
        let text = "<td>0.12</td><td>0.873</td><td>0.5</td>";
        assert_eq!(coarse_high(text), 0.873);
        assert_eq!(coarse_high("no digits"), 0.0);
        assert_eq!(coarse_high("1.5 and 2"), 0.0);
    }

    #[test]
    fn test_coarse_high_matches_inside_larger_numbers() {
        // "10.25" contains "0.25"
        assert_eq!(coarse_high("value=10.25"), 0.25);
    }

    #[test]
    fn test_dot_position() {
        let text = r#"<div id="gcpdot123" style="position: absolute; top: 37.5px; left: 2px">"#;
        assert_eq!(parse_dot_position(text), Some(62.5));
        let high = r#"<div id="gcpdot1" style="position: absolute; top: 140px;">"#;
        assert_eq!(parse_dot_position(high), Some(0.0));
        assert_eq!(parse_dot_position("<div id=\"gcpdot\">"), None);
    }
}
