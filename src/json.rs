use crate::error::FormatError;
use crate::record::Fields;
use serde::Serialize;
use serde_json::ser::Formatter;
use std::io;

/// Escapes written for HTML-sensitive characters, paired with the literal
/// byte they stand for.
const HTML_ESCAPES: [(&[u8], u8); 3] = [
    (b"\\u003c", b'<'),
    (b"\\u003e", b'>'),
    (b"\\u0026", b'&'),
];

/// Compact JSON formatter that also escapes `<`, `>` and `&` in strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlSafeFormatter;

impl Formatter for HtmlSafeFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let bytes = fragment.as_bytes();
        let mut start = 0;

        for (i, &byte) in bytes.iter().enumerate() {
            let escape: &[u8] = match byte {
                b'<' => HTML_ESCAPES[0].0,
                b'>' => HTML_ESCAPES[1].0,
                b'&' => HTML_ESCAPES[2].0,
                _ => continue,
            };
            if start < i {
                writer.write_all(&bytes[start..i])?;
            }
            writer.write_all(escape)?;
            start = i + 1;
        }

        if start < bytes.len() {
            writer.write_all(&bytes[start..])?;
        }
        Ok(())
    }
}

/// Encode `fields` as one JSON object followed by `\n`.
///
/// With `html_escaping_disabled` the `<`, `>` and `&` escapes are turned
/// back into literal characters after encoding.
pub fn serialize(fields: &Fields, html_escaping_disabled: bool) -> Result<Vec<u8>, FormatError> {
    let mut buf = Vec::with_capacity(128);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, HtmlSafeFormatter);
    fields.serialize(&mut ser).map_err(FormatError::Marshal)?;

    if html_escaping_disabled {
        buf = unescape_html(&buf);
    }

    buf.push(b'\n');
    Ok(buf)
}

/// Replace `\u003c`, `\u003e` and `\u0026` escapes in encoded JSON with
/// `<`, `>` and `&`.
///
/// Only real escape sequences are replaced: a backslash that is itself
/// escaped (`\\u003c`) is copied through, as is every other escape.
pub fn unescape_html(encoded: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded.len());
    let mut i = 0;

    while i < encoded.len() {
        if encoded[i] != b'\\' {
            out.push(encoded[i]);
            i += 1;
            continue;
        }

        let rest = &encoded[i..];
        if let Some((_, literal)) = HTML_ESCAPES.iter().find(|(esc, _)| rest.starts_with(*esc)) {
            out.push(*literal);
            i += 6;
        } else {
            // copy the backslash with the byte it escapes
            let end = (i + 2).min(encoded.len());
            out.extend_from_slice(&encoded[i..end]);
            i = end;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldValue;

    fn fields(pairs: &[(&str, FieldValue)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn escapes_html_characters_by_default() {
        let out = serialize(&fields(&[("v", "<b>&amp;</b>".into())]), false).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"v\":\"\\u003cb\\u003e\\u0026amp;\\u003c/b\\u003e\"}\n"
        );
    }

    #[test]
    fn escapes_html_characters_in_keys() {
        let out = serialize(&fields(&[("a<b", 1.into())]), false).unwrap();
        assert_eq!(out, b"{\"a\\u003cb\":1}\n");
    }

    #[test]
    fn disabled_escaping_writes_literal_characters() {
        let out = serialize(&fields(&[("v", "<b>&amp;</b>".into())]), true).unwrap();
        assert_eq!(out, b"{\"v\":\"<b>&amp;</b>\"}\n");
    }

    #[test]
    fn disabled_escaping_keeps_other_escapes() {
        let out = serialize(&fields(&[("v", "a\"b\\c\nd<".into())]), true).unwrap();
        assert_eq!(out, b"{\"v\":\"a\\\"b\\\\c\\nd<\"}\n");
    }

    #[test]
    fn literal_escape_text_in_values_survives_unescaping() {
        let out = serialize(&fields(&[("v", "\\u003c".into())]), true).unwrap();
        assert_eq!(out, b"{\"v\":\"\\\\u003c\"}\n");
        let text = std::str::from_utf8(&out).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(parsed["v"], "\\u003c");
    }

    #[test]
    fn unescape_leaves_unrelated_unicode_escapes() {
        assert_eq!(unescape_html(b"\"\\u001f\\u003e\""), b"\"\\u001f>\"");
    }

    #[test]
    fn marshal_failure_returns_wrapped_error() {
        let err = serialize(&fields(&[("x", FieldValue::Float(f64::INFINITY))]), false)
            .unwrap_err();
        assert!(matches!(err, FormatError::Marshal(_)));
        assert!(err
            .to_string()
            .starts_with("failed to marshal fields to JSON: "));
    }

    #[test]
    fn empty_mapping_is_an_empty_object() {
        assert_eq!(serialize(&Fields::new(), false).unwrap(), b"{}\n");
    }
}
