// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Small text helpers shared by the routes: query-string codec, gemtext
//! sanitizing and byte-size formatting.

/// Percent-encode per RFC 3986, with space mapped to `+`.
/// Unreserved characters (`-_.~` plus alphanumerics) pass through.
pub fn url_encode(input: &str) -> String {
    const UNRESERVED: &str = "-_.~";
    let mut out = String::with_capacity(input.len() + 8);
    for byte in input.bytes() {
        if byte == b' ' {
            out.push('+');
        } else if byte.is_ascii_alphanumeric() || UNRESERVED.contains(byte as char) {
            out.push(byte as char);
        } else {
            out.push('%');
            out.push_str(&format!("{byte:02X}"));
        }
    }
    out
}

/// Inverse of [`url_encode`]: `+` becomes space, `%XX` decodes to the
/// raw byte. Malformed escapes pass through unchanged.
pub fn url_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => match (hex_value(bytes.get(i + 1)), hex_value(bytes.get(i + 2))) {
                (Some(hi), Some(lo)) => {
                    out.push(hi * 16 + lo);
                    i += 3;
                }
                _ => {
                    out.push(b'%');
                    i += 1;
                }
            },
            other => {
                out.push(other);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: Option<&u8>) -> Option<u8> {
    (*byte? as char).to_digit(16).map(|v| v as u8)
}

/// Flatten a text fragment so it can be embedded in a gemtext line:
/// newlines, tabs and code fences become spaces, and leading gemtext
/// markup characters are trimmed.
pub fn sanitize_gemtext(input: &str) -> String {
    let flat = input
        .replace('\n', " ")
        .replace('\t', " ")
        .replace("```", " ");
    match flat.find(|c: char| !"`*=>#".contains(c)) {
        Some(idx) => flat[idx..].to_string(),
        None => flat,
    }
}

/// Human-readable size for the result metadata line.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_encode_basic() {
        assert_eq!(url_encode("cats and dogs"), "cats+and+dogs");
        assert_eq!(url_encode("a-b_c.d~e"), "a-b_c.d~e");
        assert_eq!(url_encode("50%"), "50%25");
        assert_eq!(url_encode("q?x=1"), "q%3Fx%3D1");
    }

    #[test]
    fn test_url_decode_basic() {
        assert_eq!(url_decode("cats+and+dogs"), "cats and dogs");
        assert_eq!(url_decode("50%25"), "50%");
        assert_eq!(url_decode("q%3Fx%3D1"), "q?x=1");
    }

    #[test]
    fn test_url_decode_malformed_escape_passes_through() {
        assert_eq!(url_decode("100%"), "100%");
        assert_eq!(url_decode("%zz"), "%zz");
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        for input in [
            "plain",
            "with space",
            "content_type:text/gemini",
            "size:>1mi NOT domain:example.com",
            "!@#$%^&*()[]{}<>\"'\\|;:,./?",
        ] {
            assert_eq!(url_decode(&url_encode(input)), input, "roundtrip {input:?}");
        }
    }

    #[test]
    fn test_sanitize_gemtext() {
        assert_eq!(sanitize_gemtext("# Heading"), " Heading");
        assert_eq!(sanitize_gemtext("=> link text"), " link text");
        assert_eq!(sanitize_gemtext("a\nb\tc"), "a b c");
        assert_eq!(sanitize_gemtext("```rust"), " rust");
        // Nothing but markup: returned as-is
        assert_eq!(sanitize_gemtext("#=>`*"), "#=>`*");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MiB");
    }
}
