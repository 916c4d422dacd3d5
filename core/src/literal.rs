//! Decoding of PHP scalar literals used as array keys.
//!
//! Only the literal forms a strict PHP parser folds into plain string or
//! integer scalars are decoded here. Anything else is left to the caller to
//! classify as a dynamic key.

/// Decode a single-quoted string literal, including an optional `b` prefix.
///
/// Inside single quotes only `\\` and `\'` are escapes; every other
/// backslash is kept verbatim.
pub fn single_quoted(raw: &str) -> Option<String> {
    let body = strip_binary_prefix(raw)
        .strip_prefix('\'')?
        .strip_suffix('\'')?;
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some(&next @ ('\\' | '\'')) => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Decode a double-quoted string literal without interpolation.
pub fn double_quoted(raw: &str) -> Option<String> {
    let body = strip_binary_prefix(raw)
        .strip_prefix('"')?
        .strip_suffix('"')?;
    Some(unescape(body, Some('"')))
}

/// Decode a heredoc (`<<<ID` / `<<<"ID"`) or nowdoc (`<<<'ID'`) literal.
///
/// The closing marker's indentation is removed from every body line. Heredoc
/// bodies get double-quote escape processing, except for `\"`.
pub fn heredoc(raw: &str) -> Option<String> {
    let raw = strip_binary_prefix(raw).trim_end_matches(['\r', '\n']);
    let (opener, rest) = raw.split_once('\n')?;
    let label = opener.trim().strip_prefix("<<<")?.trim();
    let nowdoc = label.starts_with('\'');

    let (body, closing) = match rest.rsplit_once('\n') {
        Some((body, closing)) => (Some(body), closing),
        None => (None, rest),
    };
    let indent_len = closing.len() - closing.trim_start().len();
    let indent = &closing[..indent_len];

    let text = match body {
        Some(body) => body
            .split('\n')
            .map(|line| {
                let line = line.strip_suffix('\r').unwrap_or(line);
                line.strip_prefix(indent).unwrap_or(line.trim_start())
            })
            .collect::<Vec<_>>()
            .join("\n"),
        None => String::new(),
    };

    if nowdoc {
        Some(text)
    } else {
        Some(unescape(&text, None))
    }
}

/// Parse an integer literal in any base PHP accepts.
///
/// Returns `None` when the value does not fit in `i64`; PHP turns such
/// literals into floats, which are not integer keys.
pub fn integer(raw: &str) -> Option<i64> {
    let digits: String = raw.chars().filter(|c| *c != '_').collect();
    let lower = digits.to_ascii_lowercase();
    let (radix, body) = if let Some(hex) = lower.strip_prefix("0x") {
        (16, hex)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        (2, bin)
    } else if let Some(oct) = lower.strip_prefix("0o") {
        (8, oct)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (8, &lower[1..])
    } else {
        (10, lower.as_str())
    };
    if body.is_empty() {
        return None;
    }
    i64::from_str_radix(body, radix).ok()
}

fn strip_binary_prefix(raw: &str) -> &str {
    raw.strip_prefix(['b', 'B']).unwrap_or(raw)
}

/// Process the escapes of a double-quoted or heredoc body.
///
/// `quote` is the delimiter that may be escaped (`Some('"')` for double
/// quotes, `None` for heredocs).
fn unescape(body: &str, quote: Option<char>) -> String {
    let bytes = body.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b != b'\\' || i + 1 >= bytes.len() {
            out.push(b);
            i += 1;
            continue;
        }
        let next = bytes[i + 1];
        let simple = match next {
            b'n' => Some(b'\n'),
            b't' => Some(b'\t'),
            b'r' => Some(b'\r'),
            b'v' => Some(0x0b),
            b'e' => Some(0x1b),
            b'f' => Some(0x0c),
            b'\\' => Some(b'\\'),
            b'$' => Some(b'$'),
            b'"' if quote == Some('"') => Some(b'"'),
            _ => None,
        };
        if let Some(decoded) = simple {
            out.push(decoded);
            i += 2;
            continue;
        }
        match next {
            b'0'..=b'7' => {
                let end = scan_while(bytes, i + 1, 3, |c| (b'0'..=b'7').contains(&c));
                let value = parse_ascii_radix(&bytes[i + 1..end], 8);
                out.push((value & 0xff) as u8);
                i = end;
            }
            b'x' => {
                let end = scan_while(bytes, i + 2, 2, |c| c.is_ascii_hexdigit());
                if end == i + 2 {
                    out.extend_from_slice(b"\\x");
                    i += 2;
                } else {
                    out.push(parse_ascii_radix(&bytes[i + 2..end], 16) as u8);
                    i = end;
                }
            }
            b'u' => match decode_unicode_escape(bytes, i) {
                Some((ch, end)) => {
                    let mut buf = [0u8; 4];
                    out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                    i = end;
                }
                None => {
                    out.extend_from_slice(b"\\u");
                    i += 2;
                }
            },
            _ => {
                out.push(b'\\');
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn scan_while(bytes: &[u8], start: usize, max: usize, pred: impl Fn(u8) -> bool) -> usize {
    let mut end = start;
    while end < bytes.len() && end - start < max && pred(bytes[end]) {
        end += 1;
    }
    end
}

fn parse_ascii_radix(digits: &[u8], radix: u32) -> u32 {
    digits.iter().fold(0u32, |acc, d| {
        acc * radix + (*d as char).to_digit(radix).unwrap_or(0)
    })
}

/// `\u{1F600}` starting at `start` (the backslash). Returns the character and
/// the index just past the closing brace.
fn decode_unicode_escape(bytes: &[u8], start: usize) -> Option<(char, usize)> {
    if bytes.get(start + 2) != Some(&b'{') {
        return None;
    }
    let digits_start = start + 3;
    let close = bytes[digits_start..].iter().position(|b| *b == b'}')? + digits_start;
    let digits = std::str::from_utf8(&bytes[digits_start..close]).ok()?;
    let code = u32::from_str_radix(digits, 16).ok()?;
    Some((char::from_u32(code)?, close + 1))
}
