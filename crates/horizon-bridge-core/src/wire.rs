//! Helpers for the native list syntax.
//!
//! Native list values are whitespace separated; elements that contain
//! whitespace are wrapped in braces (`{two words}`) or double quotes, and a
//! backslash escapes the next character outside braces. [`split_list`] parses
//! a whole list in one pass instead of round-tripping through the native
//! layer once per element.

use crate::error::{BridgeError, Result};

const CODEC: &str = "list";

/// Split a native list into its elements.
///
/// Nested lists are returned as their literal text and are not parsed
/// recursively.
pub fn split_list(input: &str) -> Result<Vec<String>> {
    let chars: Vec<char> = input.chars().collect();
    let mut items = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }

        match chars[i] {
            '{' => {
                let (item, next) = read_braced(&chars, i, input)?;
                items.push(item);
                i = next;
            }
            '"' => {
                let (item, next) = read_quoted(&chars, i, input)?;
                items.push(item);
                i = next;
            }
            _ => {
                let mut item = String::new();
                while i < chars.len() && !chars[i].is_whitespace() {
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        item.push(unescape(chars[i + 1]));
                        i += 2;
                    } else {
                        item.push(chars[i]);
                        i += 1;
                    }
                }
                items.push(item);
            }
        }
    }

    Ok(items)
}

fn read_braced(chars: &[char], start: usize, input: &str) -> Result<(String, usize)> {
    let mut depth = 0usize;
    let mut item = String::new();
    let mut i = start;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' if i + 1 < chars.len() => {
                // Escapes are preserved verbatim inside braces.
                item.push(c);
                item.push(chars[i + 1]);
                i += 2;
                continue;
            }
            '{' => {
                depth += 1;
                if depth > 1 {
                    item.push(c);
                }
            }
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let next = i + 1;
                    if next < chars.len() && !chars[next].is_whitespace() {
                        return Err(BridgeError::conversion(
                            CODEC,
                            input,
                            "list element in braces followed by non-space character",
                        ));
                    }
                    return Ok((item, next));
                }
                item.push(c);
            }
            _ => item.push(c),
        }
        i += 1;
    }

    Err(BridgeError::conversion(CODEC, input, "unmatched open brace in list"))
}

fn read_quoted(chars: &[char], start: usize, input: &str) -> Result<(String, usize)> {
    let mut item = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        match chars[i] {
            '\\' if i + 1 < chars.len() => {
                item.push(unescape(chars[i + 1]));
                i += 2;
            }
            '"' => {
                let next = i + 1;
                if next < chars.len() && !chars[next].is_whitespace() {
                    return Err(BridgeError::conversion(
                        CODEC,
                        input,
                        "list element in quotes followed by non-space character",
                    ));
                }
                return Ok((item, next));
            }
            c => {
                item.push(c);
                i += 1;
            }
        }
    }

    Err(BridgeError::conversion(CODEC, input, "unmatched open quote in list"))
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        other => other,
    }
}

/// Quote a single element so that [`split_list`] returns it unchanged.
pub fn quote_element(element: &str) -> String {
    if element.is_empty() {
        return "{}".to_string();
    }

    let needs_quoting = element
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '"' | '\\' | '[' | ']' | '$' | ';'));
    if !needs_quoting {
        return element.to_string();
    }

    if braces_balanced(element) && !element.contains('\\') {
        return format!("{{{element}}}");
    }

    let mut out = String::with_capacity(element.len() * 2);
    for c in element.chars() {
        match c {
            '{' | '}' | '"' | '\\' | '[' | ']' | '$' | ';' | ' ' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

fn braces_balanced(s: &str) -> bool {
    let mut depth: i64 = 0;
    for c in s.chars() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Join elements into a native list, quoting where needed.
pub fn join_list<I, S>(elements: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    elements
        .into_iter()
        .map(|e| quote_element(e.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}
