use std::future::Future;

use serde_json::Value;

use super::LiteralEvaluator;
use crate::error::EvalError;

/// In-process evaluator for the object-literal dialect vendor pages emit.
///
/// Accepts single-quoted strings, unquoted keys, trailing commas, comments,
/// `undefined`/`NaN`/`Infinity` (as `null`), minifier booleans `!0`/`!1`,
/// and `\xNN` escapes. Anything executable (calls, variables, operators) is
/// rejected rather than evaluated.
///
/// Work runs on the blocking pool, so the extractor's evaluation timeout
/// bounds it like any other evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelaxedLiteralEvaluator;

impl LiteralEvaluator for RelaxedLiteralEvaluator {
    fn evaluate(&self, literal: &str) -> impl Future<Output = Result<Value, EvalError>> + Send {
        let literal = literal.to_owned();
        async move {
            tokio::task::spawn_blocking(move || {
                normalize_literal(&literal).and_then(|json| {
                    serde_json::from_str(&json).map_err(|e| EvalError::Syntax {
                        reason: e.to_string(),
                    })
                })
            })
            .await?
        }
    }
}

/// Rewrites a relaxed object literal into strict JSON text.
///
/// # Errors
///
/// Returns [`EvalError::Syntax`] for unterminated strings or comments and for
/// bare identifiers that are neither keys nor known constants.
pub fn normalize_literal(src: &str) -> Result<String, EvalError> {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' => {
                i = read_string(&chars, i, &mut out)?;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                let close = (i + 2..chars.len().saturating_sub(1))
                    .find(|&j| chars[j] == '*' && chars[j + 1] == '/')
                    .ok_or_else(|| syntax("unterminated comment"))?;
                i = close + 2;
            }
            '}' | ']' => {
                drop_trailing_comma(&mut out);
                out.push(c);
                i += 1;
            }
            '!' => {
                let literal = match chars.get(i + 1) {
                    Some('0') => "true",
                    Some('1') => "false",
                    _ => return Err(syntax("unsupported '!' expression")),
                };
                out.push_str(literal);
                i += 2;
            }
            '-' if starts_with_word(&chars, i + 1, "Infinity") => {
                out.push_str("null");
                i += 1 + "Infinity".len();
            }
            c if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '$')
                {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                if next_non_space(&chars, i) == Some(':') {
                    push_json_string(&mut out, &word);
                } else {
                    out.push_str(constant(&word)?);
                }
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                let (end, number) = read_number(&chars, i)?;
                i = end;
                if next_non_space(&chars, i) == Some(':') {
                    push_json_string(&mut out, &number);
                } else {
                    out.push_str(&number);
                }
            }
            '{' | '[' | ':' | ',' => {
                out.push(c);
                i += 1;
            }
            c if c.is_whitespace() => {
                out.push(' ');
                i += 1;
            }
            other => return Err(syntax(&format!("unexpected character '{other}'"))),
        }
    }

    Ok(out)
}

fn syntax(reason: &str) -> EvalError {
    EvalError::Syntax {
        reason: reason.to_owned(),
    }
}

fn constant(word: &str) -> Result<&'static str, EvalError> {
    match word {
        "true" => Ok("true"),
        "false" => Ok("false"),
        "null" | "undefined" | "NaN" | "Infinity" => Ok("null"),
        other => Err(syntax(&format!("identifier '{other}' is not a literal"))),
    }
}

fn starts_with_word(chars: &[char], at: usize, word: &str) -> bool {
    let end = at + word.chars().count();
    end <= chars.len()
        && chars[at..end].iter().copied().eq(word.chars())
        && !chars
            .get(end)
            .is_some_and(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '$')
}

fn next_non_space(chars: &[char], from: usize) -> Option<char> {
    chars[from..].iter().copied().find(|c| !c.is_whitespace())
}

fn drop_trailing_comma(out: &mut String) {
    let trimmed_len = out.trim_end().len();
    if out[..trimmed_len].ends_with(',') {
        out.truncate(trimmed_len - 1);
    }
}

/// Copies a quoted string starting at `start` as a JSON string; returns the
/// index just past the closing quote.
fn read_string(chars: &[char], start: usize, out: &mut String) -> Result<usize, EvalError> {
    let quote = chars[start];
    let mut value = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        let c = chars[i];
        if c == quote {
            push_json_string(out, &value);
            return Ok(i + 1);
        }
        if c != '\\' {
            value.push(c);
            i += 1;
            continue;
        }

        let escaped = *chars
            .get(i + 1)
            .ok_or_else(|| syntax("unterminated escape"))?;
        i += 2;
        match escaped {
            'n' => value.push('\n'),
            't' => value.push('\t'),
            'r' => value.push('\r'),
            'b' => value.push('\u{8}'),
            'f' => value.push('\u{c}'),
            'v' => value.push('\u{b}'),
            '0' => value.push('\0'),
            'x' => {
                let code = hex_code(chars, i, 2)?;
                value.push(char::from_u32(code).ok_or_else(|| syntax("invalid \\x escape"))?);
                i += 2;
            }
            'u' => {
                let (ch, consumed) = unicode_escape(chars, i)?;
                value.push(ch);
                i += consumed;
            }
            '\n' => {}
            other => value.push(other),
        }
    }

    Err(syntax("unterminated string"))
}

fn hex_code(chars: &[char], at: usize, len: usize) -> Result<u32, EvalError> {
    let digits: String = chars
        .get(at..at + len)
        .ok_or_else(|| syntax("truncated escape"))?
        .iter()
        .collect();
    u32::from_str_radix(&digits, 16).map_err(|_| syntax("invalid hex escape"))
}

/// Decodes `\uXXXX` (joining surrogate pairs) or `\u{X…}`; returns the char
/// and how many chars after `u` were consumed.
fn unicode_escape(chars: &[char], at: usize) -> Result<(char, usize), EvalError> {
    if chars.get(at) == Some(&'{') {
        let close = chars[at..]
            .iter()
            .position(|&c| c == '}')
            .ok_or_else(|| syntax("unterminated \\u{} escape"))?;
        let code = hex_code(chars, at + 1, close - 1)?;
        let ch = char::from_u32(code).ok_or_else(|| syntax("invalid code point"))?;
        return Ok((ch, close + 1));
    }

    let high = hex_code(chars, at, 4)?;
    if (0xD800..0xDC00).contains(&high)
        && chars.get(at + 4) == Some(&'\\')
        && chars.get(at + 5) == Some(&'u')
    {
        let low = hex_code(chars, at + 6, 4)?;
        if (0xDC00..0xE000).contains(&low) {
            let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
            let ch = char::from_u32(code).ok_or_else(|| syntax("invalid surrogate pair"))?;
            return Ok((ch, 10));
        }
    }
    Ok((char::from_u32(high).unwrap_or('\u{FFFD}'), 4))
}

/// Reads a numeric literal starting at `start` and returns the index past it
/// together with its JSON rendering.
fn read_number(chars: &[char], start: usize) -> Result<(usize, String), EvalError> {
    let mut i = start;
    while i < chars.len()
        && (chars[i].is_ascii_alphanumeric() || matches!(chars[i], '.' | '+' | '-'))
    {
        i += 1;
    }
    let raw: String = chars[start..i].iter().collect();
    let raw = raw.strip_prefix('+').unwrap_or(&raw);
    let (sign, digits) = raw.strip_prefix('-').map_or(("", raw), |rest| ("-", rest));

    let number = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16)
            .map_err(|_| syntax(&format!("invalid number '{raw}'")))?
            .to_string()
    } else {
        let parsed: f64 = digits
            .parse()
            .map_err(|_| syntax(&format!("invalid number '{raw}'")))?;
        if digits.contains(['.', 'e', 'E']) {
            serde_json::Number::from_f64(parsed)
                .map_or_else(|| "null".to_owned(), |n| n.to_string())
        } else {
            digits.trim_start_matches('0').to_owned()
        }
    };

    let number = if number.is_empty() { "0".to_owned() } else { number };
    Ok((i, format!("{sign}{number}")))
}

fn push_json_string(out: &mut String, value: &str) {
    out.push_str(&Value::String(value.to_owned()).to_string());
}

#[cfg(test)]
#[path = "relaxed_test.rs"]
mod tests;
