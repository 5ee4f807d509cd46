//! Quote- and escape-aware brace matching.

/// Returns the balanced `{…}` literal at the start of `s`, after any leading
/// whitespace.
///
/// State is a depth counter, an in-string flag that toggles on every
/// unescaped `"`, and an escape flag that any backslash sets and the next
/// byte consumes. Braces only count outside strings. The span ends at the
/// `}` that brings depth back to zero; `None` when `s` does not start with
/// `{` or the literal is unterminated.
pub(crate) fn balanced_object(s: &str) -> Option<&str> {
    let body = s.trim_start();
    if !body.starts_with('{') {
        return None;
    }

    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escape = false;
    for (i, b) in body.bytes().enumerate() {
        if escape {
            escape = false;
            continue;
        }
        match b {
            b'\\' => escape = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&body[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Finds `marker` in `markup` and returns the object literal that follows.
pub(crate) fn object_after_marker<'a>(markup: &'a str, marker: &str) -> Option<&'a str> {
    let start = markup.find(marker)? + marker.len();
    balanced_object(&markup[start..])
}
