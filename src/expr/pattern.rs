/// Convert a SQL LIKE pattern to an anchored regex pattern.
/// `%` matches zero or more characters, `_` exactly one; a backslash
/// escapes the following character. Everything else is literal.
fn like_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 2);
    out.push('^');
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            '\\' => {
                // A trailing backslash stands for itself.
                let escaped = chars.next().unwrap_or('\\');
                out.push_str(&regex::escape(escaped.encode_utf8(&mut [0; 4])));
            }
            literal => out.push_str(&regex::escape(literal.encode_utf8(&mut [0; 4]))),
        }
    }
    out.push('$');
    out
}

/// Evaluate LIKE pattern matching, anchored start to end and case-sensitive.
/// An unparsable pattern matches nothing.
pub fn eval_like(text: &str, pattern: &str) -> bool {
    match regex::Regex::new(&like_to_regex(pattern)) {
        Ok(re) => re.is_match(text),
        Err(_) => false,
    }
}

/// Length of the literal prefix before the first wildcard, used by the
/// histogram selectivity model for prefix-anchored patterns.
pub fn literal_prefix_len(pattern: &str) -> usize {
    pattern
        .chars()
        .take_while(|c| *c != '%' && *c != '_')
        .count()
}
