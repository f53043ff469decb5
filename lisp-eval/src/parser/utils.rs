/// Resolves backslash escapes in a string literal body. On failure returns
/// the offending sequence.
pub(crate) fn unescape(s: &str) -> Result<String, String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('0') => result.push('\0'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('u') => result.push(unicode_escape(&mut chars)?),
            Some(other) => return Err(format!("\\{}", other)),
            None => return Err("\\".to_string()),
        }
    }
    Ok(result)
}

/// `\u{1F600}` with the leading `\u` already consumed.
fn unicode_escape(chars: &mut std::str::Chars<'_>) -> Result<char, String> {
    if chars.next() != Some('{') {
        return Err("\\u".to_string());
    }
    let digits: String = chars.by_ref().take_while(|c| *c != '}').collect();
    u32::from_str_radix(&digits, 16)
        .ok()
        .filter(|_| !digits.is_empty() && digits.len() <= 6)
        .and_then(char::from_u32)
        .ok_or_else(|| format!("\\u{{{}}}", digits))
}
