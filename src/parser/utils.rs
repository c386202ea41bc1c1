// String literal helpers

use super::errors::ParseError;

/// Resolve backslash escapes in a string literal body.
pub(super) fn unescape(content: &str) -> Result<String, ParseError> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('\'') => result.push('\''),
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some(other) => {
                return Err(ParseError::InvalidEscape { sequence: other.to_string() });
            }
            None => {
                return Err(ParseError::InvalidEscape { sequence: String::new() });
            }
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_escapes() {
        assert_eq!(unescape("a\\nb").unwrap(), "a\nb");
        assert_eq!(unescape("say \\\"hi\\\"").unwrap(), "say \"hi\"");
        assert_eq!(unescape("back\\\\slash").unwrap(), "back\\slash");
    }

    #[test]
    fn rejects_unknown_escapes() {
        assert!(unescape("\\q").is_err());
        assert!(unescape("dangling\\").is_err());
    }
}
