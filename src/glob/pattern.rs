// Shell-style glob matching over slash-separated relative paths.
//
// `*` and `?` never cross a `/`; a bare `**` segment matches any number of
// path segments, including none. Character classes support ranges and
// negation via `[!...]` or `[^...]`.

/// True if the pattern contains any glob metacharacters.
pub fn is_wildcarded(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?') || pattern.contains('[')
}

/// Match a whole relative path against a glob pattern.
pub fn matches(path: &str, pattern: &str) -> bool {
    let path_segments: Vec<&str> = path.split('/').collect();
    let pattern_segments: Vec<&str> = pattern.split('/').collect();
    match_segments(&pattern_segments, &path_segments)
}

fn match_segments(pattern: &[&str], path: &[&str]) -> bool {
    let Some((first, rest)) = pattern.split_first() else {
        return path.is_empty();
    };
    if *first == "**" {
        // `**` may swallow zero or more leading segments.
        return (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]));
    }
    let Some((segment, remaining)) = path.split_first() else {
        return false;
    };
    let pattern_chars: Vec<char> = first.chars().collect();
    let segment_chars: Vec<char> = segment.chars().collect();
    match_chars(&pattern_chars, 0, &segment_chars, 0) && match_segments(rest, remaining)
}

/// Recursive single-segment matching with backtracking for `*`.
fn match_chars(pattern: &[char], pi: usize, input: &[char], ii: usize) -> bool {
    if pi >= pattern.len() {
        return ii >= input.len();
    }

    match pattern[pi] {
        '*' => {
            // Collapse consecutive stars.
            let mut next_pi = pi;
            while next_pi < pattern.len() && pattern[next_pi] == '*' {
                next_pi += 1;
            }
            if next_pi >= pattern.len() {
                return true;
            }
            (0..=(input.len() - ii)).any(|skip| match_chars(pattern, next_pi, input, ii + skip))
        }

        '?' => ii < input.len() && match_chars(pattern, pi + 1, input, ii + 1),

        '[' => {
            if ii >= input.len() {
                return false;
            }
            let (matched, consumed) = match_char_class(&pattern[pi..], input[ii]);
            matched && match_chars(pattern, pi + consumed, input, ii + 1)
        }

        c => ii < input.len() && c == input[ii] && match_chars(pattern, pi + 1, input, ii + 1),
    }
}

/// Match one character against a `[...]` class, returning whether it
/// matched and how many pattern characters the class consumed. An unclosed
/// bracket is treated as a literal `[`.
fn match_char_class(pattern: &[char], ch: char) -> (bool, usize) {
    let mut idx = 1;
    let mut negate = false;
    if idx < pattern.len() && (pattern[idx] == '!' || pattern[idx] == '^') {
        negate = true;
        idx += 1;
    }

    let first = idx;
    let mut matched = false;
    let mut closed = false;
    while idx < pattern.len() {
        let c = pattern[idx];
        if c == ']' && idx > first {
            closed = true;
            idx += 1;
            break;
        }
        if idx + 2 < pattern.len() && pattern[idx + 1] == '-' && pattern[idx + 2] != ']' {
            if ch >= c && ch <= pattern[idx + 2] {
                matched = true;
            }
            idx += 3;
            continue;
        }
        if c == ch {
            matched = true;
        }
        idx += 1;
    }

    if !closed {
        return (ch == '[', 1);
    }
    (if negate { !matched } else { matched }, idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_classification() {
        assert!(is_wildcarded("*.java"));
        assert!(is_wildcarded("Foo?.java"));
        assert!(is_wildcarded("[Ff]oo.java"));
        assert!(!is_wildcarded("src/Foo.java"));
    }

    #[test]
    fn literal_matches_whole_path_only() {
        assert!(matches("Foo.java", "Foo.java"));
        assert!(matches("src/Foo.java", "src/Foo.java"));
        assert!(!matches("src/Foo.java", "Foo.java"));
        assert!(!matches("Foo.java", "Foo"));
    }

    #[test]
    fn star_does_not_cross_separators() {
        assert!(matches("Foo.java", "*.java"));
        assert!(matches(".hidden.java", "*.java"));
        assert!(!matches("src/Foo.java", "*.java"));
        assert!(matches("src/Foo.java", "src/*.java"));
        assert!(matches("src/Foo.java", "*/*.java"));
        assert!(!matches("src/main/Foo.java", "*/*.java"));
    }

    #[test]
    fn double_star_crosses_directories() {
        assert!(matches("Foo.java", "**/*.java"));
        assert!(matches("src/Foo.java", "**/*.java"));
        assert!(matches("src/main/java/Foo.java", "**/*.java"));
        assert!(matches("src/main/java/Foo.java", "src/**/*.java"));
        assert!(matches("src/Foo.java", "src/**/*.java"));
        assert!(!matches("lib/Foo.java", "src/**/*.java"));
        assert!(!matches("src/Foo.c", "src/**/*.java"));
    }

    #[test]
    fn question_and_classes() {
        assert!(matches("file1.txt", "file?.txt"));
        assert!(!matches("file10.txt", "file?.txt"));
        assert!(matches("file5.txt", "file[0-9].txt"));
        assert!(!matches("filea.txt", "file[0-9].txt"));
        assert!(matches("Foo.java", "[Ff]oo.java"));
        assert!(matches("x.txt", "[!0-9].txt"));
        assert!(!matches("5.txt", "[!0-9].txt"));
    }

    #[test]
    fn unclosed_bracket_is_literal() {
        assert!(matches("a[b", "a[b"));
        assert!(!matches("aXb", "a[b"));
    }

    #[test]
    fn within_segment_double_star_behaves_like_star() {
        assert!(matches("ab", "a**b"));
        assert!(matches("aXYZb", "a**b"));
        assert!(!matches("a/b", "a**b"));
    }
}
