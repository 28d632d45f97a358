/// Outcome of matching a text against a glob pattern.
///
/// `Abort` means no suffix of the text can match either, so a caller scanning
/// with `*` can stop early. Everything outside this module treats it as a
/// failed match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    Match,
    NoMatch,
    Abort,
}

impl Match {
    pub fn is_match(self) -> bool {
        self == Match::Match
    }
}

/// Match `text` against `pattern` anchored at both ends.
///
/// * `*` zero or more characters
/// * `?` exactly one ASCII letter
/// * `+` exactly one character
/// * `[abc]` / `[!abc]` one character from (or not from) the class
///
/// Everything else matches itself, case-sensitively.
pub fn match_pattern(text: &str, pattern: &str) -> Match {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    match_chars(&text, &pattern)
}

/// Shorthand for callers that only care about success.
pub fn matches(text: &str, pattern: &str) -> bool {
    match_pattern(text, pattern).is_match()
}

/// True when `text` matches any of `patterns`.
pub fn matches_any<P: AsRef<str>>(text: &str, patterns: &[P]) -> bool {
    patterns.iter().any(|p| matches(text, p.as_ref()))
}

fn match_chars(text: &[char], pattern: &[char]) -> Match {
    let mut t = 0;
    let mut p = 0;

    while p < pattern.len() {
        if t >= text.len() && pattern[p] != '*' {
            return Match::Abort;
        }
        match pattern[p] {
            '*' => {
                while p < pattern.len() && pattern[p] == '*' {
                    p += 1;
                }
                if p == pattern.len() {
                    return Match::Match;
                }
                // each recursion consumes one run of stars, so depth is bounded
                while t < text.len() {
                    let rv = match_chars(&text[t..], &pattern[p..]);
                    if rv != Match::NoMatch {
                        return rv;
                    }
                    t += 1;
                }
                return Match::Abort;
            }
            '?' => {
                if !text[t].is_ascii_alphabetic() {
                    return Match::Abort;
                }
            }
            '+' => {}
            '[' => {
                p += 1;
                let mut negate = false;
                if p < pattern.len() && pattern[p] == '!' {
                    p += 1;
                    negate = p < pattern.len() && pattern[p] != ']';
                }
                let mut found = false;
                loop {
                    match pattern.get(p) {
                        None | Some('[') => return Match::Abort,
                        Some(']') => break,
                        Some(c) => {
                            if *c == text[t] {
                                found = true;
                            }
                            p += 1;
                        }
                    }
                }
                if found == negate {
                    return Match::Abort;
                }
            }
            c => {
                if text[t] != c {
                    return Match::NoMatch;
                }
            }
        }
        t += 1;
        p += 1;
    }

    if t == text.len() {
        Match::Match
    } else {
        Match::NoMatch
    }
}
