use std::borrow::Cow;

/// One element of the child's argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Quoted on serialization if needed.
    Regular(String),
    /// Already quoted, emitted verbatim.
    Raw(String),
}

impl Arg {
    pub fn as_str(&self) -> &str {
        match self {
            Arg::Regular(s) | Arg::Raw(s) => s,
        }
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Regular(s)
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Regular(s.to_string())
    }
}

/// Quotes `arg` so that `CommandLineToArgvW` and the MSVC runtime split it
/// back into exactly `arg`.
pub fn quote(arg: &str) -> Cow<'_, str> {
    if !arg.is_empty() && !arg.contains([' ', '\t', '"']) {
        return Cow::Borrowed(arg);
    }

    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    let mut backslashes = 0;
    for c in arg.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                out.extend(std::iter::repeat('\\').take(backslashes * 2 + 1));
                out.push('"');
                backslashes = 0;
            }
            c => {
                out.extend(std::iter::repeat('\\').take(backslashes));
                out.push(c);
                backslashes = 0;
            }
        }
    }
    out.extend(std::iter::repeat('\\').take(backslashes * 2));
    out.push('"');
    Cow::Owned(out)
}

/// Joins the argument vector into one command line.
pub fn make_command_line(args: &[Arg]) -> String {
    let mut line = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            line.push(' ');
        }
        match arg {
            Arg::Regular(s) => line.push_str(&quote(s)),
            Arg::Raw(s) => line.push_str(s),
        }
    }
    line
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Splits a command line the way `CommandLineToArgvW` does for arguments
    /// after the program name.
    pub(crate) fn split_command_line(line: &str) -> Vec<String> {
        let chars: Vec<char> = line.chars().collect();
        let mut args = vec![];
        let mut i = 0;
        loop {
            while i < chars.len() && (chars[i] == ' ' || chars[i] == '\t') {
                i += 1;
            }
            if i >= chars.len() {
                break;
            }
            let mut arg = String::new();
            let mut quoted = false;
            while i < chars.len() {
                let c = chars[i];
                if c == '\\' {
                    let mut n = 0;
                    while i < chars.len() && chars[i] == '\\' {
                        n += 1;
                        i += 1;
                    }
                    if i < chars.len() && chars[i] == '"' {
                        arg.extend(std::iter::repeat('\\').take(n / 2));
                        if n % 2 == 1 {
                            arg.push('"');
                            i += 1;
                        }
                    } else {
                        arg.extend(std::iter::repeat('\\').take(n));
                    }
                    continue;
                }
                if c == '"' {
                    if quoted && chars.get(i + 1) == Some(&'"') {
                        arg.push('"');
                        i += 2;
                        continue;
                    }
                    quoted = !quoted;
                    i += 1;
                    continue;
                }
                if !quoted && (c == ' ' || c == '\t') {
                    break;
                }
                arg.push(c);
                i += 1;
            }
            args.push(arg);
        }
        args
    }

    #[test]
    fn plain_arguments_are_untouched() {
        assert_eq!(quote("hello"), "hello");
        assert_eq!(quote("C:\\path\\"), "C:\\path\\");
        assert!(matches!(quote("x"), Cow::Borrowed(_)));
    }

    #[test]
    fn spaces_and_quotes_are_wrapped() {
        assert_eq!(quote("a b"), "\"a b\"");
        assert_eq!(quote("a\tb"), "\"a\tb\"");
        assert_eq!(quote(""), "\"\"");
        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn backslashes_before_quotes_are_doubled() {
        // a\"b -> "a\\\"b"
        assert_eq!(quote("a\\\"b"), "\"a\\\\\\\"b\"");
        // C:\dir with space\ -> "C:\dir with space\\"
        assert_eq!(quote("C:\\dir with space\\"), "\"C:\\dir with space\\\\\"");
        // interior backslashes stay single
        assert_eq!(quote("a\\b c"), "\"a\\b c\"");
    }

    #[test]
    fn command_line_joins_and_keeps_raw_arguments() {
        let args = vec![
            Arg::from("C:\\Windows\\System32\\cmd.exe"),
            Arg::from("/D"),
            Arg::Raw("\"C:\\x y\\run.bat\"".into()),
            Arg::from("a b"),
        ];
        assert_eq!(
            make_command_line(&args),
            "C:\\Windows\\System32\\cmd.exe /D \"C:\\x y\\run.bat\" \"a b\""
        );
    }

    #[test]
    fn splitter_agrees_with_known_lines() {
        assert_eq!(split_command_line(r#"a "b c" d"#), ["a", "b c", "d"]);
        assert_eq!(split_command_line(r#""a\"b""#), ["a\"b"]);
        assert_eq!(split_command_line(r#"a\\\\"b c" d"#), ["a\\\\b c", "d"]);
        assert_eq!(split_command_line(r#""""#), [""]);
    }

    proptest! {
        #[test]
        fn quoting_round_trips(args in prop::collection::vec("[ a-z\\\\\"\t]{0,12}", 1..6)) {
            let line = args.iter().map(|a| quote(a).into_owned()).collect::<Vec<_>>().join(" ");
            prop_assert_eq!(split_command_line(&line), args);
        }
    }
}
