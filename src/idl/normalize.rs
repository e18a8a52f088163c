//! Comment and passthrough-block stripping.
//!
//! Output keeps one entry per input line so that line numbers survive;
//! stripped regions become blank.

/// A region opened but never closed before the end of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unterminated {
    /// `/* ...` without `*/`, opened at the given 1-based line
    Comment(usize),
    /// `%{C++ ...` without `%}`, opened at the given 1-based line
    Passthrough(usize),
}

#[derive(Debug)]
pub struct Normalized {
    pub lines: Vec<String>,
    pub unterminated: Option<Unterminated>,
}

/// Remove `//` and `/* */` comments and `%{ ... %}` verbatim C++ blocks.
pub fn strip<S: AsRef<str>>(lines: &[S]) -> Normalized {
    let mut out = Vec::with_capacity(lines.len());
    let mut comment_open: Option<usize> = None;
    let mut passthrough_open: Option<usize> = None;

    for (index, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        let line_no = index + 1;

        if passthrough_open.is_some() {
            if line.trim_start().starts_with("%}") {
                passthrough_open = None;
            }
            out.push(String::new());
            continue;
        }

        if comment_open.is_none() {
            if let Some(rest) = line.trim_start().strip_prefix("%{") {
                if !rest.contains("%}") {
                    passthrough_open = Some(line_no);
                }
                out.push(String::new());
                continue;
            }
        }

        let mut kept = String::with_capacity(line.len());
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            if comment_open.is_some() {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    comment_open = None;
                    kept.push(' ');
                }
                continue;
            }
            match (c, chars.peek()) {
                ('/', Some('*')) => {
                    chars.next();
                    comment_open = Some(line_no);
                }
                ('/', Some('/')) => break,
                _ => kept.push(c),
            }
        }
        out.push(kept);
    }

    let unterminated = comment_open
        .map(Unterminated::Comment)
        .or(passthrough_open.map(Unterminated::Passthrough));

    Normalized {
        lines: out,
        unterminated,
    }
}
