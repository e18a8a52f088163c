use super::types::{Member, MemberKind};
use super::Grammar;

impl Grammar {
    /// Split an interface body into normalized members.
    ///
    /// Returns the offending statement when the body holds a nested
    /// `interface` declaration, which the grammar does not support.
    pub(super) fn parse_members(&self, body: &str) -> Result<Vec<Member>, String> {
        let mut members = Vec::new();
        for statement in split_statements(body) {
            if self.interface_keyword.is_match(&statement) {
                return Err(statement);
            }
            members.push(self.parse_member(&statement));
        }
        Ok(members)
    }

    fn parse_member(&self, statement: &str) -> Member {
        let signature = self.normalize_signature(statement);
        let bare = strip_descriptors(&signature);

        let (kind, name) = if let Some(caps) = self.constant.captures(bare) {
            (MemberKind::Const, caps.name("name"))
        } else if let Some(caps) = self.attribute.captures(bare) {
            (MemberKind::Attribute, caps.name("name"))
        } else if let Some(caps) = self.method.captures(bare) {
            (MemberKind::Method, caps.name("name"))
        } else {
            (MemberKind::Other, None)
        };

        Member {
            kind,
            name: name.map(|m| m.as_str().to_string()),
            signature,
        }
    }

    /// Collapse whitespace, drop spaces around punctuation and remove
    /// descriptors that do not affect binary compatibility.
    pub fn normalize_signature(&self, text: &str) -> String {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let spaced = self.spacing.replace_all(&collapsed, "$1").into_owned();
        self.filter_descriptors(&spaced)
    }

    fn filter_descriptors(&self, signature: &str) -> String {
        let Some(list) = descriptor_list(signature) else {
            return signature.to_string();
        };
        let rest = &signature[list.len() + 2..];
        let kept: Vec<&str> = split_top_level(list, ',')
            .into_iter()
            .filter(|token| {
                let name = token.split('(').next().unwrap_or_default().trim();
                !self.ignored_descriptors.contains(name)
            })
            .collect();
        if kept.is_empty() {
            rest.to_string()
        } else {
            format!("[{}]{}", kept.join(","), rest)
        }
    }
}

/// Text between a leading `[` and its matching `]`, if the member has one.
fn descriptor_list(signature: &str) -> Option<&str> {
    if !signature.starts_with('[') {
        return None;
    }
    let mut depth = 0usize;
    for (i, c) in signature.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&signature[1..i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn strip_descriptors(signature: &str) -> &str {
    match descriptor_list(signature) {
        Some(list) => signature[list.len() + 2..].trim_start(),
        None => signature,
    }
}

/// Split on `sep` where no bracket of any kind is open.
fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Body text split into `;`-terminated statements, whitespace collapsed,
/// empty statements dropped. A trailing statement without `;` is kept.
fn split_statements(body: &str) -> Vec<String> {
    split_top_level(body, ';')
        .into_iter()
        .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DescriptorConfig;
    use crate::idl::test_grammar;

    #[test]
    fn test_members_split_on_semicolons_across_lines() {
        let grammar = test_grammar();
        let members = grammar
            .parse_members("\n  void a();\n  long b(in long x,\n         in long y);\n")
            .unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[1].signature, "long b(in long x,in long y)");
        assert_eq!(members[1].name.as_deref(), Some("b"));
    }

    #[test]
    fn test_member_kinds() {
        let grammar = test_grammar();
        let members = grammar
            .parse_members(
                "const unsigned long FLAG_X = 1; readonly attribute AString name; [noscript] void run(in long n) raises (Foo); cenum Mode : 8 { A, B };",
            )
            .unwrap();
        let kinds: Vec<MemberKind> = members.iter().map(|m| m.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MemberKind::Const,
                MemberKind::Attribute,
                MemberKind::Method,
                MemberKind::Other
            ]
        );
        assert_eq!(members[0].name.as_deref(), Some("FLAG_X"));
        assert_eq!(members[1].name.as_deref(), Some("name"));
        assert_eq!(members[2].name.as_deref(), Some("run"));
    }

    #[test]
    fn test_whitespace_does_not_change_signature() {
        let grammar = test_grammar();
        assert_eq!(
            grammar.normalize_signature("void   a( in long x ,in  long y )"),
            grammar.normalize_signature("void a(in long x, in long y)")
        );
        assert_ne!(
            grammar.normalize_signature("void a(in long x)"),
            grammar.normalize_signature("void a(in short x)")
        );
    }

    #[test]
    fn test_binary_descriptors_are_kept_by_default() {
        let grammar = test_grammar();
        assert_eq!(
            grammar.normalize_signature("[notxpcom] long getValue()"),
            "[notxpcom]long getValue()"
        );
        assert_ne!(
            grammar.normalize_signature("[noscript] void a()"),
            grammar.normalize_signature("void a()")
        );
    }

    #[test]
    fn test_configured_non_binary_descriptors_are_dropped() {
        let mut descriptors = crate::config::default_descriptors();
        descriptors.push(DescriptorConfig {
            token: "noscript".to_string(),
            affects_binary_compat: false,
        });
        let grammar = Grammar::new(&descriptors).unwrap();
        assert_eq!(
            grammar.normalize_signature("[noscript] void a()"),
            grammar.normalize_signature("void a()")
        );
        assert_eq!(
            grammar.normalize_signature("[noscript, notxpcom] void a()"),
            "[notxpcom]void a()"
        );
    }

    #[test]
    fn test_nested_interface_is_rejected() {
        let grammar = test_grammar();
        let err = grammar
            .parse_members("void a(); interface nsIInner : nsISupports { void b() }")
            .unwrap_err();
        assert!(err.starts_with("interface nsIInner"));
    }
}
