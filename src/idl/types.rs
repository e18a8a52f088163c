/// Where an interface was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Diff-relative file path
    pub path: String,
    /// 1-based line of the `interface` keyword
    pub first_line: usize,
    /// 1-based line of the closing brace
    pub last_line: usize,
}

/// One interface declaration with a body.
#[derive(Debug, Clone)]
pub struct Interface {
    pub name: String,
    /// Declared base interface, e.g. `nsISupports`
    pub base: Option<String>,
    /// Text inside `uuid(...)` as written, absent for interfaces without one
    pub uuid: Option<String>,
    /// Members in declaration order (vtable order)
    pub members: Vec<Member>,
    pub span: Span,
    /// Raw text from the `interface` keyword line to the closing brace line,
    /// comments included. Only used to tell cosmetic edits from no edit.
    pub source: String,
}

impl Interface {
    /// True when the binary layout described by the two declarations is the
    /// same: same base and the same member signatures in the same order.
    pub fn same_layout(&self, other: &Interface) -> bool {
        self.base == other.base
            && self.members.len() == other.members.len()
            && self
                .members
                .iter()
                .zip(&other.members)
                .all(|(a, b)| a.signature == b.signature)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Method,
    Attribute,
    Const,
    /// Anything else found in a body (cenum, typedef...). Compared verbatim.
    Other,
}

impl std::fmt::Display for MemberKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemberKind::Method => write!(f, "method"),
            MemberKind::Attribute => write!(f, "attribute"),
            MemberKind::Const => write!(f, "const"),
            MemberKind::Other => write!(f, "member"),
        }
    }
}

/// A member with whitespace and comments normalized away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub kind: MemberKind,
    pub name: Option<String>,
    /// Normalized member text; the comparison key
    pub signature: String,
}
