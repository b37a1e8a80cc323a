//! Name derivation for generated symbols

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Identifiers a generated method may not take: Rust keywords plus
/// methods the proxies already define.
static RESERVED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "as", "async", "await", "box", "break", "const", "continue", "crate", "dyn", "else",
        "enum", "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "macro",
        "match", "mod", "move", "mut", "override", "priv", "pub", "ref", "return", "self",
        "static", "struct", "super", "trait", "true", "try", "type", "typeof", "unsafe",
        "unsized", "use", "virtual", "where", "while", "yield", "abstract", "become", "do",
        "final",
        // proxy and std trait methods
        "clone", "error", "fmt", "to_string", "unwrap", "super_", "cast",
    ]
    .into_iter()
    .collect()
});

pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(name)
}

/// `getURLForKey` → `get_url_for_key`
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(char::is_lowercase),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else if c.is_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// `java.lang.Runnable` → `JavaLangRunnable`
pub fn camel_case(name: &str) -> String {
    name.split(|c: char| c == '.' || c == '$' || c == '_' || c == '/')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// `a.b.Outer$Inner` → `a_b_Outer_Inner`
pub fn flatten(name: &str) -> String {
    name.replace(['.', '$'], "_")
}

/// Snake-case a foreign name and escape it away from reserved identifiers
pub fn managed_name(name: &str) -> String {
    escape(snake_case(name))
}

pub fn escape(name: String) -> String {
    if is_reserved(&name) {
        format!("{name}_")
    } else {
        name
    }
}

/// JNI short-name mangling
pub fn jni_mangle(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '_' => out.push_str("_1"),
            ';' => out.push_str("_2"),
            '[' => out.push_str("_3"),
            '/' | '.' => out.push('_'),
            c if c.is_ascii_alphanumeric() => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("_0{unit:04x}"));
                }
            }
        }
    }
    out
}

/// Per-class table handing out unique identifiers
#[derive(Debug, Default, Clone)]
pub struct UniqueNames {
    taken: HashSet<String>,
}

impl UniqueNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// `base`, or `base` with trailing underscores until unused
    pub fn claim(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        while self.taken.contains(&name) {
            name.push('_');
        }
        self.taken.insert(name.clone());
        name
    }

    pub fn contains(&self, name: &str) -> bool {
        self.taken.contains(name)
    }
}
