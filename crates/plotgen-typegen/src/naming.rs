//! Identifier synthesis and escaping.
//!
//! Two concerns live here and must not be mixed:
//!
//! - identifiers: schema names and raw enum values turned into type, field
//!   and variant names;
//! - literal payloads: raw values escaped for embedding inside a string
//!   literal of the generated source.

/// Ordered substitution table from symbols that cannot appear in an
/// identifier to words.
#[derive(Debug)]
pub struct SymbolTable {
    entries: &'static [(char, &'static str)],
}

/// The symbol table used for enum and flag identifiers.
pub static SYMBOLS: SymbolTable = SymbolTable {
    entries: &[
        ('=', "Eq"),
        ('>', "Gt"),
        ('-', "Hyphen"),
        ('<', "Lt"),
        ('|', "Or"),
        ('/', "Slash"),
        ('\\', "Doublebackslash"),
        ('^', "Cape"),
        ('(', "Lpar"),
        (')', "Rpar"),
        ('[', "Lbracket"),
        (']', "Rbracket"),
        ('+', "Plus"),
        ('?', "Question"),
        ('$', "Dollar"),
    ],
};

impl SymbolTable {
    pub fn word(&self, symbol: char) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(c, _)| *c == symbol)
            .map(|(_, word)| *word)
    }

    /// Replace every table symbol by its word in a single left-to-right pass.
    /// Inserted words are never rescanned.
    pub fn substitute(&self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        for c in raw.chars() {
            match self.word(c) {
                Some(word) => out.push_str(word),
                None => out.push(c),
            }
        }
        out
    }
}

/// Identifier synthesis over a borrowed symbol table.
#[derive(Debug, Clone, Copy)]
pub struct Namer<'a> {
    symbols: &'a SymbolTable,
}

impl Default for Namer<'static> {
    fn default() -> Self {
        Self::new(&SYMBOLS)
    }
}

impl<'a> Namer<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self { symbols }
    }

    /// Type and field identifier for a schema name (`paper_bgcolor` →
    /// `PaperBgcolor`).
    pub fn type_ident(&self, name: &str) -> String {
        to_camel_case(name)
    }

    /// Variant identifier for a raw enum value or flag.
    ///
    /// Returns `None` when a non-empty raw value has no identifier
    /// characters left (e.g. `"."`).
    pub fn variant_ident(&self, raw: &str) -> Option<String> {
        if raw.is_empty() {
            return Some("Empty".to_string());
        }
        let ident = to_camel_case(&self.symbols.substitute(raw));
        if ident.is_empty() {
            return None;
        }
        if ident.starts_with(|c: char| c.is_ascii_digit()) {
            return Some(format!("V{}", ident));
        }
        if ident == "Self" {
            return Some("Self_".to_string());
        }
        Some(ident)
    }
}

/// Upper camel case, splitting on every non-alphanumeric character. Only the
/// first character of each part is changed.
pub fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for part in name.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.extend(chars);
        }
    }
    out
}

const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be raw identifiers.
const NON_RAW_KEYWORDS: &[&str] = &["crate", "self", "super", "Self"];

/// Rust field identifier for a wire name (`plotlyServerURL` →
/// `plotly_server_url`, `type` → `r#type`).
pub fn field_ident(json_name: &str) -> String {
    let mut out = String::with_capacity(json_name.len() + 4);
    let mut prev: Option<char> = None;
    for c in json_name.chars() {
        if c.is_ascii_alphanumeric() {
            let boundary = c.is_ascii_uppercase()
                && prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit());
            if boundary {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
        prev = Some(c);
    }
    let mut ident = out.trim_end_matches('_').to_string();

    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if NON_RAW_KEYWORDS.contains(&ident.as_str()) {
        ident.push('_');
    } else if RUST_KEYWORDS.contains(&ident.as_str()) {
        ident.insert_str(0, "r#");
    }
    ident
}

/// Escape a raw value for embedding between double quotes. Each backslash is
/// doubled and each double quote escaped.
pub fn escape_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out
}
