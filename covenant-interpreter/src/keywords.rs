//! Textual keyword substitution applied before evaluation

use indexmap::IndexMap;
use std::borrow::Cow;

/// Default mapping from contract keywords to backend symbols
pub const DEFAULT_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("$this", "this"),
    ("$target", "target"),
    ("$args", "args"),
    ("$result", "result"),
];

/// Keyword table. Later inserts override earlier ones; matching is
/// longest keyword first and respects identifier boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordSubstitutions {
    table: IndexMap<String, String>,
}

impl Default for KeywordSubstitutions {
    fn default() -> Self {
        Self {
            table: DEFAULT_SUBSTITUTIONS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl KeywordSubstitutions {
    /// Table without any defaults
    pub fn empty() -> Self {
        Self {
            table: IndexMap::new(),
        }
    }

    pub fn insert(&mut self, keyword: impl Into<String>, symbol: impl Into<String>) {
        self.table.insert(keyword.into(), symbol.into());
    }

    /// Add every entry of `other`, overriding existing keywords
    pub fn extend(&mut self, other: &KeywordSubstitutions) {
        for (keyword, symbol) in other.iter() {
            self.insert(keyword, symbol);
        }
    }

    pub fn get(&self, keyword: &str) -> Option<&str> {
        self.table.get(keyword).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.table.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Rewrite every keyword occurrence outside string literals
    pub fn apply<'s>(&self, source: &'s str) -> Cow<'s, str> {
        if self.table.is_empty() {
            return Cow::Borrowed(source);
        }

        let mut keywords: Vec<(&str, &str)> = self
            .iter()
            .filter(|(keyword, _)| !keyword.is_empty())
            .collect();
        keywords.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let mut out = String::with_capacity(source.len());
        let mut changed = false;
        let mut quote: Option<char> = None;
        let mut escaped = false;
        let mut prev: Option<char> = None;
        let mut i = 0;

        while i < source.len() {
            let rest = &source[i..];
            let Some(ch) = rest.chars().next() else { break };

            if let Some(q) = quote {
                out.push(ch);
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == q {
                    quote = None;
                }
                prev = Some(ch);
                i += ch.len_utf8();
                continue;
            }

            if ch == '"' || ch == '\'' {
                quote = Some(ch);
                out.push(ch);
                prev = Some(ch);
                i += ch.len_utf8();
                continue;
            }

            let at_boundary = !prev.map(is_ident_char).unwrap_or(false);
            let matched = if at_boundary {
                keywords.iter().find(|(keyword, _)| {
                    rest.starts_with(keyword)
                        && !rest[keyword.len()..]
                            .chars()
                            .next()
                            .map(is_ident_char)
                            .unwrap_or(false)
                })
            } else {
                None
            };

            match matched {
                Some((keyword, symbol)) => {
                    out.push_str(symbol);
                    changed = true;
                    prev = keyword.chars().last();
                    i += keyword.len();
                }
                None => {
                    out.push(ch);
                    prev = Some(ch);
                    i += ch.len_utf8();
                }
            }
        }

        if changed {
            Cow::Owned(out)
        } else {
            Cow::Borrowed(source)
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}
