//! `$old(expr)` references in postconditions

use indexmap::IndexMap;

const OLD_MARKER: &str = "$old(";
const OLD_SYMBOL_PREFIX: &str = "__old";

/// A postcondition with its `$old(...)` references replaced by symbols
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OldReferences {
    /// Expression text with every reference replaced
    pub rewritten: String,
    /// Generated symbol to the expression captured for it
    pub captures: IndexMap<String, String>,
}

impl OldReferences {
    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }
}

/// Replace every `$old(expr)` in `expression` with a generated symbol
/// (`__old0`, `__old1`, ...). Identical inner expressions share a symbol.
/// Unbalanced references are left in place so that evaluation reports them.
pub fn extract_old_references(expression: &str) -> OldReferences {
    let mut rewritten = String::with_capacity(expression.len());
    let mut captures: IndexMap<String, String> = IndexMap::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut prev: Option<char> = None;
    let mut i = 0;

    while i < expression.len() {
        let rest = &expression[i..];
        let Some(ch) = rest.chars().next() else { break };

        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
        } else if ch == '"' || ch == '\'' {
            quote = Some(ch);
        } else if rest.starts_with(OLD_MARKER)
            && !prev.map(|c| c.is_ascii_alphanumeric() || c == '_').unwrap_or(false)
        {
            let body_start = OLD_MARKER.len();
            if let Some(body_len) = balanced_len(&rest[body_start..]) {
                let inner = rest[body_start..body_start + body_len].trim().to_string();
                let next_symbol = format!("{}{}", OLD_SYMBOL_PREFIX, captures.len());
                let symbol = captures
                    .iter()
                    .find(|(_, captured)| **captured == inner)
                    .map(|(symbol, _)| symbol.clone())
                    .unwrap_or(next_symbol);
                captures.entry(symbol.clone()).or_insert(inner);
                rewritten.push_str(&symbol);
                // Skip the body and its closing paren
                i += body_start + body_len + 1;
                prev = Some(')');
                continue;
            }
        }

        rewritten.push(ch);
        prev = Some(ch);
        i += ch.len_utf8();
    }

    OldReferences {
        rewritten,
        captures,
    }
}

/// Length of the text up to the paren that closes an already open one
fn balanced_len(text: &str) -> Option<usize> {
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}
