use std::collections::BTreeMap;

/// Cursor over raw command-line tokens.
pub struct TokenStream {
    toks: Vec<String>,
    i: usize,
}

impl TokenStream {
    pub fn new(raw: &[String]) -> Self {
        Self {
            toks: raw.to_vec(),
            i: 0,
        }
    }
    pub fn peek(&self) -> Option<&str> {
        self.toks.get(self.i).map(|s| s.as_str())
    }
    pub fn next_token(&mut self) -> Option<String> {
        let tok = self.peek()?.to_string();
        self.i += 1;
        Some(tok)
    }

    /// Take the next token only if it can be an option value.
    pub fn next_value(&mut self) -> Option<String> {
        match self.peek() {
            Some(tok) if !looks_like_flag(tok) => self.next_token(),
            _ => None,
        }
    }

    /// Put a token back in front of the cursor (used to unpack `-abc`).
    pub fn push_front(&mut self, tok: String) {
        self.toks.insert(self.i, tok);
    }

    /// Drain everything that is left.
    pub fn rest(&mut self) -> Vec<String> {
        let rest = self.toks.split_off(self.i);
        self.i = self.toks.len();
        rest
    }
}

/// `-x`, `--xyz` and `--` are flags; a lone `-` and negative numbers are not.
pub fn looks_like_flag(tok: &str) -> bool {
    match tok.strip_prefix('-') {
        None | Some("") => false,
        Some(rest) => !rest.chars().all(|c| c.is_ascii_digit() || c == '.'),
    }
}

/// Raw option values collected by a lenient scan, before type conversion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMatches {
    values: BTreeMap<String, Vec<String>>,
    leftovers: Vec<String>,
}

impl RawMatches {
    pub fn push(&mut self, dest: &str, value: impl Into<String>) {
        self.values
            .entry(dest.to_string())
            .or_default()
            .push(value.into());
    }
    pub fn push_leftover(&mut self, tok: impl Into<String>) {
        self.leftovers.push(tok.into());
    }
    pub fn values(&self, dest: &str) -> &[String] {
        self.values.get(dest).map(Vec::as_slice).unwrap_or(&[])
    }
    pub fn into_leftovers(self) -> Vec<String> {
        self.leftovers
    }
}
