//! Lexical helpers shared by the sanitizer rules and the preview factory.
//!
//! Quoted strings end at a newline at the latest, so an apostrophe in JSX
//! text (`<p>Don't</p>`) only hides the rest of its own line.

/// Byte offsets of every line whose first non-blank character sits at
/// bracket depth zero, outside strings and comments.
pub fn top_level_offsets(src: &str) -> Vec<usize> {
    scan_offsets(src, false)
}

/// Like [`top_level_offsets`], plus statements that share a line with
/// earlier code: the first identifier after a depth-zero `;` or a `}` that
/// closes back to depth zero (`} export default App;`).
pub fn statement_offsets(src: &str) -> Vec<usize> {
    scan_offsets(src, true)
}

fn scan_offsets(src: &str, mid_line: bool) -> Vec<usize> {
    let bytes = src.as_bytes();
    let mut out = Vec::new();
    let mut depth: i32 = 0;
    let mut at_line_start = true;
    let mut after_statement = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let blank = matches!(b, b' ' | b'\t' | b'\r' | b'\n');
        if at_line_start && !blank {
            at_line_start = false;
            after_statement = false;
            if depth <= 0 {
                out.push(i);
            }
        } else if after_statement && !blank {
            after_statement = false;
            if depth <= 0 && (b.is_ascii_alphabetic() || b == b'_' || b == b'$') {
                out.push(i);
            }
        }
        match b {
            b'\n' => {
                at_line_start = true;
                after_statement = false;
                i += 1;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = line_end(bytes, i);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = match src[i + 2..].find("*/") {
                    Some(p) => i + 2 + p + 2,
                    None => bytes.len(),
                };
            }
            b'\'' | b'"' => i = skip_quoted(bytes, i),
            b'`' => i = skip_template(bytes, i),
            b'{' | b'(' | b'[' => {
                depth += 1;
                i += 1;
            }
            b'}' | b')' | b']' => {
                depth -= 1;
                after_statement = mid_line && b == b'}' && depth == 0;
                i += 1;
            }
            b';' => {
                after_statement = mid_line && depth == 0;
                i += 1;
            }
            _ => i += 1,
        }
    }
    out
}

fn line_end(bytes: &[u8], from: usize) -> usize {
    bytes[from..].iter().position(|&b| b == b'\n').map(|p| from + p).unwrap_or(bytes.len())
}

/// Index just past a `'` or `"` string starting at `start`.
pub fn skip_quoted(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return i,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Index just past a template literal starting at `start`.
pub fn skip_template(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

pub fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Forward-only reader over a source string.
pub struct Cursor<'a> {
    src: &'a str,
    pub pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str, pos: usize) -> Self {
        Self { src, pos }
    }

    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    pub fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    pub fn rest(&self) -> &'a str {
        &self.src[self.pos.min(self.src.len())..]
    }

    /// Skips whitespace, newlines and comments.
    pub fn skip_ws(&mut self) {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b'/') if self.rest().starts_with("//") => {
                    self.pos = line_end(self.bytes(), self.pos);
                }
                Some(b'/') if self.rest().starts_with("/*") => {
                    self.pos = match self.rest()[2..].find("*/") {
                        Some(p) => self.pos + 2 + p + 2,
                        None => self.src.len(),
                    };
                }
                _ => return,
            }
        }
    }

    /// Skips spaces and tabs only.
    pub fn skip_inline_ws(&mut self) {
        while matches!(self.peek(), Some(b' ') | Some(b'\t')) {
            self.pos += 1;
        }
    }

    pub fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consumes `kw` when it is followed by a non-identifier byte.
    pub fn keyword(&mut self, kw: &str) -> bool {
        if !self.rest().starts_with(kw) {
            return false;
        }
        match self.bytes().get(self.pos + kw.len()) {
            Some(&b) if is_ident_byte(b) => false,
            _ => {
                self.pos += kw.len();
                true
            }
        }
    }

    pub fn ident(&mut self) -> Option<String> {
        let start = self.pos;
        match self.peek() {
            Some(b) if b.is_ascii_alphabetic() || b == b'_' || b == b'$' => {}
            _ => return None,
        }
        while matches!(self.peek(), Some(b) if is_ident_byte(b)) {
            self.pos += 1;
        }
        Some(self.src[start..self.pos].to_string())
    }

    pub fn string(&mut self) -> Option<String> {
        match self.peek() {
            Some(b'\'') | Some(b'"') => {}
            _ => return None,
        }
        let start = self.pos;
        let end = skip_quoted(self.bytes(), start);
        if end <= start + 1 || self.bytes()[end - 1] != self.bytes()[start] {
            return None;
        }
        self.pos = end;
        Some(self.src[start + 1..end - 1].to_string())
    }

    /// Consumes a trailing `;` on the same line, if any.
    pub fn statement_end(&mut self) {
        let save = self.pos;
        self.skip_inline_ws();
        if !self.eat(b';') {
            self.pos = save;
        }
    }
}
