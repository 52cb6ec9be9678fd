//! Bracket matching over script text.
//!
//! Listing data sits inside a JavaScript expression with no delimiter other
//! than nesting depth. These helpers walk the text one byte at a time and
//! skip string literals and comments, so brackets inside `"a [b"` or
//! `/* [noise */` never affect the depth count.
//!
//! All structural characters are ASCII, so byte offsets returned here always
//! fall on `char` boundaries.

/// Failure to find the close of a bracketed region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// The byte at the requested offset is not `(`, `[` or `{`.
    #[error("offset {0} is not an opening bracket")]
    NotAnOpening(usize),
    /// Text ended before depth returned to zero.
    #[error("unterminated bracket opened at offset {0}")]
    Unterminated(usize),
    /// A closing bracket did not match the innermost opening one.
    #[error("expected '{expected}' but found '{found}' at offset {at}")]
    Mismatched {
        at: usize,
        expected: char,
        found: char,
    },
}

/// Iterator over bytes that are code: outside string literals and comments.
///
/// The opening quote of a string literal is yielded; its contents and
/// closing quote are not. A line break ends a `'` or `"` literal, which keeps
/// a stray apostrophe from swallowing the rest of the text.
struct CodeBytes<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> CodeBytes<'a> {
    fn new(text: &'a str, start: usize) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: start,
        }
    }

    fn skip_string(&mut self, quote: u8) {
        while let Some(&b) = self.bytes.get(self.pos) {
            self.pos += 1;
            match b {
                b'\\' => self.pos += 1,
                b'\n' if quote != b'`' => return,
                _ if b == quote => return,
                _ => {}
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            self.pos += 1;
            if b == b'\n' {
                return;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        while self.pos < self.bytes.len() {
            if self.bytes[self.pos] == b'*' && self.bytes.get(self.pos + 1) == Some(&b'/') {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
    }
}

impl Iterator for CodeBytes<'_> {
    type Item = (usize, u8);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let idx = self.pos;
            let b = *self.bytes.get(idx)?;
            self.pos += 1;
            match b {
                b'"' | b'\'' | b'`' => {
                    self.skip_string(b);
                    return Some((idx, b));
                }
                b'/' if self.bytes.get(idx + 1) == Some(&b'/') => self.skip_line_comment(),
                b'/' if self.bytes.get(idx + 1) == Some(&b'*') => {
                    self.pos += 1;
                    self.skip_block_comment();
                }
                _ => return Some((idx, b)),
            }
        }
    }
}

fn closer_for(open: u8) -> Option<u8> {
    match open {
        b'(' => Some(b')'),
        b'[' => Some(b']'),
        b'{' => Some(b'}'),
        _ => None,
    }
}

/// Returns the offset one past the bracket that closes the one at `open`.
///
/// `text[open..end]` is then the complete bracketed region, both brackets
/// included.
pub fn matching_close(text: &str, open: usize) -> Result<usize, ScanError> {
    let first = text
        .as_bytes()
        .get(open)
        .copied()
        .and_then(closer_for)
        .ok_or(ScanError::NotAnOpening(open))?;

    let mut expected = vec![first];
    for (idx, b) in CodeBytes::new(text, open + 1) {
        if let Some(closer) = closer_for(b) {
            expected.push(closer);
            continue;
        }
        if !matches!(b, b')' | b']' | b'}') {
            continue;
        }
        let Some(want) = expected.pop() else {
            break;
        };
        if want != b {
            return Err(ScanError::Mismatched {
                at: idx,
                expected: want as char,
                found: b as char,
            });
        }
        if expected.is_empty() {
            return Ok(idx + 1);
        }
    }

    Err(ScanError::Unterminated(open))
}

/// Bracket depth at `pos`, or `None` when `pos` is inside a string literal
/// or comment.
///
/// Depth counts brackets opened before `pos` and not yet closed.
pub fn code_depth_at(text: &str, pos: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, b) in CodeBytes::new(text, 0) {
        if idx == pos {
            return Some(depth);
        }
        if idx > pos {
            return None;
        }
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(text: &str, open: usize) -> &str {
        &text[open..matching_close(text, open).unwrap()]
    }

    #[test]
    fn test_simple_nesting() {
        let text = r#"x = [{"a":[1,2]},{"b":{}}]; y = [3]"#;
        let open = text.find('[').unwrap();
        assert_eq!(region(text, open), r#"[{"a":[1,2]},{"b":{}}]"#);
    }

    #[test]
    fn test_brackets_inside_strings_are_ignored() {
        let text = r#"["a]b", 'c[d', "e\"]"] tail]"#;
        assert_eq!(region(text, 0), r#"["a]b", 'c[d', "e\"]"]"#);
    }

    #[test]
    fn test_comments_are_ignored() {
        let text = "( a, /* ) ] */ b // )\n , c ) rest";
        assert_eq!(region(text, 0), "( a, /* ) ] */ b // )\n , c )");
    }

    #[test]
    fn test_stops_before_trailing_noise() {
        let text = r#"data: [{"a":1}] /* noise [not data] */ ]"#;
        let open = text.find('[').unwrap();
        assert_eq!(region(text, open), r#"[{"a":1}]"#);
    }

    #[test]
    fn test_unterminated() {
        let text = "[1, [2, 3]";
        assert_eq!(matching_close(text, 0), Err(ScanError::Unterminated(0)));
    }

    #[test]
    fn test_mismatched() {
        let text = "[1, {2]";
        assert_eq!(
            matching_close(text, 0),
            Err(ScanError::Mismatched {
                at: 6,
                expected: '}',
                found: ']',
            })
        );
    }

    #[test]
    fn test_not_an_opening() {
        assert_eq!(matching_close("abc", 1), Err(ScanError::NotAnOpening(1)));
        assert_eq!(matching_close("abc", 9), Err(ScanError::NotAnOpening(9)));
    }

    #[test]
    fn test_multibyte_text_keeps_offsets_valid() {
        let text = r#"["Ŧier ☆ [set]", "Ë"] après"#;
        let end = matching_close(text, 0).unwrap();
        assert!(text.is_char_boundary(end));
        assert_eq!(&text[..end], r#"["Ŧier ☆ [set]", "Ë"]"#);
    }

    #[test]
    fn test_code_depth_at() {
        let text = r#"{a: [1, "data: ["], data: [2]}"#;
        let inner = text.find("data").unwrap();
        let outer = text.rfind("data").unwrap();
        assert_eq!(code_depth_at(text, inner), None);
        assert_eq!(code_depth_at(text, outer), Some(1));
        assert_eq!(code_depth_at(text, 0), Some(0));
        assert_eq!(code_depth_at(text, text.find('1').unwrap()), Some(2));
    }

    #[test]
    fn test_apostrophe_string_ends_at_line_break() {
        let text = "[it's\n ]";
        assert_eq!(region(text, 0), text);
    }
}
