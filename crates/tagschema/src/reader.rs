//! Byte cursor over a raw constraint tag
//!
//! The reader has no knowledge of constraint keywords; it only supports the
//! primitive operations the tag parser is built from: peek/consume a byte,
//! consume a fixed number of bytes, read up to the next top-level separator,
//! and skip a delimiter.

/// Cursor over the bytes of a constraint tag.
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(tag: &'a str) -> Self {
        Self {
            buf: tag.as_bytes(),
            pos: 0,
        }
    }

    /// Current byte offset into the tag, for diagnostics.
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Look at the next byte without consuming it.
    pub(crate) fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    /// Consume and return the next byte.
    pub(crate) fn read_byte(&mut self) -> Option<u8> {
        let b = self.buf.get(self.pos).copied()?;
        self.pos += 1;
        Some(b)
    }

    /// Consume exactly `n` bytes, or `None` if fewer remain.
    pub(crate) fn read_bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.pos + n > self.buf.len() {
            return None;
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Some(out)
    }

    /// Consume up to the next top-level `,` (or end of input) and return the
    /// bytes before it. The separator itself is consumed but not returned.
    pub(crate) fn read_separator(&mut self) -> &'a [u8] {
        let start = self.pos;
        while self.pos < self.buf.len() && self.buf[self.pos] != b',' {
            self.pos += 1;
        }
        let out = &self.buf[start..self.pos];
        if self.pos < self.buf.len() {
            self.pos += 1;
        }
        out
    }

    /// Consume bytes through the next `:` or `=`. Returns false if the input
    /// ran out before a delimiter was found.
    pub(crate) fn skip_delimiter(&mut self) -> bool {
        while let Some(b) = self.read_byte() {
            if b == b':' || b == b'=' {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_byte_and_eof() {
        let mut r = Reader::new("ab");
        assert!(!r.is_eof());
        assert_eq!(r.read_byte(), Some(b'a'));
        assert_eq!(r.read_byte(), Some(b'b'));
        assert!(r.is_eof());
        assert_eq!(r.read_byte(), None);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut r = Reader::new("x");
        assert_eq!(r.peek(), Some(b'x'));
        assert_eq!(r.peek(), Some(b'x'));
        assert_eq!(r.read_byte(), Some(b'x'));
        assert_eq!(r.peek(), None);
    }

    #[test]
    fn test_read_bytes() {
        let mut r = Reader::new("minimum");
        assert_eq!(r.read_bytes(4), Some(&b"mini"[..]));
        assert_eq!(r.read_bytes(3), Some(&b"mum"[..]));
        assert_eq!(r.read_bytes(1), None);
    }

    #[test]
    fn test_read_separator_consumes_comma() {
        let mut r = Reader::new("5,maxLength:3");
        assert_eq!(r.read_separator(), b"5");
        assert_eq!(r.peek(), Some(b'm'));
    }

    #[test]
    fn test_read_separator_at_end() {
        let mut r = Reader::new("42");
        assert_eq!(r.read_separator(), b"42");
        assert!(r.is_eof());
    }

    #[test]
    fn test_skip_delimiter() {
        let mut r = Reader::new(":5");
        assert!(r.skip_delimiter());
        assert_eq!(r.peek(), Some(b'5'));

        let mut r = Reader::new("=5");
        assert!(r.skip_delimiter());
        assert_eq!(r.peek(), Some(b'5'));

        let mut r = Reader::new("nodelim");
        assert!(!r.skip_delimiter());
        assert!(r.is_eof());
    }
}
