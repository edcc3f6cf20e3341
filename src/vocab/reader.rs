//! Byte-level corpus tokenization.

use std::io::{self, BufRead, Seek, SeekFrom};

/// Synthetic end-of-sentence token surfaced for every newline.
pub const EOS: &[u8] = b"</s>";

/// Whitespace bytes that delimit tokens.
fn is_token_separator(byte: u8) -> bool {
    matches!(byte, b' ' | b'\n' | b'\r' | b'\t' | 0x0b | 0x0c | 0x00)
}

/// Streaming tokenizer over a corpus byte stream.
///
/// Tokens are maximal runs of non-whitespace bytes; the stream is treated as
/// opaque bytes, not UTF-8. A newline is surfaced as the synthetic [`EOS`]
/// token: one that terminates a token in progress is held back so the next
/// read yields `EOS` on its own.
pub struct CorpusReader<R> {
    inner: R,
    hold_newline: bool,
    at_eof: bool,
}

impl<R: BufRead> CorpusReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            hold_newline: false,
            at_eof: false,
        }
    }

    /// Whether the last read exhausted the stream.
    pub fn at_eof(&self) -> bool {
        self.at_eof
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let buf = self.inner.fill_buf()?;
        if buf.is_empty() {
            return Ok(None);
        }
        let byte = buf[0];
        self.inner.consume(1);
        Ok(Some(byte))
    }

    /// Read the next token into `token`, returning whether one was produced.
    /// Returns `false` only at end of stream with nothing pending.
    pub fn read_token(&mut self, token: &mut Vec<u8>) -> io::Result<bool> {
        token.clear();
        if self.hold_newline {
            self.hold_newline = false;
            token.extend_from_slice(EOS);
            return Ok(true);
        }
        while let Some(byte) = self.next_byte()? {
            if is_token_separator(byte) {
                if token.is_empty() {
                    if byte == b'\n' {
                        token.extend_from_slice(EOS);
                        return Ok(true);
                    }
                    continue;
                }
                if byte == b'\n' {
                    self.hold_newline = true;
                }
                return Ok(true);
            }
            token.push(byte);
        }
        self.at_eof = true;
        Ok(!token.is_empty())
    }
}

impl<R: BufRead + Seek> CorpusReader<R> {
    /// Seek to an absolute byte offset, clearing tokenizer state. Shard
    /// offsets land mid-line; the first partial token is accepted as-is.
    pub fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        self.hold_newline = false;
        self.at_eof = false;
        Ok(())
    }

    /// Wrap back to the start of the stream.
    pub fn rewind(&mut self) -> io::Result<()> {
        self.seek_to(0)
    }
}
