//! `READ`'s input source (spec §4.4). The interpreter's `--input`
//! flag picks between stdin and a file at startup; everything past
//! that point just needs "give me the next line, or tell me there
//! isn't one", so the executor is generic over a small trait instead
//! of holding a `Box<dyn BufRead>` directly. Mirrors the teacher's
//! `src/memory/io.rs`, which isolates actual I/O behind a narrow trait
//! for the same reason: so the executor's tests can swap in an
//! in-memory source.

use std::fs::File;
use std::io::{self, BufRead, BufReader};

/// A source of input lines for `READ`. Each call consumes one line;
/// a `None` return means end of input, which `READ` maps to `nil`
/// (spec §4.4).
pub trait InputSource {
    fn next_line(&mut self) -> io::Result<Option<String>>;
}

/// Wraps any `BufRead`, stripping the trailing newline the way
/// `BufRead::lines()` does.
pub struct LineSource<R: BufRead> {
    inner: R,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(inner: R) -> LineSource<R> {
        LineSource { inner }
    }
}

impl<R: BufRead> InputSource for LineSource<R> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = String::new();
        let bytes = self.inner.read_line(&mut buf)?;
        if bytes == 0 {
            return Ok(None);
        }
        if buf.ends_with('\n') {
            buf.pop();
            if buf.ends_with('\r') {
                buf.pop();
            }
        }
        Ok(Some(buf))
    }
}

pub fn stdin_source() -> LineSource<io::BufReader<io::Stdin>> {
    LineSource::new(BufReader::new(io::stdin()))
}

pub fn file_source(path: &str) -> io::Result<LineSource<BufReader<File>>> {
    Ok(LineSource::new(BufReader::new(File::open(path)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn yields_lines_then_none() {
        let mut src = LineSource::new(Cursor::new(b"one\ntwo\n".to_vec()));
        assert_eq!(src.next_line().unwrap(), Some("one".to_string()));
        assert_eq!(src.next_line().unwrap(), Some("two".to_string()));
        assert_eq!(src.next_line().unwrap(), None);
    }

    #[test]
    fn tolerates_missing_trailing_newline() {
        let mut src = LineSource::new(Cursor::new(b"only".to_vec()));
        assert_eq!(src.next_line().unwrap(), Some("only".to_string()));
        assert_eq!(src.next_line().unwrap(), None);
    }

    #[test]
    fn strips_crlf() {
        let mut src = LineSource::new(Cursor::new(b"windows\r\n".to_vec()));
        assert_eq!(src.next_line().unwrap(), Some("windows".to_string()));
    }
}
