//! Backing byte streams for tables
//!
//! A table pulls lines from one of three sources: its file, an in-memory
//! buffer (the result of a materializing order-by), or the body of an HTTP
//! response. Streams are shared between a table and its clones, mirroring
//! how the join operator retains and rewinds its parents.

use crate::error::{Error, Result};
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Seek, SeekFrom};
use std::net::TcpStream;
use std::path::Path;
use std::rc::Rc;

/// A shared handle to a table stream. Execution is single-threaded (pull
/// model), so shared ownership is `Rc` with interior mutability.
pub type SharedStream = Rc<RefCell<TableStream>>;

pub enum TableStream {
    File(BufReader<File>),
    Memory(Cursor<Vec<u8>>),
    Remote(BufReader<TcpStream>),
}

impl TableStream {
    pub fn open_file(path: &Path) -> Result<TableStream> {
        Ok(TableStream::File(BufReader::new(File::open(path)?)))
    }

    pub fn from_buffer(contents: String) -> TableStream {
        TableStream::Memory(Cursor::new(contents.into_bytes()))
    }

    pub fn from_remote(reader: BufReader<TcpStream>) -> TableStream {
        TableStream::Remote(reader)
    }

    pub fn shared(self) -> SharedStream {
        Rc::new(RefCell::new(self))
    }

    /// Reads the next line, without its terminator. `None` at end of stream.
    pub fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = match self {
            TableStream::File(reader) => reader.read_line(&mut line)?,
            TableStream::Memory(cursor) => cursor.read_line(&mut line)?,
            TableStream::Remote(reader) => reader.read_line(&mut line)?,
        };
        if read == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }

    /// Seeks back to position zero. A socket-backed stream cannot rewind.
    pub fn rewind(&mut self) -> Result<()> {
        match self {
            TableStream::File(reader) => {
                reader.seek(SeekFrom::Start(0))?;
                Ok(())
            }
            TableStream::Memory(cursor) => {
                cursor.set_position(0);
                Ok(())
            }
            TableStream::Remote(_) => Err(Error::invalid("Cannot rewind a remote table")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_stream_lines_and_rewind() {
        let mut stream = TableStream::from_buffer("one\ntwo\nthree".to_string());
        assert_eq!(stream.read_line().unwrap().as_deref(), Some("one"));
        assert_eq!(stream.read_line().unwrap().as_deref(), Some("two"));
        assert_eq!(stream.read_line().unwrap().as_deref(), Some("three"));
        assert_eq!(stream.read_line().unwrap(), None);
        stream.rewind().unwrap();
        assert_eq!(stream.read_line().unwrap().as_deref(), Some("one"));
    }

    #[test]
    fn test_crlf_stripped() {
        let mut stream = TableStream::from_buffer("a\r\nb\r\n".to_string());
        assert_eq!(stream.read_line().unwrap().as_deref(), Some("a"));
        assert_eq!(stream.read_line().unwrap().as_deref(), Some("b"));
        assert_eq!(stream.read_line().unwrap(), None);
    }

    #[test]
    fn test_file_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.table");
        std::fs::write(&path, "header\nrow\n").unwrap();
        let mut stream = TableStream::open_file(&path).unwrap();
        assert_eq!(stream.read_line().unwrap().as_deref(), Some("header"));
        assert_eq!(stream.read_line().unwrap().as_deref(), Some("row"));
        assert_eq!(stream.read_line().unwrap(), None);
        stream.rewind().unwrap();
        assert_eq!(stream.read_line().unwrap().as_deref(), Some("header"));
    }
}
