//! Remote tables fetched over HTTP
//!
//! A table name beginning with `http://` is fetched with a plain HTTP/1.1
//! GET (`Connection: Close`). The first line of the response body is a
//! space-separated list of column names; each column is synthesized as
//! `varchar(25)` with no constraints. The remaining body lines stream as
//! rows. The socket cannot rewind, so remote tables are read-only and
//! report an unknown row count.

use super::stream::TableStream;
use crate::error::{Error, Result};
use crate::types::{ColumnMetadata, ColumnType, Schema};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use tracing::debug;

/// Fetches `url` and returns the row stream (positioned at the first data
/// row) together with the synthesized schema.
pub fn fetch(url: &str) -> Result<(TableStream, Schema)> {
    let rest = url
        .strip_prefix("http://")
        .ok_or_else(|| Error::invalid(format!("Invalid table URL: {}", url)))?;
    let (host, resource) = match rest.find('/') {
        Some(slash) => (&rest[..slash], &rest[slash..]),
        None => (rest, "/"),
    };
    debug!(host, resource, "fetching remote table");
    let mut socket = TcpStream::connect((host, 80))?;
    write!(
        socket,
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: Close\r\n\r\n",
        resource, host
    )?;
    let mut reader = BufReader::new(socket);

    let status = read_line(&mut reader)?;
    if !status.contains("200 OK") {
        return Err(Error::invalid(format!("Error accessing {}: {}", url, status)));
    }
    loop {
        let line = read_line(&mut reader)?;
        if line.is_empty() {
            break;
        }
    }

    let table = rest.rsplit('/').next().unwrap_or(rest);
    let header = read_line(&mut reader)?;
    let mut schema = Schema::default();
    for col_name in header.split_whitespace() {
        schema.add_column(ColumnMetadata::new(
            col_name,
            table,
            ColumnType::Varchar(25),
            None,
            false,
            false,
        ));
    }
    Ok((TableStream::from_remote(reader), schema))
}

fn read_line(reader: &mut BufReader<TcpStream>) -> Result<String> {
    let mut line = String::new();
    reader.read_line(&mut line)?;
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(line)
}
