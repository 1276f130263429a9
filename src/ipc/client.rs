//! Minimal client for the command socket

use std::io::{self, Read};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use super::command::{Command, write_command};

/// Send one command and wait for the server's single-byte reply
///
/// Returns the reply byte, or an `UnexpectedEof` error if the server closed
/// the connection without acknowledging (for example on an unknown opcode).
pub fn send_command(path: &Path, command: Command, timeout: Duration) -> io::Result<u8> {
    let mut stream = UnixStream::connect(path)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    write_command(&mut stream, command)?;

    let mut reply = [0u8; 1];
    stream.read_exact(&mut reply)?;
    Ok(reply[0])
}

/// Send raw bytes, for exercising the server with malformed input
pub fn send_raw(path: &Path, bytes: &[u8], timeout: Duration) -> io::Result<Vec<u8>> {
    use std::io::Write;

    let mut stream = UnixStream::connect(path)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.write_all(bytes)?;
    stream.shutdown(std::net::Shutdown::Write)?;

    let mut reply = Vec::new();
    stream.read_to_end(&mut reply)?;
    Ok(reply)
}
