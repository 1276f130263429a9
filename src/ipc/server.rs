//! Unix-domain-socket command server
//!
//! One short-lived connection at a time: read one command, hand it to the
//! callback, write the ack byte, close. The accept loop polls the listener
//! with a short timeout so that it notices the stop flag, and `stop` also
//! connects to the socket once to wake a pending wait immediately.

use std::fs;
use std::io::{self, ErrorKind};
use std::os::fd::AsFd;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::command::{Command, read_command, write_ack};
use super::error::{DecodeError, IpcError};
use super::worker::StoppableThread;

/// How long one readiness wait on the listener lasts
pub const ACCEPT_POLL_MS: u16 = 100;
/// Upper bound on how long a single client may stall a read
pub const CLIENT_READ_TIMEOUT: Duration = Duration::from_secs(1);

const SERVER_THREAD_NAME: &str = "command-server";

pub struct CommandServer {
    socket_path: PathBuf,
    worker: Option<StoppableThread>,
}

impl CommandServer {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            worker: None,
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(StoppableThread::is_running)
    }

    /// Bind the socket and start accepting on a background thread
    ///
    /// `on_command` runs on the accept thread for every command that decodes,
    /// so it must only touch thread-safe state.
    pub fn start<F>(&mut self, on_command: F) -> Result<(), IpcError>
    where
        F: Fn(Command) + Send + 'static,
    {
        if self.worker.is_some() {
            return Err(IpcError::AlreadyRunning(self.socket_path.clone()));
        }

        let listener = self.bind()?;

        let worker = StoppableThread::spawn(SERVER_THREAD_NAME, move |stop| {
            accept_loop(&listener, stop, &on_command);
        });

        match worker {
            Ok(worker) => {
                info!(path = %self.socket_path.display(), "command server listening");
                self.worker = Some(worker);
                Ok(())
            }
            Err(err) => {
                remove_socket_file(&self.socket_path);
                Err(err)
            }
        }
    }

    /// Stop accepting, join the accept thread, and remove the socket file
    pub fn stop(&mut self) {
        let Some(mut worker) = self.worker.take() else {
            return;
        };

        worker.request_stop();

        // Wake the accept wait right away instead of waiting out the poll timeout.
        if let Err(err) = UnixStream::connect(&self.socket_path) {
            debug!(error = %err, "wake-up connection failed");
        }

        worker.join();
        remove_socket_file(&self.socket_path);
        info!(path = %self.socket_path.display(), "command server stopped");
    }

    fn bind(&self) -> Result<UnixListener, IpcError> {
        remove_socket_file(&self.socket_path);

        let bind_error = |source| IpcError::Bind {
            path: self.socket_path.clone(),
            source,
        };

        let listener = UnixListener::bind(&self.socket_path).map_err(bind_error)?;
        listener.set_nonblocking(true).map_err(bind_error)?;
        Ok(listener)
    }
}

impl Drop for CommandServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn remove_socket_file(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => debug!(path = %path.display(), error = %err, "could not remove socket file"),
    }
}

fn accept_loop<F>(listener: &UnixListener, stop: &AtomicBool, on_command: &F)
where
    F: Fn(Command),
{
    while !stop.load(Ordering::Acquire) {
        let mut fds = [PollFd::new(listener.as_fd(), PollFlags::POLLIN)];

        match poll(&mut fds, PollTimeout::from(ACCEPT_POLL_MS)) {
            Ok(0) => continue,
            Ok(_) => {}
            Err(Errno::EINTR) => continue,
            Err(err) => {
                warn!(error = %err, "poll on command socket failed");
                thread::sleep(Duration::from_millis(u64::from(ACCEPT_POLL_MS)));
                continue;
            }
        }

        let stream = match listener.accept() {
            Ok((stream, _)) => stream,
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                continue;
            }
            Err(err) => {
                warn!(error = %err, "accept on command socket failed");
                continue;
            }
        };

        if stop.load(Ordering::Acquire) {
            break;
        }

        if let Err(err) = handle_client(stream, on_command) {
            debug!(error = %err, "client connection dropped");
        }
    }
}

#[derive(Debug, Error)]
enum ClientError {
    #[error("socket setup: {0}")]
    Setup(#[source] io::Error),
    #[error("decode: {0}")]
    Decode(#[from] DecodeError),
    #[error("ack: {0}")]
    Ack(#[source] io::Error),
}

fn handle_client<F>(mut stream: UnixStream, on_command: &F) -> Result<(), ClientError>
where
    F: Fn(Command),
{
    stream.set_nonblocking(false).map_err(ClientError::Setup)?;
    stream
        .set_read_timeout(Some(CLIENT_READ_TIMEOUT))
        .map_err(ClientError::Setup)?;

    let command = match read_command(&mut stream) {
        Ok(command) => command,
        Err(DecodeError::Empty) => return Ok(()),
        Err(err) => {
            if let DecodeError::UnknownOpcode(opcode) = err {
                warn!(opcode, "rejected unknown opcode");
            }
            return Err(err.into());
        }
    };

    debug!(?command, "command received");
    on_command(command);

    write_ack(&mut stream).map_err(ClientError::Ack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::command::ACK;
    use std::io::{Read, Write};
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::time::Instant;
    use tempfile::TempDir;

    fn socket_in(dir: &TempDir) -> PathBuf {
        dir.path().join("cmd.sock")
    }

    fn exchange(path: &Path, bytes: &[u8]) -> Vec<u8> {
        let mut stream = UnixStream::connect(path).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(3)))
            .unwrap();
        stream.write_all(bytes).unwrap();
        stream.shutdown(std::net::Shutdown::Write).unwrap();
        let mut reply = Vec::new();
        stream.read_to_end(&mut reply).unwrap();
        reply
    }

    #[test]
    fn test_command_is_delivered_and_acked() {
        let dir = TempDir::new().unwrap();
        let path = socket_in(&dir);
        let (tx, rx) = mpsc::channel();

        let mut server = CommandServer::new(&path);
        server.start(move |command| tx.send(command).unwrap()).unwrap();
        assert!(server.is_running());

        assert_eq!(exchange(&path, &[1]), vec![ACK]);
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(1)).unwrap(),
            Command::StartGame
        );

        assert_eq!(exchange(&path, &[8, 12, 34]), vec![ACK]);
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(1)).unwrap(),
            Command::ChangeBoardSize {
                width: 12,
                height: 34
            }
        );
    }

    #[test]
    fn test_bad_opcode_gets_no_ack_and_no_callback() {
        let dir = TempDir::new().unwrap();
        let path = socket_in(&dir);
        let (tx, rx) = mpsc::channel();

        let mut server = CommandServer::new(&path);
        server.start(move |command| tx.send(command).unwrap()).unwrap();

        assert!(exchange(&path, &[9]).is_empty());
        assert!(exchange(&path, &[255]).is_empty());
        // short payload
        assert!(exchange(&path, &[8, 10]).is_empty());
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        // the server keeps serving after bad clients
        assert_eq!(exchange(&path, &[7]), vec![ACK]);
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(1)).unwrap(),
            Command::QuitGame
        );
    }

    #[test]
    fn test_stale_socket_file_is_replaced() {
        let dir = TempDir::new().unwrap();
        let path = socket_in(&dir);
        fs::write(&path, b"stale").unwrap();

        let mut server = CommandServer::new(&path);
        server.start(|_| {}).unwrap();
        assert_eq!(exchange(&path, &[0]), vec![ACK]);
    }

    #[test]
    fn test_start_twice_fails() {
        let dir = TempDir::new().unwrap();
        let mut server = CommandServer::new(socket_in(&dir));
        server.start(|_| {}).unwrap();

        assert!(matches!(
            server.start(|_| {}),
            Err(IpcError::AlreadyRunning(_))
        ));
    }

    #[test]
    fn test_bind_failure_is_reported() {
        let mut server = CommandServer::new("/nonexistent-dir/for/snake.sock");
        assert!(matches!(server.start(|_| {}), Err(IpcError::Bind { .. })));
        assert!(!server.is_running());
    }

    #[test]
    fn test_stop_is_prompt_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let path = socket_in(&dir);
        let calls = Arc::new(AtomicBool::new(false));
        let seen = Arc::clone(&calls);

        let mut server = CommandServer::new(&path);
        server
            .start(move |_| seen.store(true, Ordering::Release))
            .unwrap();

        let started = Instant::now();
        server.stop();

        assert!(started.elapsed() < Duration::from_millis(500));
        assert!(!server.is_running());
        assert!(!path.exists());
        // the wake-up connection is not a command
        assert!(!calls.load(Ordering::Acquire));
    }
}
