//! Owned handle for a background thread with cooperative shutdown
//!
//! Dropping the handle sets the stop flag and joins the thread, so anything
//! declared after the handle in its owner is still alive while the thread
//! winds down.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use tracing::{debug, error};

use super::error::IpcError;

pub struct StoppableThread {
    name: &'static str,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl StoppableThread {
    /// Spawn `body`, which must return once the flag it is given turns true
    pub fn spawn<F>(name: &'static str, body: F) -> Result<Self, IpcError>
    where
        F: FnOnce(&AtomicBool) + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || body(&thread_stop))
            .map_err(|source| IpcError::Spawn { name, source })?;

        debug!(thread = name, "background thread started");

        Ok(Self {
            name,
            stop,
            handle: Some(handle),
        })
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Signal the thread and wait for it; later calls do nothing
    pub fn join(&mut self) {
        self.request_stop();

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!(thread = self.name, "background thread panicked");
            } else {
                debug!(thread = self.name, "background thread stopped");
            }
        }
    }
}

impl Drop for StoppableThread {
    fn drop(&mut self) {
        self.join();
    }
}
