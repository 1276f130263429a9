//! Background publisher for game snapshots
//!
//! The game loop hands over a snapshot with [`SnapshotPublisher::publish`],
//! which only copies it under a lock and raises a flag. A writer thread polls
//! that flag and does the packing and the shared-memory write, so the game
//! loop never waits on readers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::error::IpcError;
use super::layout::{GameSnapshot, SNAPSHOT_SIZE, pack_snapshot};
use super::shm::SharedRegion;
use super::worker::StoppableThread;

/// How often the writer thread checks for a new snapshot
pub const WRITER_POLL_INTERVAL: Duration = Duration::from_micros(200);

const WRITER_THREAD_NAME: &str = "snapshot-writer";

struct Shared {
    region: SharedRegion,
    latest: Mutex<GameSnapshot>,
    has_new: AtomicBool,
}

pub struct SnapshotPublisher {
    // Declared first so the writer is joined before the region is unmapped.
    writer: Option<StoppableThread>,
    shared: Option<Arc<Shared>>,
}

impl SnapshotPublisher {
    /// Create the shared-memory region, or fall back to a disabled publisher
    pub fn create(name: &str) -> Self {
        match SharedRegion::create(name) {
            Ok(region) => Self {
                writer: None,
                shared: Some(Arc::new(Shared {
                    region,
                    latest: Mutex::new(GameSnapshot::default()),
                    has_new: AtomicBool::new(false),
                })),
            },
            Err(err) => {
                warn!(error = %err, "shared memory unavailable, snapshots will not be published");
                Self::disabled()
            }
        }
    }

    /// A publisher that accepts snapshots and drops them
    pub fn disabled() -> Self {
        Self {
            writer: None,
            shared: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.shared.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.writer.as_ref().is_some_and(StoppableThread::is_running)
    }

    /// Start the writer thread; does nothing if disabled or already running
    pub fn start(&mut self) -> Result<(), IpcError> {
        let Some(shared) = &self.shared else {
            return Ok(());
        };
        if self.writer.is_some() {
            return Ok(());
        }

        let shared = Arc::clone(shared);
        let writer = StoppableThread::spawn(WRITER_THREAD_NAME, move |stop| {
            writer_loop(&shared, stop);
        })?;

        info!(name = shared_name(&self.shared), "snapshot writer started");
        self.writer = Some(writer);
        Ok(())
    }

    /// Hand over the latest snapshot; never blocks on the shared region
    pub fn publish(&self, snapshot: &GameSnapshot) {
        let Some(shared) = &self.shared else {
            return;
        };

        shared.latest.lock().clone_from(snapshot);
        shared.has_new.store(true, Ordering::Release);
    }

    /// Stop and join the writer thread
    pub fn stop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            writer.join();
            debug!("snapshot writer stopped");
        }
    }

    /// Version counter of the shared region, if there is one
    pub fn version(&self) -> Option<u32> {
        self.shared.as_ref().map(|shared| shared.region.version())
    }

    /// Read back what external readers currently see
    pub fn read_latest(&self) -> Option<(u32, GameSnapshot)> {
        self.shared.as_ref()?.region.read_snapshot()
    }
}

impl Drop for SnapshotPublisher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn shared_name(shared: &Option<Arc<Shared>>) -> &str {
    shared
        .as_ref()
        .map_or("<disabled>", |shared| shared.region.name())
}

fn writer_loop(shared: &Shared, stop: &AtomicBool) {
    let mut packed = vec![0u8; SNAPSHOT_SIZE];
    let mut pending = GameSnapshot::default();

    while !stop.load(Ordering::Acquire) {
        if shared.has_new.swap(false, Ordering::AcqRel) {
            // Only the copy happens under the lock; `publish` never waits on packing.
            pending.clone_from(&shared.latest.lock());

            match pack_snapshot(&pending, &mut packed) {
                Ok(used) => {
                    if !shared.region.write(&packed[..used]) {
                        debug!("shared memory busy, snapshot skipped");
                    }
                }
                Err(err) => warn!(error = %err, "failed to pack snapshot"),
            }
        }

        thread::sleep(WRITER_POLL_INTERVAL);
    }
}
