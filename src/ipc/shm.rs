//! POSIX shared-memory region holding the latest game snapshot
//!
//! The region starts with a one-byte write-in-progress flag and a `u32`
//! version counter (see [`super::layout`]). A write claims the flag with a
//! compare-and-swap, copies the packed snapshot, bumps the version and
//! releases the flag. Readers treat the snapshot as torn while the flag is
//! set or the version moved during their copy.
//!
//! # Safety
//!
//! Only one `SharedRegion` should write to a given name at a time. Other
//! processes map the same name read-only.

use std::ffi::c_void;
use std::num::NonZeroUsize;
use std::os::fd::OwnedFd;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering, fence};

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::libc::off_t;
use nix::sys::mman::{MapFlags, ProtFlags, mmap, munmap, shm_open, shm_unlink};
use nix::sys::stat::Mode;
use nix::unistd::ftruncate;
use tracing::{debug, info, warn};

use super::error::IpcError;
use super::layout::{
    GameSnapshot, REGION_SIZE, SNAPSHOT_OFFSET, SNAPSHOT_SIZE, VERSION_OFFSET,
    WRITING_FLAG_OFFSET, unpack_snapshot,
};

pub struct SharedRegion {
    name: String,
    base: NonNull<c_void>,
    _fd: OwnedFd,
}

// Safety: the header fields are only touched through atomics and the
// snapshot bytes are only written while the write flag is held.
unsafe impl Send for SharedRegion {}
unsafe impl Sync for SharedRegion {}

impl SharedRegion {
    /// Create (or recreate) the named region, sized and zeroed
    pub fn create(name: &str) -> Result<Self, IpcError> {
        let error = |operation, source| IpcError::SharedMemory {
            name: name.to_string(),
            operation,
            source,
        };

        // A crashed run leaves the name behind; a live one is replaced.
        match shm_unlink(name) {
            Ok(()) => warn!(
                name,
                "replaced an existing shared-memory object; a running instance loses its feed"
            ),
            Err(Errno::ENOENT) => {}
            Err(err) => debug!(name, error = %err, "could not remove stale shared memory"),
        }

        let fd = shm_open(
            name,
            OFlag::O_CREAT | OFlag::O_RDWR,
            Mode::from_bits_truncate(0o666),
        )
        .map_err(|source| error("shm_open", source))?;

        if let Err(source) = ftruncate(&fd, REGION_SIZE as off_t) {
            let _ = shm_unlink(name);
            return Err(error("ftruncate", source));
        }

        let length = NonZeroUsize::new(REGION_SIZE).ok_or(error("mmap", Errno::EINVAL))?;

        let base = unsafe {
            mmap(
                None,
                length,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                &fd,
                0,
            )
        };
        let base = match base {
            Ok(base) => base,
            Err(source) => {
                let _ = shm_unlink(name);
                return Err(error("mmap", source));
            }
        };

        unsafe { ptr::write_bytes(base.as_ptr().cast::<u8>(), 0, REGION_SIZE) };

        info!(name, size = REGION_SIZE, "shared memory created");

        Ok(Self {
            name: name.to_string(),
            base,
            _fd: fd,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn bytes(&self) -> *mut u8 {
        self.base.as_ptr().cast::<u8>()
    }

    fn write_flag(&self) -> &AtomicBool {
        unsafe { &*self.bytes().add(WRITING_FLAG_OFFSET).cast::<AtomicBool>() }
    }

    fn version_counter(&self) -> &AtomicU32 {
        unsafe { &*self.bytes().add(VERSION_OFFSET).cast::<AtomicU32>() }
    }

    /// Number of completed writes
    pub fn version(&self) -> u32 {
        self.version_counter().load(Ordering::Acquire)
    }

    /// Whether a write is in progress right now
    pub fn is_writing(&self) -> bool {
        self.write_flag().load(Ordering::Acquire)
    }

    /// Copy `packed` into the snapshot area
    ///
    /// Returns `false` without touching the region if another write holds the
    /// flag. Bytes past `SNAPSHOT_SIZE` are ignored.
    pub fn write(&self, packed: &[u8]) -> bool {
        let flag = self.write_flag();
        if flag
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }

        // Payload stores must not become visible before the flag.
        fence(Ordering::Release);

        let len = packed.len().min(SNAPSHOT_SIZE);
        unsafe {
            ptr::copy_nonoverlapping(packed.as_ptr(), self.bytes().add(SNAPSHOT_OFFSET), len);
        }

        fence(Ordering::Release);

        self.version_counter().fetch_add(1, Ordering::Release);
        flag.store(false, Ordering::Release);
        true
    }

    /// Read the last complete snapshot and its version
    ///
    /// Returns `None` while nothing has been written, while a write is in
    /// progress, or if a write overlapped the copy.
    pub fn read_snapshot(&self) -> Option<(u32, GameSnapshot)> {
        if self.is_writing() {
            return None;
        }
        let before = self.version();
        if before == 0 {
            return None;
        }

        let mut copy = vec![0u8; SNAPSHOT_SIZE];
        unsafe {
            ptr::copy_nonoverlapping(
                self.bytes().add(SNAPSHOT_OFFSET),
                copy.as_mut_ptr(),
                SNAPSHOT_SIZE,
            );
        }

        // The copy's loads must complete before the re-check.
        fence(Ordering::Acquire);

        if self.is_writing() || self.version() != before {
            return None;
        }

        match unpack_snapshot(&copy) {
            Ok(snapshot) => Some((before, snapshot)),
            Err(err) => {
                warn!(error = %err, "shared memory held an invalid snapshot");
                None
            }
        }
    }

    #[cfg(test)]
    fn force_write_flag(&self, value: bool) {
        self.write_flag().store(value, Ordering::Release);
    }
}

impl Drop for SharedRegion {
    fn drop(&mut self) {
        if let Err(err) = unsafe { munmap(self.base, REGION_SIZE) } {
            warn!(name = %self.name, error = %err, "munmap failed");
        }
        match shm_unlink(self.name.as_str()) {
            Ok(()) | Err(Errno::ENOENT) => {}
            Err(err) => warn!(name = %self.name, error = %err, "shm_unlink failed"),
        }
        info!(name = %self.name, "shared memory released");
    }
}
