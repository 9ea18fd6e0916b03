//! Current thread stack bounds
//!
//! Best-effort lookup of the address range reserved for the calling thread's
//! stack, used to check that a probed stack pointer is plausible. On Linux
//! the thread attributes are asked first (`pthread_getattr_np`); if that
//! fails the `[stack]` mapping of `/proc/self/maps` is used, which only
//! describes the main thread.

use crate::error::{ProbeError, Result};
use crate::probe::StackPointer;
use tracing::{debug, trace};

/// Path of the memory map of the running process
pub const PROC_SELF_MAPS: &str = "/proc/self/maps";

/// Half-open address range `[low, high)` of a thread stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackRegion {
    low: usize,
    high: usize,
}

impl StackRegion {
    pub fn new(low: usize, high: usize) -> Result<Self> {
        if low >= high {
            return Err(ProbeError::InvalidRegion { low, high });
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> usize {
        self.low
    }

    pub fn high(&self) -> usize {
        self.high
    }

    pub fn size(&self) -> usize {
        self.high - self.low
    }

    pub fn contains(&self, sp: StackPointer) -> bool {
        (self.low..self.high).contains(&sp.as_usize())
    }

    /// Resolve the stack region of the calling thread
    pub fn current_thread() -> Result<Self> {
        #[cfg(any(target_os = "linux", target_os = "android"))]
        {
            match thread_attr_region() {
                Ok(region) => {
                    debug!(
                        low = %StackPointer::new(region.low),
                        high = %StackPointer::new(region.high),
                        "stack region from thread attributes"
                    );
                    Ok(region)
                }
                Err(err) => {
                    debug!(error = %err, "thread attributes failed, reading {}", PROC_SELF_MAPS);
                    let maps = std::fs::read_to_string(PROC_SELF_MAPS)?;
                    parse_proc_maps_stack(&maps).ok_or_else(|| {
                        ProbeError::RegionUnavailable(format!(
                            "no [stack] mapping in {}",
                            PROC_SELF_MAPS
                        ))
                    })
                }
            }
        }

        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        {
            Err(ProbeError::RegionUnavailable(format!(
                "stack bounds lookup is not supported on {}",
                std::env::consts::OS
            )))
        }
    }
}

/// Ask the thread library for the calling thread's stack bounds
#[cfg(any(target_os = "linux", target_os = "android"))]
fn thread_attr_region() -> Result<StackRegion> {
    use std::mem::MaybeUninit;

    let mut attr = MaybeUninit::<libc::pthread_attr_t>::uninit();
    // SAFETY: pthread_getattr_np initializes attr when it returns 0
    let rc = unsafe { libc::pthread_getattr_np(libc::pthread_self(), attr.as_mut_ptr()) };
    if rc != 0 {
        return Err(ProbeError::RegionUnavailable(format!(
            "pthread_getattr_np failed: {}",
            std::io::Error::from_raw_os_error(rc)
        )));
    }

    let mut stack_addr: *mut libc::c_void = std::ptr::null_mut();
    let mut stack_size: libc::size_t = 0;
    // SAFETY: attr was initialized above and is destroyed exactly once below
    let rc = unsafe {
        let rc = libc::pthread_attr_getstack(attr.as_ptr(), &mut stack_addr, &mut stack_size);
        libc::pthread_attr_destroy(attr.as_mut_ptr());
        rc
    };
    if rc != 0 {
        return Err(ProbeError::RegionUnavailable(format!(
            "pthread_attr_getstack failed: {}",
            std::io::Error::from_raw_os_error(rc)
        )));
    }

    let low = stack_addr as usize;
    let high = low.checked_add(stack_size).ok_or_else(|| {
        ProbeError::RegionUnavailable(format!(
            "stack of 0x{:x} bytes at 0x{:x} wraps the address space",
            stack_size, low
        ))
    })?;
    StackRegion::new(low, high)
}

/// Find the `[stack]` mapping in `/proc/<pid>/maps` text
///
/// Returns `None` when no line is tagged `[stack]` or its range is malformed.
pub fn parse_proc_maps_stack(maps: &str) -> Option<StackRegion> {
    let line = maps
        .lines()
        .find(|line| line.split_whitespace().next_back() == Some("[stack]"))?;
    trace!(line, "found stack mapping");

    let range = line.split_whitespace().next()?;
    let (low, high) = range.split_once('-')?;
    let low = usize::from_str_radix(low, 16).ok()?;
    let high = usize::from_str_radix(high, 16).ok()?;
    StackRegion::new(low, high).ok()
}

/// Soft `RLIMIT_STACK` of the process in bytes, `None` when unlimited
#[cfg(unix)]
pub fn stack_limit() -> Result<Option<u64>> {
    use nix::sys::resource::{getrlimit, Resource};

    let (soft, _hard) = getrlimit(Resource::RLIMIT_STACK)
        .map_err(|errno| ProbeError::Io(std::io::Error::from(errno)))?;
    if soft == libc::RLIM_INFINITY {
        Ok(None)
    } else {
        Ok(Some(u64::from(soft)))
    }
}

#[cfg(not(unix))]
pub fn stack_limit() -> Result<Option<u64>> {
    Ok(None)
}
