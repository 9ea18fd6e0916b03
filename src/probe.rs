//! Stack pointer probe
//!
//! Reads the machine's stack-pointer register with inline assembly. The
//! register read is bound per instruction set; building for a target that
//! has no binding here is a compile error rather than a runtime failure.
//!
//! The value is an artifact of the compiler, calling convention, and
//! platform. It is only guaranteed to point somewhere inside the calling
//! thread's stack at the moment of the read.

use crate::error::{ProbeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[cfg(not(any(
    target_arch = "x86_64",
    target_arch = "x86",
    target_arch = "aarch64",
    target_arch = "arm",
    target_arch = "riscv64",
    target_arch = "riscv32",
    target_arch = "loongarch64"
)))]
compile_error!("stackprobe has no stack pointer binding for this target architecture");

/// Architecture the probe was compiled for
pub const TARGET_ARCH: &str = std::env::consts::ARCH;

/// A snapshot of the stack pointer register
///
/// Formats as `0x` followed by lowercase hex digits with no padding, the same
/// shape `printf("0x%lx")` produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct StackPointer(usize);

impl StackPointer {
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    pub const fn as_usize(self) -> usize {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Parse the `0x<hex>` form printed by the tool
    ///
    /// # Example
    /// ```
    /// use stackprobe::probe::StackPointer;
    ///
    /// let sp = StackPointer::parse("0x7ffd5e8c1a30").unwrap();
    /// assert_eq!(sp.as_usize(), 0x7ffd5e8c1a30);
    /// assert_eq!(sp.to_string(), "0x7ffd5e8c1a30");
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let reject = |reason: &str| ProbeError::ParseStackPointer {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let digits = input
            .strip_prefix("0x")
            .or_else(|| input.strip_prefix("0X"))
            .ok_or_else(|| reject("missing 0x prefix"))?;

        if digits.is_empty() {
            return Err(reject("no hex digits after prefix"));
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(reject("contains non-hex characters"));
        }

        usize::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| reject("value does not fit in a machine word"))
    }
}

impl fmt::Display for StackPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl fmt::LowerHex for StackPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl fmt::UpperHex for StackPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

impl FromStr for StackPointer {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<StackPointer> for String {
    fn from(sp: StackPointer) -> Self {
        sp.to_string()
    }
}

impl TryFrom<String> for StackPointer {
    type Error = ProbeError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

/// Read the current stack pointer register
///
/// Never inlined, so every call reads the register from inside its own
/// frame. Consecutive calls may return different values.
#[inline(never)]
pub fn read_stack_pointer() -> StackPointer {
    StackPointer(read_register())
}

#[cfg(target_arch = "x86_64")]
#[inline(always)]
fn read_register() -> usize {
    let sp: usize;
    // SAFETY: copies rsp into a general purpose register, touches no memory
    unsafe {
        std::arch::asm!("mov {}, rsp", out(reg) sp, options(nomem, nostack, preserves_flags));
    }
    sp
}

#[cfg(target_arch = "x86")]
#[inline(always)]
fn read_register() -> usize {
    let sp: usize;
    // SAFETY: copies esp into a general purpose register, touches no memory
    unsafe {
        std::arch::asm!("mov {}, esp", out(reg) sp, options(nomem, nostack, preserves_flags));
    }
    sp
}

#[cfg(any(target_arch = "aarch64", target_arch = "arm"))]
#[inline(always)]
fn read_register() -> usize {
    let sp: usize;
    // SAFETY: copies sp into a general purpose register, touches no memory
    unsafe {
        std::arch::asm!("mov {}, sp", out(reg) sp, options(nomem, nostack, preserves_flags));
    }
    sp
}

#[cfg(any(target_arch = "riscv64", target_arch = "riscv32"))]
#[inline(always)]
fn read_register() -> usize {
    let sp: usize;
    // SAFETY: copies sp into a general purpose register, touches no memory
    unsafe {
        std::arch::asm!("mv {}, sp", out(reg) sp, options(nomem, nostack, preserves_flags));
    }
    sp
}

#[cfg(target_arch = "loongarch64")]
#[inline(always)]
fn read_register() -> usize {
    let sp: usize;
    // SAFETY: copies $sp into a general purpose register, touches no memory
    unsafe {
        std::arch::asm!("move {}, $sp", out(reg) sp, options(nomem, nostack, preserves_flags));
    }
    sp
}
