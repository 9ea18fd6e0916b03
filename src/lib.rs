//! stackprobe - read and print the current stack pointer register
//!
//! The probe reads the register with per-architecture inline assembly and
//! reports it as `0x<hex>`. A best-effort stack region lookup lets callers
//! check that the value actually falls inside the calling thread's stack.

pub mod cli;
pub mod error;
pub mod probe;
pub mod report;
pub mod stack_region;
