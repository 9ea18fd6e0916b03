//! Probe reports and their text/JSON renderings
//!
//! Text output is one `0x<hex>` line per sample and nothing else, so a
//! single-sample report prints exactly what the classic handbook program
//! prints. JSON output carries the same samples plus the region check.

use crate::error::{ProbeError, Result};
use crate::probe::{read_stack_pointer, StackPointer, TARGET_ARCH};
use crate::stack_region::{stack_limit, StackRegion};
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::{debug, trace};

/// Format tag written into JSON reports
pub const JSON_FORMAT: &str = "stackprobe-json-v1";

/// Stack region as written into JSON reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRegion {
    pub low: StackPointer,
    pub high: StackPointer,
    /// Region size in bytes
    pub size: usize,
    /// Soft RLIMIT_STACK in bytes (absent when unlimited or unknown)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rlimit: Option<u64>,
}

/// Complete JSON report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub format: String,
    pub arch: String,
    pub samples: Vec<StackPointer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<JsonRegion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub within_region: Option<bool>,
}

/// One probe run: the samples taken and, if requested, the region check
#[derive(Debug, Clone)]
pub struct ProbeReport {
    samples: Vec<StackPointer>,
    region: Option<StackRegion>,
    rlimit: Option<u64>,
}

impl ProbeReport {
    /// Take `samples` snapshots, resolving the thread stack region if `check`
    ///
    /// A `samples` of zero is treated as one; the CLI rejects it earlier.
    pub fn collect(samples: usize, check: bool) -> Result<Self> {
        let taken: Vec<StackPointer> = (0..samples.max(1)).map(|_| read_stack_pointer()).collect();
        for (i, sp) in taken.iter().enumerate() {
            trace!(sample = i, sp = %sp, "probed stack pointer");
        }

        let (region, rlimit) = if check {
            let region = StackRegion::current_thread()?;
            // A failing rlimit query is not worth failing the check over.
            let rlimit = stack_limit().unwrap_or_else(|err| {
                debug!(error = %err, "RLIMIT_STACK query failed");
                None
            });
            (Some(region), rlimit)
        } else {
            (None, None)
        };

        Ok(Self::from_parts(taken, region, rlimit))
    }

    pub fn from_parts(
        samples: Vec<StackPointer>,
        region: Option<StackRegion>,
        rlimit: Option<u64>,
    ) -> Self {
        Self {
            samples,
            region,
            rlimit,
        }
    }

    pub fn samples(&self) -> &[StackPointer] {
        &self.samples
    }

    pub fn region(&self) -> Option<&StackRegion> {
        self.region.as_ref()
    }

    /// Whether every sample lies in the region, `None` if no region was resolved
    pub fn within_region(&self) -> Option<bool> {
        self.region
            .map(|region| self.samples.iter().all(|sp| region.contains(*sp)))
    }

    /// Samples outside the resolved region
    pub fn outliers(&self) -> Vec<StackPointer> {
        match self.region {
            Some(region) => self
                .samples
                .iter()
                .copied()
                .filter(|sp| !region.contains(*sp))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Fail with the outlying samples if any lie outside the resolved region
    ///
    /// A report without a region passes; `collect` only skips the region
    /// when no check was asked for.
    pub fn verify(&self) -> Result<()> {
        let Some(region) = self.region else {
            return Ok(());
        };
        let outliers = self.outliers();
        if outliers.is_empty() {
            return Ok(());
        }
        let samples: Vec<String> = outliers.iter().map(|sp| sp.to_string()).collect();
        Err(ProbeError::OutsideRegion {
            samples: samples.join(", "),
            low: region.low(),
            high: region.high(),
        })
    }

    pub fn write_text<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        for sp in &self.samples {
            writeln!(out, "{}", sp)?;
        }
        Ok(())
    }

    pub fn to_json(&self) -> JsonReport {
        JsonReport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: JSON_FORMAT.to_string(),
            arch: TARGET_ARCH.to_string(),
            samples: self.samples.clone(),
            region: self.region.map(|region| JsonRegion {
                low: StackPointer::new(region.low()),
                high: StackPointer::new(region.high()),
                size: region.size(),
                rlimit: self.rlimit,
            }),
            within_region: self.within_region(),
        }
    }

    pub fn write_json<W: Write>(&self, out: &mut W) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(&mut *out, &self.to_json())?;
        writeln!(out).map_err(serde_json::Error::io)
    }
}
