use std::io::Read;

use crate::XlsxError;

/// Maximum uncompressed size permitted for any single ZIP part inflated into memory.
///
/// Guards against ZIP bombs and forged `uncompressed_size` metadata.
pub const MAX_PART_BYTES: u64 = 64 * 1024 * 1024; // 64MiB

/// Maximum total uncompressed bytes across a whole package.
pub const MAX_TOTAL_BYTES: u64 = 256 * 1024 * 1024; // 256MiB

pub(crate) struct ZipInflateBudget {
    max_total_bytes: u64,
    used_bytes: u64,
}

impl ZipInflateBudget {
    pub(crate) fn new(max_total_bytes: u64) -> Self {
        Self {
            max_total_bytes,
            used_bytes: 0,
        }
    }

    fn remaining_bytes(&self) -> u64 {
        self.max_total_bytes.saturating_sub(self.used_bytes)
    }

    fn consume(&mut self, bytes: u64) -> Result<(), XlsxError> {
        self.used_bytes = self.used_bytes.saturating_add(bytes);
        if self.used_bytes > self.max_total_bytes {
            return Err(XlsxError::PackageTooLarge {
                total: self.used_bytes,
                max: self.max_total_bytes,
            });
        }
        Ok(())
    }
}

/// Inflate one ZIP entry, enforcing both the per-part limit and the package budget.
///
/// The declared size is only a fast-path; reads are capped at `limit + 1` bytes so
/// forged metadata cannot force an unbounded allocation.
pub(crate) fn read_part_with_budget(
    entry: impl Read,
    declared_size: u64,
    part: &str,
    max_part_bytes: u64,
    budget: &mut ZipInflateBudget,
) -> Result<Vec<u8>, XlsxError> {
    if declared_size > max_part_bytes {
        return Err(XlsxError::PartTooLarge {
            part: part.to_string(),
            size: declared_size,
            max: max_part_bytes,
        });
    }

    let effective_max = max_part_bytes.min(budget.remaining_bytes());
    let mut buf = Vec::new();
    entry
        .take(effective_max.saturating_add(1))
        .read_to_end(&mut buf)?;

    let observed = buf.len() as u64;
    if observed > max_part_bytes {
        return Err(XlsxError::PartTooLarge {
            part: part.to_string(),
            size: observed,
            max: max_part_bytes,
        });
    }
    budget.consume(observed)?;
    Ok(buf)
}
