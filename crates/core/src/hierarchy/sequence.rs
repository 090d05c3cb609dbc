//! Sibling suffix allocation.

use aip_shared::config::EngineConfig;

use super::error::HierarchyError;

/// Digits in an allocated suffix.
pub const SUFFIX_WIDTH: usize = 3;

/// Largest suffix that fits in [`SUFFIX_WIDTH`] digits.
pub const MAX_SUFFIX: u32 = 999;

/// How allocation treats an existing sibling suffix that is not numeric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SuffixPolicy {
    /// Leave it out of the max computation and log a warning.
    #[default]
    Lenient,
    /// Fail the allocation.
    Strict,
}

impl From<&EngineConfig> for SuffixPolicy {
    fn from(config: &EngineConfig) -> Self {
        if config.strict_suffixes {
            Self::Strict
        } else {
            Self::Lenient
        }
    }
}

/// Numeric value of the trailing hyphen-delimited segment of a suffix.
///
/// `"004"` and `"01-1-02-005-004"` both yield `4`.
#[must_use]
pub fn suffix_number(suffix: &str) -> Option<u32> {
    let segment = suffix.rsplit('-').next()?.trim();
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Formats a sequence number as a zero-padded suffix.
#[must_use]
pub fn format_suffix(number: u32) -> String {
    format!("{number:0>SUFFIX_WIDTH$}")
}

/// Computes the next unused suffix given the suffixes of the existing siblings.
///
/// The result is one more than the largest existing number, so gaps left by
/// deletions are never refilled: `001, 002, 004` yields `005`.
///
/// # Errors
///
/// - `SequenceExhausted` if the next number does not fit in three digits.
/// - `InvalidSuffix` in strict mode when a sibling suffix is not numeric.
pub fn next_suffix<S: AsRef<str>>(
    siblings: &[S],
    policy: SuffixPolicy,
) -> Result<String, HierarchyError> {
    let mut max = 0u32;

    for suffix in siblings {
        let suffix = suffix.as_ref();
        match suffix_number(suffix) {
            Some(n) => max = max.max(n),
            None if policy == SuffixPolicy::Strict => {
                return Err(HierarchyError::InvalidSuffix(suffix.to_string()));
            }
            None => {
                tracing::warn!(suffix, "non-numeric sibling suffix left out of allocation");
            }
        }
    }

    let next = max.saturating_add(1);
    if next > MAX_SUFFIX {
        return Err(HierarchyError::SequenceExhausted {
            scope: format!("{} siblings", siblings.len()),
        });
    }
    Ok(format_suffix(next))
}
