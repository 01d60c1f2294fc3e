//! Shared listing parse step.

use strand_core::RangeName;
use tracing::warn;

/// A store file name together with its decoded range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedRange {
    pub(crate) file: String,
    pub(crate) range: RangeName,
}

/// Decodes a store listing, skipping (and logging) foreign file names.
pub(crate) fn parse_listing(files: Vec<String>) -> Vec<ParsedRange> {
    let mut parsed = Vec::with_capacity(files.len());
    for file in files {
        match RangeName::parse(&file) {
            Ok(range) => parsed.push(ParsedRange { file, range }),
            Err(e) => warn!(file = %file, error = %e, "ignoring non-range file"),
        }
    }
    parsed
}

/// Orders candidates the way consumers resolve ties: term first, then
/// rand, then file name byte order.
pub(crate) fn supersession_order(a: &ParsedRange, b: &ParsedRange) -> std::cmp::Ordering {
    a.range
        .term
        .cmp(&b.range.term)
        .then_with(|| a.range.rand.cmp(&b.range.rand))
        .then_with(|| a.file.cmp(&b.file))
}
