//! Text line encoding for samples at the transport boundary.
//!
//! One sample per line: the tag token plus three unsigned integers, joined
//! by `" ; "` and terminated by a newline, e.g.
//! `event/time/count: ; 3 ; 3000 ; 17`.

use crate::error::CodecError;
use crate::sample::Sample;

/// Leading token of every sample line.
pub const LINE_TAG: &str = "event/time/count:";

/// Encode one sample as a delimited text line, newline included.
pub fn encode(sample: &Sample) -> String {
    format!(
        "{LINE_TAG} ; {} ; {} ; {}\n",
        sample.tick_index, sample.elapsed_ms, sample.event_count
    )
}

/// Parse one line back into a [`Sample`].
///
/// Tolerates surrounding whitespace on every token and a missing trailing
/// newline; rejects anything that is not the tag plus exactly three
/// unsigned integers.
pub fn parse(line: &str) -> Result<Sample, CodecError> {
    let tokens: Vec<&str> = line.trim_end_matches('\n').split(';').collect();
    if tokens.len() != 4 {
        return Err(CodecError::FieldCount(tokens.len()));
    }

    let tag = tokens[0].trim();
    if tag != LINE_TAG {
        return Err(CodecError::UnexpectedTag(tag.to_string()));
    }

    Ok(Sample {
        tick_index: tokens[1].trim().parse()?,
        elapsed_ms: tokens[2].trim().parse()?,
        event_count: tokens[3].trim().parse()?,
    })
}
