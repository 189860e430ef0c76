//! Payload codecs for the two on-disk encodings.
//!
//! The encoding is decided once from the header (see [`is_large`](crate::size::is_large))
//! and never changes for the lifetime of a reader. Both codecs seek to absolute offsets, so
//! `get` and `score` may be issued in any order.

use std::io::{Read, Seek, SeekFrom};

use rayon::prelude::*;

use crate::element::Element;
use crate::error::{corrupt_file, validation_error, Result};
use crate::header::ProblemHeader;
use crate::tolerance::{Score, Standards, Violation};

pub mod dense;
pub mod tiled;

pub use dense::DenseCodec;
pub use tiled::TiledCodec;

/// Rows scored by one parallel task.
const ROWS_PER_BAND: usize = 16;

/// Elements covered by one window of bands. Strict violations are held only until the
/// window they belong to has been scored.
const ELEMENTS_PER_WINDOW: usize = 1 << 20;

/// On-disk layout of the payload that follows the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// `lhs`, `rhs` and the answer fully materialized, row-major.
    Dense,
    /// `lhs`, `rhs` and the answer each stored as a tile descriptor plus four blocks.
    Tiled,
}

/// The codec bound to a reader's stream.
#[derive(Debug, Clone)]
pub enum Codec<E> {
    Dense(DenseCodec<E>),
    Tiled(TiledCodec<E>),
}

impl<E: Element> Codec<E> {
    /// Binds the codec matching `header` to `stream`, which must hold a complete problem.
    pub fn open<S: Read + Seek>(stream: &mut S, header: ProblemHeader) -> Result<Self> {
        match header.encoding() {
            Encoding::Dense => Ok(Codec::Dense(DenseCodec::open(stream, header)?)),
            Encoding::Tiled => Ok(Codec::Tiled(TiledCodec::open(stream, header)?)),
        }
    }

    pub fn encoding(&self) -> Encoding {
        match self {
            Codec::Dense(_) => Encoding::Dense,
            Codec::Tiled(_) => Encoding::Tiled,
        }
    }

    pub fn get<S: Read + Seek>(
        &self,
        stream: &mut S,
        lhs: &mut [E],
        rhs: &mut [E],
        lhs_pitch: usize,
        rhs_pitch: usize,
    ) -> Result<()> {
        match self {
            Codec::Dense(codec) => codec.get(stream, lhs, rhs, lhs_pitch, rhs_pitch),
            Codec::Tiled(codec) => codec.get(stream, lhs, rhs, lhs_pitch, rhs_pitch),
        }
    }

    pub fn score<S, F>(
        &self,
        stream: &mut S,
        calced: &[E],
        pitch: usize,
        standards: &Standards,
        violation_callback: F,
    ) -> Result<Score<E>>
    where
        S: Read + Seek,
        F: FnMut(u32, u32, E, E),
    {
        match self {
            Codec::Dense(codec) => codec.score(stream, calced, pitch, standards, violation_callback),
            Codec::Tiled(codec) => codec.score(stream, calced, pitch, standards, violation_callback),
        }
    }
}

/// Checks that a `rows × cols` matrix with row stride `pitch` fits in `len` elements.
pub(crate) fn check_buffer(name: &str, len: usize, rows: usize, cols: usize, pitch: usize) -> Result<()> {
    if pitch < cols {
        return Err(validation_error(format!(
            "{} pitch {} is smaller than its {} columns",
            name, pitch, cols
        )));
    }

    let required = match rows {
        0 => Some(0),
        _ => (rows - 1)
            .checked_mul(pitch)
            .and_then(|start| start.checked_add(cols)),
    };
    let required = required.ok_or_else(|| {
        validation_error(format!(
            "{} {}x{} with pitch {} exceeds the address space",
            name, rows, cols, pitch
        ))
    })?;
    if len < required {
        return Err(validation_error(format!(
            "{} buffer holds {} elements, {}x{} with pitch {} needs {}",
            name, len, rows, cols, pitch, required
        )));
    }
    Ok(())
}

/// Fails when the stream ends before `expected_end`.
pub(crate) fn check_stream_len<S: Seek>(stream: &mut S, expected_end: u64) -> Result<()> {
    let end = stream.seek(SeekFrom::End(0))?;
    if end < expected_end {
        return Err(corrupt_file(format!(
            "file is {} bytes, its header requires {}",
            end, expected_end
        )));
    }
    Ok(())
}

/// Partial score of a band of rows along with its strict violations in row-major order.
pub(crate) struct Tally<E> {
    score: Score<E>,
    violations: Vec<Violation<E>>,
}

impl<E: Element> Tally<E> {
    #[inline(always)]
    pub(crate) fn check(&mut self, row: usize, col: usize, calced: E, answer: E) {
        if !self.score.check(calced, answer) {
            self.violations.push(Violation {
                row: row as u32,
                col: col as u32,
                calced,
                answer,
            });
        }
    }
}

/// Scores `rows` rows of `calced` in parallel bands.
///
/// `compare_row(row, calced_row, tally)` checks every element of one row against its
/// reference. Bands are scored one window at a time; partial scores are merged in row
/// order and the callback is invoked on the calling thread, once per strict violation, in
/// row-major order, before the next window starts.
pub(crate) fn score_rows<E, C, F>(
    calced: &[E],
    rows: usize,
    cols: usize,
    pitch: usize,
    empty: Score<E>,
    compare_row: C,
    mut violation_callback: F,
) -> Score<E>
where
    E: Element,
    C: Fn(usize, &[E], &mut Tally<E>) + Sync,
    F: FnMut(u32, u32, E, E),
{
    let bands = rows.div_ceil(ROWS_PER_BAND);
    let window = window_bands(cols);
    let mut total = empty;

    for first in (0..bands).step_by(window) {
        let last = (first + window).min(bands);
        let partials: Vec<Tally<E>> = (first..last)
            .into_par_iter()
            .map(|band| {
                let mut tally = Tally {
                    score: empty,
                    violations: Vec::new(),
                };
                let end = ((band + 1) * ROWS_PER_BAND).min(rows);
                for row in band * ROWS_PER_BAND..end {
                    let start = row * pitch;
                    compare_row(row, &calced[start..start + cols], &mut tally);
                }
                tally
            })
            .collect();

        for tally in &partials {
            total.merge(&tally.score);
            for violation in &tally.violations {
                violation_callback(
                    violation.row,
                    violation.col,
                    violation.calced,
                    violation.answer,
                );
            }
        }
    }
    total
}

/// Bands per window for rows of `cols` elements, never fewer than the worker count.
fn window_bands(cols: usize) -> usize {
    let bands = ELEMENTS_PER_WINDOW / cols.max(1).saturating_mul(ROWS_PER_BAND);
    bands.max(rayon::current_num_threads()).max(1)
}
