//! Dense encoding: `lhs`, `rhs` and the answer stored row-major one after another.

use std::io::{Read, Seek, SeekFrom};
use std::marker::PhantomData;

use crate::codec::{check_buffer, check_stream_len, score_rows};
use crate::element::{decode_into, Element};
use crate::error::Result;
use crate::header::ProblemHeader;
use crate::tolerance::{Score, Standards};
use crate::HEADER_BYTES;

#[derive(Debug, Clone)]
pub struct DenseCodec<E> {
    header: ProblemHeader,
    answer_offset: u64,
    _element: PhantomData<E>,
}

impl<E: Element> DenseCodec<E> {
    pub fn open<S: Read + Seek>(stream: &mut S, header: ProblemHeader) -> Result<Self> {
        let element_bytes = E::BYTES as u64;
        let (m, k, n) = (
            header.lhs_rows as u64,
            header.lhs_cols as u64,
            header.rhs_cols as u64,
        );
        let answer_offset = HEADER_BYTES + (m * k + k * n) * element_bytes;
        check_stream_len(stream, answer_offset + m * n * element_bytes)?;

        Ok(DenseCodec {
            header,
            answer_offset,
            _element: PhantomData,
        })
    }

    /// Copies both operands into the caller's buffers, one row read per destination row.
    pub fn get<S: Read + Seek>(
        &self,
        stream: &mut S,
        lhs: &mut [E],
        rhs: &mut [E],
        lhs_pitch: usize,
        rhs_pitch: usize,
    ) -> Result<()> {
        let (lhs_rows, lhs_cols) = self.header.lhs_shape();
        let (rhs_rows, rhs_cols) = self.header.rhs_shape();
        check_buffer("lhs", lhs.len(), lhs_rows, lhs_cols, lhs_pitch)?;
        check_buffer("rhs", rhs.len(), rhs_rows, rhs_cols, rhs_pitch)?;

        stream.seek(SeekFrom::Start(HEADER_BYTES))?;
        read_rows(stream, lhs, lhs_rows, lhs_cols, lhs_pitch)?;
        read_rows(stream, rhs, rhs_rows, rhs_cols, rhs_pitch)?;
        Ok(())
    }

    /// Loads the whole answer block and compares it with `calced`.
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
        let (rows, cols) = self.header.answer_shape();
        check_buffer("calced", calced.len(), rows, cols, pitch)?;

        stream.seek(SeekFrom::Start(self.answer_offset))?;
        let mut answer = vec![E::zero(); rows * cols];
        read_rows(stream, &mut answer, rows, cols, cols)?;

        let empty = Score::new(self.header.lhs_cols, standards);
        Ok(score_rows(
            calced,
            rows,
            cols,
            pitch,
            empty,
            |row, calced_row, tally| {
                let answer_row = &answer[row * cols..(row + 1) * cols];
                for (col, (&c, &a)) in calced_row.iter().zip(answer_row).enumerate() {
                    tally.check(row, col, c, a);
                }
            },
            violation_callback,
        ))
    }
}

fn read_rows<E: Element, S: Read>(
    stream: &mut S,
    dst: &mut [E],
    rows: usize,
    cols: usize,
    pitch: usize,
) -> Result<()> {
    let mut bytes = vec![0u8; cols * E::BYTES];
    for row in 0..rows {
        stream.read_exact(&mut bytes)?;
        let start = row * pitch;
        decode_into(&bytes, &mut dst[start..start + cols]);
    }
    Ok(())
}
