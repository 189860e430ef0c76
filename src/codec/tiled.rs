//! Tiled encoding for problems too large to store densely.
//!
//! `lhs`, `rhs` and the answer are each a [`TileDescriptor`] followed by its four blocks.
//! `get` expands the operand tiles into the caller's buffers; `score` walks the same tiling
//! over the caller's result without ever materializing the reference answer.

use std::io::{Read, Seek, SeekFrom};
use std::marker::PhantomData;

use crate::codec::{check_buffer, check_stream_len, score_rows};
use crate::element::Element;
use crate::error::{corrupt_file, Result};
use crate::header::ProblemHeader;
use crate::tile::{TileDescriptor, TiledMatrix};
use crate::tolerance::{Score, Standards};
use crate::{HEADER_BYTES, TILE_DESCRIPTOR_BYTES};

#[derive(Debug, Clone)]
pub struct TiledCodec<E> {
    header: ProblemHeader,
    lhs_offset: u64,
    answer_offset: u64,
    descriptors: [TileDescriptor; 3],
    _element: PhantomData<E>,
}

impl<E: Element> TiledCodec<E> {
    /// Walks the three descriptors once, validating each against its matrix shape and
    /// recording where the answer starts.
    pub fn open<S: Read + Seek>(stream: &mut S, header: ProblemHeader) -> Result<Self> {
        let shapes = [
            (header.lhs_rows, header.lhs_cols),
            (header.lhs_cols, header.rhs_cols),
            (header.lhs_rows, header.rhs_cols),
        ];

        let mut offset = HEADER_BYTES;
        let mut offsets = [0u64; 3];
        let mut descriptors = [TileDescriptor {
            repeat_rows: 0,
            repeat_cols: 0,
            pad_rows: 0,
            pad_cols: 0,
        }; 3];

        for (i, &(rows, cols)) in shapes.iter().enumerate() {
            stream.seek(SeekFrom::Start(offset))?;
            let descriptor = TileDescriptor::read_from(stream)?;
            descriptor.validate(rows, cols)?;

            offsets[i] = offset;
            descriptors[i] = descriptor;
            offset = descriptor
                .payload_elements()?
                .checked_mul(E::BYTES as u64)
                .and_then(|bytes| bytes.checked_add(TILE_DESCRIPTOR_BYTES))
                .and_then(|bytes| bytes.checked_add(offset))
                .ok_or_else(|| {
                    corrupt_file(format!("{:?} ends beyond the largest file offset", descriptor))
                })?;
        }
        check_stream_len(stream, offset)?;

        log::trace!("tiled layout {:?} at offsets {:?}", descriptors, offsets);

        Ok(TiledCodec {
            header,
            lhs_offset: offsets[0],
            answer_offset: offsets[2],
            descriptors,
            _element: PhantomData,
        })
    }

    pub fn descriptors(&self) -> [TileDescriptor; 3] {
        self.descriptors
    }

    /// Reads both operand tiles, then expands them into the caller's buffers concurrently.
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

        // The rhs tile immediately follows the lhs tile.
        stream.seek(SeekFrom::Start(self.lhs_offset))?;
        let lhs_tiles =
            TiledMatrix::<E>::read_from(stream, self.header.lhs_rows, self.header.lhs_cols)?;
        let rhs_tiles =
            TiledMatrix::<E>::read_from(stream, self.header.lhs_cols, self.header.rhs_cols)?;

        rayon::join(
            || expand_into(&lhs_tiles, lhs, lhs_pitch),
            || expand_into(&rhs_tiles, rhs, rhs_pitch),
        );
        Ok(())
    }

    /// Compares `calced` against the tiled answer, one row segment at a time.
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
        let answer =
            TiledMatrix::<E>::read_from(stream, self.header.lhs_rows, self.header.rhs_cols)?;
        let interior_cols = answer.interior_cols();

        let empty = Score::new(self.header.lhs_cols, standards);
        Ok(score_rows(
            calced,
            rows,
            cols,
            pitch,
            empty,
            |row, calced_row, tally| {
                let (interior, tail) = answer.row_sources(row);
                let (body, rest) = calced_row.split_at(interior_cols);

                if !interior.is_empty() {
                    for (band, chunk) in body.chunks_exact(interior.len()).enumerate() {
                        let base = band * interior.len();
                        for (offset, (&c, &a)) in chunk.iter().zip(interior).enumerate() {
                            tally.check(row, base + offset, c, a);
                        }
                    }
                }
                for (offset, (&c, &a)) in rest.iter().zip(tail).enumerate() {
                    tally.check(row, interior_cols + offset, c, a);
                }
            },
            violation_callback,
        ))
    }
}

fn expand_into<E: Element>(tiles: &TiledMatrix<E>, dst: &mut [E], pitch: usize) {
    let cols = tiles.cols() as usize;
    for row in 0..tiles.rows() as usize {
        let start = row * pitch;
        tiles.expand_row(row, &mut dst[start..start + cols]);
    }
}
