//! Tiled (repeat block + padding) matrix representation.
//!
//! A `rows × cols` matrix is described by a `repeat_rows × repeat_cols` block tiled across
//! the interior, plus three padding blocks covering the remainder:
//!
//! ```text
//!   +--------+--------+--------+-----+
//!   | repeat | repeat | repeat | pr  |    pr  = pad_right        (repeat_rows × pad_cols)
//!   +--------+--------+--------+-----+
//!   | repeat | repeat | repeat | pr  |
//!   +--------+--------+--------+-----+
//!   |   pb   |   pb   |   pb   | pbr |    pb  = pad_bottom       (pad_rows × repeat_cols)
//!   +--------+--------+--------+-----+    pbr = pad_bottom_right (pad_rows × pad_cols)
//! ```
//!
//! The descriptor must satisfy `rows % repeat_rows == pad_rows` and
//! `cols % repeat_cols == pad_cols`, and a repeat block may not exceed its matrix.

use std::io::{self, Read};

use ndarray::{Array2, ArrayView2};

use crate::element::{decode_into, Element};
use crate::error::{corrupt_file, validation_error, Result};
use crate::header::read_u32;

/// Tile geometry stored ahead of each tiled matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileDescriptor {
    pub repeat_rows: u32,
    pub repeat_cols: u32,
    pub pad_rows: u32,
    pub pad_cols: u32,
}

impl TileDescriptor {
    pub(crate) fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let repeat_rows = read_u32(reader)?;
        let repeat_cols = read_u32(reader)?;
        let pad_rows = read_u32(reader)?;
        let pad_cols = read_u32(reader)?;
        Ok(TileDescriptor {
            repeat_rows,
            repeat_cols,
            pad_rows,
            pad_cols,
        })
    }

    pub(crate) fn extend_le(&self, out: &mut Vec<u8>) {
        for value in [self.repeat_rows, self.repeat_cols, self.pad_rows, self.pad_cols] {
            out.extend_from_slice(&value.to_le_bytes());
        }
    }

    /// Checks that the descriptor exactly covers a `rows × cols` matrix.
    pub fn validate(&self, rows: u32, cols: u32) -> Result<()> {
        check_axis("rows", rows, self.repeat_rows, self.pad_rows)?;
        check_axis("cols", cols, self.repeat_cols, self.pad_cols)
    }

    /// Element counts of `repeat`, `pad_bottom`, `pad_right` and `pad_bottom_right`.
    ///
    /// Counts that do not fit in `usize` saturate.
    pub fn block_lens(&self) -> [usize; 4] {
        let (rr, rc) = (self.repeat_rows as usize, self.repeat_cols as usize);
        let (pr, pc) = (self.pad_rows as usize, self.pad_cols as usize);
        [
            rr.saturating_mul(rc),
            pr.saturating_mul(rc),
            rr.saturating_mul(pc),
            pr.saturating_mul(pc),
        ]
    }

    /// Total elements stored after the descriptor.
    pub fn payload_elements(&self) -> Result<u64> {
        let (rr, rc) = (u64::from(self.repeat_rows), u64::from(self.repeat_cols));
        let (pr, pc) = (u64::from(self.pad_rows), u64::from(self.pad_cols));
        // Each product of two u32 fits in u64; only the sum can overflow.
        [rr * rc, pr * rc, rr * pc, pr * pc]
            .into_iter()
            .try_fold(0u64, u64::checked_add)
            .ok_or_else(|| corrupt_file(format!("{:?} describes more than 2^64 elements", self)))
    }
}

fn check_axis(axis: &str, dim: u32, repeat: u32, pad: u32) -> Result<()> {
    let covered = if repeat == 0 {
        dim == 0 && pad == 0
    } else {
        repeat <= dim.max(1) && dim % repeat == pad
    };
    if covered {
        Ok(())
    } else {
        Err(corrupt_file(format!(
            "{} {} is not covered by repeat {} with padding {}",
            axis, dim, repeat, pad
        )))
    }
}

/// A matrix held as its four tile blocks, never materialized unless asked to.
#[derive(Debug, Clone, PartialEq)]
pub struct TiledMatrix<E> {
    rows: u32,
    cols: u32,
    descriptor: TileDescriptor,
    repeat: Vec<E>,
    pad_bottom: Vec<E>,
    pad_right: Vec<E>,
    pad_bottom_right: Vec<E>,
}

impl<E: Element> TiledMatrix<E> {
    /// Assembles a tiled matrix from its blocks, each in row-major order.
    pub fn from_blocks(
        rows: u32,
        cols: u32,
        descriptor: TileDescriptor,
        repeat: Vec<E>,
        pad_bottom: Vec<E>,
        pad_right: Vec<E>,
        pad_bottom_right: Vec<E>,
    ) -> Result<Self> {
        descriptor.validate(rows, cols)?;

        let actual = [
            repeat.len(),
            pad_bottom.len(),
            pad_right.len(),
            pad_bottom_right.len(),
        ];
        if actual != descriptor.block_lens() {
            return Err(validation_error(format!(
                "block lengths {:?} do not match descriptor {:?}",
                actual,
                descriptor.block_lens()
            )));
        }

        Ok(TiledMatrix {
            rows,
            cols,
            descriptor,
            repeat,
            pad_bottom,
            pad_right,
            pad_bottom_right,
        })
    }

    /// Compresses a dense matrix that is periodic with a `repeat_rows × repeat_cols` tile.
    ///
    /// A zero-sized axis always gets a zero repeat. Fails when the tile is larger than the
    /// matrix or the matrix does not actually repeat with that period.
    pub fn compress(matrix: ArrayView2<E>, repeat_rows: u32, repeat_cols: u32) -> Result<Self> {
        let (rows, cols) = matrix.dim();
        let rows = u32::try_from(rows)
            .map_err(|_| validation_error(format!("{} rows do not fit in u32", rows)))?;
        let cols = u32::try_from(cols)
            .map_err(|_| validation_error(format!("{} cols do not fit in u32", cols)))?;

        let repeat_rows = if rows == 0 { 0 } else { repeat_rows };
        let repeat_cols = if cols == 0 { 0 } else { repeat_cols };
        if (rows > 0 && !(1..=rows).contains(&repeat_rows))
            || (cols > 0 && !(1..=cols).contains(&repeat_cols))
        {
            return Err(validation_error(format!(
                "tile {}x{} does not fit matrix {}x{}",
                repeat_rows, repeat_cols, rows, cols
            )));
        }

        let descriptor = TileDescriptor {
            repeat_rows,
            repeat_cols,
            pad_rows: if rows == 0 { 0 } else { rows % repeat_rows },
            pad_cols: if cols == 0 { 0 } else { cols % repeat_cols },
        };
        let interior_rows = (rows - descriptor.pad_rows) as usize;
        let interior_cols = (cols - descriptor.pad_cols) as usize;

        let block = |row_start: usize, row_len: u32, col_start: usize, col_len: u32| -> Vec<E> {
            let mut values = Vec::with_capacity(row_len as usize * col_len as usize);
            for r in row_start..row_start + row_len as usize {
                for c in col_start..col_start + col_len as usize {
                    values.push(matrix[[r, c]]);
                }
            }
            values
        };

        let tiled = TiledMatrix::from_blocks(
            rows,
            cols,
            descriptor,
            block(0, repeat_rows, 0, repeat_cols),
            block(interior_rows, descriptor.pad_rows, 0, repeat_cols),
            block(0, repeat_rows, interior_cols, descriptor.pad_cols),
            block(interior_rows, descriptor.pad_rows, interior_cols, descriptor.pad_cols),
        )?;

        for ((r, c), &value) in matrix.indexed_iter() {
            let tiled_value = tiled.get(r, c);
            let same = tiled_value == value || (tiled_value.is_nan() && value.is_nan());
            if !same {
                return Err(validation_error(format!(
                    "matrix is not periodic with tile {}x{}: ({}, {}) differs",
                    repeat_rows, repeat_cols, r, c
                )));
            }
        }

        Ok(tiled)
    }

    /// Reads a descriptor and its four blocks, rejecting descriptors that do not cover
    /// `rows × cols`.
    pub(crate) fn read_from<R: Read>(reader: &mut R, rows: u32, cols: u32) -> Result<Self> {
        let descriptor = TileDescriptor::read_from(reader)?;
        descriptor.validate(rows, cols)?;

        let [repeat, pad_bottom, pad_right, pad_bottom_right] = descriptor.block_lens();
        log::trace!("reading {}x{} tiled matrix, {:?}", rows, cols, descriptor);

        Ok(TiledMatrix {
            rows,
            cols,
            descriptor,
            repeat: read_block(reader, repeat)?,
            pad_bottom: read_block(reader, pad_bottom)?,
            pad_right: read_block(reader, pad_right)?,
            pad_bottom_right: read_block(reader, pad_bottom_right)?,
        })
    }

    pub(crate) fn extend_le(&self, out: &mut Vec<u8>) {
        self.descriptor.extend_le(out);
        for block in [
            &self.repeat,
            &self.pad_bottom,
            &self.pad_right,
            &self.pad_bottom_right,
        ] {
            for &value in block.iter() {
                value.extend_le(out);
            }
        }
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn descriptor(&self) -> TileDescriptor {
        self.descriptor
    }

    #[inline(always)]
    pub(crate) fn interior_cols(&self) -> usize {
        (self.cols - self.descriptor.pad_cols) as usize
    }

    /// The repeating segment and the tail segment that make up one dense row.
    ///
    /// The dense row is `interior` repeated `interior_cols / repeat_cols` times followed by
    /// `tail` once.
    #[inline]
    pub(crate) fn row_sources(&self, row: usize) -> (&[E], &[E]) {
        let rc = self.descriptor.repeat_cols as usize;
        let pc = self.descriptor.pad_cols as usize;
        let interior_rows = (self.rows - self.descriptor.pad_rows) as usize;

        if row < interior_rows {
            let r = row % self.descriptor.repeat_rows as usize;
            (
                &self.repeat[r * rc..(r + 1) * rc],
                &self.pad_right[r * pc..(r + 1) * pc],
            )
        } else {
            let r = row - interior_rows;
            (
                &self.pad_bottom[r * rc..(r + 1) * rc],
                &self.pad_bottom_right[r * pc..(r + 1) * pc],
            )
        }
    }

    /// Writes dense row `row` into `dst`, which must be exactly `cols` long.
    pub fn expand_row(&self, row: usize, dst: &mut [E]) {
        debug_assert_eq!(dst.len(), self.cols as usize);
        let (interior, tail) = self.row_sources(row);
        let (body, rest) = dst.split_at_mut(self.interior_cols());

        if !interior.is_empty() {
            for band in body.chunks_exact_mut(interior.len()) {
                band.copy_from_slice(interior);
            }
        }
        rest.copy_from_slice(tail);
    }

    /// Element `(row, col)` of the dense matrix.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> E {
        let (interior, tail) = self.row_sources(row);
        let interior_cols = self.interior_cols();
        if col < interior_cols {
            interior[col % interior.len()]
        } else {
            tail[col - interior_cols]
        }
    }

    /// Materializes the dense matrix.
    pub fn expand(&self) -> Array2<E> {
        let (rows, cols) = (self.rows as usize, self.cols as usize);
        let mut dense = Array2::zeros((rows, cols));
        for (row, mut dst) in dense.outer_iter_mut().enumerate() {
            // Freshly allocated arrays are in standard layout.
            if let Some(slice) = dst.as_slice_mut() {
                self.expand_row(row, slice);
            }
        }
        dense
    }
}

fn read_block<E: Element, R: Read>(reader: &mut R, len: usize) -> Result<Vec<E>> {
    let mut bytes = vec![0u8; len * E::BYTES];
    reader.read_exact(&mut bytes)?;
    let mut values = vec![E::zero(); len];
    decode_into(&bytes, &mut values);
    Ok(values)
}
