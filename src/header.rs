use std::io::{self, Read};

use crate::codec::Encoding;
use crate::error::{validation_error, Result};
use crate::size::is_large;

/// The three dimensions that open every problem file.
///
/// `lhs` is `lhs_rows × lhs_cols`, `rhs` is `lhs_cols × rhs_cols` and the answer is
/// `lhs_rows × rhs_cols`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProblemHeader {
    pub lhs_rows: u32,
    pub lhs_cols: u32,
    pub rhs_cols: u32,
}

impl ProblemHeader {
    pub fn new(lhs_rows: u32, lhs_cols: u32, rhs_cols: u32) -> Self {
        ProblemHeader {
            lhs_rows,
            lhs_cols,
            rhs_cols,
        }
    }

    /// Builds a header from operand and answer shapes given as `(rows, cols)`.
    ///
    /// Fails when the shapes do not describe a matrix product or a dimension does not fit
    /// in a `u32`.
    pub fn from_shapes(
        lhs: (usize, usize),
        rhs: (usize, usize),
        answer: (usize, usize),
    ) -> Result<Self> {
        if lhs.1 != rhs.0 {
            return Err(validation_error(format!(
                "lhs is {}x{} but rhs is {}x{}",
                lhs.0, lhs.1, rhs.0, rhs.1
            )));
        }
        if answer != (lhs.0, rhs.1) {
            return Err(validation_error(format!(
                "answer is {}x{}, expected {}x{}",
                answer.0, answer.1, lhs.0, rhs.1
            )));
        }

        let dim = |value: usize| {
            u32::try_from(value)
                .map_err(|_| validation_error(format!("dimension {} does not fit in u32", value)))
        };
        Ok(ProblemHeader::new(dim(lhs.0)?, dim(lhs.1)?, dim(rhs.1)?))
    }

    #[inline]
    pub fn rhs_rows(&self) -> u32 {
        self.lhs_cols
    }

    pub fn lhs_shape(&self) -> (usize, usize) {
        (self.lhs_rows as usize, self.lhs_cols as usize)
    }

    pub fn rhs_shape(&self) -> (usize, usize) {
        (self.lhs_cols as usize, self.rhs_cols as usize)
    }

    pub fn answer_shape(&self) -> (usize, usize) {
        (self.lhs_rows as usize, self.rhs_cols as usize)
    }

    pub fn is_large(&self) -> bool {
        is_large(self.lhs_rows, self.lhs_cols, self.rhs_cols)
    }

    pub fn encoding(&self) -> Encoding {
        if self.is_large() {
            Encoding::Tiled
        } else {
            Encoding::Dense
        }
    }

    /// Reads `lhs_rows`, `lhs_cols`, `rhs_cols` in that order.
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let lhs_rows = read_u32(reader)?;
        let lhs_cols = read_u32(reader)?;
        let rhs_cols = read_u32(reader)?;
        Ok(ProblemHeader::new(lhs_rows, lhs_cols, rhs_cols))
    }

    pub fn extend_le(&self, out: &mut Vec<u8>) {
        for value in [self.lhs_rows, self.lhs_cols, self.rhs_cols] {
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
}

pub(crate) fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut raw = [0u8; 4];
    reader.read_exact(&mut raw)?;
    Ok(u32::from_le_bytes(raw))
}
