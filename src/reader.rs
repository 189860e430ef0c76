//! The problem reader: header parsing, codec selection and the `get`/`score` surface.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use ndarray::{Array2, ArrayView2};

use crate::codec::{Codec, Encoding};
use crate::element::Element;
use crate::error::{validation_error, Result};
use crate::header::ProblemHeader;
use crate::select::{select_file, RandomSelector, Selector};
use crate::tolerance::{Score, Standards};

/// Reads one benchmark problem and scores a computed product against its answer.
///
/// A reader owns its stream exclusively. `get` and `score` both take `&mut self` because
/// they move the shared stream position; each seeks to absolute offsets, so they may be
/// called in any order.
///
/// ```no_run
/// use mmprob::Reader;
///
/// let mut reader = Reader::<f32>::open("problems/")?;
/// let (m, k, n) = (
///     reader.lhs_rows() as usize,
///     reader.lhs_cols() as usize,
///     reader.rhs_cols() as usize,
/// );
/// let mut lhs = vec![0.0; m * k];
/// let mut rhs = vec![0.0; k * n];
/// reader.get(&mut lhs, &mut rhs, k, n)?;
///
/// let calced = vec![0.0; m * n]; // computed by the candidate
/// let score = reader.score(&calced, n, |row, col, calced, answer| {
///     eprintln!("({row}, {col}): {calced} != {answer}");
/// })?;
/// println!("{score}");
/// # Ok::<(), mmprob::ProblemError>(())
/// ```
#[derive(Debug)]
pub struct Reader<E, S = BufReader<File>> {
    header: ProblemHeader,
    stream: S,
    codec: Codec<E>,
    standards: Standards,
}

impl<E: Element> Reader<E> {
    /// Opens a problem file, or a uniformly random regular file if `path` is a directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::open_dir(path)
        } else {
            Self::open_file(path)
        }
    }

    pub fn open_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("opening problem {}", path.display());
        Self::from_stream(BufReader::new(File::open(path)?))
    }

    pub fn open_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::open_dir_with(dir, RandomSelector::new())
    }

    /// Opens the regular file of `dir` chosen by `selector`.
    pub fn open_dir_with(dir: impl AsRef<Path>, mut selector: impl Selector) -> Result<Self> {
        let path = select_file(dir, &mut selector)?;
        Self::open_file(path)
    }
}

impl<E: Element, S: Read + Seek> Reader<E, S> {
    /// Parses the header at the start of `stream` and binds the matching codec.
    pub fn from_stream(mut stream: S) -> Result<Self> {
        stream.seek(SeekFrom::Start(0))?;
        let header = ProblemHeader::read_from(&mut stream)?;
        let codec = Codec::open(&mut stream, header)?;

        log::debug!(
            "problem {}x{}x{} uses the {:?} encoding",
            header.lhs_rows,
            header.lhs_cols,
            header.rhs_cols,
            codec.encoding()
        );

        Ok(Reader {
            header,
            stream,
            codec,
            standards: Standards::default(),
        })
    }

    /// Replaces the tolerance digits used by subsequent `score` calls.
    pub fn with_standards(mut self, standards: Standards) -> Self {
        self.standards = standards;
        self
    }

    pub fn standards(&self) -> Standards {
        self.standards
    }

    pub fn header(&self) -> ProblemHeader {
        self.header
    }

    pub fn encoding(&self) -> Encoding {
        self.codec.encoding()
    }

    pub fn lhs_rows(&self) -> u32 {
        self.header.lhs_rows
    }

    pub fn lhs_cols(&self) -> u32 {
        self.header.lhs_cols
    }

    pub fn rhs_rows(&self) -> u32 {
        self.header.rhs_rows()
    }

    pub fn rhs_cols(&self) -> u32 {
        self.header.rhs_cols
    }

    /// Fills row-major `lhs` (`lhs_rows × lhs_cols`) and `rhs` (`lhs_cols × rhs_cols`).
    ///
    /// Rows start every `*_pitch` elements; elements between the end of a row and the
    /// next pitch boundary are left untouched.
    pub fn get(
        &mut self,
        lhs: &mut [E],
        rhs: &mut [E],
        lhs_pitch: usize,
        rhs_pitch: usize,
    ) -> Result<()> {
        self.codec.get(&mut self.stream, lhs, rhs, lhs_pitch, rhs_pitch)
    }

    /// Compares row-major `calced` (`lhs_rows × rhs_cols`, row stride `pitch`) against the
    /// stored answer.
    ///
    /// `violation_callback(row, col, calced, answer)` runs once per element beyond the
    /// strict threshold, in row-major order. Loose-only violations are counted but not
    /// reported individually.
    pub fn score<F>(&mut self, calced: &[E], pitch: usize, violation_callback: F) -> Result<Score<E>>
    where
        F: FnMut(u32, u32, E, E),
    {
        let score = self.codec.score(
            &mut self.stream,
            calced,
            pitch,
            &self.standards,
            violation_callback,
        )?;

        if score.is_acceptable() {
            log::debug!("{}", score);
        } else {
            log::warn!("{}", score);
        }
        Ok(score)
    }

    /// Allocates and fills both operands.
    pub fn get_arrays(&mut self) -> Result<(Array2<E>, Array2<E>)> {
        let lhs_shape = self.header.lhs_shape();
        let rhs_shape = self.header.rhs_shape();
        let mut lhs = vec![E::zero(); lhs_shape.0 * lhs_shape.1];
        let mut rhs = vec![E::zero(); rhs_shape.0 * rhs_shape.1];
        self.get(&mut lhs, &mut rhs, lhs_shape.1, rhs_shape.1)?;

        let to_array = |shape: (usize, usize), values: Vec<E>| {
            Array2::from_shape_vec(shape, values).map_err(|err| validation_error(err.to_string()))
        };
        Ok((to_array(lhs_shape, lhs)?, to_array(rhs_shape, rhs)?))
    }

    /// Scores any two-dimensional view. Views not in standard layout are copied first.
    pub fn score_array<F>(&mut self, calced: ArrayView2<E>, violation_callback: F) -> Result<Score<E>>
    where
        F: FnMut(u32, u32, E, E),
    {
        let expected = self.header.answer_shape();
        if calced.dim() != expected {
            return Err(validation_error(format!(
                "calced is {}x{}, expected {}x{}",
                calced.nrows(),
                calced.ncols(),
                expected.0,
                expected.1
            )));
        }

        let standard = calced.as_standard_layout();
        let values = standard
            .as_slice()
            .ok_or_else(|| validation_error("calced is not contiguous"))?;
        self.score(values, expected.1, violation_callback)
    }
}
