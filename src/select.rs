//! Picking one problem file out of a directory of candidates.

use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::ThreadRng;
use rand::Rng;

use crate::error::{empty_directory, validation_error, Result};

/// Chooses an index in `0..count` among the candidate files of a directory.
///
/// `count` is never zero. Closures `FnMut(usize) -> usize` implement this trait, which makes
/// a deterministic choice easy in tests.
pub trait Selector {
    fn pick(&mut self, count: usize) -> usize;
}

impl<F: FnMut(usize) -> usize> Selector for F {
    fn pick(&mut self, count: usize) -> usize {
        self(count)
    }
}

/// Uniform choice backed by a `rand` generator.
#[derive(Debug, Clone)]
pub struct RandomSelector<R = ThreadRng> {
    rng: R,
}

impl RandomSelector<ThreadRng> {
    pub fn new() -> Self {
        RandomSelector { rng: rand::rng() }
    }
}

impl Default for RandomSelector<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> RandomSelector<R> {
    pub fn from_rng(rng: R) -> Self {
        RandomSelector { rng }
    }
}

impl<R: Rng> Selector for RandomSelector<R> {
    fn pick(&mut self, count: usize) -> usize {
        self.rng.random_range(0..count)
    }
}

/// Regular files directly inside `dir`, sorted by path. Symlinks are followed.
pub fn list_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Lets `selector` choose one regular file of `dir`.
pub fn select_file<S: Selector + ?Sized>(dir: impl AsRef<Path>, selector: &mut S) -> Result<PathBuf> {
    let dir = dir.as_ref();
    let mut files = list_files(dir)?;
    if files.is_empty() {
        return Err(empty_directory(dir));
    }

    let count = files.len();
    let index = selector.pick(count);
    if index >= count {
        return Err(validation_error(format!(
            "selector picked candidate {} of {}",
            index, count
        )));
    }

    let path = files.swap_remove(index);
    log::debug!("selected {} out of {} candidates", path.display(), count);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProblemError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn populate(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), b"x").unwrap();
        }
    }

    #[test]
    fn test_list_files_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path(), &["b.bin", "a.bin"]);
        fs::create_dir(dir.path().join("nested")).unwrap();

        let files = list_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.bin", "b.bin"]);
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("only_a_dir")).unwrap();

        let err = select_file(dir.path(), &mut |_: usize| 0).unwrap_err();
        match err {
            ProblemError::EmptyDirectory { path } => assert_eq!(path, dir.path()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_closure_selector() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path(), &["a.bin", "b.bin", "c.bin"]);

        let picked = select_file(dir.path(), &mut |count: usize| count - 1).unwrap();
        assert_eq!(picked, dir.path().join("c.bin"));
    }

    #[test]
    fn test_out_of_range_selection() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path(), &["a.bin"]);

        let err = select_file(dir.path(), &mut |_: usize| 1).unwrap_err();
        assert!(matches!(err, ProblemError::ValidationError { .. }));
    }

    #[test]
    fn test_random_selector_covers_all_candidates() {
        let mut selector = RandomSelector::from_rng(StdRng::seed_from_u64(42));
        let mut hits = [0usize; 4];
        for _ in 0..400 {
            hits[selector.pick(4)] += 1;
        }
        assert!(hits.iter().all(|&h| h > 0), "hits: {:?}", hits);
    }

    #[test]
    fn test_thread_rng_selector_stays_in_range() {
        let mut selector = RandomSelector::new();
        for count in 1..20 {
            assert!(selector.pick(count) < count);
        }
    }
}
