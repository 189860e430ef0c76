//! Opening problems through a directory of candidate files.

use std::fs;
use std::path::Path;

use mmprob::writer::write_dense;
use mmprob::{ProblemError, RandomSelector, Reader};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Writes a `size × size × size` problem whose entries all equal `value`.
fn write_constant_problem(path: &Path, size: usize, value: f32) {
    let operand = Array2::from_elem((size, size), value);
    let answer = Array2::from_elem((size, size), value * value * size as f32);
    let mut bytes = Vec::new();
    write_dense(&mut bytes, operand.view(), operand.view(), answer.view()).unwrap();
    fs::write(path, bytes).unwrap();
}

#[test]
fn test_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("subdir")).unwrap();

    let err = Reader::<f32>::open(dir.path()).unwrap_err();
    assert!(matches!(err, ProblemError::EmptyDirectory { .. }));
    assert_eq!(
        err.to_string(),
        format!("directory \"{}\" contains no file", dir.path().display())
    );
}

#[test]
fn test_single_file_directory_matches_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("only.bin");
    write_constant_problem(&path, 3, 2.0);

    let mut from_dir = Reader::<f32>::open(dir.path()).unwrap();
    let mut from_file = Reader::<f32>::open(&path).unwrap();
    assert_eq!(from_dir.header(), from_file.header());
    assert_eq!(from_dir.encoding(), from_file.encoding());

    let (dir_lhs, dir_rhs) = from_dir.get_arrays().unwrap();
    let (file_lhs, file_rhs) = from_file.get_arrays().unwrap();
    assert_eq!(dir_lhs, file_lhs);
    assert_eq!(dir_rhs, file_rhs);

    let calced = vec![12.0f32, 12.0, 12.0, 12.0, 12.5, 12.0, 12.0, 12.0, 12.0];
    let dir_score = from_dir.score(&calced, 3, |_, _, _, _| {}).unwrap();
    let file_score = from_file.score(&calced, 3, |_, _, _, _| {}).unwrap();
    assert_eq!(dir_score, file_score);
    assert_eq!(dir_score.strict_violations, 1);
}

#[test]
fn test_deterministic_selector() {
    let dir = tempfile::tempdir().unwrap();
    for (i, name) in ["a.bin", "b.bin", "c.bin"].iter().enumerate() {
        write_constant_problem(&dir.path().join(name), i + 1, 1.0);
    }

    // Candidates are offered sorted by path.
    for (index, size) in [(0usize, 1u32), (1, 2), (2, 3)] {
        let reader = Reader::<f32>::open_dir_with(dir.path(), move |count: usize| {
            assert_eq!(count, 3);
            index
        })
        .unwrap();
        assert_eq!(reader.lhs_rows(), size);
    }
}

#[test]
fn test_random_selector_opens_every_candidate_eventually() {
    let dir = tempfile::tempdir().unwrap();
    for size in 1..=4 {
        write_constant_problem(&dir.path().join(format!("p{size}.bin")), size, 1.0);
    }

    let mut seen = [false; 4];
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..64 {
        let selector = RandomSelector::from_rng(&mut rng);
        let reader = Reader::<f32>::open_dir_with(dir.path(), selector).unwrap();
        seen[reader.lhs_rows() as usize - 1] = true;
    }
    assert!(seen.iter().all(|&s| s), "seen: {:?}", seen);
}
