use std::fs;
use std::path::{Path, PathBuf};

use regionpile::{AlignedRead, CigarOp};

fn snapshot_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("snapshots")
}

#[allow(dead_code)]
pub fn assert_snapshot(name: &str, actual: &str) {
    let path = snapshot_root().join(name);
    if std::env::var("REGIONPILE_UPDATE_SNAPSHOTS").is_ok() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create snapshot directory");
        }
        fs::write(&path, actual).expect("write snapshot");
        return;
    }

    let expected =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("snapshot {:?} not found", path));
    if normalize(&expected) != normalize(actual) {
        panic!(
            "Snapshot mismatch for {:?}. Set REGIONPILE_UPDATE_SNAPSHOTS=1 to regenerate.\nExpected:\n{}\nActual:\n{}",
            path,
            expected,
            actual
        );
    }
}

fn normalize(input: &str) -> String {
    input.replace("\r\n", "\n")
}

/// Forward or reverse read on chr1 with uniform base quality 30.
#[allow(dead_code)]
pub fn read(position: u32, cigar: &str, sequence: &[u8], is_reverse: bool) -> AlignedRead {
    AlignedRead::new(
        "chr1",
        position,
        60,
        CigarOp::parse(cigar).expect("valid CIGAR"),
        sequence.to_vec(),
        vec![30; sequence.len()],
        is_reverse,
    )
}
