//! Test fixtures with automatic cleanup

#![allow(dead_code)]

use statframe::io::{read_csv_str, CsvReadOptions, LocalFileSystem, MemoryFileSystem};
use statframe::DataFrame;
use tempfile::TempDir;

/// Balanced 2 x 3 design, two replicates per cell, rows interleaved
pub const TOOTH_GROWTH_CSV: &str = "\
len,supp,dose
4.2,VC,0.5
15.2,OJ,0.5
16.5,VC,1
19.7,OJ,1
23.6,VC,2
25.5,OJ,2
11.5,VC,0.5
21.5,OJ,0.5
16.5,VC,1
23.3,OJ,1
18.5,VC,2
26.4,OJ,2
";

/// Install a test logger once; later calls are no-ops
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The fixture data with `supp` and `dose` converted to categoricals
pub fn tooth_growth() -> DataFrame {
    let mut df = read_csv_str(TOOTH_GROWTH_CSV, &CsvReadOptions::default()).unwrap();
    df.to_categorical("supp").unwrap();
    df.to_categorical("dose").unwrap();
    df
}

/// In-memory provider holding the fixture as `tooth_growth.csv`
pub fn memory_fs() -> MemoryFileSystem {
    let mut fs = MemoryFileSystem::new();
    fs.insert("tooth_growth.csv", TOOTH_GROWTH_CSV);
    fs
}

/// Temporary directory exposed through a `LocalFileSystem`.
///
/// The directory and its contents are deleted when this is dropped.
pub struct TempWorkspace {
    dir: TempDir,
}

impl TempWorkspace {
    pub fn new() -> std::io::Result<Self> {
        Ok(TempWorkspace {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn fs(&self) -> LocalFileSystem {
        LocalFileSystem::new(self.dir.path())
    }

    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }
}
