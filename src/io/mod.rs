//! Reading and writing tables through a file system provider

pub mod csv;
pub mod fs;

pub use self::csv::{read_csv, read_csv_str, write_csv, write_csv_string, CsvReadOptions, NA_TOKEN};
pub use self::fs::{FileSystem, LocalFileSystem, MemoryFileSystem};
