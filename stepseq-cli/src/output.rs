//! CSV output
//!
//! One `Value` header row, then one row per sequence element, each row
//! terminated by CRLF.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use stepseq_core::Number;
use tracing::info;

pub const CSV_HEADER: &str = "Value";
const ROW_END: &str = "\r\n";

/// Append `.csv` unless the name already ends with it
pub fn csv_filename(name: &str) -> PathBuf {
    let name = name.trim();
    if name.ends_with(".csv") {
        PathBuf::from(name)
    } else {
        PathBuf::from(format!("{}.csv", name))
    }
}

pub fn write_csv<W: Write>(mut writer: W, sequence: &[Number]) -> io::Result<()> {
    write!(writer, "{}{}", CSV_HEADER, ROW_END)?;
    for value in sequence {
        write!(writer, "{}{}", value, ROW_END)?;
    }
    writer.flush()
}

/// Create or truncate `path` and write the sequence to it
pub fn save_to_csv(path: &Path, sequence: &[Number]) -> io::Result<()> {
    let file = File::create(path)?;
    write_csv(BufWriter::new(file), sequence)?;
    info!(path = %path.display(), rows = sequence.len(), "sequence written");
    Ok(())
}
