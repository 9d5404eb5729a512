//! User-supplied filename → group overrides.

use crate::error::{ensure_exists, GfopError, Result};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Column that keys every override row.
pub const FILENAME_COLUMN: &str = "filename";

/// Field delimiter implied by a metadata file's extension.
///
/// `.csv` is comma-separated; `.tsv` and `.txt` are tab-separated.
pub fn delimiter_for(path: &Path) -> Result<u8> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("csv") => Ok(b','),
        Some("tsv") | Some("txt") => Ok(b'\t'),
        _ => Err(GfopError::UnsupportedMetadataFormat(
            path.display().to_string(),
        )),
    }
}

/// Read `filename → merge_column` from a CSV or TSV metadata file.
pub fn read_group_mapping<P: AsRef<Path>>(
    path: P,
    merge_column: &str,
) -> Result<HashMap<String, String>> {
    let path = path.as_ref();
    let delimiter = delimiter_for(path)?;
    ensure_exists(path)?;
    let file = File::open(path)?;
    group_mapping_from_reader(BufReader::new(file), delimiter, merge_column)
}

/// Read `filename → merge_column` from any delimited reader.
///
/// Both columns must be present in the header. Rows with an empty merge
/// value are skipped; the last row wins for a repeated filename.
pub fn group_mapping_from_reader<R: Read>(
    reader: R,
    delimiter: u8,
    merge_column: &str,
) -> Result<HashMap<String, String>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| GfopError::MissingColumn(name.to_string()))
    };
    let filename_col = find(FILENAME_COLUMN)?;
    let merge_col = find(merge_column)?;

    let mut mapping = HashMap::new();
    for record in rdr.records() {
        let record = record?;
        let filename = record.get(filename_col).unwrap_or("").trim();
        let value = record.get(merge_col).unwrap_or("").trim();
        if filename.is_empty() || value.is_empty() {
            continue;
        }
        mapping.insert(filename.to_string(), value.to_string());
    }

    log::debug!(
        "Read {} group overrides from column '{}'",
        mapping.len(),
        merge_column
    );
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_delimiter_by_extension() {
        assert_eq!(delimiter_for(Path::new("meta.csv")).unwrap(), b',');
        assert_eq!(delimiter_for(Path::new("meta.TSV")).unwrap(), b'\t');
        assert_eq!(delimiter_for(Path::new("meta.txt")).unwrap(), b'\t');
        let err = delimiter_for(Path::new("meta.xlsx")).unwrap_err();
        assert!(matches!(err, GfopError::UnsupportedMetadataFormat(_)));
    }

    #[test]
    fn test_read_csv_mapping() {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "filename,diet,age").unwrap();
        writeln!(file, "s1.mzXML,vegan,30").unwrap();
        writeln!(file, "s2.mzXML,,41").unwrap();
        writeln!(file, "s1.mzXML,omnivore,30").unwrap();
        file.flush().unwrap();

        let mapping = read_group_mapping(file.path(), "diet").unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping["s1.mzXML"], "omnivore");
    }

    #[test]
    fn test_missing_filename_column() {
        let data = "sample,diet\ns1,vegan\n";
        let err = group_mapping_from_reader(data.as_bytes(), b',', "diet").unwrap_err();
        assert!(matches!(err, GfopError::MissingColumn(ref c) if c == "filename"));
    }

    #[test]
    fn test_missing_merge_column() {
        let data = "filename\tdiet\ns1\tvegan\n";
        let err = group_mapping_from_reader(data.as_bytes(), b'\t', "cohort").unwrap_err();
        assert!(matches!(err, GfopError::MissingColumn(ref c) if c == "cohort"));
    }
}
