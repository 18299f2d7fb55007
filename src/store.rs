use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::record::{COLUMNS, JobRecord};

// Spreadsheet tools only sniff UTF-8 when the file starts with a BOM.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Result-page URLs from the first column of a headerless CSV. Blank cells
/// are skipped; order is kept. Callers check existence first.
pub fn read_page_urls(path: &Path) -> Result<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("cannot open {}", path.display()))?;

    let mut urls = Vec::new();
    for (i, row) in rdr.records().enumerate() {
        let row = row.with_context(|| format!("{}: bad row {}", path.display(), i + 1))?;
        let cell = row.get(0).unwrap_or("").trim().trim_start_matches('\u{feff}');
        if !cell.is_empty() {
            urls.push(cell.to_string());
        }
    }
    Ok(urls)
}

/// Write `records` with a header row, replacing whatever is at `path`. The
/// data lands in a sibling temp file first, so readers never see a torn file.
pub fn write_records(path: &Path, records: &[JobRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
    }

    let tmp = tmp_path(path);
    write_csv(&tmp, records).with_context(|| format!("cannot write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("cannot replace {}", path.display()))?;
    Ok(())
}

fn write_csv(path: &Path, records: &[JobRecord]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(UTF8_BOM)?;

    let mut w = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);
    // explicit header so an empty checkpoint still carries the columns
    w.write_record(COLUMNS)?;
    for r in records {
        w.serialize(r)?;
    }
    w.flush()?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Remove `path` if it exists. Returns whether something was removed.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("cannot remove {}", path.display())),
    }
}

#[cfg(test)]
pub(crate) fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let bytes = fs::read(path).unwrap();
    let body = bytes.strip_prefix(UTF8_BOM).expect("missing BOM");
    csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(body)
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::NOT_AVAILABLE;

    fn record(link: &str) -> JobRecord {
        JobRecord {
            title: "Data Engineer, Platform".into(),
            rating: "4.1".into(),
            location: "London".into(),
            salary: "£60,000 a year".into(),
            contract_type: "Permanent".into(),
            benefits: "Pension\n\"Hybrid\" working".into(),
            link: link.into(),
        }
    }

    #[test]
    fn writes_header_then_rows_in_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut second = record("https://j/2");
        second.rating = NOT_AVAILABLE.into();

        write_records(&path, &[record("https://j/1"), second]).unwrap();

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], COLUMNS.map(String::from).to_vec());
        assert_eq!(rows[1][0], "Data Engineer, Platform");
        assert_eq!(rows[1][5], "Pension\n\"Hybrid\" working");
        assert_eq!(rows[1][6], "https://j/1");
        assert_eq!(rows[2][1], NOT_AVAILABLE);
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn overwrite_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.csv");
        write_records(&path, &[record("a"), record("b")]).unwrap();
        write_records(&path, &[record("c")]).unwrap();
        let rows = read_rows(&path);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][6], "c");
    }

    #[test]
    fn reads_first_column_skipping_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.csv");
        fs::write(
            &path,
            "\u{feff}https://a/jobs?start=10,extra\n\n  \nhttps://a/jobs?start=20\n,\nhttps://a/jobs?start=30\n",
        )
        .unwrap();
        let urls = read_page_urls(&path).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://a/jobs?start=10",
                "https://a/jobs?start=20",
                "https://a/jobs?start=30",
            ]
        );
    }

    #[test]
    fn missing_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_page_urls(&dir.path().join("nope.csv")).is_err());
    }

    #[test]
    fn remove_reports_absence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.csv");
        assert!(!remove_if_exists(&path).unwrap());
        fs::write(&path, "x").unwrap();
        assert!(remove_if_exists(&path).unwrap());
        assert!(!path.exists());
    }
}
