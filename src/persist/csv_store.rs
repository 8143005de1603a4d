// src/persist/csv_store.rs

use csv::{ReaderBuilder, WriterBuilder};
use std::{
    collections::HashSet,
    ffi::OsString,
    fs, io,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument, warn};

use super::{EmptyReason, LoadOutcome};
use crate::error::Result;
use crate::schema::Column;
use crate::table::Table;

/// Read the participant list at `path`.
///
/// - a missing or blank file yields `LoadOutcome::Empty`, as does one that does not parse
/// - any other I/O failure (permissions, a directory at `path`, ...) is an error
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn load(path: &Path, key_column: &str) -> Result<LoadOutcome> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("no participant list on disk");
            return Ok(LoadOutcome::Empty(EmptyReason::Missing));
        }
        Err(e) => return Err(e.into()),
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(LoadOutcome::Empty(EmptyReason::Blank));
    }

    match parse(&bytes) {
        Ok((columns, rows)) => {
            debug!(columns = columns.len(), rows = rows.len(), "parsed participant list");
            Ok(LoadOutcome::Loaded(Table::from_rows(key_column, columns, rows)))
        }
        Err(reason) => {
            warn!("unreadable participant list {}: {}", path.display(), reason);
            Ok(LoadOutcome::Empty(EmptyReason::Unreadable(reason)))
        }
    }
}

type Parsed = (Vec<Column>, Vec<Vec<String>>);

fn parse(bytes: &[u8]) -> std::result::Result<Parsed, String> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = rdr.headers().map_err(|e| e.to_string())?.clone();
    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(headers.len());
    for name in headers.iter() {
        if name.is_empty() {
            return Err("header contains an empty column name".to_string());
        }
        if !seen.insert(name) {
            return Err(format!("column `{}` appears more than once", name));
        }
        columns.push(Column::text(name));
    }

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| e.to_string())?;
        if record.len() > columns.len() {
            return Err(format!(
                "row {} has {} values but the header has {} columns",
                i + 2,
                record.len(),
                columns.len()
            ));
        }
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok((columns, rows))
}

/// Rewrite the whole file from `table`: header row, then every record in table order.
/// Written to a sibling `.tmp` file first and renamed over `path`.
#[instrument(level = "debug", skip_all, fields(path = %path.display(), rows = table.len()))]
pub fn save(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = tmp_path_for(path);
    let written = write_rows(table, &tmp_path).and_then(|()| Ok(fs::rename(&tmp_path, path)?));
    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(&tmp_path) {
            debug!("leaving {}: {}", tmp_path.display(), cleanup);
        }
        return Err(e);
    }
    Ok(())
}

fn write_rows(table: &Table, tmp_path: &Path) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(tmp_path)?;
    wtr.write_record(table.column_names())?;
    for record in table.records() {
        wtr.write_record(table.row_values(record))?;
    }
    wtr.flush()?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("participant_list"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn loaded(path: &Path) -> Table {
        match load(path, "ppid").unwrap() {
            LoadOutcome::Loaded(t) => t,
            LoadOutcome::Empty(reason) => panic!("expected a table, got {:?}", reason),
        }
    }

    fn empty_reason(path: &Path) -> EmptyReason {
        match load(path, "ppid").unwrap() {
            LoadOutcome::Empty(reason) => reason,
            LoadOutcome::Loaded(t) => panic!("expected empty, got {:?}", t),
        }
    }

    #[test]
    fn round_trip_preserves_columns_values_and_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("list.csv");
        let text = "ppid,age,notes\np1,20,\"likes, commas\"\np2,007,\"said \"\"hi\"\"\"\n";
        fs::write(&path, text).unwrap();

        let first = loaded(&path);
        save(&first, &path).unwrap();
        let second = loaded(&path);

        assert_eq!(first, second);
        assert_eq!(
            second.column_names().collect::<Vec<_>>(),
            vec!["ppid", "age", "notes"]
        );
        assert_eq!(second.find_by_key("p2").unwrap().get("age"), Some("007"));
        assert_eq!(fs::read_to_string(&path).unwrap(), text);
    }

    #[test]
    fn save_leaves_no_temporary_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("list.csv");
        save(&Table::new("ppid", ["ppid"]), &path).unwrap();
        assert!(path.exists());
        assert!(!dir.path().join("list.csv.tmp").exists());
    }

    #[test]
    fn failed_rename_removes_temporary_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("list.csv");
        fs::create_dir_all(path.join("occupied")).unwrap();

        assert!(save(&Table::new("ppid", ["ppid"]), &path).is_err());
        assert!(path.is_dir());
        assert!(!dir.path().join("list.csv.tmp").exists());
    }

    #[test]
    fn missing_and_blank_files_are_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nothing.csv");
        assert_eq!(empty_reason(&path), EmptyReason::Missing);

        fs::write(&path, "  \n").unwrap();
        assert_eq!(empty_reason(&path), EmptyReason::Blank);
    }

    #[test]
    fn header_only_file_is_a_table_without_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("list.csv");
        fs::write(&path, "ppid,age\n").unwrap();
        let t = loaded(&path);
        assert!(t.is_empty());
        assert_eq!(t.columns().len(), 2);
    }

    #[test]
    fn short_rows_are_padded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("list.csv");
        fs::write(&path, "ppid,age,group\np1,20\n").unwrap();
        let t = loaded(&path);
        assert_eq!(t.find_by_key("p1").unwrap().get("group"), Some(""));
    }

    #[test]
    fn malformed_files_are_unreadable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("list.csv");

        fs::write(&path, "ppid,age\np1,20,extra\n").unwrap();
        assert!(matches!(empty_reason(&path), EmptyReason::Unreadable(_)));

        fs::write(&path, "ppid,age,ppid\np1,20,p1\n").unwrap();
        assert!(matches!(empty_reason(&path), EmptyReason::Unreadable(_)));
    }
}
