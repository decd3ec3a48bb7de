//! Loading recorded intervals and stroke series from disk.
//!
//! Files are JSON arrays or CSV with a header row, chosen by extension.
//! CSV numeric columns may be left empty; empty means zero.

use crate::strokes::StrokeSample;
use crate::{Error, FlatInterval, IntervalType, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Json,
    Csv,
}

fn format_of(path: &Path) -> Result<Format> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("json") => Ok(Format::Json),
        Some("csv") => Ok(Format::Csv),
        _ => Err(Error::Import(format!(
            "Unsupported file type {:?}, expected .json or .csv",
            path
        ))),
    }
}

/// One CSV row of an interval export
#[derive(Debug, Deserialize)]
struct IntervalRow {
    #[serde(rename = "type", default)]
    kind: Option<IntervalType>,
    #[serde(default)]
    distance: Option<u32>,
    #[serde(default)]
    time: Option<u32>,
    #[serde(default)]
    rest_time: Option<u32>,
    #[serde(default)]
    watts: Option<u32>,
    #[serde(default)]
    calories_total: Option<u32>,
}

impl From<IntervalRow> for FlatInterval {
    fn from(row: IntervalRow) -> Self {
        FlatInterval {
            kind: row.kind,
            distance: row.distance.unwrap_or(0),
            time: row.time.unwrap_or(0),
            rest_time: row.rest_time.unwrap_or(0),
            watts: row.watts.unwrap_or(0),
            calories_total: row.calories_total.unwrap_or(0),
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

fn read_csv<R: DeserializeOwned>(path: &Path) -> Result<Vec<R>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}

/// Load recorded intervals from a `.json` or `.csv` file
pub fn load_intervals(path: &Path) -> Result<Vec<FlatInterval>> {
    let intervals: Vec<FlatInterval> = match format_of(path)? {
        Format::Json => read_json(path)?,
        Format::Csv => read_csv::<IntervalRow>(path)?
            .into_iter()
            .map(FlatInterval::from)
            .collect(),
    };
    tracing::debug!("Loaded {} intervals from {:?}", intervals.len(), path);
    Ok(intervals)
}

/// Load a stroke series from a `.json` or `.csv` file
pub fn load_strokes(path: &Path) -> Result<Vec<StrokeSample>> {
    let strokes: Vec<StrokeSample> = match format_of(path)? {
        Format::Json => read_json(path)?,
        Format::Csv => read_csv(path)?,
    };
    tracing::debug!("Loaded {} strokes from {:?}", strokes.len(), path);
    Ok(strokes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_intervals_json() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "session.json",
            r#"[{"type":"distance","distance":500,"rest_time":600},{"time":3000}]"#,
        );

        let intervals = load_intervals(&path).unwrap();
        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[0], FlatInterval::distance(500).with_rest(600));
        assert_eq!(intervals[1].kind, None);
    }

    #[test]
    fn test_load_intervals_csv_with_blanks() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "session.CSV",
            "type,distance,time,rest_time,watts,calories_total\n\
             time,,6000,,,\n\
             distance,500,1000,600,250,\n\
             rest,,1200,,,\n",
        );

        let intervals = load_intervals(&path).unwrap();
        assert_eq!(intervals.len(), 3);
        assert_eq!(intervals[0], FlatInterval::time(6000));
        assert_eq!(intervals[1].watts, 250);
        assert!(intervals[2].is_rest());
    }

    #[test]
    fn test_load_strokes_csv() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "strokes.csv",
            "time,distance,watts\n20,8.5,210\n1000,250.2,\n",
        );

        let strokes = load_strokes(&path).unwrap();
        assert_eq!(strokes.len(), 2);
        assert_eq!(strokes[0].watts, Some(210.0));
        assert_eq!(strokes[1].watts, None);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "session.txt", "[]");
        assert!(matches!(load_intervals(&path), Err(Error::Import(_))));
    }

    #[test]
    fn test_malformed_json_is_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "broken.json", "[{");
        assert!(matches!(load_intervals(&path), Err(Error::Json(_))));
    }
}
