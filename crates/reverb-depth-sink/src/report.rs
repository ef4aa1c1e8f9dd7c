use std::path::PathBuf;

use thiserror::Error;
use tokio::fs;

use reverb_depth_types::DepthRecord;

const CSV_HEADER: &str = "file,depth (cm)";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Writes the finished batch to its destinations. Records are expected in
/// their final (identifier-sorted) order; the sink never reorders them.
pub struct ResultSink {
    csv_path: PathBuf,
}

impl ResultSink {
    pub fn new(csv_path: PathBuf) -> Self {
        Self { csv_path }
    }

    pub async fn write_csv(&self, records: &[DepthRecord]) -> Result<(), ReportError> {
        let contents = render_csv(records);
        fs::write(&self.csv_path, contents)
            .await
            .map_err(|source| ReportError::Io {
                path: self.csv_path.clone(),
                source,
            })
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

fn render_csv(records: &[DepthRecord]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for record in records {
        out.push_str(&csv_field(&record.file));
        out.push(',');
        out.push_str(&csv_field(&depth_cell(record)));
        out.push('\n');
    }
    out
}

fn depth_cell(record: &DepthRecord) -> String {
    match (record.depth_cm, record.error.as_deref()) {
        (Some(depth), _) => format!("{depth:.4}"),
        (None, Some(error)) => format!("error: {error}"),
        (None, None) => "error: unknown".to_string(),
    }
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Console rendering of the same table, with a trailing success/failure
/// summary line.
pub fn render_console_table(records: &[DepthRecord]) -> String {
    let file_width = records
        .iter()
        .map(|r| r.file.len())
        .chain(std::iter::once("file".len()))
        .max()
        .unwrap_or(4);

    let mut out = format!("{:<file_width$}  depth (cm)\n", "file");
    for record in records {
        out.push_str(&format!(
            "{:<file_width$}  {}\n",
            record.file,
            depth_cell(record)
        ));
    }

    let failures = records.iter().filter(|r| !r.is_success()).count();
    out.push_str(&format!(
        "{} image(s) processed, {} succeeded, {} failed\n",
        records.len(),
        records.len() - failures,
        failures
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records() -> Vec<DepthRecord> {
        vec![
            DepthRecord::success("phantom_01.png", 0.5025),
            DepthRecord::failure("phantom_02.png", "no reverberation lines detected"),
        ]
    }

    #[test]
    fn csv_has_the_expected_header_and_no_index_column() {
        let csv = render_csv(&sample_records());
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("file,depth (cm)"));
        assert_eq!(lines.next(), Some("phantom_01.png,0.5025"));
        assert_eq!(
            lines.next(),
            Some("phantom_02.png,error: no reverberation lines detected")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn fields_with_commas_are_quoted() {
        let records = vec![DepthRecord::failure("odd,name.png", "bad, very bad")];
        let csv = render_csv(&records);
        assert!(csv.contains("\"odd,name.png\",\"error: bad, very bad\""));
    }

    #[test]
    fn console_table_reports_the_failure_count() {
        let table = render_console_table(&sample_records());
        assert!(table.contains("2 image(s) processed, 1 succeeded, 1 failed"));
        assert!(table.starts_with("file"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn csv_file_lands_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("line_heights.csv");
        let sink = ResultSink::new(path.clone());
        sink.write_csv(&sample_records()).await.unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("file,depth (cm)\n"));
        assert_eq!(contents.lines().count(), 3);
    }
}
