//! File download, scratch files and table summaries.

use super::ToolContext;
use crate::error::{Result, SvarError};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// File name for a download: the explicit name, else the last URL path
/// segment, else a random `download_xxxxxxxx`.
fn download_name(url: &str, filename: Option<&str>) -> String {
    if let Some(name) = filename.map(str::trim).filter(|n| !n.is_empty()) {
        return sanitize(name);
    }

    url::Url::parse(url)
        .ok()
        .and_then(|u| u.path_segments().and_then(|s| s.last().map(str::to_string)))
        .filter(|name| !name.is_empty())
        .map(|name| sanitize(&name))
        .unwrap_or_else(|| format!("download_{}", &uuid::Uuid::new_v4().simple().to_string()[..8]))
}

/// Keep only the final path component so names cannot escape the scratch dir.
fn sanitize(name: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("download")
        .to_string()
}

impl ToolContext {
    #[instrument(skip(self))]
    pub(crate) async fn download_file_from_url(
        &self,
        url: &str,
        filename: Option<&str>,
    ) -> Result<String> {
        tokio::fs::create_dir_all(&self.temp_dir).await?;
        let path = self.temp_dir.join(download_name(url, filename));

        let response = self.http.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        tokio::fs::write(&path, &bytes).await?;

        info!("Downloaded {} bytes to {:?}", bytes.len(), path);
        Ok(path.display().to_string())
    }

    pub(crate) async fn save_and_read_file(
        &self,
        content: &str,
        filename: Option<&str>,
    ) -> Result<String> {
        tokio::fs::create_dir_all(&self.temp_dir).await?;

        let path: PathBuf = match filename.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => self.temp_dir.join(sanitize(name)),
            None => {
                let file = tempfile::Builder::new()
                    .prefix("svar_")
                    .tempfile_in(&self.temp_dir)?;
                file.keep()
                    .map_err(|e| SvarError::Tool(format!("Failed to keep temp file: {}", e)))?
                    .1
            }
        };

        tokio::fs::write(&path, content).await?;
        Ok(path.display().to_string())
    }
}

#[derive(Default)]
struct ColumnStats {
    count: usize,
    numbers: Vec<f64>,
    non_numeric: usize,
    frequencies: std::collections::HashMap<String, usize>,
}

impl ColumnStats {
    fn push(&mut self, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        self.count += 1;
        *self.frequencies.entry(value.to_string()).or_default() += 1;
        match value.parse::<f64>() {
            Ok(n) if n.is_finite() => self.numbers.push(n),
            _ => self.non_numeric += 1,
        }
    }

    fn describe(&self) -> String {
        if self.count == 0 {
            return "count=0".to_string();
        }

        if self.non_numeric == 0 {
            let n = self.numbers.len() as f64;
            let mean = self.numbers.iter().sum::<f64>() / n;
            let std = if self.numbers.len() > 1 {
                (self.numbers.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
            } else {
                f64::NAN
            };
            let min = self.numbers.iter().copied().fold(f64::INFINITY, f64::min);
            let max = self.numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            return format!(
                "count={} mean={:.6} std={:.6} min={} max={} sum={}",
                self.count,
                mean,
                std,
                min,
                max,
                self.numbers.iter().sum::<f64>()
            );
        }

        // Ties resolve to the lexicographically smallest value
        let (top, freq) = self
            .frequencies
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(v, f)| (v.as_str(), *f))
            .unwrap_or(("", 0));
        format!(
            "count={} unique={} top={} freq={}",
            self.count,
            self.frequencies.len(),
            top,
            freq
        )
    }
}

/// Shape, column names and per-column statistics of a table.
struct TableSummary {
    headers: Vec<String>,
    columns: Vec<ColumnStats>,
    rows: usize,
}

impl TableSummary {
    fn new(headers: Vec<String>) -> Self {
        let columns = headers.iter().map(|_| ColumnStats::default()).collect();
        Self {
            headers,
            columns,
            rows: 0,
        }
    }

    fn push_row<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.rows += 1;
        for (column, value) in self.columns.iter_mut().zip(values) {
            column.push(value.as_ref());
        }
    }

    fn render(&self) -> String {
        let mut summary = String::new();
        for (name, column) in self.headers.iter().zip(&self.columns) {
            let _ = writeln!(summary, "{}: {}", name, column.describe());
        }

        format!(
            "Rows: {}, Columns: {}\n Cols: {}\n Summary:\n{}",
            self.rows,
            self.headers.len(),
            self.headers.join(", "),
            summary.trim_end()
        )
    }
}

/// Summarize a CSV file: shape, column names and per-column statistics.
pub fn analyze_csv_file(file_path: &str) -> Result<String> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(file_path)
        .map_err(|e| SvarError::Tool(format!("Failed to open {}: {}", file_path, e)))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| SvarError::Tool(format!("Failed to read header: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut table = TableSummary::new(headers);
    for record in reader.records() {
        let record = record.map_err(|e| SvarError::Tool(format!("Invalid CSV row: {}", e)))?;
        table.push_row(record.iter());
    }

    Ok(table.render())
}

/// Summarize the first worksheet of an Excel file in the same format as
/// [`analyze_csv_file`]. The first row holds the column names.
pub fn analyze_excel_file(file_path: &str) -> Result<String> {
    let mut workbook = open_workbook_auto(file_path)
        .map_err(|e| SvarError::Tool(format!("Failed to open {}: {}", file_path, e)))?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| SvarError::Tool(format!("{} has no worksheets", file_path)))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| SvarError::Tool(format!("Failed to read sheet {}: {}", sheet, e)))?;

    Ok(summarize_range(&range))
}

fn summarize_range(range: &Range<Data>) -> String {
    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|cells| cells.iter().map(|c| c.to_string()).collect())
        .unwrap_or_default();

    let mut table = TableSummary::new(headers);
    for cells in rows {
        table.push_row(cells.iter().map(|c| c.to_string()));
    }
    table.render()
}

/// Run a blocking table reader off the async executor.
pub(crate) async fn analyze_table_file(
    file_path: &str,
    analyze: fn(&str) -> Result<String>,
) -> Result<String> {
    let path = file_path.to_string();
    tokio::task::spawn_blocking(move || analyze(&path))
        .await
        .map_err(|e| SvarError::Tool(format!("File analysis did not finish: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tools::testing;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_download_name() {
        assert_eq!(download_name("https://x.org/files/report.pdf?dl=1", None), "report.pdf");
        assert_eq!(download_name("https://x.org/a.txt", Some("b.txt")), "b.txt");
        assert_eq!(download_name("https://x.org/a.txt", Some("../../etc/passwd")), "passwd");
        assert!(download_name("https://x.org/", None).starts_with("download_"));
        assert_eq!(download_name("https://x.org/", None).len(), "download_".len() + 8);
    }

    #[tokio::test]
    async fn test_download_file_from_url() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/data/table.csv")
            .with_body("a,b\n1,2\n")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let tools = testing::context(dir.path());
        let path = tools
            .download_file_from_url(&format!("{}/data/table.csv", server.url()), None)
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("table.csv").display().to_string());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a,b\n1,2\n");
    }

    #[tokio::test]
    async fn test_download_error_status() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/missing").with_status(404).create_async().await;

        let dir = tempfile::tempdir().unwrap();
        let tools = testing::context(dir.path());
        let result = tools
            .download_file_from_url(&format!("{}/missing", server.url()), None)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_save_and_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let tools = testing::context(dir.path());

        let named = tools.save_and_read_file("hello", Some("note.txt")).await.unwrap();
        assert_eq!(std::fs::read_to_string(&named).unwrap(), "hello");
        assert!(named.ends_with("note.txt"));

        let anonymous = tools.save_and_read_file("world", None).await.unwrap();
        assert!(Path::new(&anonymous).starts_with(dir.path()));
        assert_eq!(std::fs::read_to_string(&anonymous).unwrap(), "world");
    }

    #[test]
    fn test_analyze_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        std::fs::write(
            &path,
            "Location,Burgers,Soda\nPinebrook,1594,1980\nWharvton,1983,2023\nSagrada,1594,1710\n",
        )
        .unwrap();

        let out = analyze_csv_file(path.to_str().unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Rows: 3, Columns: 3");
        assert_eq!(lines[1], " Cols: Location, Burgers, Soda");
        assert_eq!(lines[2], " Summary:");
        assert_eq!(lines[3], "Location: count=3 unique=3 top=Pinebrook freq=1");
        assert!(lines[4].starts_with("Burgers: count=3 mean=1723.666667"));
        assert!(lines[4].ends_with("min=1594 max=1983 sum=5171"));
    }

    #[tokio::test]
    async fn test_analyze_table_file_off_executor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(&path, "name,qty\na,1\nb,3\n").unwrap();

        let out = analyze_table_file(path.to_str().unwrap(), analyze_csv_file)
            .await
            .unwrap();
        assert!(out.starts_with("Rows: 2, Columns: 2"));
        assert!(out.contains("qty: count=2 mean=2.000000"));
    }

    #[test]
    fn test_summarize_excel_range() {
        let mut range = Range::new((0, 0), (3, 1));
        range.set_value((0, 0), Data::String("Item".to_string()));
        range.set_value((0, 1), Data::String("Price".to_string()));
        range.set_value((1, 0), Data::String("Burger".to_string()));
        range.set_value((1, 1), Data::Float(4.5));
        range.set_value((2, 0), Data::String("Soda".to_string()));
        range.set_value((2, 1), Data::Float(1.5));
        range.set_value((3, 0), Data::String("Burger".to_string()));
        range.set_value((3, 1), Data::Int(6));

        let out = summarize_range(&range);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Rows: 3, Columns: 2");
        assert_eq!(lines[1], " Cols: Item, Price");
        assert_eq!(lines[3], "Item: count=3 unique=2 top=Burger freq=2");
        assert!(lines[4].starts_with("Price: count=3 mean=4.000000"));
        assert!(lines[4].ends_with("min=1.5 max=6 sum=12"));
    }

    #[test]
    fn test_analyze_missing_excel() {
        let err = analyze_excel_file("/definitely/not/here.xlsx").unwrap_err();
        assert!(err.to_string().contains("Failed to open"));
    }

    #[test]
    fn test_analyze_missing_csv() {
        let err = analyze_csv_file("/definitely/not/here.csv").unwrap_err();
        assert!(err.to_string().contains("Failed to open"));
    }
}
