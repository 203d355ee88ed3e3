use std::path::PathBuf;

/// One reporting year's bounded sample, exactly as read from disk.
#[derive(Debug, Clone)]
pub struct YearlySample {
    /// Year tag every record of this sample carries.
    pub year: i32,
    /// Where the sample came from. Empty for in-memory samples.
    pub source: PathBuf,
    /// Column names from the header row, as written in the file.
    pub headers: Vec<String>,
    /// Each accepted data row, one cell per header. `None` is a missing cell.
    pub rows: Vec<Vec<Option<String>>>,
    /// Rows dropped because they were malformed (too many fields, unreadable).
    pub rejected_rows: usize,
    /// True when loading stopped at the row cap before the end of the file.
    pub truncated: bool,
}

impl YearlySample {
    /// Builds a sample from in-memory rows. Short rows are padded with missing
    /// cells; long rows are counted as rejected.
    pub fn from_rows<H, R, C>(year: i32, headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = Vec<C>>,
        C: Into<String>,
    {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let mut sample = YearlySample {
            year,
            source: PathBuf::new(),
            headers,
            rows: Vec::new(),
            rejected_rows: 0,
            truncated: false,
        };
        for row in rows {
            let cells = row.into_iter().map(|c| {
                let c: String = c.into();
                if c.is_empty() {
                    None
                } else {
                    Some(c)
                }
            });
            sample.push_row(cells.collect());
        }
        sample
    }

    /// Appends a row, padding it to the header width. Returns false (and
    /// counts a rejection) when the row is wider than the header.
    pub(crate) fn push_row(&mut self, mut cells: Vec<Option<String>>) -> bool {
        if cells.len() > self.headers.len() {
            self.rejected_rows += 1;
            return false;
        }
        cells.resize(self.headers.len(), None);
        self.rows.push(cells);
        true
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
