use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read};
use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use super::{RawRecord, ResolvedColumns};
use crate::error::MalformedSourceError;
use crate::storage::Config;

const SNIFF_CANDIDATES: [u8; 3] = [b',', b';', b'\t'];
const READ_BUFFER: usize = 64 * 1024;

/// Bytes consumed while sniffing, replayed ahead of the rest of the source.
type Source<R> = io::Chain<Cursor<Vec<u8>>, BufReader<R>>;

/// Single-pass reader over a delimited export.
///
/// Construction reads the header, resolves the column mapping and reads
/// ahead to the first data row, so a source that cannot yield any record
/// fails here rather than halfway through a run. Iterating yields the
/// remaining rows; the iterator is fused after the first error.
pub struct RowIngestor<R: Read> {
    reader: csv::Reader<Source<R>>,
    header: Vec<String>,
    columns: ResolvedColumns,
    delimiter: u8,
    pending: Option<RawRecord>,
    done: bool,
}

impl RowIngestor<File> {
    /// Open the export at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedSourceError`] if the file cannot be opened or has
    /// no usable header or data rows.
    pub fn open(path: &Path, config: &Config) -> Result<Self, MalformedSourceError> {
        let file = File::open(path).map_err(|source| MalformedSourceError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened export");
        Self::from_reader(file, config)
    }
}

impl<R: Read> RowIngestor<R> {
    /// Wrap any reader holding delimited text.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedSourceError`] if the text has no usable header or
    /// no data rows.
    pub fn from_reader(reader: R, config: &Config) -> Result<Self, MalformedSourceError> {
        let mut buffered = BufReader::with_capacity(READ_BUFFER, reader);
        let mut prefix = Vec::new();
        let delimiter = match config.delimiter {
            Some(c) => u8::try_from(c)
                .ok()
                .filter(u8::is_ascii)
                .ok_or(MalformedSourceError::UnsupportedDelimiter(c))?,
            None => {
                read_through_first_line(&mut buffered, &mut prefix)
                    .map_err(MalformedSourceError::Read)?;
                sniff_delimiter(&prefix)
            }
        };

        let reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(Cursor::new(prefix).chain(buffered));

        let mut ingestor = Self {
            reader,
            header: Vec::new(),
            columns: ResolvedColumns::default(),
            delimiter,
            pending: None,
            done: false,
        };

        let header = ingestor
            .next_non_blank()?
            .ok_or(MalformedSourceError::MissingHeader)?;
        ingestor.header = header
            .iter()
            .map(|cell| cell.trim_start_matches('\u{feff}').to_string())
            .collect();
        ingestor.columns = ResolvedColumns::resolve(&ingestor.header, config)?;
        debug!(
            delimiter = %char::from(delimiter).escape_default(),
            columns = ?ingestor.columns,
            "resolved export header"
        );

        ingestor.pending = Some(
            ingestor
                .next_record()?
                .ok_or(MalformedSourceError::NoDataRows)?,
        );
        Ok(ingestor)
    }

    /// Header cells as written in the export (trimmed).
    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn columns(&self) -> &ResolvedColumns {
        &self.columns
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    fn next_non_blank(&mut self) -> Result<Option<csv::StringRecord>, MalformedSourceError> {
        let mut record = csv::StringRecord::new();
        loop {
            let more = self.reader.read_record(&mut record).map_err(|e| {
                MalformedSourceError::Undecodable {
                    line: e.position().map_or(0, csv::Position::line),
                    message: e.to_string(),
                }
            })?;
            if !more {
                return Ok(None);
            }
            if record.iter().any(|cell| !cell.is_empty()) {
                return Ok(Some(record));
            }
        }
    }

    fn next_record(&mut self) -> Result<Option<RawRecord>, MalformedSourceError> {
        let Some(record) = self.next_non_blank()? else {
            return Ok(None);
        };
        let line = record.position().map_or(0, csv::Position::line);

        let mut fields = IndexMap::with_capacity(self.header.len());
        for (i, column) in self.header.iter().enumerate() {
            let value = record.get(i).unwrap_or_default();
            fields
                .entry(column.clone())
                .or_insert_with(|| value.to_string());
        }
        Ok(Some(RawRecord::new(line, fields)))
    }
}

impl<R: Read> Iterator for RowIngestor<R> {
    type Item = Result<RawRecord, MalformedSourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(record) = self.pending.take() {
            return Some(Ok(record));
        }
        if self.done {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Append lines to `prefix` up to and including the first non-blank one,
/// however the underlying reader chunks its output.
fn read_through_first_line<B: BufRead>(reader: &mut B, prefix: &mut Vec<u8>) -> io::Result<()> {
    loop {
        let start = prefix.len();
        if reader.read_until(b'\n', prefix)? == 0 {
            return Ok(());
        }
        if !prefix[start..].iter().all(u8::is_ascii_whitespace) {
            return Ok(());
        }
    }
}

/// Pick the candidate delimiter that occurs most often on the first
/// non-blank line; `,` when none occurs.
fn sniff_delimiter(buf: &[u8]) -> u8 {
    let Some(line) = buf
        .split(|b| *b == b'\n')
        .find(|line| !line.iter().all(u8::is_ascii_whitespace))
    else {
        return b',';
    };

    let mut best = (b',', 0usize);
    for candidate in SNIFF_CANDIDATES {
        let count = line.iter().filter(|b| **b == candidate).count();
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}
