use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::Error;

/// One raw source line with what diagnostics need around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-based.
    pub number: usize,
    pub raw: String,
    pub previous: Option<String>,
}

/// Line iterator over one source file. The handle is dropped with the reader.
pub struct SourceReader<R: BufRead> {
    name: String,
    reader: R,
    number: usize,
    previous: Option<String>,
}

impl SourceReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let name = path.display().to_string();
        let file = File::open(path).map_err(|e| Error::FileOpen(name.clone(), e))?;
        Ok(SourceReader::new(name, BufReader::new(file)))
    }
}

impl<R: BufRead> SourceReader<R> {
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        SourceReader {
            name: name.into(),
            reader,
            number: 0,
            previous: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<R: BufRead> Iterator for SourceReader<R> {
    type Item = Result<SourceLine, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut raw = String::new();
        match self.reader.read_line(&mut raw) {
            Ok(0) => None,
            Ok(_) => {
                while raw.ends_with('\n') || raw.ends_with('\r') {
                    raw.pop();
                }
                self.number += 1;
                let previous = self.previous.replace(raw.clone());
                Some(Ok(SourceLine {
                    number: self.number,
                    raw,
                    previous,
                }))
            }
            Err(e) => Some(Err(Error::FileRead(self.name.clone(), e))),
        }
    }
}
