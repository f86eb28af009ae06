//! line source
//!
//! [MultiFileLineIterator] flattens a stack of open streams into one forward,
//! non-restartable sequence of provenance-tagged lines. The top of the stack
//! is the active stream; pushing a new file mid-iteration (`@INCLUDE`) makes
//! it active until it is exhausted, then control pops back to the includer.
//!
//! Streams are owned by the stack, so every handle is released when its
//! content is exhausted, and dropping the iterator releases whatever is still
//! open when an error aborts the session mid-file.
use crate::context::LineEntry;
use crate::error::ReadError;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Default)]
pub struct MultiFileLineIterator {
    streams: Vec<FileStream>,
}

struct FileStream {
    reader: Box<dyn BufRead>,
    fname: Arc<PathBuf>,
    linenr: usize,
}

impl MultiFileLineIterator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a stream; it becomes the active one until exhausted
    pub fn add_file(&mut self, reader: Box<dyn BufRead>, fname: impl Into<PathBuf>) {
        self.streams.push(FileStream {
            reader,
            fname: Arc::new(fname.into()),
            linenr: 0,
        });
    }

    pub fn add_path(&mut self, path: &Path) -> std::io::Result<()> {
        tracing::info!(path=%path.display(), "reading input file");
        let file = std::fs::File::open(path)?;
        self.add_file(Box::new(std::io::BufReader::new(file)), path);
        Ok(())
    }
}

impl Iterator for MultiFileLineIterator {
    type Item = Result<LineEntry, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.streams.last_mut()?;

            let mut buf = String::new();
            match top.reader.read_line(&mut buf) {
                Ok(0) => {
                    let finished = self.streams.pop().expect("the active stream was just read");
                    tracing::trace!(file=%finished.fname.display(), "stream exhausted");
                }
                Ok(_) => {
                    top.linenr += 1;
                    return Some(Ok(LineEntry {
                        line: buf.trim().to_string(),
                        fname: top.fname.clone(),
                        linenr: top.linenr,
                    }));
                }
                Err(source) => {
                    top.linenr += 1;
                    return Some(Err(ReadError {
                        source,
                        fname: top.fname.clone(),
                        linenr: top.linenr,
                    }));
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn entries(iter: &mut MultiFileLineIterator) -> Vec<(String, usize)> {
        iter.map(|entry| {
            let entry = entry.unwrap();
            (entry.line, entry.linenr)
        })
        .collect()
    }

    #[test]
    fn trims_and_numbers_lines() {
        let mut iter = MultiFileLineIterator::new();
        iter.add_file(Box::new(Cursor::new("  a \n\nb\n".to_string())), "main.inp");

        assert_eq!(
            entries(&mut iter),
            vec![("a".into(), 1), ("".into(), 2), ("b".into(), 3)]
        );
    }

    #[test]
    fn pushed_file_drains_before_the_includer_resumes() {
        let mut iter = MultiFileLineIterator::new();
        iter.add_file(Box::new(Cursor::new("one\ntwo\n".to_string())), "main.inp");

        let first = iter.next().unwrap().unwrap();
        assert_eq!(first.line, "one");

        iter.add_file(Box::new(Cursor::new("inner\n".to_string())), "sub.inc");

        let second = iter.next().unwrap().unwrap();
        assert_eq!((second.line.as_str(), second.linenr), ("inner", 1));
        assert_eq!(second.fname.as_ref(), &PathBuf::from("sub.inc"));

        let third = iter.next().unwrap().unwrap();
        assert_eq!((third.line.as_str(), third.linenr), ("two", 2));
        assert!(iter.next().is_none());
    }

    #[test]
    fn read_failures_carry_the_active_stream() {
        let mut iter = MultiFileLineIterator::new();
        iter.add_file(Box::new(Cursor::new(b"ok\n\xff\xfe\n".to_vec())), "broken.inp");

        let first = iter.next().unwrap().unwrap();
        assert_eq!(first.line, "ok");

        let err = iter.next().unwrap().expect_err("invalid utf-8 must error");
        assert_eq!(err.fname.as_ref(), &PathBuf::from("broken.inp"));
        assert_eq!(err.linenr, 2);
    }
}
