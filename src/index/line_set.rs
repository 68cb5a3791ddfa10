//! Source file reading and the cached line set.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Read `path` and return every line with surrounding whitespace trimmed.
///
/// Internal whitespace is kept. Blank lines become empty strings. Bytes that
/// are not valid UTF-8 are replaced rather than failing the whole file.
pub fn read_trimmed_lines(path: &Path) -> io::Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    reader
        .split(b'\n')
        .map(|line| line.map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string()))
        .collect()
}

/// Immutable set of the trimmed lines of a source file.
///
/// Built once and then only read; share it behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineSet {
    lines: HashSet<String>,
}

impl LineSet {
    /// Load `path` into a set.
    ///
    /// A missing or unreadable file is logged and produces an empty set.
    pub fn build(path: &Path) -> Self {
        match read_trimmed_lines(path) {
            Ok(lines) => {
                let set: Self = lines.into_iter().collect();
                tracing::debug!(path = %path.display(), lines = set.len(), "Line set built");
                set
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::error!(path = %path.display(), "Source file not found");
                Self::default()
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Error while reading the source file");
                Self::default()
            }
        }
    }

    pub fn contains(&self, query: &str) -> bool {
        self.lines.contains(query)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl FromIterator<String> for LineSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[test]
    fn builds_from_valid_file() {
        let file = file_with(b"line1\nline2\nline3\n");
        let set = LineSet::build(file.path());
        let expected: LineSet = ["line1", "line2", "line3"].map(String::from).into_iter().collect();
        assert_eq!(set, expected);
    }

    #[test]
    fn empty_file_gives_empty_set() {
        let file = file_with(b"");
        assert!(LineSet::build(file.path()).is_empty());
    }

    #[test]
    fn missing_file_gives_empty_set() {
        assert!(LineSet::build(Path::new("/nonexistent/lines.txt")).is_empty());
    }

    #[test]
    fn keeps_special_chars_and_internal_whitespace() {
        let file = file_with(b"line with special chars!@#$%^&*\nline with \t tabs\n");
        let set = LineSet::build(file.path());
        assert_eq!(set.len(), 2);
        assert!(set.contains("line with special chars!@#$%^&*"));
        assert!(set.contains("line with \t tabs"));
    }

    #[test]
    fn trims_crlf_and_surrounding_spaces() {
        let file = file_with(b"  padded  \r\nwindows\r\nlast-without-newline");
        let set = LineSet::build(file.path());
        assert!(set.contains("padded"));
        assert!(set.contains("windows"));
        assert!(set.contains("last-without-newline"));
        assert!(!set.contains("windows\r"));
    }

    #[test]
    fn duplicates_collapse_and_blank_lines_are_empty_entries() {
        let file = file_with(b"dup\ndup\n\ndup\n");
        let set = LineSet::build(file.path());
        assert_eq!(set.len(), 2);
        assert!(set.contains("dup"));
        assert!(set.contains(""));
    }

    #[test]
    fn trailing_newline_adds_no_extra_line() {
        let file = file_with(b"only\n");
        assert_eq!(read_trimmed_lines(file.path()).unwrap(), vec!["only".to_string()]);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let file = file_with(b"ok\n\xff\xfe\n");
        let lines = read_trimmed_lines(file.path()).unwrap();
        assert_eq!(lines[0], "ok");
        assert_eq!(lines[1], "\u{fffd}\u{fffd}");
    }
}
