//! Test vector document parsing.
//!
//! The document is a sequence of sections:
//!
//! ```text
//! # BugName
//! ## buggy
//! <snippet>
//! --
//! <snippet>
//! ## fine
//! <snippet>
//! ```
//!
//! Snippets inside a subsection are separated by a line holding only `--`.
//! Snippet text is returned byte-for-byte, including surrounding whitespace.

use crate::error::{BuglistError, Result};
use crate::registry::{BugRecord, BugRegistry};
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

/// Separator between snippets of one subsection.
pub const DELIMITER: &str = "\n--\n";

const BUGGY_MARKER: &str = "## buggy";
const FINE_MARKER: &str = "## fine";

/// Labeled snippets for one bug.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VectorSet {
    pub buggy: Vec<String>,
    pub fine: Vec<String>,
}

/// A parsed section together with the bug it names.
#[derive(Debug, Clone)]
pub struct VectorSection<'a> {
    pub record: &'a BugRecord,
    pub vectors: VectorSet,
    /// 1-based line of the heading.
    pub line: usize,
}

/// The full test vector document.
#[derive(Debug, Clone)]
pub struct VectorCorpus {
    text: String,
}

impl VectorCorpus {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn read(path: &Path) -> Result<Self> {
        Ok(Self::new(std::fs::read_to_string(path)?))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lazily parse sections, resolving each heading through `registry`.
    ///
    /// Every call starts from the top of the document. The iterator stops
    /// after yielding its first error.
    pub fn sections<'a>(&'a self, registry: &'a BugRegistry) -> VectorSections<'a> {
        VectorSections {
            text: &self.text,
            registry,
            pos: 0,
            seen: HashSet::new(),
            failed: false,
        }
    }

    /// Parse every section, failing on the first malformed one.
    pub fn parse_all<'a>(&'a self, registry: &'a BugRegistry) -> Result<Vec<VectorSection<'a>>> {
        self.sections(registry).collect()
    }
}

/// Iterator over the sections of a [`VectorCorpus`].
pub struct VectorSections<'a> {
    text: &'a str,
    registry: &'a BugRegistry,
    pos: usize,
    seen: HashSet<&'a str>,
    failed: bool,
}

/// A line as byte offsets: `start..end` excludes the newline, `next` is the
/// offset of the following line.
#[derive(Debug, Clone, Copy)]
struct Line {
    start: usize,
    end: usize,
    next: usize,
}

impl<'a> VectorSections<'a> {
    fn line_at(&self, pos: usize) -> Option<Line> {
        if pos >= self.text.len() {
            return None;
        }
        let rest = &self.text[pos..];
        Some(match rest.find('\n') {
            Some(i) => Line {
                start: pos,
                end: pos + i,
                next: pos + i + 1,
            },
            None => Line {
                start: pos,
                end: self.text.len(),
                next: self.text.len(),
            },
        })
    }

    fn content(&self, line: Line) -> &'a str {
        &self.text[line.start..line.end]
    }

    fn line_number(&self, pos: usize) -> usize {
        self.text[..pos].matches('\n').count() + 1
    }

    fn malformed(&self, pos: usize, reason: String) -> BuglistError {
        BuglistError::MalformedSection {
            line: self.line_number(pos),
            reason,
        }
    }

    fn parse_section(&mut self, heading: Line) -> Result<VectorSection<'a>> {
        let name = heading_name(self.content(heading))
            .ok_or_else(|| self.malformed(heading.start, "heading without a bug name".to_string()))?;
        let registry = self.registry;
        let record = registry.lookup(name)?;
        if !self.seen.insert(name) {
            return Err(BuglistError::DuplicateSection {
                name: name.to_string(),
                line: self.line_number(heading.start),
            });
        }

        // Only blank lines may sit between the heading and `## buggy`.
        let mut pos = heading.next;
        let buggy_marker = loop {
            match self.line_at(pos) {
                Some(line) if self.content(line).trim().is_empty() => pos = line.next,
                Some(line) if self.content(line).trim() == BUGGY_MARKER => break line,
                Some(line) => {
                    return Err(self.malformed(
                        line.start,
                        format!("expected `{BUGGY_MARKER}` after heading for {name}"),
                    ))
                }
                None => {
                    return Err(self.malformed(
                        self.text.len(),
                        format!("section {name} ends before `{BUGGY_MARKER}`"),
                    ))
                }
            }
        };

        let buggy_start = buggy_marker.next;
        let mut pos = buggy_start;
        let fine_marker = loop {
            match self.line_at(pos) {
                Some(line) if self.content(line).trim() == FINE_MARKER => break line,
                Some(line) if is_heading(self.content(line)) || is_marker(self.content(line)) => {
                    return Err(self.malformed(
                        line.start,
                        format!("section {name} is missing `{FINE_MARKER}`"),
                    ))
                }
                Some(line) => pos = line.next,
                None => {
                    return Err(self.malformed(
                        self.text.len(),
                        format!("section {name} is missing `{FINE_MARKER}`"),
                    ))
                }
            }
        };
        let buggy_body = &self.text[buggy_start..fine_marker.start];

        let fine_start = fine_marker.next;
        let mut pos = fine_start;
        let fine_end = loop {
            match self.line_at(pos) {
                Some(line) if is_heading(self.content(line)) => break line.start,
                Some(line) if is_marker(self.content(line)) => {
                    return Err(self.malformed(
                        line.start,
                        format!("unexpected `{}` in section {name}", self.content(line).trim()),
                    ))
                }
                Some(line) => pos = line.next,
                None => break self.text.len(),
            }
        };
        let fine_body = &self.text[fine_start..fine_end];
        self.pos = fine_end;

        let vectors = VectorSet {
            buggy: split_snippets(buggy_body),
            fine: split_snippets(fine_body),
        };
        if vectors.buggy.is_empty() {
            warn!(bug = %name, "No buggy test vectors; rule is never expected to match");
        }
        if vectors.fine.is_empty() {
            warn!(bug = %name, "No fine test vectors; rule is never expected to stay silent");
        }

        Ok(VectorSection {
            record,
            vectors,
            line: self.line_number(heading.start),
        })
    }
}

impl<'a> Iterator for VectorSections<'a> {
    type Item = Result<VectorSection<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        // Text before the next heading is not part of any section.
        let heading = loop {
            let line = self.line_at(self.pos)?;
            if is_heading(self.content(line)) {
                break line;
            }
            self.pos = line.next;
        };

        let result = self.parse_section(heading);
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

/// `# Name` (one hash followed by whitespace), leading whitespace allowed.
fn is_heading(line: &str) -> bool {
    line.trim_start()
        .strip_prefix('#')
        .and_then(|rest| rest.chars().next())
        .is_some_and(char::is_whitespace)
}

fn is_marker(line: &str) -> bool {
    matches!(line.trim(), BUGGY_MARKER | FINE_MARKER)
}

fn heading_name(line: &str) -> Option<&str> {
    line.trim_start()
        .strip_prefix('#')?
        .split_whitespace()
        .next()
}

/// Split a subsection body on the delimiter line. A body holding only
/// whitespace has no snippets.
fn split_snippets(body: &str) -> Vec<String> {
    if body.trim().is_empty() {
        return Vec::new();
    }
    body.split(DELIMITER).map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> BugRegistry {
        BugRegistry::from_json(
            r#"[
                {"name": "X", "check": {"regex-source": "a{3,}"}},
                {"name": "Y", "introduced": "0.4.0", "check": {"json-path": [{"name": "foo"}]}}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn parses_sections_in_order() {
        let doc = "# X\n## buggy\naaa\n--\nbaaa\n## fine\naa\n\n# Y\n## buggy\nuint256 foo;\n## fine\nuint256 bar;\n";
        let registry = registry();
        let corpus = VectorCorpus::new(doc);
        let sections = corpus.parse_all(&registry).unwrap();

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].record.name, "X");
        assert_eq!(sections[0].vectors.buggy, vec!["aaa", "baaa\n"]);
        assert_eq!(sections[0].vectors.fine, vec!["aa\n\n"]);
        assert_eq!(sections[0].line, 1);
        assert_eq!(sections[1].record.name, "Y");
        assert_eq!(sections[1].vectors.buggy, vec!["uint256 foo;\n"]);
        assert_eq!(sections[1].line, 9);
    }

    #[test]
    fn snippet_whitespace_is_preserved() {
        let doc = "# X\n## buggy\n  aaa  \n\t\n--\n\n aaa\n## fine\n  a\n";
        let registry = registry();
        let corpus = VectorCorpus::new(doc);
        let section = corpus.sections(&registry).next().unwrap().unwrap();

        assert_eq!(section.vectors.buggy, vec!["  aaa  \n\t", "\n aaa\n"]);
        assert_eq!(section.vectors.fine, vec!["  a\n"]);
    }

    #[test]
    fn preamble_and_leading_blank_lines_are_ignored() {
        let doc = "Bug list test vectors\n\n  # X\n\n## buggy\naaa\n## fine\naa\n";
        let registry = registry();
        let corpus = VectorCorpus::new(doc);
        let sections = corpus.parse_all(&registry).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].vectors.buggy, vec!["aaa\n"]);
    }

    #[test]
    fn unknown_heading_is_fatal() {
        let doc = "# Nope\n## buggy\naaa\n## fine\naa\n";
        let registry = registry();
        let corpus = VectorCorpus::new(doc);
        let err = corpus.parse_all(&registry).unwrap_err();
        assert!(matches!(err, BuglistError::UnknownBug { ref name } if name == "Nope"));
    }

    #[test]
    fn missing_buggy_marker_is_malformed() {
        let doc = "# X\naaa\n## fine\naa\n";
        let registry = registry();
        let corpus = VectorCorpus::new(doc);
        let err = corpus.parse_all(&registry).unwrap_err();
        assert!(matches!(err, BuglistError::MalformedSection { line: 2, .. }), "{err}");
    }

    #[test]
    fn missing_fine_marker_is_malformed() {
        let doc = "# X\n## buggy\naaa\n# Y\n## buggy\nfoo\n## fine\nbar\n";
        let registry = registry();
        let corpus = VectorCorpus::new(doc);
        let err = corpus.parse_all(&registry).unwrap_err();
        assert!(matches!(err, BuglistError::MalformedSection { line: 4, .. }), "{err}");
    }

    #[test]
    fn heading_at_end_of_document_is_malformed() {
        let doc = "# X\n## buggy\naaa\n## fine\naa\n# Y\n";
        let registry = registry();
        let corpus = VectorCorpus::new(doc);
        let mut sections = corpus.sections(&registry);
        assert!(sections.next().unwrap().is_ok());
        assert!(matches!(
            sections.next().unwrap(),
            Err(BuglistError::MalformedSection { .. })
        ));
        assert!(sections.next().is_none());
    }

    #[test]
    fn repeated_section_is_rejected() {
        let doc = "# X\n## buggy\naaa\n## fine\naa\n# X\n## buggy\naaaa\n## fine\na\n";
        let registry = registry();
        let corpus = VectorCorpus::new(doc);
        let err = corpus.parse_all(&registry).unwrap_err();
        assert!(matches!(err, BuglistError::DuplicateSection { line: 6, .. }));
    }

    #[test]
    fn empty_side_yields_no_snippets() {
        let doc = "# X\n## buggy\n## fine\naa\n";
        let registry = registry();
        let corpus = VectorCorpus::new(doc);
        let section = corpus.sections(&registry).next().unwrap().unwrap();
        assert!(section.vectors.buggy.is_empty());
        assert_eq!(section.vectors.fine, vec!["aa\n"]);
    }

    #[test]
    fn scan_is_restartable() {
        let doc = "# X\n## buggy\naaa\n## fine\naa\n# Y\n## buggy\nfoo\n## fine\nbar";
        let registry = registry();
        let corpus = VectorCorpus::new(doc);

        let first: Vec<_> = corpus
            .sections(&registry)
            .map(|s| s.unwrap().vectors)
            .collect();
        let second: Vec<_> = corpus
            .sections(&registry)
            .map(|s| s.unwrap().vectors)
            .collect();
        assert_eq!(first, second);
        assert_eq!(first[1].fine, vec!["bar"]);
    }

    #[test]
    fn heading_detection() {
        assert!(is_heading("# X"));
        assert!(is_heading("   #\tX"));
        assert!(!is_heading("## buggy"));
        assert!(!is_heading("#pragma"));
        assert!(!is_heading("x # y"));
        assert_eq!(heading_name("# X trailing words"), Some("X"));
        assert_eq!(heading_name("#   "), None);
    }
}
