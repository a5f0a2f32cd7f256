//! Builder-pattern printer for rendering validation failures.

use std::fmt::Write;
use std::ops::Range;

use annotate_snippets::{AnnotationKind, Group, Level, Renderer, Snippet};

use super::collection::Failures;
use super::failure::{Category, ValidationFailure};
use super::file_index::FileIndex;

/// Renders failures with source excerpts when file content is known.
pub struct FailurePrinter<'f, 's> {
    failures: &'f Failures,
    files: Option<&'s FileIndex>,
    colored: bool,
}

impl<'f, 's> FailurePrinter<'f, 's> {
    pub fn new(failures: &'f Failures) -> Self {
        Self {
            failures,
            files: None,
            colored: false,
        }
    }

    pub fn files(mut self, files: &'s FileIndex) -> Self {
        self.files = Some(files);
        self
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        let renderer = if self.colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                w.write_char('\n')?;
            }
            match self.excerpt(failure) {
                Some((path, source, range)) => {
                    let snippet = Snippet::source(source).line_start(1).path(path).annotation(
                        AnnotationKind::Primary
                            .span(range)
                            .label(&failure.validator_name),
                    );
                    let report: Vec<Group> =
                        vec![category_to_level(failure.category)
                            .primary_title(&failure.message)
                            .element(snippet)];
                    write!(w, "{}", renderer.render(&report))?;
                }
                None => write!(w, "{}", failure)?,
            }
        }
        Ok(())
    }

    fn excerpt<'a>(&'a self, failure: &'a ValidationFailure) -> Option<(&'a str, &'s str, Range<usize>)> {
        let files = self.files?;
        let location = failure.file_map.as_ref()?;
        let source = files.content_for(&location.file_path)?;
        let token_len = failure
            .source_map
            .as_ref()
            .map_or(0, |span| span.token_text.len());
        let range = token_range(source, location.line, location.column, token_len)?;
        Some((location.file_path.as_str(), source, range))
    }
}

fn category_to_level(category: Category) -> Level<'static> {
    match category {
        Category::Error => Level::ERROR,
        Category::Warning => Level::WARNING,
        Category::Info => Level::INFO,
    }
}

/// Byte range of a token given a 1-based line and 0-based column.
fn token_range(source: &str, line: u32, column: u32, token_len: usize) -> Option<Range<usize>> {
    let mut offset = 0;
    for (index, text) in source.split_inclusive('\n').enumerate() {
        if index + 1 == line as usize {
            let line_text = text.trim_end_matches(['\n', '\r']);
            let start = offset + (column as usize).min(line_text.len());
            let line_end = offset + line_text.len();
            let mut end = (start + token_len).min(line_end);
            if end <= start {
                end = (start + 1).min(source.len());
            }
            return Some(start..end);
        }
        offset += text.len();
    }
    None
}

impl Failures {
    pub fn printer(&self) -> FailurePrinter<'_, '_> {
        FailurePrinter::new(self)
    }
}
