//! Pipe tables (`{| ... |}`) -> header-keyed row records.
//!
//! The first row supplies the column headers. Every later row is zipped
//! against them by position; short rows simply lack the missing columns.

use crate::ast::{Diagnostic, DiagnosticPhase, RichText, Span, Table, TableRow};
use crate::config::Config;
use crate::parse::ParseContext;
use crate::parse::inline::parse_rich_text;
use crate::parse::util::{Nesting, char_len_at, line_at, strip_cr};

/// Larger `colspan` values are clamped to this.
const MAX_COLSPAN: usize = 1000;

/// Byte range of one cell's content, which may run over several lines.
#[derive(Debug)]
struct CellBuilder {
    colspan: usize,
    start: usize,
    end: usize,
}

#[derive(Debug, Default)]
struct Scanner {
    rows: Vec<Vec<CellBuilder>>,
    row: Vec<CellBuilder>,
    cell: Option<CellBuilder>,
}

impl Scanner {
    fn finish_cell(&mut self) {
        if let Some(cell) = self.cell.take() {
            self.row.push(cell);
        }
    }

    fn finish_row(&mut self) {
        self.finish_cell();
        if !self.row.is_empty() {
            self.rows.push(std::mem::take(&mut self.row));
        }
    }

    /// Continuation lines and nested tables belong to the open cell.
    fn extend_cell(&mut self, end: usize) -> bool {
        match self.cell.as_mut() {
            Some(cell) => {
                cell.end = end;
                true
            }
            None => false,
        }
    }
}

/// Parse a single table such as `{|\n! A !! B\n|-\n| 1 || 2\n|}`.
///
/// Returns `None` when `markup` has no data rows.
pub fn parse_table(markup: &str) -> Option<Table> {
    let config = Config::default();
    let mut ctx = ParseContext::new(&config);
    parse_table_block(&mut ctx, markup, Span::from_range(0, markup.len()))
}

/// Parse the table block at `span` of `src`.
pub(crate) fn parse_table_block(ctx: &mut ParseContext, src: &str, span: Span) -> Option<Table> {
    let end = span.end as usize;
    let mut scanner = Scanner::default();
    // table nesting depth based on {| and |}.
    let mut depth = 0usize;
    let mut pos = span.start as usize;

    while pos < end {
        let line = line_at(src, pos);
        let line_end = line.end.min(end);
        let text = strip_cr(&src[line.start..line_end]);
        let trimmed = text.trim_start();
        let abs = line.start + (text.len() - trimmed.len());
        pos = line.end_with_newline.max(line_end + 1);

        if trimmed.starts_with("{|") {
            depth += 1;
            if depth > 1 {
                scanner.extend_cell(line_end);
            }
            continue;
        }
        if trimmed.starts_with("|}") {
            if depth <= 1 {
                break;
            }
            depth -= 1;
            scanner.extend_cell(line_end);
            continue;
        }
        if depth > 1 {
            // inside a nested table; raw content of the outer cell.
            scanner.extend_cell(line_end);
            continue;
        }

        // captions have no place in row records.
        if trimmed.starts_with("|+") {
            scanner.finish_cell();
            continue;
        }

        if trimmed.starts_with("|-") {
            scanner.finish_row();
            continue;
        }

        if trimmed.starts_with('!') || trimmed.starts_with('|') {
            scanner.finish_cell();
            let is_header = trimmed.starts_with('!');
            let rest = &trimmed[1..];
            let rest_abs = abs + 1;
            let segments = split_cell_segments(rest, is_header);
            let last = segments.len() - 1;
            for (idx, (seg_start, seg_end)) in segments.into_iter().enumerate() {
                let seg = &rest[seg_start..seg_end];
                let (attrs, content_rel) = split_attrs_content(seg);
                let cell = CellBuilder {
                    colspan: colspan(attrs),
                    start: rest_abs + seg_start + content_rel,
                    end: rest_abs + seg_end,
                };
                if idx == last {
                    // last segment: allow multiline continuation.
                    scanner.cell = Some(cell);
                } else {
                    scanner.row.push(cell);
                }
            }
            continue;
        }

        if scanner.extend_cell(line_end) {
            continue;
        }

        // otherwise: ignore stray lines inside the table and record a diagnostic.
        if !trimmed.is_empty() {
            ctx.report(
                Diagnostic::recovery(
                    DiagnosticPhase::Table,
                    "wikitext.table.unexpected_line",
                    "Unexpected line inside table",
                    Span::from_range(line.start, line_end),
                )
                .with_note(text.to_string()),
            );
        }
    }
    scanner.finish_row();

    let mut rows = scanner.rows.into_iter();
    let headers = header_names(ctx, src, &rows.next()?);

    let mut table = Table::default();
    for (row_idx, cells) in rows.enumerate() {
        let mut record = TableRow::new();
        let mut column = 0usize;
        let mut extra = false;
        for cell in &cells {
            let value = parse_rich_text(ctx, &src[cell.start..cell.end], cell.start);
            for _ in 0..cell.colspan {
                let key = match headers.get(column) {
                    Some(header) => header.clone(),
                    None => {
                        extra = true;
                        column_name(column)
                    }
                };
                record.insert(key, value.clone());
                column += 1;
            }
        }
        if extra && let (Some(first), Some(last)) = (cells.first(), cells.last()) {
            ctx.report(
                Diagnostic::recovery(
                    DiagnosticPhase::Table,
                    "wikitext.table.extra_cells",
                    "Row has more cells than the header row",
                    Span::from_range(first.start, last.end),
                )
                .with_note(format!(
                    "row {} has {column} columns, header has {}",
                    row_idx + 1,
                    headers.len()
                )),
            );
        }
        table.rows.push(record);
    }

    log::trace!(
        "table: {} columns, {} rows",
        headers.len(),
        table.rows.len()
    );
    (!table.is_empty()).then_some(table)
}

/// Column names from the header row; empty or repeated names become
/// `col<N>`.
fn header_names(ctx: &mut ParseContext, src: &str, cells: &[CellBuilder]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for cell in cells {
        let RichText { text, .. } = parse_rich_text(ctx, &src[cell.start..cell.end], cell.start);
        for span_idx in 0..cell.colspan {
            let column = names.len();
            let name = if span_idx == 0 && !text.is_empty() && !names.contains(&text) {
                text.clone()
            } else {
                column_name(column)
            };
            names.push(name);
        }
    }
    names
}

fn column_name(column: usize) -> String {
    format!("col{}", column + 1)
}

/// Split a cell line on top-level `||` (and `!!` on header lines).
fn split_cell_segments(rest: &str, is_header: bool) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut depth = Nesting::default();
    let mut i = 0usize;
    let mut last = 0usize;
    while i < rest.len() {
        let rem = &rest[i..];
        if let Some(step) = depth.step(rem) {
            i += step;
            continue;
        }
        if depth.is_top() && (rem.starts_with("||") || (is_header && rem.starts_with("!!"))) {
            out.push((last, i));
            i += 2;
            last = i;
            continue;
        }
        i += char_len_at(rest, i);
    }
    out.push((last, rest.len()));
    out
}

/// Split a cell segment into its attribute text and the offset its content
/// starts at.
fn split_attrs_content(seg: &str) -> (&str, usize) {
    // MediaWiki tables use a single pipe `|` to separate attributes from content.
    let (attrs, content_rel) = match find_attr_separator(seg) {
        Some(pipe) => (&seg[..pipe], pipe + 1),
        None => ("", 0),
    };
    let content = &seg[content_rel..];
    (attrs, content_rel + (content.len() - content.trim_start().len()))
}

fn find_attr_separator(seg: &str) -> Option<usize> {
    // find the first `|` not inside an attribute value or nested templates/links.
    let mut depth = Nesting::default();
    let mut in_quote: Option<char> = None;
    let mut prev = ' ';
    let mut i = 0usize;
    while i < seg.len() {
        let rem = &seg[i..];
        if in_quote.is_none()
            && let Some(step) = depth.step(rem)
        {
            i += step;
            continue;
        }
        let Some(ch) = rem.chars().next() else {
            break;
        };
        match in_quote {
            Some(q) if q == ch => in_quote = None,
            Some(_) => {}
            // only quotes opening an attribute value count.
            None if (ch == '"' || ch == '\'') && prev == '=' => in_quote = Some(ch),
            None if ch == '|' && depth.is_top() => return Some(i),
            None => {}
        }
        if !ch.is_whitespace() {
            prev = ch;
        }
        i += ch.len_utf8();
    }
    None
}

/// The `colspan` attribute, defaulting to 1.
fn colspan(attrs: &str) -> usize {
    parse_html_attrs(attrs)
        .into_iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("colspan"))
        .and_then(|(_, value)| value?.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .map_or(1, |n| n.min(MAX_COLSPAN))
}

/// Parse HTML-like attributes, e.g. `style="text-align:center;" colspan=2`.
fn parse_html_attrs(mut s: &str) -> Vec<(&str, Option<&str>)> {
    let mut attrs = Vec::new();
    loop {
        s = s.trim_start();
        let name_end = s
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(s.len());
        if name_end == 0 {
            break;
        }
        let name = &s[..name_end];
        s = s[name_end..].trim_start();

        let mut value = None;
        if let Some(after_eq) = s.strip_prefix('=') {
            s = after_eq.trim_start();
            match s.chars().next() {
                Some(q @ ('"' | '\'')) => {
                    s = &s[1..];
                    // unterminated quote; take rest.
                    let end_q = s.find(q).unwrap_or(s.len());
                    value = Some(&s[..end_q]);
                    s = s.get(end_q + 1..).unwrap_or_default();
                }
                Some(_) => {
                    let end = s.find(char::is_whitespace).unwrap_or(s.len());
                    value = Some(&s[..end]);
                    s = &s[end..];
                }
                None => {}
            }
        }
        attrs.push((name, value));
    }
    attrs
}
