//! Heading-delimited sections.
//!
//! Walks the block token stream once. Headings open a new section, tables
//! and list lines attach to the open one, and everything else forms
//! paragraphs, which end at blank lines and block constructs. Paragraph
//! text is split into sentences.

use crate::ast::{Section, Span};
use crate::parse::ParseContext;
use crate::parse::inline::{parse_fragment, parse_rich_text};
use crate::parse::list::parse_list_item;
use crate::parse::sentence::split_fragment;
use crate::parse::table::parse_table_block;
use crate::parse::tokenizer::{Token, TokenKind};
use crate::parse::util::{is_line_start, line_at};

/// Split the body into sections. The lead section is always first.
pub(crate) fn build_sections(ctx: &mut ParseContext, src: &str, tokens: &[Token]) -> Vec<Section> {
    let mut builder = SectionBuilder {
        src,
        lists: !ctx.config().ignore_lists,
        sections: Vec::new(),
        current: Section::lead(),
        paragraph: None,
    };
    if builder.lists {
        builder.current.lists = Some(vec![]);
    }

    for token in tokens {
        let start = token.span.start as usize;
        let end = token.span.end as usize;
        match &token.kind {
            TokenKind::Heading { level, title } => {
                builder.flush_paragraph(ctx);
                let title = parse_rich_text(ctx, &src[title.range()], title.start as usize).text;
                // `==T==` is depth 1; a lone `=T=` is clamped to it.
                let depth = level.saturating_sub(1).max(1);
                builder.open(Section::new(title, depth));
            }
            TokenKind::TableBlock => {
                builder.flush_paragraph(ctx);
                if let Some(table) = parse_table_block(ctx, src, token.span) {
                    builder.current.tables.push(table);
                }
            }
            TokenKind::ListLine { markers, content } => {
                builder.flush_paragraph(ctx);
                if builder.lists
                    && let Some(item) = parse_list_item(ctx, src, markers, *content)
                    && let Some(lists) = builder.current.lists.as_mut()
                {
                    lists.push(item);
                }
            }
            TokenKind::Text => builder.text(ctx, start, end),
            TokenKind::Template | TokenKind::Link | TokenKind::Ref | TokenKind::Comment => {
                builder.extend_paragraph(start, end);
            }
        }
    }
    builder.flush_paragraph(ctx);
    builder.sections.push(builder.current);

    log::trace!("built {} sections", builder.sections.len());
    builder.sections
}

struct SectionBuilder<'s> {
    src: &'s str,
    lists: bool,
    sections: Vec<Section>,
    current: Section,
    /// Byte range of the paragraph being collected.
    paragraph: Option<(usize, usize)>,
}

impl SectionBuilder<'_> {
    fn open(&mut self, mut section: Section) {
        if self.lists {
            section.lists = Some(vec![]);
        }
        let done = std::mem::replace(&mut self.current, section);
        self.sections.push(done);
    }

    fn extend_paragraph(&mut self, start: usize, end: usize) {
        self.paragraph = Some(match self.paragraph {
            Some((para_start, _)) => (para_start, end),
            None => (start, end),
        });
    }

    /// Text runs may hold blank lines, which end the paragraph.
    fn text(&mut self, ctx: &mut ParseContext, start: usize, end: usize) {
        let src = self.src;
        // a partial first line cannot be blank.
        let mut line_start = if is_line_start(src, start) {
            start
        } else {
            match src[start..end].find('\n') {
                Some(nl) => start + nl + 1,
                None => end,
            }
        };
        let mut para_start = start;

        while line_start < end {
            let line = line_at(src, line_start);
            if src[line.start..line.end].trim().is_empty() {
                if para_start < line.start {
                    self.extend_paragraph(para_start, line.start);
                }
                self.flush_paragraph(ctx);
                para_start = line.end_with_newline.min(end);
            }
            if line.end_with_newline == line.end {
                break;
            }
            line_start = line.end_with_newline;
        }
        if para_start < end {
            self.extend_paragraph(para_start, end);
        }
    }

    fn flush_paragraph(&mut self, ctx: &mut ParseContext) {
        let Some((start, end)) = self.paragraph.take() else {
            return;
        };
        let fragment = parse_fragment(ctx, &self.src[start..end], start);
        if fragment.text.is_empty() {
            return;
        }
        log::trace!(
            "paragraph {:?} in section {:?}",
            Span::from_range(start, end),
            self.current.title
        );
        self.current.sentences.extend(split_fragment(fragment));
    }
}
