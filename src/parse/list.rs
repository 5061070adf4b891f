//! List lines (`*`, `#`, `;`, `:`) -> `ListItem`s.
//!
//! Lists are kept flat: nesting is carried by each item's `depth`, the
//! same way sections carry theirs.

use crate::ast::{ListItem, Span};
use crate::config::Config;
use crate::parse::ParseContext;
use crate::parse::inline::parse_rich_text;
use crate::parse::tokenizer::{Mode, TokenKind, tokenize};

/// Build the item for one list line. Items without visible text are
/// skipped.
pub(crate) fn parse_list_item(
    ctx: &mut ParseContext,
    src: &str,
    markers: &str,
    content: Span,
) -> Option<ListItem> {
    let depth = u8::try_from(markers.chars().count()).unwrap_or(u8::MAX);
    let ordered = markers.ends_with('#');
    let text = parse_rich_text(ctx, &src[content.range()], content.start as usize);
    if text.text.is_empty() {
        log::trace!("skipping empty list item at {}", content.start);
        return None;
    }
    Some(ListItem {
        depth,
        ordered,
        content: text,
    })
}

/// Every list item in `markup`, in order, ignoring everything else.
pub fn parse_lists(markup: &str) -> Vec<ListItem> {
    let config = Config::default();
    let mut ctx = ParseContext::new(&config);
    let tokens = tokenize(markup, Mode::Block, &mut ctx);
    tokens
        .iter()
        .filter_map(|token| match &token.kind {
            TokenKind::ListLine { markers, content } => {
                parse_list_item(&mut ctx, markup, markers, *content)
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_carry_depth_and_order() {
        let items = parse_lists("* one\n** [[two]]\n# three\n*# four\nplain\n");
        let shape: Vec<(u8, bool, &str)> = items
            .iter()
            .map(|i| (i.depth, i.ordered, i.content.text.as_str()))
            .collect();
        assert_eq!(
            shape,
            vec![
                (1, false, "one"),
                (2, false, "two"),
                (1, true, "three"),
                (2, true, "four"),
            ]
        );
        assert_eq!(items[1].content.links[0].page, "two");
    }

    #[test]
    fn empty_items_are_skipped() {
        let items = parse_lists("*\n* <!-- nothing -->\n* {{citation needed}}\n* real\n");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content.text, "real");
    }

    #[test]
    fn multiline_templates_stay_in_their_item() {
        let items = parse_lists("* {{nowrap|Duncan\nMacpherson}}\n* Next\n");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].content.text, "Duncan Macpherson");
    }
}
