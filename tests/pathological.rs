use wiki2doc::ast::*;
use wiki2doc::parse::ParseOutput;
use wiki2doc::{Config, parse_document};

fn parse(src: &str) -> ParseOutput {
    parse_document(src, &Config::default())
}

fn has_code(out: &ParseOutput, code: &str) -> bool {
    out.diagnostics
        .iter()
        .any(|d| d.code.as_deref() == Some(code))
}

fn lead_text(out: &ParseOutput) -> String {
    out.document.sections[0]
        .sentences
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn pathological_open_delimiter_runs_are_treated_as_text() {
    // huge runs of opening delimiters would otherwise trigger quadratic
    // scanning for a matching close.
    let cases = [
        ("braces", "{".repeat(20_000)),
        ("brackets", "[".repeat(20_000)),
    ];

    for (name, src) in cases {
        let out = parse(&src);
        assert!(
            has_code(&out, "wikitext.inline.pathological_delim_run"),
            "expected delimiter-run diagnostic for case '{name}'"
        );
        let lead = &out.document.sections[0];
        assert_eq!(lead.sentences.len(), 1, "case '{name}'");
        assert_eq!(lead.sentences[0].text, src, "case '{name}'");
    }
}

#[test]
fn many_unclosed_openers_finish() {
    let src = "{{a ".repeat(5_000) + &"[[b ".repeat(5_000);
    let out = parse(&src);
    assert!(has_code(&out, "wikitext.template.unclosed"));
    assert!(has_code(&out, "wikitext.link.unclosed"));
    assert!(out.document.infobox.is_none());
}

#[test]
fn unclosed_openers_before_a_single_closer_finish() {
    let src = "{{a ".repeat(20_000) + "}}";
    let out = parse(&src);
    assert!(has_code(&out, "wikitext.template.unclosed"));
    assert!(out.document.infobox.is_none());

    let src = "[[a ".repeat(20_000) + "]]";
    let out = parse(&src);
    assert!(has_code(&out, "wikitext.link.unclosed"));
    let lead = &out.document.sections[0];
    let links: Vec<&str> = lead
        .sentences
        .iter()
        .flat_map(|s| s.links.iter().map(|l| l.page.as_str()))
        .collect();
    assert_eq!(links, vec!["a"]);
}

#[test]
fn many_unclosed_comments_and_refs_finish() {
    let src = "<!-- a ".repeat(20_000) + &"<ref> b ".repeat(20_000) + "<ref c";
    let out = parse(&src);
    assert!(has_code(&out, "wikitext.comment.unclosed"));
    assert!(has_code(&out, "wikitext.ref.unclosed"));

    let out = parse(&"<math> x ".repeat(20_000));
    assert!(lead_text(&out).starts_with("x x x"));
}

#[test]
fn unclosed_template_is_kept_as_text() {
    let out = parse("Before {{Infobox venue|opened=1939\nAfter it.");
    assert!(has_code(&out, "wikitext.template.unclosed"));
    assert!(out.document.infobox.is_none());
    assert!(out.document.infobox_template.is_none());
    let text = lead_text(&out);
    assert!(text.starts_with("Before {{Infobox venue"), "{text}");
    assert!(text.ends_with("After it."), "{text}");
}

#[test]
fn unclosed_link_is_kept_as_text() {
    let out = parse("See [[Toronto and more.");
    assert!(has_code(&out, "wikitext.link.unclosed"));
    let lead = &out.document.sections[0];
    assert_eq!(lead.sentences[0].text, "See [[Toronto and more.");
    assert!(lead.sentences[0].links.is_empty());
}

#[test]
fn unclosed_ref_and_comment_recover() {
    let out = parse("Claim.<ref>never closed\n\nVisible <!-- hidden");
    assert!(has_code(&out, "wikitext.ref.unclosed"));
    assert!(has_code(&out, "wikitext.comment.unclosed"));
    let text = lead_text(&out);
    assert!(text.contains("never closed"), "{text}");
    assert!(text.contains("hidden"), "{text}");
}

#[test]
fn deep_template_nesting_is_cut_off() {
    let mut src = String::from("core");
    for _ in 0..200 {
        src = format!("{{{{nowrap|x {src}}}}}");
    }
    let out = parse(&src);
    assert!(has_code(&out, "wikitext.inline.depth_limit"));
    assert!(lead_text(&out).ends_with("core"));
}

#[test]
fn deep_list_markers_survive_json() {
    let src = format!("{}item\n", ":".repeat(200));
    let config = Config {
        ignore_lists: false,
        ..Config::default()
    };
    let out = parse_document(&src, &config);
    let items = out.document.sections[0].list_items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].depth, 200);

    let json = serde_json::to_string_pretty(&out.document).expect("serialize");
    let back: Document = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(out.document, back);
}

#[test]
fn repeated_recoveries_are_reported_once() {
    let out = parse("{{unclosed\n\n== Heading ==\nText.");
    let count = out
        .diagnostics
        .iter()
        .filter(|d| d.code.as_deref() == Some("wikitext.template.unclosed"))
        .count();
    assert_eq!(count, 1, "{:#?}", out.diagnostics);
    assert!(out.document.section("Heading").is_some());
}

#[test]
fn empty_and_whitespace_input() {
    for src in ["", "   \n\n\t", "<!-- only a comment -->"] {
        let out = parse(src);
        assert_eq!(out.document.kind, DocumentKind::Article);
        assert_eq!(out.document.sections.len(), 1);
        assert!(out.document.sections[0].sentences.is_empty());
        assert!(out.document.categories.is_empty());
    }
}

#[test]
fn redirect_without_target_is_an_article() {
    let out = parse("#REDIRECT somewhere\nText here.");
    assert!(has_code(&out, "wikitext.redirect.missing_target"));
    assert_eq!(out.document.kind, DocumentKind::Article);
    assert!(!out.document.sections.is_empty());
}
