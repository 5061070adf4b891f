use std::fs;
use std::path::PathBuf;
use wiki2doc::{Config, parse, parse_document, parse_table};

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("testdata")
        .join(format!("{name}.wiki"));
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

#[test]
fn big_table() {
    let doc = parse(&fixture("bluejays"), &Config::default());
    let table = &doc.tables[0];
    assert_eq!(table.len(), 8);
    assert_eq!(table.headers(), vec!["Level", "Team", "League", "Location"]);
    assert_eq!(table[0]["Level"].text, "AAA");
    assert_eq!(table[0]["Team"].text, "Buffalo Bisons");
    assert_eq!(table[0]["League"].text, "International League");
    assert_eq!(table[1]["Location"].text, "Manchester, New Hampshire");
    assert_eq!(table[1]["League"].links[0].page, "Eastern League (baseball)");
    assert_eq!(table[7]["Location"].text, "Boca Chica, Santo Domingo");
    assert_eq!(table[7]["Location"].links.len(), 2);

    // the flattened list and the section agree.
    let section = doc.section("Current affiliates").expect("section");
    assert_eq!(section.tables, doc.tables);
}

#[test]
fn header_names_are_filled_in() {
    let table = parse_table("{|\n! Name !! !! Name\n|-\n| a || b || c || d\n|}").expect("table");
    assert_eq!(table.headers(), vec!["Name", "col2", "col3", "col4"]);
    assert_eq!(table[0]["col4"].text, "d");
}

#[test]
fn colspan_repeats_cell_values() {
    let table = parse_table(
        "{|\n! A !! B !! C\n|-\n| colspan=\"2\" | wide || narrow\n|-\n| 1 || 2 || 3\n|}",
    )
    .expect("table");
    assert_eq!(table.len(), 2);
    assert_eq!(table[0]["A"].text, "wide");
    assert_eq!(table[0]["B"].text, "wide");
    assert_eq!(table[0]["C"].text, "narrow");
    assert_eq!(table[1]["C"].text, "3");
}

#[test]
fn header_only_tables_have_no_rows() {
    assert!(parse_table("{|\n! A !! B\n|}").is_none());
    let doc = parse("Intro.\n{|\n! A !! B\n|}\n", &Config::default());
    assert!(doc.tables.is_empty());
}

#[test]
fn unclosed_table_ends_before_next_heading() {
    let src = "== One ==\n{|\n! A\n|-\n| x\n== Two ==\nAfter.";
    let out = parse_document(src, &Config::default());
    let doc = &out.document;
    assert_eq!(doc.section("One").expect("One").tables[0][0]["A"].text, "x");
    assert_eq!(doc.section("Two").expect("Two").sentences[0].text, "After.");
    assert!(
        out.diagnostics
            .iter()
            .any(|d| d.code.as_deref() == Some("wikitext.table.unclosed"))
    );
}

#[test]
fn extra_cells_are_kept_and_reported() {
    let src = "{|\n! A\n|-\n| 1 || 2\n|}";
    let out = parse_document(src, &Config::default());
    let table = &out.document.tables[0];
    assert_eq!(table[0]["A"].text, "1");
    assert_eq!(table[0]["col2"].text, "2");
    assert!(
        out.diagnostics
            .iter()
            .any(|d| d.code.as_deref() == Some("wikitext.table.extra_cells"))
    );
}
