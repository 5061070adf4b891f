pub mod ast;
pub mod config;
pub mod error;
pub mod parse;

pub use config::Config;
pub use error::{Error, Result};
pub use parse::inline::parse_inline;
pub use parse::list::parse_lists;
pub use parse::table::parse_table;
pub use parse::template::parse_template;
pub use parse::{ParseOutput, parse, parse_document};

use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// File extensions `parse_dir` picks up.
pub const WIKITEXT_EXTENSIONS: &[&str] = &["wiki", "txt"];

/// Parse markup given as raw bytes.
///
/// Fails with [`Error::InvalidUtf8`] before any parsing when the bytes are
/// not a UTF-8 string.
pub fn parse_bytes(bytes: &[u8], config: &Config) -> Result<ast::Document> {
    let src = std::str::from_utf8(bytes)?;
    Ok(parse(src, config))
}

/// Wrap a parse result in the JSON envelope.
pub fn document_file(path: Option<&Path>, src: &str, out: ParseOutput) -> ast::DocumentFile {
    ast::DocumentFile {
        schema_version: ast::SCHEMA_VERSION,
        parser: ast::ParserInfo::default(),
        source: ast::SourceInfo {
            path: path.map(|p| p.to_string_lossy().to_string()),
            byte_len: src.len() as u64,
        },
        diagnostics: out.diagnostics,
        document: out.document,
    }
}

/// Read and parse one wikitext file.
pub fn parse_file(path: &Path, config: &Config) -> Result<ast::DocumentFile> {
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    let bytes = fs::read(path)?;
    let src = std::str::from_utf8(&bytes)?;
    log::debug!("parsing {} ({} bytes)", path.display(), src.len());

    let out = parse_document(src, config);
    Ok(document_file(Some(path), src, out))
}

/// Walk `root` and parse every wikitext file under it, in path order.
///
/// A file that is not UTF-8 fails the whole walk.
pub fn parse_dir(root: &Path, config: &Config) -> Result<Vec<ast::DocumentFile>> {
    if !root.exists() {
        return Err(Error::NotFound(root.to_path_buf()));
    }

    let mut entries: Vec<_> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file()
                && e.path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| WIKITEXT_EXTENSIONS.contains(&ext))
        })
        .collect();

    entries.sort_by(|a, b| a.path().cmp(b.path()));
    log::debug!("found {} wikitext files under {}", entries.len(), root.display());

    entries
        .iter()
        .map(|entry| parse_file(entry.path(), config))
        .collect()
}

/// Parse a file or every wikitext file under a directory.
pub fn parse_path(path: &Path, config: &Config) -> Result<Vec<ast::DocumentFile>> {
    if path.is_dir() {
        parse_dir(path, config)
    } else {
        Ok(vec![parse_file(path, config)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parse_bytes_rejects_invalid_utf8() {
        let err = parse_bytes(b"ok \xff\xfe", &Config::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidUtf8 { valid_up_to: 3 }), "{err}");

        let doc = parse_bytes("Plain text.".as_bytes(), &Config::default()).unwrap();
        assert_eq!(doc.sections[0].sentences[0].text, "Plain text.");
    }

    #[test]
    fn parse_dir_walks_sorted_wikitext_files() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("b").join("two.wiki"), "Two.").unwrap();
        fs::write(dir.path().join("a.txt"), "#REDIRECT [[One]]").unwrap();
        fs::write(dir.path().join("skip.md"), "Skipped.").unwrap();

        let files = parse_dir(dir.path(), &Config::default()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].document.is_redirect());
        assert!(files[1].source.path.as_deref().unwrap().ends_with("two.wiki"));
        assert_eq!(files[1].source.byte_len, 4);
    }

    #[test]
    fn missing_paths_are_reported() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.wiki");
        let err = parse_path(&missing, &Config::default()).unwrap_err();
        assert!(matches!(err, Error::NotFound(p) if p == missing));
    }
}
