//! Categories, images, and redirects.
//!
//! Categories and images are found anywhere in the markup, including
//! inside templates and other links. Only comments hide them.

use crate::ast::{Category, Diagnostic, DiagnosticPhase, Image, Span};
use crate::parse::ParseContext;
use crate::parse::inline::parse_rich_text;
use crate::parse::tokenizer::MAX_DELIM_RUN;
use crate::parse::util::{
    PairTable, char_len_at, find_matching, normalize_name, split_target_anchor, split_top_level,
    starts_with_ci, strip_comments,
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Category namespace names, lowercase.
pub const CATEGORY_NAMESPACES: &[&str] = &[
    "category",
    "kategori",
    "kategorie",
    "kategoria",
    "catégorie",
    "categoría",
    "categoria",
    "categorie",
    "категория",
];

/// File namespace names and aliases, lowercase.
pub const FILE_NAMESPACES: &[&str] = &[
    "file",
    "image",
    "fil",
    "bild",
    "datei",
    "fichier",
    "imagen",
    "immagine",
    "archivo",
    "plik",
    "afbeelding",
    "ficheiro",
    "arquivo",
    "файл",
    "изображение",
    "media",
];

/// Redirect magic words, lowercase, including the leading `#`.
const REDIRECT_WORDS: &[&str] = &[
    "#redirect",
    "#weiterleitung",
    "#redirection",
    "#redirección",
    "#omdirigering",
    "#перенаправление",
];

/// Characters JavaScript's `encodeURIComponent` escapes.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Image parameters that are formatting options rather than a caption.
const IMAGE_OPTIONS: &[&str] = &[
    "thumb",
    "thumbnail",
    "frame",
    "framed",
    "frameless",
    "border",
    "left",
    "right",
    "center",
    "centre",
    "none",
    "upright",
    "baseline",
    "middle",
    "sub",
    "super",
    "top",
    "text-top",
    "bottom",
    "text-bottom",
];

const IMAGE_OPTION_KEYS: &[&str] = &[
    "upright", "alt", "link", "page", "class", "lang", "thumb", "thumbnail", "lossy",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub target: String,
    pub anchor: Option<String>,
}

pub fn is_category_namespace(ns: &str) -> bool {
    CATEGORY_NAMESPACES.contains(&normalize_name(ns).as_str())
}

pub fn is_file_namespace(ns: &str) -> bool {
    FILE_NAMESPACES.contains(&normalize_name(ns).as_str())
}

/// Detect `#REDIRECT [[Target]]` at the start of the markup.
///
/// A redirect word without a link is reported and the page is treated as
/// an article.
pub(crate) fn find_redirect(ctx: &mut ParseContext, src: &str) -> Option<Redirect> {
    let body = src.trim_start();
    let lead = src.len() - body.len();
    let word = REDIRECT_WORDS
        .iter()
        .find(|w| starts_with_ci(body, w))?;
    // compare by bytes: some magic words are not ASCII.
    let rest = body.get(word.len()..)?.trim_start();
    let rest = rest.strip_prefix(':').unwrap_or(rest).trim_start();

    if rest.starts_with("[[")
        && let Some(len) = find_matching(rest, "[[", "]]")
    {
        let inner = strip_comments(&rest[2..len - 2]);
        let target = inner.split('|').next().unwrap_or_default().trim();
        let (page, anchor) = split_target_anchor(target);
        let page = page.trim();
        if !page.is_empty() {
            return Some(Redirect {
                target: page.to_string(),
                anchor: anchor
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(str::to_string),
            });
        }
    }

    ctx.report(Diagnostic::recovery(
        DiagnosticPhase::Media,
        "wikitext.redirect.missing_target",
        "Redirect has no target link; parsing the page as an article",
        Span::from_range(lead, lead + word.len()),
    ));
    None
}

/// Every category membership, in document order.
pub fn categories(src: &str) -> Vec<Category> {
    link_regions(src)
        .into_iter()
        .filter_map(|(_, region)| {
            let inner = strip_comments(&region[2..region.len() - 2]);
            let (target, sort_key) = match inner.split_once('|') {
                Some((t, k)) => (t, Some(k.trim())),
                None => (inner.as_str(), None),
            };
            let (ns, name) = target.trim().split_once(':')?;
            if !is_category_namespace(ns) {
                return None;
            }
            let name = name.trim().replace('_', " ");
            if name.is_empty() {
                return None;
            }
            Some(Category {
                name,
                sort_key: sort_key.filter(|k| !k.is_empty()).map(str::to_string),
            })
        })
        .collect()
}

/// Every file link, in document order.
pub(crate) fn images(ctx: &mut ParseContext, src: &str) -> Vec<Image> {
    let base_url = ctx.config().media_base_url.as_str();
    let mut out = Vec::new();
    for (at, region) in link_regions(src) {
        let inner = &region[2..region.len() - 2];
        let parts = split_top_level(inner, '|');
        let (target_start, target_end) = parts[0];
        let target = strip_comments(&inner[target_start..target_end]);
        let target = target.trim();
        let Some((ns, name)) = target.split_once(':') else {
            continue;
        };
        if !is_file_namespace(ns) || name.trim().is_empty() {
            continue;
        }

        let caption = parts[1..]
            .iter()
            .rev()
            .find(|&&(a, b)| !is_image_option(inner[a..b].trim()))
            .map(|&(a, b)| parse_rich_text(ctx, &inner[a..b], at + 2 + a))
            .filter(|c| !c.is_empty());

        out.push(Image {
            file: target.to_string(),
            url: media_url(base_url, name),
            caption,
        });
    }
    out
}

/// The hash-bucketed upload URL for a file name (without namespace).
///
/// `Statoil-Estonia.jpg` -> `<base>/8/87/Statoil-Estonia.jpg`.
pub fn media_url(base_url: &str, name: &str) -> String {
    let name = name.trim().replace(' ', "_");
    let mut chars = name.chars();
    let name: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => name,
    };
    let hash = format!("{:x}", md5::compute(name.as_bytes()));
    format!(
        "{}/{}/{}/{}",
        base_url.trim_end_matches('/'),
        &hash[..1],
        &hash[..2],
        utf8_percent_encode(&name, URI_COMPONENT)
    )
}

fn is_image_option(param: &str) -> bool {
    let lower = param.to_lowercase();
    if lower.is_empty() || IMAGE_OPTIONS.contains(&lower.as_str()) {
        return true;
    }
    if let Some((key, _)) = lower.split_once('=')
        && IMAGE_OPTION_KEYS.contains(&key.trim())
    {
        return true;
    }
    // sizes: 200px, x150px, 200x150px
    lower.strip_suffix("px").is_some_and(|size| {
        !size.is_empty() && size.bytes().all(|b| b.is_ascii_digit() || b == b'x')
    })
}

/// Every balanced `[[...]]` region with its offset, outer before inner.
fn link_regions(src: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let pairs = PairTable::brackets(src);
    let mut i = 0usize;
    while i < src.len() {
        let rem = &src[i..];
        if rem.starts_with("<!--") {
            match rem[4..].find("-->") {
                Some(close) => {
                    i += 4 + close + 3;
                    continue;
                }
                None => break,
            }
        }
        if rem.starts_with("[[") {
            let run = rem.bytes().take_while(|b| *b == b'[').count();
            if run >= MAX_DELIM_RUN {
                i += run;
                continue;
            }
            if let Some(len) = pairs.region_len(src, i) {
                out.push((i, &rem[..len]));
            }
            // step inside so nested links are found too.
            i += 2;
            continue;
        }
        i += char_len_at(src, i);
    }
    out
}
