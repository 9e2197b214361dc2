//! File and bucket naming.

const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const FALLBACK_NAME: &str = "document";
const EXTENSION: &str = ".pdf";

/// Most filesystems cap a name component at 255 bytes. Names are built short
/// enough to leave room for a `" (NNNN)"` collision suffix.
const MAX_NAME_BYTES: usize = 255 - 7;

/// Strip characters no common filesystem accepts, collapse whitespace and
/// trim trailing dots and spaces.
pub fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if ILLEGAL_CHARS.contains(&c) || c.is_control() {
                ' '
            } else {
                c
            }
        })
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_end_matches(|c: char| c == '.' || c == ' ')
        .to_string()
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn truncate_bytes(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Char cap from configuration, then the byte budget left for the stem.
fn cap(text: &str, max_chars: usize, max_bytes: usize) -> String {
    let capped = truncate_bytes(truncate_chars(text, max_chars), max_bytes);
    sanitize_component(capped)
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    (head.to_lowercase() == prefix.to_lowercase()).then(|| &text[prefix.len()..])
}

/// `"<System> - <title>.pdf"`. A title that already carries the system prefix
/// does not get it twice; an unusable title falls back to `fallback_stem`.
pub fn classified_file_name(
    system: &str,
    title: Option<&str>,
    fallback_stem: &str,
    max_title_chars: usize,
) -> String {
    let system = sanitize_component(truncate_bytes(system, MAX_NAME_BYTES / 2));
    let prefix = format!("{} - ", system);
    let title_bytes = MAX_NAME_BYTES - prefix.len() - EXTENSION.len();

    let pick = |candidate: &str| {
        let mut cleaned = sanitize_component(candidate);
        while let Some(rest) = strip_prefix_ignore_case(&cleaned, &prefix) {
            cleaned = rest.trim_start().to_string();
        }
        let capped = cap(&cleaned, max_title_chars, title_bytes);
        (!capped.is_empty()).then_some(capped)
    };

    let title = title
        .and_then(pick)
        .or_else(|| pick(fallback_stem))
        .unwrap_or_else(|| FALLBACK_NAME.to_string());

    format!("{}{}{}", prefix, title, EXTENSION)
}

/// Unclassified documents keep their own file name.
pub fn unclassified_file_name(fallback_stem: &str, max_title_chars: usize) -> String {
    let stem = cap(
        &sanitize_component(fallback_stem),
        max_title_chars,
        MAX_NAME_BYTES - EXTENSION.len(),
    );
    if stem.is_empty() {
        format!("{}{}", FALLBACK_NAME, EXTENSION)
    } else {
        format!("{}{}", stem, EXTENSION)
    }
}

/// `name` itself if `taken` says it is free, otherwise `"stem (2).pdf"`,
/// `"stem (3).pdf"` and so on.
pub fn disambiguate(name: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(name) {
        return name.to_string();
    }
    let (stem, ext) = match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    };
    (2..)
        .map(|n| format!("{} ({}){}", stem, n, ext))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| name.to_string())
}
