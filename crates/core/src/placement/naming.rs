//! File and folder name hygiene.
//!
//! Stored names are restricted to `[a-z0-9._-]`; anything else is
//! stripped, not replaced. Folder paths keep `/` as their separator
//! and never carry empty or traversal segments.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use rand::Rng;
use uuid::Uuid;

/// Extensions appended to files whose name arrives without one.
static MIME_EXTENSIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("image/jpeg", "jpg"),
        ("image/png", "png"),
        ("image/gif", "gif"),
        ("image/webp", "webp"),
        ("image/avif", "avif"),
        ("image/svg+xml", "svg"),
        ("application/pdf", "pdf"),
        ("application/zip", "zip"),
        ("application/json", "json"),
        ("text/plain", "txt"),
        ("video/mp4", "mp4"),
        ("audio/mpeg", "mp3"),
    ])
});

const NAME_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

fn is_safe(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-')
}

fn clean_chars(s: &str) -> String {
    s.to_ascii_lowercase().chars().filter(|c| is_safe(*c)).collect()
}

/// Reduce a client-supplied file name to its safe basename.
///
/// Any directory prefix is cut off first, so a name like
/// `../../etc/passwd` stores as `passwd`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    clean_chars(base)
}

/// Sanitize a folder path into zero or more clean segments.
///
/// Backslashes count as separators. Empty, `.`, and `..` segments are
/// dropped, before and after character cleaning.
#[must_use]
pub fn sanitize_folder(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|segment| !matches!(*segment, "" | "." | ".."))
        .map(clean_chars)
        .filter(|segment| !matches!(segment.as_str(), "" | "." | ".."))
        .collect::<Vec<_>>()
        .join("/")
}

/// Split a file name at its final dot. Names without a dot, with only
/// a leading dot, or with a trailing dot have no extension.
#[must_use]
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}

/// Append the extension implied by `content_type` when the name has
/// none. Unknown content types leave the name untouched.
#[must_use]
pub fn ensure_extension(name: &str, content_type: &str) -> String {
    if split_extension(name).1.is_some() {
        return name.to_string();
    }
    match MIME_EXTENSIONS.get(content_type) {
        Some(ext) => format!("{name}.{ext}"),
        None => name.to_string(),
    }
}

/// Generate a lowercase alphanumeric name of the given length.
#[must_use]
pub fn random_name(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| {
            let idx = rng.random_range(0..NAME_ALPHABET.len());
            char::from(NAME_ALPHABET[idx])
        })
        .collect()
}

/// Produce a storable file name from a client-supplied hint, falling
/// back to a random name when nothing survives sanitizing.
#[must_use]
pub fn resolve_file_name(hint: &str, content_type: &str) -> String {
    let safe = sanitize_file_name(hint);
    let base = if safe.is_empty() {
        random_name(10)
    } else {
        safe
    };
    ensure_extension(&base, content_type)
}

/// Append a random three-byte hex suffix before the extension, used to
/// sidestep a name collision without losing either object.
#[must_use]
pub fn suffixed_name(name: &str) -> String {
    let (stem, ext) = split_extension(name);
    let salt: [u8; 3] = rand::rng().random();
    let suffix = format!("{:02x}{:02x}{:02x}", salt[0], salt[1], salt[2]);
    match ext {
        Some(ext) => format!("{stem}-{suffix}.{ext}"),
        None => format!("{stem}-{suffix}"),
    }
}

/// Disambiguate the nth file of a batch that shares one provided name.
/// Every file gets a 1-based position suffix, the first included.
#[must_use]
pub fn indexed_name(name: &str, index: usize) -> String {
    let (stem, ext) = split_extension(name);
    match ext {
        Some(ext) => format!("{stem}-{}.{ext}", index + 1),
        None => format!("{stem}-{}", index + 1),
    }
}

/// Compose the canonical object key for a file.
#[must_use]
pub fn object_key(tenant_id: Uuid, folder_path: &str, file_name: &str) -> String {
    if folder_path.is_empty() {
        format!("{tenant_id}/{file_name}")
    } else {
        format!("{tenant_id}/{folder_path}/{file_name}")
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("invoice.pdf", "invoice.pdf")]
    #[case("Photo (1).PNG", "photo1.png")]
    #[case("../../etc/passwd", "passwd")]
    #[case("C:\\Users\\me\\Report.PDF", "report.pdf")]
    #[case("café münü.jpg", "cafmn.jpg")]
    #[case("!@#$%", "")]
    fn test_sanitize_file_name(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_file_name(input), expected);
    }

    #[rstest]
    #[case("invoices/2026", "invoices/2026")]
    #[case("/Invoices//August/", "invoices/august")]
    #[case("a\\b\\c", "a/b/c")]
    #[case("../secret/./x", "secret/x")]
    #[case("!!/??", "")]
    #[case("", "")]
    fn test_sanitize_folder(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize_folder(input), expected);
    }

    #[rstest]
    #[case("photo.png", "photo", Some("png"))]
    #[case("archive.tar.gz", "archive.tar", Some("gz"))]
    #[case("readme", "readme", None)]
    #[case(".hidden", ".hidden", None)]
    #[case("trailing.", "trailing.", None)]
    fn test_split_extension(#[case] name: &str, #[case] stem: &str, #[case] ext: Option<&str>) {
        assert_eq!(split_extension(name), (stem, ext));
    }

    #[test]
    fn test_ensure_extension() {
        assert_eq!(ensure_extension("photo", "image/jpeg"), "photo.jpg");
        assert_eq!(ensure_extension("photo.png", "image/jpeg"), "photo.png");
        assert_eq!(ensure_extension("blob", "application/x-custom"), "blob");
    }

    #[test]
    fn test_resolve_file_name_falls_back_to_random() {
        let name = resolve_file_name("🔥🔥🔥", "image/png");
        let (stem, ext) = split_extension(&name);
        assert_eq!(ext, Some("png"));
        assert_eq!(stem.len(), 10);
        assert!(stem.bytes().all(|b| NAME_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_suffixed_name_keeps_stem_and_extension() {
        let name = suffixed_name("report.pdf");
        assert!(name.starts_with("report-"));
        assert!(name.ends_with(".pdf"));
        assert_eq!(name.len(), "report-".len() + 6 + ".pdf".len());

        let bare = suffixed_name("report");
        assert!(bare.starts_with("report-"));
        assert_eq!(bare.len(), "report-".len() + 6);
    }

    #[test]
    fn test_indexed_name() {
        assert_eq!(indexed_name("photo.png", 0), "photo-1.png");
        assert_eq!(indexed_name("photo.png", 1), "photo-2.png");
        assert_eq!(indexed_name("photo.png", 4), "photo-5.png");
        assert_eq!(indexed_name("notes", 1), "notes-2");
    }

    #[test]
    fn test_object_key_shape() {
        let tenant_id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(
            object_key(tenant_id, "invoices/2026", "a.pdf"),
            format!("{tenant_id}/invoices/2026/a.pdf")
        );
        assert_eq!(
            object_key(tenant_id, "", "a.pdf"),
            format!("{tenant_id}/a.pdf")
        );
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // Property 1: sanitized names only ever carry safe characters.
        #[test]
        fn prop_sanitized_names_only_carry_safe_chars(name in ".*") {
            let sanitized = sanitize_file_name(&name);
            for c in sanitized.chars() {
                prop_assert!(is_safe(c), "unsafe character survived: {}", c);
            }
        }

        // Property 2: folder paths never keep traversal or empty
        // segments, whatever the input.
        #[test]
        fn prop_folders_never_carry_traversal(path in ".*") {
            let sanitized = sanitize_folder(&path);
            if !sanitized.is_empty() {
                for segment in sanitized.split('/') {
                    prop_assert!(!segment.is_empty());
                    prop_assert_ne!(segment, ".");
                    prop_assert_ne!(segment, "..");
                }
            }
        }

        // Property 3: collision suffixing preserves the extension.
        #[test]
        fn prop_suffixed_name_keeps_extension(stem in "[a-z0-9_-]{1,20}", ext in "[a-z]{1,5}") {
            let name = format!("{stem}.{ext}");
            let suffixed = suffixed_name(&name);
            let ext_suffix = format!(".{ext}");
            let stem_prefix = format!("{stem}-");
            prop_assert!(suffixed.ends_with(&ext_suffix));
            prop_assert!(suffixed.starts_with(&stem_prefix));
        }

        // Property 4: random names honor length and charset.
        #[test]
        fn prop_random_name_charset(len in 1usize..40) {
            let name = random_name(len);
            prop_assert_eq!(name.len(), len);
            prop_assert!(name.bytes().all(|b| NAME_ALPHABET.contains(&b)));
        }

        // Property 5: keys always start with the tenant and end with
        // the file name.
        #[test]
        fn prop_object_key_brackets(folder in "[a-z0-9/]{0,20}", file in "[a-z0-9]{1,10}\\.[a-z]{2,4}") {
            let tenant_id = Uuid::new_v4();
            let key = object_key(tenant_id, &folder, &file);
            prop_assert!(key.starts_with(&tenant_id.to_string()));
            prop_assert!(key.ends_with(&file));
        }
    }
}
