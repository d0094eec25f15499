//! Lookup of previously downloaded songs in a local cache directory.
//!
//! A cache file matches a song name when its lower-cased file stem contains
//! every word of the name. Short or very common words can therefore match
//! unrelated files; this is a known limitation of the heuristic.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Split a song name into lower-cased match tokens. Hyphens separate words.
pub fn tokenize(name: &str) -> Vec<String> {
    name.replace('-', " ")
        .split_whitespace()
        .map(str::to_lowercase)
        .collect()
}

/// True if every token occurs in the lower-cased stem. No tokens never match.
pub fn stem_matches(stem: &str, tokens: &[String]) -> bool {
    if tokens.is_empty() {
        return false;
    }
    let stem = stem.to_lowercase();
    tokens.iter().all(|t| stem.contains(t.as_str()))
}

fn is_mp3(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"))
}

/// Walk `cache_dir` recursively and return the first MP3 matching `name`.
///
/// Walk order is whatever the filesystem yields. Unreadable entries are
/// skipped and a missing directory simply has no matches. The `exclude`
/// subtree (normally the output directory, which may sit inside the cache)
/// is not descended into.
pub fn find_match_blocking(
    cache_dir: &Path,
    name: &str,
    exclude: Option<&Path>,
) -> Option<PathBuf> {
    let tokens = tokenize(name);
    if tokens.is_empty() {
        return None;
    }

    WalkDir::new(cache_dir)
        .into_iter()
        .filter_entry(|e| exclude.is_none_or(|x| e.path() != x))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_mp3(p))
        .find(|p| {
            p.file_stem()
                .map(|s| stem_matches(&s.to_string_lossy(), &tokens))
                .unwrap_or(false)
        })
}

/// Async wrapper running the directory walk on the blocking pool.
pub async fn find_match(
    cache_dir: PathBuf,
    name: String,
    exclude: Option<PathBuf>,
) -> Option<PathBuf> {
    let scan = move || find_match_blocking(&cache_dir, &name, exclude.as_deref());
    match tokio::task::spawn_blocking(scan).await {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(error = %e, "Cache scan task failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_tokenize_splits_on_whitespace_and_hyphen() {
        assert_eq!(
            tokenize("  Daft Punk - One-More  Time "),
            vec!["daft", "punk", "one", "more", "time"]
        );
        assert!(tokenize("   ").is_empty());
        assert!(tokenize(" - ").is_empty());
    }

    #[test]
    fn test_stem_matches_case_insensitive() {
        let tokens = tokenize("queen bohemian");
        assert!(stem_matches("QUEEN - Bohemian Rhapsody (Remastered)", &tokens));
        assert!(!stem_matches("Queen - Radio Ga Ga", &tokens));
    }

    #[test]
    fn test_stem_matches_substrings() {
        // Tokens are substrings, not whole words
        let tokens = tokenize("one");
        assert!(stem_matches("Someone Like You", &tokens));
    }

    #[test]
    fn test_empty_tokens_never_match() {
        assert!(!stem_matches("anything", &[]));
    }

    #[test]
    fn test_find_match_recursive() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("old").join("music");
        std::fs::create_dir_all(&nested).unwrap();
        File::create(dir.path().join("Other Song.mp3")).unwrap();
        File::create(nested.join("Adele - Hello (Official).MP3")).unwrap();

        let found = find_match_blocking(dir.path(), "adele hello", None).unwrap();
        assert_eq!(found, nested.join("Adele - Hello (Official).MP3"));
    }

    #[test]
    fn test_find_match_ignores_non_mp3() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("Adele - Hello.flac")).unwrap();
        File::create(dir.path().join("Adele - Hello.txt")).unwrap();
        std::fs::create_dir(dir.path().join("Adele - Hello.mp3.d")).unwrap();

        assert!(find_match_blocking(dir.path(), "Adele Hello", None).is_none());
    }

    #[test]
    fn test_find_match_any_of_several() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("Hello - Adele.mp3")).unwrap();
        File::create(dir.path().join("Adele Hello live.mp3")).unwrap();

        let found = find_match_blocking(dir.path(), "Adele Hello", None).unwrap();
        let stem = found.file_stem().unwrap().to_string_lossy().to_string();
        assert!(stem_matches(&stem, &tokenize("Adele Hello")));
    }

    #[test]
    fn test_find_match_missing_dir() {
        let dir = tempdir().unwrap();
        assert!(find_match_blocking(&dir.path().join("nope"), "anything", None).is_none());
    }

    #[test]
    fn test_find_match_blank_name() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("song.mp3")).unwrap();
        assert!(find_match_blocking(dir.path(), "   ", None).is_none());
    }

    #[test]
    fn test_find_match_skips_excluded_subtree() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("songs converted 2026-10-19");
        std::fs::create_dir(&out).unwrap();
        File::create(out.join("Toto - Africa (Official Video).mp3")).unwrap();

        assert!(find_match_blocking(dir.path(), "toto africa", Some(&out)).is_none());
        assert!(find_match_blocking(dir.path(), "toto africa", None).is_some());
    }

    #[tokio::test]
    async fn test_find_match_async() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("Toto - Africa.mp3")).unwrap();

        let found = find_match(dir.path().to_path_buf(), "toto africa".to_string(), None).await;
        assert!(found.is_some());
    }

    proptest! {
        #[test]
        fn prop_name_matches_itself(name in "[a-zA-Z0-9 ]{1,40}") {
            prop_assume!(!tokenize(&name).is_empty());
            prop_assert!(stem_matches(&name, &tokenize(&name)));
        }

        #[test]
        fn prop_match_survives_decoration(
            name in "[a-z]{1,10}( [a-z]{1,10}){0,3}",
            prefix in "[A-Z0-9 ]{0,8}",
            suffix in "[A-Z0-9 ()]{0,12}",
        ) {
            let stem = format!("{}{}{}", prefix, name.to_uppercase(), suffix);
            prop_assert!(stem_matches(&stem, &tokenize(&name)));
        }
    }
}
