//! Path classifier (C1). A pure function of the path string: no I/O, no state.
//!
//! Rules, exhaustive (§3):
//! - trailing `/` ⇒ local (directory)
//! - any `.`-prefixed segment ⇒ local
//! - trailing `~` on the last segment ⇒ local
//! - last segment starting with `_` ⇒ wiki
//! - everything else ⇒ local

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Wiki,
    Local,
}

pub fn classify(path: &str) -> Classification {
    if path.is_empty() || path.ends_with('/') {
        return Classification::Local;
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let Some(last) = segments.last() else {
        return Classification::Local;
    };

    if segments.iter().any(|s| s.starts_with('.')) {
        return Classification::Local;
    }
    if last.ends_with('~') {
        return Classification::Local;
    }
    if last.starts_with('_') {
        Classification::Wiki
    } else {
        Classification::Local
    }
}

pub fn is_wiki(path: &str) -> bool {
    classify(path) == Classification::Wiki
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_wiki_file() {
        assert_eq!(classify("_a"), Classification::Wiki);
        assert_eq!(classify("notes/_a"), Classification::Wiki);
    }

    #[test]
    fn plain_local_file() {
        assert_eq!(classify("plain.txt"), Classification::Local);
        assert_eq!(classify("notes/plain.txt"), Classification::Local);
    }

    #[test]
    fn trailing_slash_is_always_local() {
        assert_eq!(classify("notes/_a/"), Classification::Local);
    }

    #[test]
    fn dotted_segment_is_local_even_if_basename_looks_wiki() {
        assert_eq!(classify(".git/_a"), Classification::Local);
        assert_eq!(classify("notes/.hidden/_a"), Classification::Local);
    }

    #[test]
    fn tilde_suffixed_basename_is_local() {
        assert_eq!(classify("notes/_a~"), Classification::Local);
    }

    #[test]
    fn root_is_local() {
        assert_eq!(classify(""), Classification::Local);
    }

    #[test]
    fn underscore_prefixed_dir_segment_does_not_force_wiki() {
        // a `_`-prefixed *directory* segment doesn't matter; only the basename does.
        assert_eq!(classify("_dir/plain.txt"), Classification::Local);
        assert_eq!(classify("_dir/_file"), Classification::Wiki);
    }
}
