//! Slug derivation for project URLs
//!
//! Lowercase, runs of non-alphanumeric characters collapse to a single
//! hyphen, leading/trailing hyphens trimmed. Deterministic and idempotent.

pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true; // suppresses a leading hyphen

    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("My Portfolio Site"), "my-portfolio-site");
    }

    #[test]
    fn test_collapses_runs() {
        assert_eq!(slugify("a -- b ___ c"), "a-b-c");
        assert_eq!(slugify("Rust & WebAssembly!!!"), "rust-webassembly");
    }

    #[test]
    fn test_trims_edges() {
        assert_eq!(slugify("  spaced  "), "spaced");
        assert_eq!(slugify("---x---"), "x");
    }

    #[test]
    fn test_idempotent() {
        let once = slugify("Hello, World!");
        assert_eq!(slugify(&once), once);
    }

    #[test]
    fn test_non_ascii_dropped() {
        assert_eq!(slugify("café crème"), "caf-cr-me");
        assert_eq!(slugify("日本語"), "");
    }
}
