//! Slug generation for forms and fields.

use unicode_normalization::UnicodeNormalization;

/// Convert a display name into a URL-safe slug.
///
/// Accented letters are reduced to their ASCII base (NFKD, then any
/// remaining non-ASCII character is dropped). ASCII letters are lowercased,
/// digits and `_` kept, and every other run of characters collapses into a
/// single `-`. Leading and trailing separators are removed.
///
/// # Examples
///
/// ```
/// use dynforms_core::naming::slugify;
///
/// assert_eq!(slugify("Customer Onboarding"), "customer-onboarding");
/// assert_eq!(slugify("  KRA PIN (Company) "), "kra-pin-company");
/// assert_eq!(slugify("first_name"), "first_name");
/// assert_eq!(slugify("Café Menu"), "cafe-menu");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.nfkd().filter(char::is_ascii) {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_separators() {
        assert_eq!(slugify("a  --  b"), "a-b");
    }

    #[test]
    fn transliterates_accents() {
        assert_eq!(slugify("Café Menu"), "cafe-menu");
        assert_eq!(slugify("Ñandú Über-Größe"), "nandu-uber-groe");
        assert_eq!(slugify("ﬁle №5"), "file-no5");
    }

    #[test]
    fn drops_characters_without_ascii_base() {
        assert_eq!(slugify("Form 日本 2"), "form-2");
    }

    #[test]
    fn empty_input() {
        assert_eq!(slugify("   "), "");
    }
}
