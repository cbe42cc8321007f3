use unicode_normalization::UnicodeNormalization;

/// Turn a title into a URL slug: lowercase ASCII letters, digits, underscores
/// and hyphens, with whitespace runs folded into a single hyphen.
///
/// Accented letters are decomposed (NFKD) first so `Café` becomes `cafe`.
/// Anything left outside ASCII is dropped.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_hyphen = false;

    for c in value.nfkd().filter(char::is_ascii) {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else if c == '-' || c.is_whitespace() {
            pending_hyphen = true;
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_joins_words() {
        assert_eq!(slugify("Website Redesign"), "website-redesign");
    }

    #[test]
    fn drops_punctuation() {
        assert_eq!(slugify("Mobile app (v2.0)!"), "mobile-app-v20");
    }

    #[test]
    fn collapses_whitespace_and_hyphens() {
        assert_eq!(slugify("  ERP -- migration\tphase  "), "erp-migration-phase");
    }

    #[test]
    fn keeps_underscores_inside_but_trims_edges() {
        assert_eq!(slugify("_internal_tool_"), "internal_tool");
    }

    #[test]
    fn transliterates_accented_letters() {
        assert_eq!(slugify("Café Żółć"), "cafe-zoc");
        assert_eq!(slugify("äöü ???"), "aou");
    }

    #[test]
    fn compatibility_forms_fold_to_ascii() {
        assert_eq!(slugify("ﬁnal ①"), "final-1");
    }

    #[test]
    fn empty_when_nothing_survives() {
        assert_eq!(slugify("日本 ???"), "");
    }
}
