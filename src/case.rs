//! Identifier conversions: camelCase field names to snake_case columns, error-code segments and human labels.

/// Convert a single identifier from camelCase to snake_case.
/// e.g. "authorId" -> "author_id", "createdAt" -> "created_at"
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Upper snake case segment used in error codes.
/// e.g. "thumbnailUrl" -> "THUMBNAIL_URL", so a missing value reports `MISSING_THUMBNAIL_URL`.
pub fn to_code_segment(s: &str) -> String {
    to_snake_case(s).to_uppercase()
}

/// Human label for messages: "authorName" -> "Author name".
pub fn to_label(s: &str) -> String {
    let spaced = to_snake_case(s).replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_from_camel() {
        assert_eq!(to_snake_case("authorId"), "author_id");
        assert_eq!(to_snake_case("thumbnailUrl"), "thumbnail_url");
        assert_eq!(to_snake_case("title"), "title");
    }

    #[test]
    fn code_segment_is_upper_snake() {
        assert_eq!(to_code_segment("slug"), "SLUG");
        assert_eq!(to_code_segment("invoiceNumber"), "INVOICE_NUMBER");
    }

    #[test]
    fn label_is_sentence_case() {
        assert_eq!(to_label("authorName"), "Author name");
        assert_eq!(to_label("email"), "Email");
        assert_eq!(to_label(""), "");
    }
}
