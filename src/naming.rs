//! Default naming convention for columns without an explicit `column_name`.

/// Convert a declared field name to its default column name.
///
/// Word boundaries are detected on case changes, keeping acronyms together:
/// `UserID` becomes `user_id`, `HTTPServer` becomes `http_server`, and
/// names that are already snake_case pass through unchanged.
pub fn column_name(field: &str) -> String {
    let chars: Vec<char> = field.chars().collect();
    let mut out = String::with_capacity(field.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                let boundary = prev.is_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_uppercase() && next_is_lower);
                if boundary && !out.ends_with('_') {
                    out.push('_');
                }
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case_passthrough() {
        assert_eq!(column_name("user_name"), "user_name");
        assert_eq!(column_name("id"), "id");
    }

    #[test]
    fn test_camel_and_pascal() {
        assert_eq!(column_name("userName"), "user_name");
        assert_eq!(column_name("CreatedAt"), "created_at");
    }

    #[test]
    fn test_acronyms() {
        assert_eq!(column_name("UserID"), "user_id");
        assert_eq!(column_name("HTTPServer"), "http_server");
        assert_eq!(column_name("ID"), "id");
    }

    #[test]
    fn test_digits() {
        assert_eq!(column_name("address2Line"), "address2_line");
    }
}
