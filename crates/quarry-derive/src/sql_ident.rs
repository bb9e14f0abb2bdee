use proc_macro2::Span;
use syn::{Error, Result};

pub(crate) fn is_valid_sql_ident(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A column name: one plain identifier.
pub(crate) fn parse_column(s: &str, span: Span, what: &str) -> Result<String> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::new(span, format!("{what} must not be empty")));
    }
    if !is_valid_sql_ident(s) {
        return Err(Error::new(
            span,
            format!("{what} must be a valid SQL identifier (expected [A-Za-z_][A-Za-z0-9_]*)"),
        ));
    }
    Ok(s.to_string())
}

/// A table name, optionally schema-qualified (`schema.table`).
pub(crate) fn parse_table(s: &str, span: Span) -> Result<String> {
    let s = s.trim();
    if s.is_empty() || !s.split('.').all(is_valid_sql_ident) {
        return Err(Error::new(
            span,
            format!("table name '{s}' must be an identifier or schema.identifier"),
        ));
    }
    Ok(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert!(is_valid_sql_ident("user_id"));
        assert!(is_valid_sql_ident("_x1"));
        assert!(!is_valid_sql_ident("1x"));
        assert!(!is_valid_sql_ident("a-b"));
        assert!(!is_valid_sql_ident(""));
    }

    #[test]
    fn tables() {
        let span = Span::call_site();
        assert_eq!(parse_table(" main.users ", span).unwrap(), "main.users");
        assert!(parse_table("main.", span).is_err());
        assert!(parse_table("users; drop", span).is_err());
    }
}
