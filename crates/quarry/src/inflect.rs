//! Key naming conventions for relations.

/// Singular form of a plural table name (English suffix rules).
pub fn singularize(name: &str) -> String {
    if let Some(stem) = name.strip_suffix("ies") {
        format!("{stem}y")
    } else if ["sses", "ches", "shes", "xes", "zes"]
        .iter()
        .any(|suffix| name.ends_with(suffix))
    {
        name[..name.len() - 2].to_string()
    } else if name.ends_with("ss") || name.ends_with("us") {
        name.to_string()
    } else if name.ends_with('s') && name.len() > 1 {
        name[..name.len() - 1].to_string()
    } else {
        name.to_string()
    }
}

/// Conventional foreign key pointing at rows of `table`: `singular(table)_id`.
///
/// Schema-qualified names use their last segment (`main.users` -> `user_id`).
pub fn foreign_key_for(table: &str) -> String {
    let table = table.rsplit('.').next().unwrap_or(table);
    format!("{}_id", singularize(table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singular_forms() {
        assert_eq!(singularize("users"), "user");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("matches"), "match");
        assert_eq!(singularize("status"), "status");
        assert_eq!(singularize("class"), "class");
        assert_eq!(singularize("person"), "person");
    }

    #[test]
    fn foreign_keys() {
        assert_eq!(foreign_key_for("users"), "user_id");
        assert_eq!(foreign_key_for("main.roles"), "role_id");
    }
}
