//! Storage layer: one repository per collection over a shared SQLite pool.

pub mod classroom_repository;
pub mod db;
pub mod invoice_repository;
pub mod person_repository;
pub mod product_repository;
pub mod schedule_repository;
pub mod subject_repository;
pub mod teacher_repository;
pub mod user_repository;

pub use db::DbConnection;

/// Build an ORDER BY clause from caller input. The sort field must come from
/// the per-entity allow-list, otherwise the default `created_at DESC` applies.
pub(crate) fn order_clause(
    sort_field: Option<&str>,
    sort_order: Option<&str>,
    allowed: &[&str],
) -> String {
    let field = sort_field
        .filter(|f| allowed.contains(f))
        .unwrap_or("created_at");
    let direction = match sort_order {
        Some("asc") => "ASC",
        _ => "DESC",
    };
    format!(" ORDER BY {} {}", field, direction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_clause_defaults() {
        assert_eq!(order_clause(None, None, &["name"]), " ORDER BY created_at DESC");
    }

    #[test]
    fn order_clause_rejects_unknown_field() {
        assert_eq!(
            order_clause(Some("password_hash"), Some("asc"), &["name", "created_at"]),
            " ORDER BY created_at ASC"
        );
    }

    #[test]
    fn order_clause_accepts_allowed_field() {
        assert_eq!(
            order_clause(Some("name"), Some("asc"), &["name", "created_at"]),
            " ORDER BY name ASC"
        );
    }
}
