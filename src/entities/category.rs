// 🏷️ Category Entity - named tags created on first reference
//
// Titles are unique and matched exactly (case-sensitive).
// Categories are never renamed or deleted, so the UUID is a stable
// foreign key for transactions.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::db::parse_timestamp;
use crate::error::Result;

// ============================================================================
// CATEGORY ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Stable identity (UUID)
    pub id: String,

    /// Unique title, e.g. "Food", "Housing"
    pub title: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Create new category entity with UUID (not yet persisted)
    pub fn new(title: String) -> Self {
        let now = Utc::now();

        Category {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            created_at: now,
            updated_at: now,
        }
    }
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    let created_at: String = row.get(2)?;
    let updated_at: String = row.get(3)?;

    Ok(Category {
        id: row.get(0)?,
        title: row.get(1)?,
        created_at: parse_timestamp(2, &created_at)?,
        updated_at: parse_timestamp(3, &updated_at)?,
    })
}

// ============================================================================
// CATEGORY STORE
// ============================================================================

/// Find category by title (exact match)
pub fn find_by_title(conn: &Connection, title: &str) -> Result<Option<Category>> {
    let category = conn
        .query_row(
            "SELECT id, title, created_at, updated_at FROM categories WHERE title = ?1",
            [title],
            category_from_row,
        )
        .optional()?;

    Ok(category)
}

pub fn find_by_id(conn: &Connection, id: &str) -> Result<Option<Category>> {
    let category = conn
        .query_row(
            "SELECT id, title, created_at, updated_at FROM categories WHERE id = ?1",
            [id],
            category_from_row,
        )
        .optional()?;

    Ok(category)
}

/// Insert a new category. Fails on a duplicate title (UNIQUE constraint).
pub fn create_category(conn: &Connection, title: &str) -> Result<Category> {
    let category = Category::new(title.to_string());

    conn.execute(
        "INSERT INTO categories (id, title, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            category.id,
            category.title,
            category.created_at.to_rfc3339(),
            category.updated_at.to_rfc3339(),
        ],
    )?;

    debug!(id = %category.id, title = %category.title, "category created");
    Ok(category)
}

/// Look the title up; create it only when no category has that title
pub fn find_or_create(conn: &Connection, title: &str) -> Result<Category> {
    match find_by_title(conn, title)? {
        Some(category) => Ok(category),
        None => create_category(conn, title),
    }
}

/// Category ids for a batch of titles
#[derive(Debug, Default, Clone)]
pub struct ResolvedCategories {
    ids: HashMap<String, String>,

    /// Categories that did not exist before, in first-occurrence order
    pub created: Vec<Category>,
}

impl ResolvedCategories {
    pub fn id_of(&self, title: &str) -> Option<&str> {
        self.ids.get(title).map(String::as_str)
    }

    /// Number of distinct titles resolved
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Resolve many titles at once.
///
/// Repeated titles are looked up once, and each missing title is created
/// exactly once, in the order it first appears.
pub fn resolve_titles<'a, I>(conn: &Connection, titles: I) -> Result<ResolvedCategories>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut resolved = ResolvedCategories::default();

    for title in titles {
        if resolved.ids.contains_key(title) {
            continue;
        }

        let category = match find_by_title(conn, title)? {
            Some(existing) => existing,
            None => {
                let created = create_category(conn, title)?;
                resolved.created.push(created.clone());
                created
            }
        };

        resolved.ids.insert(category.title, category.id);
    }

    Ok(resolved)
}

/// All categories in creation order
pub fn get_all_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, created_at, updated_at FROM categories ORDER BY row_id",
    )?;

    let categories = stmt
        .query_map([], category_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(categories)
}

pub fn count_categories(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;

    Ok(count)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;
    use crate::error::LedgerError;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_category_creation() {
        let category = Category::new("Test Category".to_string());

        assert!(!category.id.is_empty());
        assert_eq!(category.title, "Test Category");
        assert_eq!(category.created_at, category.updated_at);
    }

    #[test]
    fn test_find_or_create_creates_once() {
        let conn = setup();

        let first = find_or_create(&conn, "Food").unwrap();
        let second = find_or_create(&conn, "Food").unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(count_categories(&conn).unwrap(), 1);
    }

    #[test]
    fn test_find_by_title_is_case_sensitive() {
        let conn = setup();
        let food = create_category(&conn, "Food").unwrap();

        assert_eq!(find_by_title(&conn, "Food").unwrap().unwrap().id, food.id);
        assert!(find_by_title(&conn, "food").unwrap().is_none());
        assert!(find_by_title(&conn, "Food ").unwrap().is_none());

        // A different case is a different category
        let lower = find_or_create(&conn, "food").unwrap();
        assert_ne!(lower.id, food.id);
        assert_eq!(count_categories(&conn).unwrap(), 2);
    }

    #[test]
    fn test_find_by_id() {
        let conn = setup();
        let housing = create_category(&conn, "Housing").unwrap();

        let found = find_by_id(&conn, &housing.id).unwrap().unwrap();
        assert_eq!(found.title, "Housing");
        assert!(find_by_id(&conn, "non-existent-uuid").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_title_is_rejected() {
        let conn = setup();
        create_category(&conn, "Job").unwrap();

        let err = create_category(&conn, "Job").unwrap_err();
        assert!(matches!(err, LedgerError::Database(_)));
        assert_eq!(count_categories(&conn).unwrap(), 1);
    }

    #[test]
    fn test_resolve_titles_dedups_and_keeps_order() {
        let conn = setup();
        let existing = create_category(&conn, "Housing").unwrap();

        let titles = ["Food", "Housing", "Food", "Job", "Food"];
        let resolved = resolve_titles(&conn, titles).unwrap();

        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved.id_of("Housing"), Some(existing.id.as_str()));

        let created: Vec<&str> = resolved.created.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(created, vec!["Food", "Job"]);
        assert_eq!(count_categories(&conn).unwrap(), 3);

        for title in ["Food", "Job"] {
            let stored = find_by_title(&conn, title).unwrap().unwrap();
            assert_eq!(resolved.id_of(title), Some(stored.id.as_str()));
        }
    }

    #[test]
    fn test_resolve_titles_empty() {
        let conn = setup();
        let resolved = resolve_titles(&conn, std::iter::empty()).unwrap();

        assert!(resolved.is_empty());
        assert!(resolved.created.is_empty());
    }

    #[test]
    fn test_get_all_categories_in_creation_order() {
        let conn = setup();
        for title in ["Job", "Housing", "Food"] {
            find_or_create(&conn, title).unwrap();
        }

        let titles: Vec<String> = get_all_categories(&conn)
            .unwrap()
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["Job", "Housing", "Food"]);
    }
}
