// Entity Models
//
// Categories are the only entity besides transactions: created on first
// reference, matched by exact title, never updated.

pub mod category;

pub use category::{
    Category, ResolvedCategories,
    find_by_title, find_by_id, create_category, find_or_create, resolve_titles,
    get_all_categories, count_categories,
};
