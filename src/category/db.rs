//! Database operations for categories.

use rusqlite::{Connection, Row, ffi::SQLITE_CONSTRAINT_UNIQUE};

use crate::{
    Error,
    category::{Category, CategoryId, CategoryName, CategoryType},
};

/// Create a category and return it with its generated ID.
///
/// # Errors
/// Returns [Error::DuplicateCategoryName] if a category with the same name and type exists.
pub fn create_category(
    name: CategoryName,
    type_: Option<CategoryType>,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(
            "INSERT INTO category (name, type) VALUES (?1, ?2)
             RETURNING id, name, type",
        )?
        .query_row((name.as_ref(), type_.map(|t| t.as_str())), map_row)
        .map_err(|error| map_unique_violation(error, &name))
}

/// Retrieve a single category by ID.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, type FROM category WHERE id = :id;")?
        .query_row(&[(":id", &category_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve all categories ordered alphabetically by name.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, type FROM category ORDER BY name ASC, id ASC;")?
        .query_map([], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Update a category's name and type, returning the updated category.
///
/// # Errors
/// Returns [Error::UpdateMissingCategory] if the category doesn't exist,
/// or [Error::DuplicateCategoryName] if the new name and type clash with another category.
pub fn update_category(
    category_id: CategoryId,
    name: CategoryName,
    type_: Option<CategoryType>,
    connection: &Connection,
) -> Result<Category, Error> {
    let rows_affected = connection
        .execute(
            "UPDATE category SET name = ?1, type = ?2 WHERE id = ?3",
            (name.as_ref(), type_.map(|t| t.as_str()), category_id),
        )
        .map_err(|error| map_unique_violation(error, &name))?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    Ok(Category {
        id: category_id,
        name,
        type_,
    })
}

/// Delete a category by ID. Returns an error if the category doesn't exist.
///
/// Transactions keep the category name they were recorded with.
pub fn delete_category(category_id: CategoryId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM category WHERE id = ?1", [category_id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(())
}

/// Initialize the category table and indexes.
///
/// Names are unique per type, where a missing type counts as its own type.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            type TEXT CHECK (type IN ('income', 'expense')),
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_category_name_type
            ON category(name, IFNULL(type, ''));",
    )?;

    Ok(())
}

fn map_unique_violation(error: rusqlite::Error, name: &CategoryName) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(sql_error, _)
            if sql_error.extended_code == SQLITE_CONSTRAINT_UNIQUE =>
        {
            Error::DuplicateCategoryName(name.to_string())
        }
        error => error.into(),
    }
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let raw_type: Option<String> = row.get(2)?;

    Ok(Category {
        id,
        name: CategoryName::new_unchecked(&raw_name),
        type_: raw_type.as_deref().and_then(CategoryType::parse),
    })
}
