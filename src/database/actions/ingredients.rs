use crate::{
    constants::INGREDIENT_COUNT_PER_PAGE,
    error::{ApiError, HttpError, QueryError},
    pagination::PageContext,
    schema::{Id, Ingredient, IngredientRow},
};

use sqlx::{Pool, Postgres};

pub async fn create_ingredient(
    name: &str,
    measurement_unit: &str,
    pool: &Pool<Postgres>,
) -> Result<Id, ApiError> {
    if find_ingredient(name, pool).await?.is_some() {
        return Err(HttpError::InvalidRequest.new("Ingredient with specified name already exists"));
    }

    let id: (i32,) = sqlx::query_as(
        "INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2) RETURNING id",
    )
    .bind(name)
    .bind(measurement_unit)
    .fetch_one(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(id.0)
}

pub async fn find_ingredient(name: &str, pool: &Pool<Postgres>) -> Result<Option<Id>, ApiError> {
    let row: Option<(i32,)> =
        sqlx::query_as("SELECT id FROM ingredients WHERE LOWER(name) = LOWER($1)")
            .bind(name)
            .fetch_optional(&*pool)
            .await
            .map_err(|e| QueryError::from(e).into())?;

    Ok(row.map(|r| r.0))
}

pub async fn get_ingredient(id: Id, pool: &Pool<Postgres>) -> Result<Option<Ingredient>, ApiError> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Prefix search for the ingredient typeahead. `search` is the raw user
/// input; the pattern is built here.
pub async fn fetch_ingredients(
    search: &str,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<IngredientRow>, ApiError> {
    let pattern = format!("{}%", search.replace('%', "\\%").replace('_', "\\_"));

    let rows: Vec<IngredientRow> = sqlx::query_as(
        "
        SELECT i.id, i.name, i.measurement_unit, COUNT(*) OVER() AS count
        FROM ingredients i
        WHERE i.name ILIKE $1
        ORDER BY i.name
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(pattern)
    .bind(INGREDIENT_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.first().map(|i| i.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, INGREDIENT_COUNT_PER_PAGE, offset);

    Ok(page)
}

/// How many of the given ids actually exist, for payload validation.
pub async fn count_existing_ingredients(
    ids: &[Id],
    pool: &Pool<Postgres>,
) -> Result<i64, ApiError> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ingredients WHERE id = ANY($1)")
        .bind(ids)
        .fetch_one(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(count.0)
}
