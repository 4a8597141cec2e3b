use crate::{
    constants::DUPLICATE_CART_ERROR,
    error::{ApiError, HttpError, QueryError},
    schema::{Id, ShoppingListRow},
};

use sqlx::{Pool, Postgres};

pub async fn is_in_cart(id: Id, user_id: Id, pool: &Pool<Postgres>) -> Result<bool, ApiError> {
    let result: Option<(i32,)> = sqlx::query_as(
        "
        SELECT recipe_id FROM cart WHERE recipe_id = $1 AND user_id = $2
    ",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(result.is_some())
}

pub async fn add_to_cart(id: Id, user_id: Id, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    let result = sqlx::query(
        "INSERT INTO cart (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING RETURNING *;",
    )
    .bind(user_id)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(HttpError::InvalidRequest.new(DUPLICATE_CART_ERROR));
    }

    Ok(())
}

pub async fn remove_from_cart(id: Id, user_id: Id, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM cart WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(HttpError::InvalidRequest.new("Recipe is not in the shopping cart"));
    }

    Ok(())
}

/// The shopping list: every part of every recipe in the user's cart,
/// summed per (ingredient name, measurement unit).
pub async fn fetch_shopping_list(
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<Vec<ShoppingListRow>, ApiError> {
    let rows: Vec<ShoppingListRow> = sqlx::query_as(
        "
        SELECT i.name AS name,
            i.measurement_unit AS measurement_unit,
            SUM(ri.amount) AS total_amount
        FROM cart c
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE c.user_id = $1
        GROUP BY i.name, i.measurement_unit
        ORDER BY i.name
    ",
    )
    .bind(user_id)
    .fetch_all(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}
