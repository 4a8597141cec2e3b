use crate::{
    constants::DUPLICATE_FAVORITE_ERROR,
    error::{ApiError, HttpError, QueryError},
    schema::Id,
};

use sqlx::{Pool, Postgres};

pub async fn is_favorite(id: Id, user_id: Id, pool: &Pool<Postgres>) -> Result<bool, ApiError> {
    let result: Option<(i32,)> = sqlx::query_as(
        "
        SELECT recipe_id FROM favorites WHERE recipe_id = $1 AND user_id = $2
    ",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(result.is_some())
}

pub async fn add_to_favorites(id: Id, user_id: Id, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    let result = sqlx::query(
        "INSERT INTO favorites (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING RETURNING *;",
    )
    .bind(user_id)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(HttpError::InvalidRequest.new(DUPLICATE_FAVORITE_ERROR));
    }

    Ok(())
}

pub async fn remove_from_favorites(
    id: Id,
    user_id: Id,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(HttpError::InvalidRequest.new("Recipe is not in favorites"));
    }

    Ok(())
}
