use crate::{
    constants::{DUPLICATE_FOLLOW_ERROR, SELF_FOLLOW_ERROR, USER_COUNT_PER_PAGE},
    error::{ApiError, HttpError, QueryError},
    pagination::PageContext,
    schema::{Id, SubscriptionEntry, UserListRow},
};

use sqlx::{Pool, Postgres};

use super::{
    recipes::{count_author_recipes, fetch_author_recipes},
    users::get_user_by_id,
};

pub async fn is_subscribed(user_id: Id, author_id: Id, pool: &Pool<Postgres>) -> Result<bool, ApiError> {
    let result: Option<(i32,)> = sqlx::query_as(
        "
        SELECT author_id FROM follows WHERE user_id = $1 AND author_id = $2
    ",
    )
    .bind(user_id)
    .bind(author_id)
    .fetch_optional(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(result.is_some())
}

/// Self-follow is rejected here, not by the table.
pub async fn subscribe(user_id: Id, author_id: Id, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    if user_id == author_id {
        return Err(HttpError::InvalidRequest.new(SELF_FOLLOW_ERROR));
    }

    if get_user_by_id(pool, author_id).await?.is_none() {
        return Err(HttpError::NotFound.new("No user exists with specified id"));
    }

    let result = sqlx::query(
        "INSERT INTO follows (user_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING RETURNING *;",
    )
    .bind(user_id)
    .bind(author_id)
    .execute(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(HttpError::InvalidRequest.new(DUPLICATE_FOLLOW_ERROR));
    }

    Ok(())
}

pub async fn unsubscribe(user_id: Id, author_id: Id, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2")
        .bind(user_id)
        .bind(author_id)
        .execute(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if result.rows_affected() <= 0 {
        return Err(HttpError::InvalidRequest.new("Not subscribed to this author"));
    }

    Ok(())
}

/// Followed authors with a short form of their recipes. `recipes_limit`
/// caps the nested list per author, not the page itself.
pub async fn fetch_subscriptions(
    user_id: Id,
    offset: i64,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<PageContext<SubscriptionEntry>, ApiError> {
    let authors: Vec<UserListRow> = sqlx::query_as(
        "
        SELECT u.id, u.username, u.email, u.first_name, u.last_name,
            true AS is_subscribed,
            COUNT(*) OVER() AS count
        FROM follows f
        INNER JOIN users u ON u.id = f.author_id
        WHERE f.user_id = $1
        ORDER BY u.id
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(USER_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let total_count = authors.first().map(|u| u.count).unwrap_or(0);

    let mut rows: Vec<SubscriptionEntry> = Vec::with_capacity(authors.len());
    for author in authors {
        let recipes = fetch_author_recipes(author.id, recipes_limit, pool).await?;
        let recipes_count = count_author_recipes(author.id, pool).await?;

        rows.push(SubscriptionEntry {
            email: author.email,
            id: author.id,
            username: author.username,
            first_name: author.first_name,
            last_name: author.last_name,
            is_subscribed: true,
            recipes,
            recipes_count,
        });
    }

    let page = PageContext::from_rows(rows, total_count, USER_COUNT_PER_PAGE, offset);

    Ok(page)
}
