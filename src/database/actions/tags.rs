use crate::{
    error::{ApiError, HttpError, QueryError},
    schema::{Id, Tag, TagColor},
};

use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

pub async fn create_tag(
    name: &str,
    color: TagColor,
    slug: &str,
    pool: &Pool<Postgres>,
) -> Result<Id, ApiError> {
    if find_tag(slug, pool).await?.is_some() {
        return Err(HttpError::InvalidRequest.new("Tag with specified slug already exists"));
    }

    let id: (i32,) =
        sqlx::query_as("INSERT INTO tags (name, color, slug) VALUES ($1, $2, $3) RETURNING id")
            .bind(name)
            .bind(color)
            .bind(slug)
            .fetch_one(pool)
            .await
            .map_err(|e| QueryError::from(e).into())?;

    Ok(id.0)
}

pub async fn get_tag(id: Id, pool: &Pool<Postgres>) -> Result<Option<Tag>, ApiError> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(tag)
}

pub async fn find_tag(slug: &str, pool: &Pool<Postgres>) -> Result<Option<Id>, ApiError> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT id FROM tags WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row.map(|tag| tag.0))
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, ApiError> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}

/// How many of the given ids actually exist. Used to reject payloads naming
/// unknown tags before anything is written.
pub async fn count_existing_tags(ids: &[Id], pool: &Pool<Postgres>) -> Result<i64, ApiError> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags WHERE id = ANY($1)")
        .bind(ids)
        .fetch_one(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(count.0)
}

pub async fn list_recipe_tags(pool: &Pool<Postgres>, recipe_id: Id) -> Result<Vec<Tag>, ApiError> {
    let list: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.id, t.name, t.color, t.slug
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(list)
}

/// Replaces the recipe's tag set inside the caller's transaction.
pub async fn set_recipe_tags(
    recipe_id: Id,
    tag_ids: &[Id],
    tr: &mut Transaction<'_, Postgres>,
) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    if !tag_ids.is_empty() {
        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");

        query_builder.push_values(tag_ids.iter(), |mut b, tag_id| {
            b.push_bind(recipe_id).push_bind(tag_id);
        });

        query_builder
            .build()
            .execute(&mut **tr)
            .await
            .map_err(|e| QueryError::from(e).into())?;
    }

    Ok(())
}
