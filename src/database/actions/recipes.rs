use std::collections::HashSet;

use base64::Engine;
use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    constants::{
        DUPLICATE_INGREDIENT_ERROR, EMPTY_INGREDIENTS_ERROR, EMPTY_TAGS_ERROR, MAX_COOKING_TIME,
        MAX_COOKING_TIME_ERROR, MAX_FIELD_LENGTH, MIN_COOKING_TIME, MIN_COOKING_TIME_ERROR,
        MIN_INGREDIENT_AMOUNT, MIN_INGREDIENT_AMOUNT_ERROR, RECIPE_COUNT_PER_PAGE,
    },
    error::{ApiError, HttpError, QueryError},
    jwt::SessionData,
    pagination::PageContext,
    permissions::ActionType,
    schema::{
        Id, Recipe, RecipeDetail, RecipeFilter, RecipeIngredient, RecipePayload, RecipeRow,
        RecipeShort,
    },
};

use super::{
    cart::is_in_cart,
    favorites::is_favorite,
    ingredients::count_existing_ingredients,
    tags::{count_existing_tags, list_recipe_tags, set_recipe_tags},
    users::get_profile,
};

/// Payload checks shared by create and update. Referential checks against
/// the ingredient/tag tables happen separately, inside the write path.
pub fn validate_recipe_payload(payload: &RecipePayload) -> Result<(), ApiError> {
    if payload.ingredients.is_empty() {
        return Err(HttpError::InvalidRequest.new(EMPTY_INGREDIENTS_ERROR));
    }
    if payload.tags.is_empty() {
        return Err(HttpError::InvalidRequest.new(EMPTY_TAGS_ERROR));
    }

    let mut seen: HashSet<Id> = HashSet::new();
    for part in payload.ingredients.iter() {
        if !seen.insert(part.id) {
            return Err(HttpError::InvalidRequest.new(DUPLICATE_INGREDIENT_ERROR));
        }
        if part.amount < MIN_INGREDIENT_AMOUNT {
            return Err(HttpError::InvalidRequest.new(MIN_INGREDIENT_AMOUNT_ERROR));
        }
    }

    if payload.cooking_time < MIN_COOKING_TIME {
        return Err(HttpError::InvalidRequest.new(MIN_COOKING_TIME_ERROR));
    }
    if payload.cooking_time > MAX_COOKING_TIME {
        return Err(HttpError::InvalidRequest.new(MAX_COOKING_TIME_ERROR));
    }

    if payload.name.trim().is_empty() || payload.name.len() > MAX_FIELD_LENGTH {
        return Err(HttpError::InvalidRequest.new("Invalid recipe name"));
    }
    if payload.text.trim().is_empty() {
        return Err(HttpError::InvalidRequest.new("Invalid recipe text"));
    }

    if let Some(image) = &payload.image {
        validate_image(image)?;
    }

    Ok(())
}

/// Images arrive either as a plain URL or a base64 data URL. Only the
/// latter has anything to verify.
fn validate_image(image: &str) -> Result<(), ApiError> {
    if !image.starts_with("data:") {
        return Ok(());
    }

    let payload = image
        .split_once(',')
        .map(|(_header, payload)| payload)
        .ok_or_else(|| HttpError::InvalidRequest.new("Invalid image payload"))?;

    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|_e| HttpError::InvalidRequest.new("Invalid image payload"))?;

    Ok(())
}

pub async fn fetch_recipes(
    filter: &RecipeFilter,
    viewer: Option<Id>,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, ApiError> {
    let rows: Vec<RecipeRow> = sqlx::query_as(
        "
        SELECT r.*, COUNT(*) OVER() AS count
        FROM recipes r
        WHERE ($1::int IS NULL OR r.author_id = $1)
            AND (cardinality($2::text[]) = 0 OR EXISTS (
                SELECT 1 FROM recipe_tags rt
                INNER JOIN tags t ON t.id = rt.tag_id
                WHERE rt.recipe_id = r.id AND t.slug = ANY($2)))
            AND (NOT $3 OR EXISTS (
                SELECT 1 FROM favorites f
                WHERE f.recipe_id = r.id AND f.user_id = $4))
            AND (NOT $5 OR EXISTS (
                SELECT 1 FROM cart c
                WHERE c.recipe_id = r.id AND c.user_id = $4))
        ORDER BY r.pub_date DESC
        LIMIT $6 OFFSET $7
    ",
    )
    .bind(filter.author)
    .bind(&filter.tags)
    .bind(filter.is_favorited)
    .bind(viewer)
    .bind(filter.is_in_shopping_cart)
    .bind(RECIPE_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, RECIPE_COUNT_PER_PAGE, offset);

    Ok(page)
}

pub async fn find_recipe(name: &str, pool: &Pool<Postgres>) -> Result<Option<Id>, ApiError> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT id FROM recipes WHERE LOWER(name) = LOWER($1)")
        .bind(name)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row.map(|r| r.0))
}

pub async fn find_recipe_by_text(text: &str, pool: &Pool<Postgres>) -> Result<Option<Id>, ApiError> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT id FROM recipes WHERE text = $1")
        .bind(text)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row.map(|r| r.0))
}

pub async fn get_recipe(id: Id, pool: &Pool<Postgres>) -> Result<Option<Recipe>, ApiError> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Resolves the recipe only if the session may mutate it: the author, or a
/// role holding `ManageAllRecipes`.
pub async fn get_recipe_mut(
    id: Id,
    session: SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ApiError> {
    let recipe = get_recipe(id, pool).await?;
    session.authenticate(ActionType::ManageOwnRecipes)?;

    match recipe {
        Some(recipe) => match session.authenticate(ActionType::ManageAllRecipes) {
            Ok(_) => Ok(recipe),
            Err(_) => {
                if recipe.author_id != session.user_id {
                    Err(HttpError::Unauthorized.default())
                } else {
                    Ok(recipe)
                }
            }
        },
        None => Err(HttpError::NotFound.new("No recipe exists with specified id")),
    }
}

/// Referential checks shared by the write paths: every named tag and
/// ingredient must exist before the transaction opens.
async fn check_recipe_references(
    payload: &RecipePayload,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let tag_count = count_existing_tags(&payload.tags, pool).await?;
    if tag_count != payload.tags.len() as i64 {
        return Err(HttpError::InvalidRequest.new("Tag doesn't exist"));
    }

    let ingredient_ids: Vec<Id> = payload.ingredients.iter().map(|part| part.id).collect();
    let ingredient_count = count_existing_ingredients(&ingredient_ids, pool).await?;
    if ingredient_count != ingredient_ids.len() as i64 {
        return Err(HttpError::InvalidRequest.new("Ingredient doesn't exist"));
    }

    Ok(())
}

pub async fn create_recipe(
    author_id: Id,
    payload: &RecipePayload,
    pool: &Pool<Postgres>,
) -> Result<Id, ApiError> {
    validate_recipe_payload(payload)?;
    check_recipe_references(payload, pool).await?;

    if find_recipe(&payload.name, pool).await?.is_some() {
        return Err(HttpError::InvalidRequest.new("Recipe with specified name already exists"));
    }
    if find_recipe_by_text(&payload.text, pool).await?.is_some() {
        return Err(HttpError::InvalidRequest.new("Recipe with specified text already exists"));
    }

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()).into())?;

    let id: (i32,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(author_id)
    .bind(&payload.name)
    .bind(&payload.image)
    .bind(&payload.text)
    .bind(payload.cooking_time)
    .fetch_one(&mut *tr)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    insert_recipe_ingredients(id.0, payload, &mut tr).await?;
    set_recipe_tags(id.0, &payload.tags, &mut tr).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()).into())?;

    Ok(id.0)
}

/// Wholesale replacement of fields, parts and tags, as one transaction.
pub async fn update_recipe(
    recipe_id: Id,
    payload: &RecipePayload,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    validate_recipe_payload(payload)?;
    check_recipe_references(payload, pool).await?;

    if let Some(existing) = find_recipe(&payload.name, pool).await? {
        if existing != recipe_id {
            return Err(HttpError::InvalidRequest.new("Recipe with specified name already exists"));
        }
    }
    if let Some(existing) = find_recipe_by_text(&payload.text, pool).await? {
        if existing != recipe_id {
            return Err(HttpError::InvalidRequest.new("Recipe with specified text already exists"));
        }
    }

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()).into())?;

    sqlx::query(
        "UPDATE recipes SET name = $1, image = $2, text = $3, cooking_time = $4 WHERE id = $5",
    )
    .bind(&payload.name)
    .bind(&payload.image)
    .bind(&payload.text)
    .bind(payload.cooking_time)
    .bind(recipe_id)
    .execute(&mut *tr)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut *tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    insert_recipe_ingredients(recipe_id, payload, &mut tr).await?;
    set_recipe_tags(recipe_id, &payload.tags, &mut tr).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()).into())?;

    Ok(())
}

async fn insert_recipe_ingredients(
    recipe_id: Id,
    payload: &RecipePayload,
    tr: &mut sqlx::Transaction<'_, Postgres>,
) -> Result<(), ApiError> {
    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");

    query_builder.push_values(payload.ingredients.iter(), |mut b, part| {
        b.push_bind(recipe_id).push_bind(part.id).push_bind(part.amount);
    });

    query_builder
        .build()
        .execute(&mut **tr)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

/// Cascades take the parts, tag links, favorites and cart rows with it.
pub async fn delete_recipe(id: Id, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

pub async fn list_recipe_ingredients(
    pool: &Pool<Postgres>,
    recipe_id: Id,
) -> Result<Vec<RecipeIngredient>, ApiError> {
    let rows: Vec<RecipeIngredient> = sqlx::query_as(
        "
        SELECT ri.recipe_id AS recipe_id, i.id AS ingredient_id, i.name AS name,
            i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY i.name
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

/// Full response shape: nested author, tags, parts and the viewer's
/// favorite/cart flags.
pub async fn get_recipe_detail(
    recipe: Recipe,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<RecipeDetail, ApiError> {
    let author = get_profile(recipe.author_id, viewer, pool)
        .await?
        .ok_or_else(|| HttpError::InternalServerError.new("Recipe author is missing"))?;

    let tags = list_recipe_tags(pool, recipe.id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let ingredients = list_recipe_ingredients(pool, recipe.id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(viewer) => (
            is_favorite(recipe.id, viewer, pool).await?,
            is_in_cart(recipe.id, viewer, pool).await?,
        ),
        None => (false, false),
    };

    Ok(RecipeDetail {
        id: recipe.id,
        tags,
        author,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
    })
}

pub async fn fetch_author_recipes(
    author_id: Id,
    limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeShort>, ApiError> {
    let rows: Vec<RecipeShort> = sqlx::query_as(
        "
        SELECT id, name, image, cooking_time
        FROM recipes
        WHERE author_id = $1
        ORDER BY pub_date DESC
        LIMIT $2
    ",
    )
    .bind(author_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(rows)
}

pub async fn count_author_recipes(author_id: Id, pool: &Pool<Postgres>) -> Result<i64, ApiError> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(count.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RecipeIngredientPayload;

    fn payload() -> RecipePayload {
        RecipePayload {
            ingredients: vec![
                RecipeIngredientPayload { id: 1, amount: 100 },
                RecipeIngredientPayload { id: 2, amount: 2 },
            ],
            tags: vec![1],
            image: None,
            name: String::from("Pancakes"),
            text: String::from("Mix and fry."),
            cooking_time: 20,
        }
    }

    #[test]
    fn accepts_well_formed_payload() {
        assert!(validate_recipe_payload(&payload()).is_ok());
    }

    #[test]
    fn rejects_duplicate_ingredients() {
        let mut payload = payload();
        payload.ingredients.push(RecipeIngredientPayload { id: 1, amount: 5 });
        let error = validate_recipe_payload(&payload).unwrap_err();
        assert_eq!(error.code, 400);
    }

    #[test]
    fn rejects_amount_below_minimum() {
        let mut payload = payload();
        payload.ingredients[0].amount = 0;
        assert!(validate_recipe_payload(&payload).is_err());
    }

    #[test]
    fn rejects_cooking_time_out_of_bounds() {
        let mut payload = payload();
        payload.cooking_time = 0;
        assert!(validate_recipe_payload(&payload).is_err());
        payload.cooking_time = MAX_COOKING_TIME + 1;
        assert!(validate_recipe_payload(&payload).is_err());
        payload.cooking_time = MAX_COOKING_TIME;
        assert!(validate_recipe_payload(&payload).is_ok());
    }

    #[test]
    fn rejects_empty_relations() {
        let mut payload = payload();
        payload.tags.clear();
        assert!(validate_recipe_payload(&payload).is_err());

        let mut payload = self::payload();
        payload.ingredients.clear();
        assert!(validate_recipe_payload(&payload).is_err());
    }

    #[test]
    fn image_data_url_must_decode() {
        assert!(validate_image("https://example.com/pancakes.png").is_ok());
        assert!(validate_image("data:image/png;base64,aGVsbG8=").is_ok());
        assert!(validate_image("data:image/png;base64,not-base64!").is_err());
        assert!(validate_image("data:image/png").is_err());
    }
}
