use sqlx::{Pool, Postgres};
use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::Reply;

use crate::{
    authentication::cryptography::hash_password,
    database::actions,
    error::{ApiError, HttpError},
    export::shopping_list::render_shopping_list,
    form::{Form, FormData},
    jwt::{JwtSessionData, SessionData},
    permissions::ActionType,
    schema::{Id, RecipeFilter, RecipePayload, RecipeShort, SubscriptionEntry, TagPayload},
};

pub type Query = Vec<(String, String)>;

fn query_param<'a>(query: &'a Query, key: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

fn query_offset(query: &Query) -> i64 {
    query_param(query, "offset")
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
        .max(0)
}

fn query_flag(query: &Query, key: &str) -> bool {
    matches!(query_param(query, key), Some("1") | Some("true"))
}

/// Anonymous viewers get the unfiltered listing even when they ask for the
/// favorite/cart slices, like the original behaves.
pub fn parse_recipe_filter(query: &Query, session: &Option<JwtSessionData>) -> RecipeFilter {
    let tags = query
        .iter()
        .filter(|(name, _)| name == "tags")
        .map(|(_, value)| value.to_owned())
        .collect();

    RecipeFilter {
        author: query_param(query, "author").and_then(|value| value.parse().ok()),
        tags,
        is_favorited: session.is_some() && query_flag(query, "is_favorited"),
        is_in_shopping_cart: session.is_some() && query_flag(query, "is_in_shopping_cart"),
    }
}

// --- auth ---

pub async fn login(data: FormData, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let form = Form::from_data(data);
    let email = form.get_str("email").map_err(Into::<ApiError>::into)?;
    let password = form.get_str("password").map_err(Into::<ApiError>::into)?;

    let token = actions::login_user(&email, &password, &pool).await?;

    let reply = warp::reply::json(&serde_json::json!({ "auth_token": token }));
    Ok(warp::reply::with_header(
        reply,
        "set-cookie",
        format!("session={token}; Path=/; HttpOnly"),
    ))
}

pub async fn logout(_auth: ()) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::with_status(
        warp::reply::with_header(
            warp::reply(),
            "set-cookie",
            "session=; Path=/; HttpOnly; Max-Age=0",
        ),
        StatusCode::NO_CONTENT,
    ))
}

// --- users ---

pub async fn register(data: FormData, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let form = Form::from_data(data);
    let username = form.get_str("username").map_err(Into::<ApiError>::into)?;
    let email = form.get_str("email").map_err(Into::<ApiError>::into)?;
    let first_name = form.get_str("first_name").map_err(Into::<ApiError>::into)?;
    let last_name = form.get_str("last_name").map_err(Into::<ApiError>::into)?;
    let password = form.get_str("password").map_err(Into::<ApiError>::into)?;

    let hash = hash_password(&password)
        .map_err(|_e| HttpError::InternalServerError.new("Password hashing failed"))?;

    let created =
        actions::register_user(&username, &email, &first_name, &last_name, &hash, &pool).await?;
    if !created {
        return Err(HttpError::InvalidRequest
            .new("User with specified username or email already exists")
            .into());
    }

    let user = actions::get_user_by_email(&pool, &email)
        .await?
        .ok_or_else(|| HttpError::InternalServerError.default())?;
    let profile = actions::get_profile(user.id, None, &pool)
        .await?
        .ok_or_else(|| HttpError::InternalServerError.default())?;

    Ok(warp::reply::with_status(
        warp::reply::json(&profile),
        StatusCode::CREATED,
    ))
}

pub async fn list_users(
    query: Query,
    session: Option<JwtSessionData>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let viewer = session.map(|session| session.user_id);
    let page = actions::fetch_users(viewer, query_offset(&query), &pool).await?;

    Ok(warp::reply::json(&page))
}

pub async fn me(session: JwtSessionData, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let profile = actions::get_profile(session.user_id, Some(session.user_id), &pool)
        .await?
        .ok_or_else(|| HttpError::InvalidSession.default())?;

    Ok(warp::reply::json(&profile))
}

pub async fn get_user(
    id: Id,
    session: Option<JwtSessionData>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let viewer = session.map(|session| session.user_id);
    let profile = actions::get_profile(id, viewer, &pool)
        .await?
        .ok_or_else(|| HttpError::NotFound.new("No user exists with specified id"))?;

    Ok(warp::reply::json(&profile))
}

pub async fn set_password(
    session: JwtSessionData,
    data: FormData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let form = Form::from_data(data);
    let current = form
        .get_str("current_password")
        .map_err(Into::<ApiError>::into)?;
    let new = form.get_str("new_password").map_err(Into::<ApiError>::into)?;

    actions::set_password(session.user_id, &current, &new, &pool).await?;

    Ok(warp::reply::with_status(
        warp::reply(),
        StatusCode::NO_CONTENT,
    ))
}

// --- subscriptions ---

pub async fn subscriptions(
    query: Query,
    session: JwtSessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let recipes_limit = query_param(&query, "recipes_limit").and_then(|value| value.parse().ok());
    let page = actions::fetch_subscriptions(
        session.user_id,
        query_offset(&query),
        recipes_limit,
        &pool,
    )
    .await?;

    Ok(warp::reply::json(&page))
}

pub async fn subscribe(
    author_id: Id,
    session: JwtSessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let session: SessionData = session.into();
    session.authenticate(ActionType::ManageOwnSubscriptions)?;

    actions::subscribe(session.user_id, author_id, &pool).await?;

    let author = actions::get_profile(author_id, Some(session.user_id), &pool)
        .await?
        .ok_or_else(|| HttpError::NotFound.new("No user exists with specified id"))?;
    let recipes = actions::fetch_author_recipes(author_id, None, &pool).await?;
    let recipes_count = actions::count_author_recipes(author_id, &pool).await?;

    let entry = SubscriptionEntry {
        email: author.email,
        id: author.id,
        username: author.username,
        first_name: author.first_name,
        last_name: author.last_name,
        is_subscribed: true,
        recipes,
        recipes_count,
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&entry),
        StatusCode::CREATED,
    ))
}

pub async fn unsubscribe(
    author_id: Id,
    session: JwtSessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let session: SessionData = session.into();
    session.authenticate(ActionType::ManageOwnSubscriptions)?;

    actions::unsubscribe(session.user_id, author_id, &pool).await?;

    Ok(warp::reply::with_status(
        warp::reply(),
        StatusCode::NO_CONTENT,
    ))
}

// --- tags ---

pub async fn list_tags(pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let tags: Vec<TagPayload> = actions::list_tags(&pool)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(warp::reply::json(&tags))
}

pub async fn get_tag(id: Id, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let tag = actions::get_tag(id, &pool)
        .await?
        .ok_or_else(|| HttpError::NotFound.new("No tag exists with specified id"))?;

    Ok(warp::reply::json(&TagPayload::from(tag)))
}

pub async fn create_tag(
    session: JwtSessionData,
    data: FormData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let session: SessionData = session.into();
    session.authenticate(ActionType::ManageTags)?;

    let form = Form::from_data(data);
    let name = form.get_str("name").map_err(Into::<ApiError>::into)?;
    let color = form.get_value("color")?;
    let slug = form.get_str("slug").map_err(Into::<ApiError>::into)?;

    let id = actions::create_tag(&name, color, &slug, &pool).await?;
    let tag = actions::get_tag(id, &pool)
        .await?
        .ok_or_else(|| HttpError::InternalServerError.default())?;

    Ok(warp::reply::with_status(
        warp::reply::json(&TagPayload::from(tag)),
        StatusCode::CREATED,
    ))
}

// --- ingredients ---

pub async fn list_ingredients(query: Query, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let search = query_param(&query, "name").unwrap_or("");
    let page = actions::fetch_ingredients(search, query_offset(&query), &pool).await?;

    Ok(warp::reply::json(&page))
}

pub async fn get_ingredient(id: Id, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let ingredient = actions::get_ingredient(id, &pool)
        .await?
        .ok_or_else(|| HttpError::NotFound.new("No ingredient exists with specified id"))?;

    Ok(warp::reply::json(&ingredient))
}

pub async fn create_ingredient(
    session: JwtSessionData,
    data: FormData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let session: SessionData = session.into();
    session.authenticate(ActionType::ManageIngredients)?;

    let form = Form::from_data(data);
    let name = form.get_str("name").map_err(Into::<ApiError>::into)?;
    let measurement_unit = form
        .get_str("measurement_unit")
        .map_err(Into::<ApiError>::into)?;

    let id = actions::create_ingredient(&name, &measurement_unit, &pool).await?;
    let ingredient = actions::get_ingredient(id, &pool)
        .await?
        .ok_or_else(|| HttpError::InternalServerError.default())?;

    Ok(warp::reply::with_status(
        warp::reply::json(&ingredient),
        StatusCode::CREATED,
    ))
}

// --- recipes ---

pub async fn list_recipes(
    query: Query,
    session: Option<JwtSessionData>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let filter = parse_recipe_filter(&query, &session);
    let viewer = session.map(|session| session.user_id);

    let page = actions::fetch_recipes(&filter, viewer, query_offset(&query), &pool).await?;

    let mut details = Vec::with_capacity(page.rows.len());
    for row in page.rows.iter().cloned() {
        details.push(actions::get_recipe_detail(row.into(), viewer, &pool).await?);
    }

    let page = crate::pagination::PageContext {
        rows: details,
        total_rows: page.total_rows,
        next_offset: page.next_offset,
        prev_offset: page.prev_offset,
        page_list: page.page_list,
        message: page.message,
    };

    Ok(warp::reply::json(&page))
}

pub async fn get_recipe(
    id: Id,
    session: Option<JwtSessionData>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let viewer = session.map(|session| session.user_id);
    let recipe = actions::get_recipe(id, &pool)
        .await?
        .ok_or_else(|| HttpError::NotFound.new("No recipe exists with specified id"))?;

    let detail = actions::get_recipe_detail(recipe, viewer, &pool).await?;

    Ok(warp::reply::json(&detail))
}

pub async fn create_recipe(
    session: JwtSessionData,
    payload: RecipePayload,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let session: SessionData = session.into();
    session.authenticate(ActionType::CreateRecipes)?;

    let id = actions::create_recipe(session.user_id, &payload, &pool).await?;
    let recipe = actions::get_recipe(id, &pool)
        .await?
        .ok_or_else(|| HttpError::InternalServerError.default())?;
    let detail = actions::get_recipe_detail(recipe, Some(session.user_id), &pool).await?;

    Ok(warp::reply::with_status(
        warp::reply::json(&detail),
        StatusCode::CREATED,
    ))
}

pub async fn update_recipe(
    id: Id,
    session: JwtSessionData,
    payload: RecipePayload,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let session: SessionData = session.into();
    let recipe = actions::get_recipe_mut(id, session.clone(), &pool).await?;

    actions::update_recipe(recipe.id, &payload, &pool).await?;

    let recipe = actions::get_recipe(id, &pool)
        .await?
        .ok_or_else(|| HttpError::InternalServerError.default())?;
    let detail = actions::get_recipe_detail(recipe, Some(session.user_id), &pool).await?;

    Ok(warp::reply::json(&detail))
}

pub async fn delete_recipe(
    id: Id,
    session: JwtSessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let recipe = actions::get_recipe_mut(id, session.into(), &pool).await?;

    actions::delete_recipe(recipe.id, &pool).await?;

    Ok(warp::reply::with_status(
        warp::reply(),
        StatusCode::NO_CONTENT,
    ))
}

// --- favorites / cart ---

async fn require_recipe(id: Id, pool: &Pool<Postgres>) -> Result<RecipeShort, ApiError> {
    let recipe = actions::get_recipe(id, pool)
        .await?
        .ok_or_else(|| HttpError::NotFound.new("No recipe exists with specified id"))?;

    Ok(RecipeShort::from(recipe))
}

pub async fn favorite(
    id: Id,
    session: JwtSessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let session: SessionData = session.into();
    session.authenticate(ActionType::ManageOwnFavorites)?;

    let short = require_recipe(id, &pool).await?;
    actions::add_to_favorites(id, session.user_id, &pool).await?;

    Ok(warp::reply::with_status(
        warp::reply::json(&short),
        StatusCode::CREATED,
    ))
}

pub async fn unfavorite(
    id: Id,
    session: JwtSessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let session: SessionData = session.into();
    session.authenticate(ActionType::ManageOwnFavorites)?;

    require_recipe(id, &pool).await?;
    actions::remove_from_favorites(id, session.user_id, &pool).await?;

    Ok(warp::reply::with_status(
        warp::reply(),
        StatusCode::NO_CONTENT,
    ))
}

pub async fn add_cart(
    id: Id,
    session: JwtSessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let session: SessionData = session.into();
    session.authenticate(ActionType::ManageOwnCart)?;

    let short = require_recipe(id, &pool).await?;
    actions::add_to_cart(id, session.user_id, &pool).await?;

    Ok(warp::reply::with_status(
        warp::reply::json(&short),
        StatusCode::CREATED,
    ))
}

pub async fn remove_cart(
    id: Id,
    session: JwtSessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let session: SessionData = session.into();
    session.authenticate(ActionType::ManageOwnCart)?;

    require_recipe(id, &pool).await?;
    actions::remove_from_cart(id, session.user_id, &pool).await?;

    Ok(warp::reply::with_status(
        warp::reply(),
        StatusCode::NO_CONTENT,
    ))
}

pub async fn download_shopping_cart(
    session: JwtSessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let rows = actions::fetch_shopping_list(session.user_id, &pool).await?;
    let bytes = render_shopping_list(&rows)?;

    let response = warp::http::Response::builder()
        .header("content-type", "application/pdf")
        .header("content-disposition", "inline; filename=shopping_list.pdf")
        .body(bytes)
        .map_err(|_e| HttpError::InternalServerError.new("Failed to build response"))?;

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::UserRole;

    fn query(pairs: &[(&str, &str)]) -> Query {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn session() -> Option<JwtSessionData> {
        Some(JwtSessionData::new(1, String::from("cook"), UserRole::User))
    }

    #[test]
    fn offset_defaults_to_zero() {
        assert_eq!(query_offset(&query(&[])), 0);
        assert_eq!(query_offset(&query(&[("offset", "12")])), 12);
        assert_eq!(query_offset(&query(&[("offset", "-3")])), 0);
        assert_eq!(query_offset(&query(&[("offset", "junk")])), 0);
    }

    #[test]
    fn repeated_tags_collect_into_filter() {
        let filter = parse_recipe_filter(
            &query(&[("tags", "breakfast"), ("tags", "dinner")]),
            &None,
        );
        assert_eq!(filter.tags, vec!["breakfast", "dinner"]);
    }

    #[test]
    fn relation_flags_require_a_session() {
        let q = query(&[("is_favorited", "1"), ("is_in_shopping_cart", "true")]);

        let anonymous = parse_recipe_filter(&q, &None);
        assert!(!anonymous.is_favorited);
        assert!(!anonymous.is_in_shopping_cart);

        let authenticated = parse_recipe_filter(&q, &session());
        assert!(authenticated.is_favorited);
        assert!(authenticated.is_in_shopping_cart);
    }

    #[test]
    fn author_filter_parses_ids_only() {
        let filter = parse_recipe_filter(&query(&[("author", "42")]), &None);
        assert_eq!(filter.author, Some(42));

        let filter = parse_recipe_filter(&query(&[("author", "me")]), &None);
        assert_eq!(filter.author, None);
    }
}
