use crate::{
    authentication::{
        cryptography::{hash_password, verify_password},
        jwt::generate_jwt_session,
    },
    constants::USER_COUNT_PER_PAGE,
    error::{ApiError, HttpError, QueryError},
    pagination::PageContext,
    schema::{Id, User, UserListRow, UserProfile},
};

use sqlx::{Pool, Postgres};

use super::follows::is_subscribed;

pub async fn get_user_by_email(
    pool: &Pool<Postgres>,
    email: &str,
) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

pub async fn get_user_by_id(
    pool: &Pool<Postgres>,
    user_id: i32,
) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(row)
}

/// Creates a user row. `password` must already be the argon2 hash. The role
/// always starts out as `user`; promotion is out of band.
pub async fn register_user(
    username: &str,
    email: &str,
    first_name: &str,
    last_name: &str,
    password: &str,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let query = sqlx::query(
        "
        INSERT INTO users (username, email, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT DO NOTHING RETURNING *;
    ",
    )
    .bind(username)
    .bind(email)
    .bind(first_name)
    .bind(last_name)
    .bind(password)
    .execute(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    Ok(query.rows_affected() > 0)
}

pub async fn login_user(
    email: &str,
    password: &str,
    pool: &Pool<Postgres>,
) -> Result<String, ApiError> {
    let user = get_user_by_email(pool, email).await?;
    let user = match user {
        Some(user) => user,
        None => return Err(HttpError::InvalidRequest.new("Invalid credentials")),
    };

    let authenticated = verify_password(password, &user.password)
        .map_err(|_e| HttpError::InternalServerError.new("Password verification failed"))?;
    if !authenticated {
        return Err(HttpError::InvalidRequest.new("Invalid credentials"));
    }

    let session = generate_jwt_session(&user);

    Ok(session)
}

pub async fn set_password(
    user_id: Id,
    current_password: &str,
    new_password: &str,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let user = get_user_by_id(pool, user_id).await?;
    let user = match user {
        Some(user) => user,
        None => return Err(HttpError::InvalidRequest.new("No user exists with specified id")),
    };

    let authenticated = verify_password(current_password, &user.password)
        .map_err(|_e| HttpError::InternalServerError.new("Password verification failed"))?;
    if !authenticated {
        return Err(HttpError::InvalidRequest.new("Current password does not match"));
    }

    let hash = hash_password(new_password)
        .map_err(|_e| HttpError::InternalServerError.new("Password hashing failed"))?;

    sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
        .bind(hash)
        .bind(user_id)
        .execute(&*pool)
        .await
        .map_err(|e| QueryError::from(e).into())?;

    Ok(())
}

pub async fn fetch_users(
    viewer: Option<Id>,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<UserProfile>, ApiError> {
    let rows: Vec<UserListRow> = sqlx::query_as(
        "
        SELECT u.id, u.username, u.email, u.first_name, u.last_name,
            EXISTS (SELECT 1 FROM follows f WHERE f.author_id = u.id AND f.user_id = $1) AS is_subscribed,
            COUNT(*) OVER() AS count
        FROM users u
        ORDER BY u.id
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(viewer)
    .bind(USER_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(&*pool)
    .await
    .map_err(|e| QueryError::from(e).into())?;

    let total_count = rows.first().map(|u| u.count).unwrap_or(0);
    let rows: Vec<UserProfile> = rows.into_iter().map(UserProfile::from).collect();
    let page = PageContext::from_rows(rows, total_count, USER_COUNT_PER_PAGE, offset);

    Ok(page)
}

pub async fn get_profile(
    user_id: Id,
    viewer: Option<Id>,
    pool: &Pool<Postgres>,
) -> Result<Option<UserProfile>, ApiError> {
    let user = match get_user_by_id(pool, user_id).await? {
        Some(user) => user,
        None => return Ok(None),
    };

    let subscribed = match viewer {
        Some(viewer) => is_subscribed(viewer, user.id, pool).await?,
        None => false,
    };

    Ok(Some(UserProfile {
        email: user.email,
        id: user.id,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        is_subscribed: subscribed,
    }))
}
