use serde::de::DeserializeOwned;
use sqlx::{Pool, Postgres};
use warp::{reject::Rejection, Filter, Reply};

use crate::authentication::middleware::{with_auth, with_possible_session, with_session};
use crate::schema::Id;

use super::handlers::{self, Query};

const MAX_BODY_BYTES: u64 = 1024 * 1024 * 8;

fn json_body<T: DeserializeOwned + Send>(
) -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// The full REST surface. Rejection recovery is left to the caller so the
/// tree stays composable in tests.
pub fn routes(
    pool: Pool<Postgres>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let with_pool = warp::any().map(move || pool.clone());

    // auth
    let login = warp::path!("api" / "auth" / "login")
        .and(warp::post())
        .and(json_body())
        .and(with_pool.clone())
        .and_then(handlers::login);

    let logout = warp::path!("api" / "auth" / "logout")
        .and(warp::post())
        .and(with_auth())
        .and_then(handlers::logout);

    // users
    let register = warp::path!("api" / "users")
        .and(warp::post())
        .and(json_body())
        .and(with_pool.clone())
        .and_then(handlers::register);

    let list_users = warp::path!("api" / "users")
        .and(warp::get())
        .and(warp::query::<Query>())
        .and(with_possible_session())
        .and(with_pool.clone())
        .and_then(handlers::list_users);

    let me = warp::path!("api" / "users" / "me")
        .and(warp::get())
        .and(with_session())
        .and(with_pool.clone())
        .and_then(handlers::me);

    let set_password = warp::path!("api" / "users" / "set_password")
        .and(warp::post())
        .and(with_session())
        .and(json_body())
        .and(with_pool.clone())
        .and_then(handlers::set_password);

    let subscriptions = warp::path!("api" / "users" / "subscriptions")
        .and(warp::get())
        .and(warp::query::<Query>())
        .and(with_session())
        .and(with_pool.clone())
        .and_then(handlers::subscriptions);

    let subscribe = warp::path!("api" / "users" / Id / "subscribe")
        .and(warp::post())
        .and(with_session())
        .and(with_pool.clone())
        .and_then(handlers::subscribe);

    let unsubscribe = warp::path!("api" / "users" / Id / "subscribe")
        .and(warp::delete())
        .and(with_session())
        .and(with_pool.clone())
        .and_then(handlers::unsubscribe);

    let get_user = warp::path!("api" / "users" / Id)
        .and(warp::get())
        .and(with_possible_session())
        .and(with_pool.clone())
        .and_then(handlers::get_user);

    // tags
    let list_tags = warp::path!("api" / "tags")
        .and(warp::get())
        .and(with_pool.clone())
        .and_then(handlers::list_tags);

    let get_tag = warp::path!("api" / "tags" / Id)
        .and(warp::get())
        .and(with_pool.clone())
        .and_then(handlers::get_tag);

    let create_tag = warp::path!("api" / "tags")
        .and(warp::post())
        .and(with_session())
        .and(json_body())
        .and(with_pool.clone())
        .and_then(handlers::create_tag);

    // ingredients
    let list_ingredients = warp::path!("api" / "ingredients")
        .and(warp::get())
        .and(warp::query::<Query>())
        .and(with_pool.clone())
        .and_then(handlers::list_ingredients);

    let get_ingredient = warp::path!("api" / "ingredients" / Id)
        .and(warp::get())
        .and(with_pool.clone())
        .and_then(handlers::get_ingredient);

    let create_ingredient = warp::path!("api" / "ingredients")
        .and(warp::post())
        .and(with_session())
        .and(json_body())
        .and(with_pool.clone())
        .and_then(handlers::create_ingredient);

    // recipes
    let download_shopping_cart = warp::path!("api" / "recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(with_session())
        .and(with_pool.clone())
        .and_then(handlers::download_shopping_cart);

    let list_recipes = warp::path!("api" / "recipes")
        .and(warp::get())
        .and(warp::query::<Query>())
        .and(with_possible_session())
        .and(with_pool.clone())
        .and_then(handlers::list_recipes);

    let create_recipe = warp::path!("api" / "recipes")
        .and(warp::post())
        .and(with_session())
        .and(json_body())
        .and(with_pool.clone())
        .and_then(handlers::create_recipe);

    let get_recipe = warp::path!("api" / "recipes" / Id)
        .and(warp::get())
        .and(with_possible_session())
        .and(with_pool.clone())
        .and_then(handlers::get_recipe);

    let update_recipe = warp::path!("api" / "recipes" / Id)
        .and(warp::patch())
        .and(with_session())
        .and(json_body())
        .and(with_pool.clone())
        .and_then(handlers::update_recipe);

    let delete_recipe = warp::path!("api" / "recipes" / Id)
        .and(warp::delete())
        .and(with_session())
        .and(with_pool.clone())
        .and_then(handlers::delete_recipe);

    let favorite = warp::path!("api" / "recipes" / Id / "favorite")
        .and(warp::post())
        .and(with_session())
        .and(with_pool.clone())
        .and_then(handlers::favorite);

    let unfavorite = warp::path!("api" / "recipes" / Id / "favorite")
        .and(warp::delete())
        .and(with_session())
        .and(with_pool.clone())
        .and_then(handlers::unfavorite);

    let add_cart = warp::path!("api" / "recipes" / Id / "shopping_cart")
        .and(warp::post())
        .and(with_session())
        .and(with_pool.clone())
        .and_then(handlers::add_cart);

    let remove_cart = warp::path!("api" / "recipes" / Id / "shopping_cart")
        .and(warp::delete())
        .and(with_session())
        .and(with_pool)
        .and_then(handlers::remove_cart);

    login
        .or(logout)
        .or(register)
        .or(me)
        .or(set_password)
        .or(subscriptions)
        .or(subscribe)
        .or(unsubscribe)
        .or(list_users)
        .or(get_user)
        .or(create_tag)
        .or(list_tags)
        .or(get_tag)
        .or(create_ingredient)
        .or(list_ingredients)
        .or(get_ingredient)
        .or(download_shopping_cart)
        .or(create_recipe)
        .or(list_recipes)
        .or(favorite)
        .or(unfavorite)
        .or(add_cart)
        .or(remove_cart)
        .or(update_recipe)
        .or(delete_recipe)
        .or(get_recipe)
}
