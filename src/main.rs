use sqlx::postgres::PgPoolOptions;
use warp::Filter;

use recipebook_sdk::error::handle_rejection;
use recipebook_sdk::{routes, Config};

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = Config::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    log::info!("Listening on 0.0.0.0:{}", config.port);

    warp::serve(routes(pool).recover(handle_rejection))
        .run(([0, 0, 0, 0], config.port))
        .await;
}
