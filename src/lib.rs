mod database {
    pub mod actions;
    pub mod error;
    pub mod form;
    pub mod pagination;
    pub mod schema;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod export {
    pub mod shopping_list;
}
mod server {
    pub mod handlers;
    pub mod routes;
}
mod config;
mod constants;

pub use authentication::*;
pub use config::Config;
pub use constants::*;
pub use database::*;
pub use export::shopping_list::{aggregate_rows, render_shopping_list};
pub use server::routes::routes;
