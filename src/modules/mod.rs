use actix_web::web;

use crate::middleware::{json_error_handler, path_error_handler, query_error_handler};

pub mod arrears;
pub mod fees;
pub mod health;
pub mod schools;
pub mod students;

/// Register extractor configs and every route of the service
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .configure(health::configure)
        .configure(arrears::controllers::configure);
}
