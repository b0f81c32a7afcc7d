use crate::handlers;
use actix_web::{web, Scope};

pub fn config() -> Scope {
    web::scope("/api")
        .route("/health", web::get().to(handlers::health_check))
        .route("/widgets", web::post().to(handlers::mount_widget))
        .route("/widgets/{id}", web::get().to(handlers::widget_state))
        .route("/widgets/{id}", web::delete().to(handlers::unmount_widget))
        .route("/widgets/{id}/input", web::post().to(handlers::widget_input))
        .route("/widgets/{id}/stream", web::get().to(handlers::widget_stream))
}
