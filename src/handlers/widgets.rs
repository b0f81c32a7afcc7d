use actix_web::{web, HttpResponse, Result};
use bytes::Bytes;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{InputEvent, WidgetResponse};
use crate::AppState;

pub async fn mount_widget(state: web::Data<AppState>) -> Result<HttpResponse> {
    let (id, widget) = state.registry.mount().await;
    Ok(HttpResponse::Created().json(WidgetResponse {
        id,
        state: widget.snapshot(),
    }))
}

pub async fn widget_state(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let widget = state
        .registry
        .get(&id)
        .await
        .ok_or(ApiError::WidgetNotFound(id))?;

    Ok(HttpResponse::Ok().json(WidgetResponse {
        id,
        state: widget.snapshot(),
    }))
}

/// `fetchResults` over HTTP: one call per change of the search field.
pub async fn widget_input(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    event: web::Json<InputEvent>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let widget = state
        .registry
        .get(&id)
        .await
        .ok_or(ApiError::WidgetNotFound(id))?;

    widget.fetch_results(&event);

    Ok(HttpResponse::Accepted().json(WidgetResponse {
        id,
        state: widget.snapshot(),
    }))
}

/// Streams the widget state as NDJSON, one line per change, until it is unmounted.
pub async fn widget_stream(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let mut updates = state
        .registry
        .get(&id)
        .await
        .ok_or(ApiError::WidgetNotFound(id))?
        .subscribe();

    let (tx, rx) = mpsc::channel::<Bytes>(32);
    tokio::spawn(async move {
        loop {
            let snapshot = updates.borrow_and_update().clone();
            let line = match serde_json::to_string(&snapshot) {
                Ok(json) => format!("{}\n", json),
                Err(e) => {
                    tracing::error!("Failed to encode widget state: {:?}", e);
                    return;
                }
            };
            if tx.send(Bytes::from(line)).await.is_err() {
                return;
            }
            if updates.changed().await.is_err() {
                return;
            }
        }
    });

    let stream = ReceiverStream::new(rx).map(Ok::<Bytes, std::io::Error>);
    Ok(HttpResponse::Ok()
        .insert_header((actix_web::http::header::CONTENT_TYPE, "application/x-ndjson"))
        .streaming(stream))
}

pub async fn unmount_widget(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    if !state.registry.unmount(&id).await {
        return Err(ApiError::WidgetNotFound(id).into());
    }
    Ok(HttpResponse::NoContent().finish())
}
