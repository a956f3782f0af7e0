use axum::{
    extract::State,
    response::Json,
};
use tracing::{info, instrument, warn};

use super::{parse_object_id, EmailParams, IdParams, JsonBody, QueryParams};
use crate::error::{AppError, AppResult};
use crate::models::{Favorite, MessageResponse};
use crate::state::AppState;
use crate::store::{ItemList, StoreError};

const ALREADY_IN_WISHLIST: &str = "Book already in wishlist";

/// The (name, userEmail) pair must not already be in the list.
#[utoipa::path(
    post,
    path = "/favorites",
    request_body = Favorite,
    responses(
        (status = 200, description = "Stored favorite with its new id", body = Favorite),
        (status = 400, description = "Malformed body"),
        (status = 409, description = "Book already in wishlist")
    ),
    tag = "Favorites"
)]
#[instrument(name = "handler::add_favorite", skip_all)]
pub async fn add_favorite(
    State(state): State<AppState>,
    JsonBody(favorite): JsonBody<Favorite>,
) -> AppResult<Json<Favorite>> {
    let existing = state
        .store
        .find_item_by_name(
            ItemList::Favorites,
            favorite.name.as_deref(),
            favorite.user_email.as_deref(),
        )
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(ALREADY_IN_WISHLIST.to_string()));
    }

    let mut favorite = Favorite { id: None, ..favorite };
    let id = match state.store.insert_item(ItemList::Favorites, &favorite).await {
        Ok(id) => id,
        Err(StoreError::Duplicate(_)) => {
            return Err(AppError::Conflict(ALREADY_IN_WISHLIST.to_string()))
        }
        Err(e) => return Err(e.into()),
    };
    favorite.id = Some(id);
    info!("Added favorite {}", id);
    Ok(Json(favorite))
}

#[utoipa::path(
    get,
    path = "/favorites",
    responses((status = 200, description = "Every favorite", body = [Favorite])),
    tag = "Favorites"
)]
pub async fn list_favorites(State(state): State<AppState>) -> AppResult<Json<Vec<Favorite>>> {
    Ok(Json(state.store.find_items(ItemList::Favorites, None).await?))
}

#[utoipa::path(
    get,
    path = "/book-favorites",
    params(EmailParams),
    responses(
        (status = 200, description = "Favorites of the user", body = [Favorite]),
        (status = 400, description = "Missing email")
    ),
    tag = "Favorites"
)]
#[instrument(name = "handler::favorites_by_email", skip(state))]
pub async fn favorites_by_email(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<EmailParams>,
) -> AppResult<Json<Vec<Favorite>>> {
    let email = params.require()?;
    Ok(Json(
        state
            .store
            .find_items(ItemList::Favorites, Some(&email))
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/favorites",
    params(IdParams),
    responses(
        (status = 200, description = "Favorite deleted", body = MessageResponse),
        (status = 400, description = "Missing or malformed id"),
        (status = 404, description = "Favorite not found")
    ),
    tag = "Favorites"
)]
#[instrument(name = "handler::delete_favorite", skip(state))]
pub async fn delete_favorite(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<IdParams>,
) -> AppResult<Json<MessageResponse>> {
    let raw = params
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("ID is required".to_string()))?;
    let id = parse_object_id(&raw)?;

    if state.store.delete_item(ItemList::Favorites, id).await? == 0 {
        warn!("No favorite with id {}", id);
        return Err(AppError::NotFound("Favorite not found".to_string()));
    }
    info!("Deleted favorite {}", id);
    Ok(Json(MessageResponse::new("Deleted successfully")))
}
