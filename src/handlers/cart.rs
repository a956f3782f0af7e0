use axum::{
    extract::{Path, State},
    response::Json,
};
use tracing::{info, instrument};

use super::{parse_object_id, EmailParams, JsonBody, QueryParams};
use crate::error::AppResult;
use crate::models::{CartItem, MessageResponse};
use crate::state::AppState;
use crate::store::ItemList;

#[utoipa::path(
    post,
    path = "/book-cart",
    request_body = CartItem,
    responses(
        (status = 200, description = "Stored cart item with its new id", body = CartItem),
        (status = 400, description = "Malformed body")
    ),
    tag = "Cart"
)]
#[instrument(name = "handler::add_to_cart", skip_all)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    JsonBody(item): JsonBody<CartItem>,
) -> AppResult<Json<CartItem>> {
    let mut item = CartItem { id: None, ..item };
    let id = state.store.insert_item(ItemList::Cart, &item).await?;
    item.id = Some(id);
    info!("Added cart item {}", id);
    Ok(Json(item))
}

#[utoipa::path(
    get,
    path = "/carts",
    responses((status = 200, description = "Every cart item", body = [CartItem])),
    tag = "Cart"
)]
pub async fn list_carts(State(state): State<AppState>) -> AppResult<Json<Vec<CartItem>>> {
    Ok(Json(state.store.find_items(ItemList::Cart, None).await?))
}

#[utoipa::path(
    get,
    path = "/book-cart",
    params(EmailParams),
    responses(
        (status = 200, description = "Cart items of the user", body = [CartItem]),
        (status = 400, description = "Missing email")
    ),
    tag = "Cart"
)]
#[instrument(name = "handler::cart_by_email", skip(state))]
pub async fn cart_by_email(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<EmailParams>,
) -> AppResult<Json<Vec<CartItem>>> {
    let email = params.require()?;
    Ok(Json(
        state.store.find_items(ItemList::Cart, Some(&email)).await?,
    ))
}

/// Reports success whether or not an item was removed.
#[utoipa::path(
    delete,
    path = "/cart/{id}",
    params(("id" = String, Path, description = "Cart item object id")),
    responses(
        (status = 200, description = "Cart item deleted", body = MessageResponse),
        (status = 400, description = "Malformed id")
    ),
    tag = "Cart"
)]
#[instrument(name = "handler::delete_cart_item", skip(state))]
pub async fn delete_cart_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_object_id(&id)?;
    let deleted = state.store.delete_item(ItemList::Cart, id).await?;
    info!("Deleted {} cart item(s) with id {}", deleted, id);
    Ok(Json(MessageResponse::new("Cart item deleted")))
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{send, test_app};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_cart_lifecycle() {
        let app = test_app();
        let item = json!({ "name": "Dune", "price": 9.5, "quantity": 2, "userEmail": "ada@example.com" });

        let (status, created) = send(&app, "POST", "/book-cart", Some(item)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["quantity"], 2);
        let id = created["_id"].as_str().unwrap().to_string();

        send(
            &app,
            "POST",
            "/book-cart",
            Some(json!({ "name": "Emma", "userEmail": "jane@example.com" })),
        )
        .await;

        let (_, all) = send(&app, "GET", "/carts", None).await;
        assert_eq!(all.as_array().unwrap().len(), 2);

        let (status, mine) = send(&app, "GET", "/book-cart?email=ada@example.com", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mine.as_array().unwrap().len(), 1);
        assert_eq!(mine[0]["_id"], id.as_str());

        let (status, _) = send(&app, "DELETE", &format!("/cart/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, mine) = send(&app, "GET", "/book-cart?email=ada@example.com", None).await;
        assert_eq!(mine, json!([]));
    }

    #[tokio::test]
    async fn test_cart_by_email_requires_email() {
        let app = test_app();
        let (status, body) = send(&app, "GET", "/book-cart", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Email query param is required");

        let (status, _) = send(&app, "GET", "/book-cart?email=", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unparseable_query_gets_json_error() {
        let app = test_app();
        let (status, body) = send(&app, "GET", "/book-cart?email=a@x.io&email=b@x.io", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert!(body["error"].as_str().unwrap().contains("duplicate field"));
    }

    #[tokio::test]
    async fn test_deleting_missing_cart_item_still_succeeds() {
        let app = test_app();
        let (status, body) = send(&app, "DELETE", "/cart/65f1c0ffee0ddba11ad0b00c", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Cart item deleted");

        let (status, _) = send(&app, "DELETE", "/cart/garbage", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
