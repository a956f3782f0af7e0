//! One handler per endpoint: decode, build the filter, one store call, encode.

pub mod auth;
pub mod books;
pub mod cart;
pub mod favorites;

use axum::extract::{FromRequest, FromRequestParts};
use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::AppError;

/// `Json` whose rejections (bad syntax, wrong shape, missing content type)
/// all surface as [`AppError::BadRequest`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// `Query` counterpart of [`JsonBody`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmailParams {
    /// Owner email, required
    pub email: Option<String>,
}

impl EmailParams {
    pub fn require(self) -> Result<String, AppError> {
        self.email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::BadRequest("Email query param is required".to_string()))
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IdParams {
    /// 24-hex-character object id, required
    pub id: Option<String>,
}

pub fn parse_object_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid ID: {raw}")))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use mongodb::bson::oid::ObjectId;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::memory::MemoryStore;
    use crate::models::{Book, CartItem, User};
    use crate::query::BookQuery;
    use crate::routes::create_router;
    use crate::state::AppState;
    use crate::store::{ItemList, Store, StoreError, StoreResult};

    pub fn test_app() -> Router {
        test_app_with(Arc::new(MemoryStore::new()), AppConfig::default())
    }

    pub fn test_app_with(store: Arc<dyn Store>, config: AppConfig) -> Router {
        create_router(AppState::new(store, config))
    }

    /// Every call hangs for `delay` and then fails, like a driver waiting out
    /// server selection against a database that went away.
    pub struct StalledStore {
        pub delay: Duration,
    }

    impl StalledStore {
        async fn stall<T>(&self) -> StoreResult<T> {
            tokio::time::sleep(self.delay).await;
            let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "server selection timed out");
            Err(StoreError::Database(io.into()))
        }
    }

    #[async_trait]
    impl Store for StalledStore {
        async fn ping(&self) -> StoreResult<()> {
            self.stall().await
        }

        async fn email_taken(&self, _email: &str) -> StoreResult<bool> {
            self.stall().await
        }

        async fn insert_user(&self, _user: &User) -> StoreResult<ObjectId> {
            self.stall().await
        }

        async fn find_user_by_credentials(
            &self,
            _email: &str,
            _password: &str,
        ) -> StoreResult<Option<User>> {
            self.stall().await
        }

        async fn insert_book(&self, _book: &Book) -> StoreResult<ObjectId> {
            self.stall().await
        }

        async fn find_books(&self, _query: &BookQuery) -> StoreResult<Vec<Book>> {
            self.stall().await
        }

        async fn find_book(&self, _id: ObjectId) -> StoreResult<Option<Book>> {
            self.stall().await
        }

        async fn update_book(&self, _id: ObjectId, _patch: &Book) -> StoreResult<u64> {
            self.stall().await
        }

        async fn delete_book(&self, _id: ObjectId) -> StoreResult<u64> {
            self.stall().await
        }

        async fn insert_item(&self, _list: ItemList, _item: &CartItem) -> StoreResult<ObjectId> {
            self.stall().await
        }

        async fn find_items(
            &self,
            _list: ItemList,
            _user_email: Option<&str>,
        ) -> StoreResult<Vec<CartItem>> {
            self.stall().await
        }

        async fn find_item_by_name(
            &self,
            _list: ItemList,
            _name: Option<&str>,
            _user_email: Option<&str>,
        ) -> StoreResult<Option<CartItem>> {
            self.stall().await
        }

        async fn delete_item(&self, _list: ItemList, _id: ObjectId) -> StoreResult<u64> {
            self.stall().await
        }
    }

    pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().uri(uri).method(method);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(serde_json::to_string(&json).unwrap())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}
