//! Persistence port used by the handlers.

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use crate::models::{Book, CartItem, User};
use crate::query::BookQuery;

pub const BOOKS: &str = "books";
pub const USERS: &str = "users";
pub const CARTS: &str = "carts";
pub const FAVORITES: &str = "favorites";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("could not encode document: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),

    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("store did not return an object id for the inserted document")]
    MissingId,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The two collections holding [`CartItem`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemList {
    Cart,
    Favorites,
}

impl ItemList {
    pub fn collection(self) -> &'static str {
        match self {
            ItemList::Cart => CARTS,
            ItemList::Favorites => FAVORITES,
        }
    }
}

/// One method per store call a handler makes. Each call is independent;
/// nothing here runs inside a transaction.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;

    async fn email_taken(&self, email: &str) -> StoreResult<bool>;
    /// Fails with [`StoreError::Duplicate`] when the email is already registered.
    async fn insert_user(&self, user: &User) -> StoreResult<ObjectId>;
    async fn find_user_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> StoreResult<Option<User>>;

    async fn insert_book(&self, book: &Book) -> StoreResult<ObjectId>;
    async fn find_books(&self, query: &BookQuery) -> StoreResult<Vec<Book>>;
    async fn find_book(&self, id: ObjectId) -> StoreResult<Option<Book>>;
    /// Returns the number of matched documents.
    async fn update_book(&self, id: ObjectId, patch: &Book) -> StoreResult<u64>;
    /// Returns the number of deleted documents.
    async fn delete_book(&self, id: ObjectId) -> StoreResult<u64>;

    /// Fails with [`StoreError::Duplicate`] when a favorite with the same
    /// name and owner already exists.
    async fn insert_item(&self, list: ItemList, item: &CartItem) -> StoreResult<ObjectId>;
    /// All items, or only those owned by `user_email`.
    async fn find_items(&self, list: ItemList, user_email: Option<&str>)
        -> StoreResult<Vec<CartItem>>;
    async fn find_item_by_name(
        &self,
        list: ItemList,
        name: Option<&str>,
        user_email: Option<&str>,
    ) -> StoreResult<Option<CartItem>>;
    async fn delete_item(&self, list: ItemList, id: ObjectId) -> StoreResult<u64>;
}
