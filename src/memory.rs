//! In-process [`Store`] kept in insertion order. Used by the test suite and
//! by `STORE_BACKEND=memory` for running without a database.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use crate::models::{Book, CartItem, User};
use crate::query::{BookQuery, PriceOrder};
use crate::store::{ItemList, Store, StoreError, StoreResult};

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    books: RwLock<Vec<Book>>,
    items: RwLock<HashMap<ItemList, Vec<CartItem>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Missing prices sort first, like BSON null.
fn compare_price(a: &Book, b: &Book) -> Ordering {
    match (a.price, b.price) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn email_taken(&self, email: &str) -> StoreResult<bool> {
        let users = self.users.read().await;
        Ok(users.iter().any(|u| u.email.as_deref() == Some(email)))
    }

    async fn insert_user(&self, user: &User) -> StoreResult<ObjectId> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(format!(
                "email {}",
                user.email.as_deref().unwrap_or_default()
            )));
        }
        let id = ObjectId::new();
        users.push(User {
            id: Some(id),
            ..user.clone()
        });
        Ok(id)
    }

    async fn find_user_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|u| u.email.as_deref() == Some(email) && u.password.as_deref() == Some(password))
            .cloned())
    }

    async fn insert_book(&self, book: &Book) -> StoreResult<ObjectId> {
        let id = ObjectId::new();
        self.books.write().await.push(Book {
            id: Some(id),
            ..book.clone()
        });
        Ok(id)
    }

    async fn find_books(&self, query: &BookQuery) -> StoreResult<Vec<Book>> {
        let books = self.books.read().await;
        let mut matched: Vec<Book> = books
            .iter()
            .filter(|book| query.filter.matches(book))
            .cloned()
            .collect();

        match query.order {
            Some(PriceOrder::Ascending) => matched.sort_by(compare_price),
            Some(PriceOrder::Descending) => matched.sort_by(|a, b| compare_price(b, a)),
            None => {}
        }

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let take = query
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l.unsigned_abs()).unwrap_or(usize::MAX));
        Ok(matched.into_iter().skip(skip).take(take).collect())
    }

    async fn find_book(&self, id: ObjectId) -> StoreResult<Option<Book>> {
        let books = self.books.read().await;
        Ok(books.iter().find(|b| b.id == Some(id)).cloned())
    }

    async fn update_book(&self, id: ObjectId, patch: &Book) -> StoreResult<u64> {
        let mut books = self.books.write().await;
        match books.iter_mut().find(|b| b.id == Some(id)) {
            Some(book) => {
                book.apply_patch(patch.clone());
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_book(&self, id: ObjectId) -> StoreResult<u64> {
        let mut books = self.books.write().await;
        let before = books.len();
        books.retain(|b| b.id != Some(id));
        Ok((before - books.len()) as u64)
    }

    async fn insert_item(&self, list: ItemList, item: &CartItem) -> StoreResult<ObjectId> {
        let mut items = self.items.write().await;
        let entries = items.entry(list).or_default();
        if list == ItemList::Favorites
            && entries
                .iter()
                .any(|e| e.name == item.name && e.user_email == item.user_email)
        {
            return Err(StoreError::Duplicate(format!(
                "{} entry {}",
                list.collection(),
                item.name.as_deref().unwrap_or_default()
            )));
        }
        let id = ObjectId::new();
        entries.push(CartItem {
            id: Some(id),
            ..item.clone()
        });
        Ok(id)
    }

    async fn find_items(
        &self,
        list: ItemList,
        user_email: Option<&str>,
    ) -> StoreResult<Vec<CartItem>> {
        let items = self.items.read().await;
        Ok(items
            .get(&list)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| user_email.map_or(true, |email| e.user_email.as_deref() == Some(email)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_item_by_name(
        &self,
        list: ItemList,
        name: Option<&str>,
        user_email: Option<&str>,
    ) -> StoreResult<Option<CartItem>> {
        let items = self.items.read().await;
        Ok(items.get(&list).and_then(|entries| {
            entries
                .iter()
                .find(|e| e.name.as_deref() == name && e.user_email.as_deref() == user_email)
                .cloned()
        }))
    }

    async fn delete_item(&self, list: ItemList, id: ObjectId) -> StoreResult<u64> {
        let mut items = self.items.write().await;
        let Some(entries) = items.get_mut(&list) else {
            return Ok(0);
        };
        let before = entries.len();
        entries.retain(|e| e.id != Some(id));
        Ok((before - entries.len()) as u64)
    }
}
