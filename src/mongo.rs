//! MongoDB implementation of [`Store`].

use std::time::Duration;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{self, doc, oid::ObjectId, Bson, Document},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{ClientOptions, IndexOptions},
    Client, Collection, Database, IndexModel,
};
use tracing::{info, warn};

use crate::models::{Book, CartItem, User};
use crate::query::BookQuery;
use crate::store::{ItemList, Store, StoreError, StoreResult, BOOKS, FAVORITES, USERS};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone, Debug)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Connect, ping and make sure the unique indexes exist.
    pub async fn connect(uri: &str, database: &str, timeout: Duration) -> StoreResult<Self> {
        let mut options = ClientOptions::parse(uri).await?;
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);

        let client = Client::with_options(options)?;
        let store = Self {
            db: client.database(database),
        };
        store.ping().await?;
        info!("Connected to MongoDB database '{}'", database);

        store.ensure_indexes().await;
        Ok(store)
    }

    /// Existing duplicate data makes index creation fail; the pre-insert
    /// checks still apply in that case.
    async fn ensure_indexes(&self) {
        let unique = || IndexOptions::builder().unique(true).build();

        let email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(unique())
            .build();
        if let Err(e) = self.users().create_index(email).await {
            warn!("Could not create unique index on {}.email: {}", USERS, e);
        }

        let favorite = IndexModel::builder()
            .keys(doc! { "name": 1, "userEmail": 1 })
            .options(unique())
            .build();
        if let Err(e) = self.items(ItemList::Favorites).create_index(favorite).await {
            warn!(
                "Could not create unique index on {}.(name, userEmail): {}",
                FAVORITES, e
            );
        }
    }

    fn users(&self) -> Collection<User> {
        self.db.collection(USERS)
    }

    fn books(&self) -> Collection<Book> {
        self.db.collection(BOOKS)
    }

    fn items(&self, list: ItemList) -> Collection<CartItem> {
        self.db.collection(list.collection())
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY
    )
}

fn inserted_id(id: Bson) -> StoreResult<ObjectId> {
    id.as_object_id().ok_or(StoreError::MissingId)
}

fn optional(value: Option<&str>) -> Bson {
    value.map_or(Bson::Null, |v| Bson::String(v.to_string()))
}

fn owner_filter(user_email: Option<&str>) -> Document {
    match user_email {
        Some(email) => doc! { "userEmail": email },
        None => Document::new(),
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn ping(&self) -> StoreResult<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn email_taken(&self, email: &str) -> StoreResult<bool> {
        let count = self.users().count_documents(doc! { "email": email }).await?;
        Ok(count > 0)
    }

    async fn insert_user(&self, user: &User) -> StoreResult<ObjectId> {
        match self.users().insert_one(user).await {
            Ok(result) => inserted_id(result.inserted_id),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate(format!(
                "email {}",
                user.email.as_deref().unwrap_or_default()
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> StoreResult<Option<User>> {
        let user = self
            .users()
            .find_one(doc! { "email": email, "password": password })
            .await?;
        Ok(user)
    }

    async fn insert_book(&self, book: &Book) -> StoreResult<ObjectId> {
        let result = self.books().insert_one(book).await?;
        inserted_id(result.inserted_id)
    }

    async fn find_books(&self, query: &BookQuery) -> StoreResult<Vec<Book>> {
        let books = self.books();
        let mut find = books.find(query.filter.to_document()).skip(query.skip);
        if let Some(limit) = query.limit {
            find = find.limit(limit);
        }
        if let Some(order) = query.order {
            find = find.sort(order.to_document());
        }

        let found = find.await?.try_collect().await?;
        Ok(found)
    }

    async fn find_book(&self, id: ObjectId) -> StoreResult<Option<Book>> {
        let book = self.books().find_one(doc! { "_id": id }).await?;
        Ok(book)
    }

    async fn update_book(&self, id: ObjectId, patch: &Book) -> StoreResult<u64> {
        let patch = Book {
            id: None,
            ..patch.clone()
        };
        let set = bson::to_document(&patch)?;

        let result = self
            .books()
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await?;
        Ok(result.matched_count)
    }

    async fn delete_book(&self, id: ObjectId) -> StoreResult<u64> {
        let result = self.books().delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count)
    }

    async fn insert_item(&self, list: ItemList, item: &CartItem) -> StoreResult<ObjectId> {
        match self.items(list).insert_one(item).await {
            Ok(result) => inserted_id(result.inserted_id),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate(format!(
                "{} entry {}",
                list.collection(),
                item.name.as_deref().unwrap_or_default()
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_items(
        &self,
        list: ItemList,
        user_email: Option<&str>,
    ) -> StoreResult<Vec<CartItem>> {
        let items = self
            .items(list)
            .find(owner_filter(user_email))
            .await?
            .try_collect()
            .await?;
        Ok(items)
    }

    async fn find_item_by_name(
        &self,
        list: ItemList,
        name: Option<&str>,
        user_email: Option<&str>,
    ) -> StoreResult<Option<CartItem>> {
        let item = self
            .items(list)
            .find_one(doc! { "name": optional(name), "userEmail": optional(user_email) })
            .await?;
        Ok(item)
    }

    async fn delete_item(&self, list: ItemList, id: ObjectId) -> StoreResult<u64> {
        let result = self.items(list).delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count)
    }
}
