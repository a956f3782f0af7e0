use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_ROLE: &str = "user";

/// JSON carries the id as a 24-char hex string, BSON as a native ObjectId.
/// Deserialization accepts either form.
pub(crate) mod object_id_hex {
    use mongodb::bson::{oid::ObjectId, Bson};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(id: &Option<ObjectId>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match id {
            Some(id) => serializer.serialize_some(&id.to_hex()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<ObjectId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Bson::deserialize(deserializer)? {
            Bson::ObjectId(oid) => Ok(Some(oid)),
            Bson::String(hex) if hex.is_empty() => Ok(None),
            Bson::String(hex) => ObjectId::parse_str(&hex).map(Some).map_err(de::Error::custom),
            Bson::Null => Ok(None),
            other => Err(de::Error::custom(format!(
                "expected an object id, found {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Store-assigned identifier
    #[serde(
        rename = "_id",
        default,
        with = "object_id_hex",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>, example = "65f1c0ffee0ddba11ad0b00c")]
    pub id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Stored as received; never returned by login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Defaults to "user" on registration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl User {
    /// Fill in the role a fresh registration gets when none was supplied.
    pub fn with_default_role(mut self) -> Self {
        if self.role.as_deref().map_or(true, str::is_empty) {
            self.role = Some(DEFAULT_ROLE.to_string());
        }
        self
    }

    pub fn without_password(mut self) -> Self {
        self.password = None;
        self
    }
}

/// Email/password pair submitted to `/login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Store-assigned identifier
    #[serde(
        rename = "_id",
        default,
        with = "object_id_hex",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>, example = "65f1c0ffee0ddba11ad0b00c")]
    pub id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication: Option<String>,
    /// Category used by listing filters and related lookups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    /// Free text, compared lexically (e.g. "2023-05-01")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Book {
    /// True when a patch would not touch any field.
    pub fn is_empty_patch(&self) -> bool {
        Book {
            id: None,
            ..self.clone()
        } == Book::default()
    }

    /// Overwrite every field that is present in `patch`.
    pub fn apply_patch(&mut self, patch: Book) {
        macro_rules! set {
            ($($field:ident),*) => {
                $(if patch.$field.is_some() { self.$field = patch.$field; })*
            };
        }
        set!(
            name,
            author,
            publication,
            product_type,
            publish_date,
            price,
            old_price,
            stock,
            description,
            image_urls,
            tags
        );
    }
}

/// A book placed in a user's cart. Favorites share the same shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(
        rename = "_id",
        default,
        with = "object_id_hex",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>, example = "65f1c0ffee0ddba11ad0b00c")]
    pub id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_urls: Option<Vec<String>>,
    /// Owner of the entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

pub type Favorite = CartItem;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson;
    use serde_json::json;

    #[test]
    fn test_book_json_uses_camel_case_and_hex_id() {
        let id = ObjectId::parse_str("65f1c0ffee0ddba11ad0b00c").unwrap();
        let book = Book {
            id: Some(id),
            name: Some("Dune".into()),
            product_type: Some("Fiction".into()),
            old_price: Some(12.5),
            image_urls: Some(vec!["a.png".into()]),
            ..Default::default()
        };

        let value = serde_json::to_value(&book).unwrap();
        assert_eq!(value["_id"], "65f1c0ffee0ddba11ad0b00c");
        assert_eq!(value["productType"], "Fiction");
        assert_eq!(value["oldPrice"], 12.5);
        assert_eq!(value["imageUrls"], json!(["a.png"]));
        assert!(value.get("author").is_none());
    }

    #[test]
    fn test_book_reads_native_object_id_from_bson() {
        let id = ObjectId::new();
        let document = bson::doc! { "_id": id, "name": "Dune", "stock": 3_i32 };
        let book: Book = bson::from_document(document).unwrap();
        assert_eq!(book.id, Some(id));
        assert_eq!(book.stock, Some(3));
    }

    #[test]
    fn test_malformed_id_in_body_is_rejected() {
        let result: Result<CartItem, _> = serde_json::from_value(json!({ "_id": "nope" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_default_role_only_when_missing() {
        let user = User::default().with_default_role();
        assert_eq!(user.role.as_deref(), Some("user"));

        let admin = User {
            role: Some("admin".into()),
            ..Default::default()
        }
        .with_default_role();
        assert_eq!(admin.role.as_deref(), Some("admin"));
    }

    #[test]
    fn test_apply_patch_keeps_absent_fields() {
        let mut book = Book {
            name: Some("Old".into()),
            price: Some(10.0),
            ..Default::default()
        };
        book.apply_patch(Book {
            price: Some(8.0),
            ..Default::default()
        });
        assert_eq!(book.name.as_deref(), Some("Old"));
        assert_eq!(book.price, Some(8.0));
        assert!(Book::default().is_empty_patch());
    }
}
