use utoipa::OpenApi;

use crate::handlers::{auth, books, cart, favorites};
use crate::models::{Book, CartItem, Credentials, MessageResponse, User};
use crate::observability::{self, HealthChecks, HealthStatus, MetricsResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        books::create_book,
        books::list_books,
        books::get_book,
        books::update_book,
        books::delete_book,
        books::related_books,
        books::books_by_category,
        books::all_books,
        auth::register,
        auth::login,
        cart::add_to_cart,
        cart::list_carts,
        cart::cart_by_email,
        cart::delete_cart_item,
        favorites::add_favorite,
        favorites::list_favorites,
        favorites::favorites_by_email,
        favorites::delete_favorite,
        observability::health_handler,
        observability::metrics_handler
    ),
    components(schemas(
        Book,
        CartItem,
        User,
        Credentials,
        MessageResponse,
        HealthStatus,
        HealthChecks,
        MetricsResponse
    )),
    tags(
        (name = "Books", description = "Catalog CRUD and listings"),
        (name = "Auth", description = "Registration and login"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Favorites", description = "Wishlist"),
        (name = "Operations", description = "Health and metrics")
    ),
    info(
        title = "Bookstore API",
        description = "Book catalog, cart and favorites backed by MongoDB",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;
