use super::API_PREFIX;
use crate::pagination::PageRequest;

/// Single post route, used for `Location` headers and `_links.self`.
pub fn post(id: i32) -> String {
    format!("{API_PREFIX}/posts/{id}")
}

/// Per-user listing route without a query string.
pub fn user_posts(user_id: i32) -> String {
    format!("{API_PREFIX}/user-{user_id}/posts")
}

/// Global listing route for a given page.
pub fn posts_page(request: PageRequest) -> String {
    format!("{API_PREFIX}/posts{}", page_query(request))
}

/// Per-user listing route for a given page.
pub fn user_posts_page(user_id: i32, request: PageRequest) -> String {
    format!("{}{}", user_posts(user_id), page_query(request))
}

fn page_query(request: PageRequest) -> String {
    format!("?page={}&per_page={}", request.page(), request.per_page())
}
