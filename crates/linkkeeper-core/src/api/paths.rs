//! Backend routes, relative to the configured base URL.

pub const REGISTER: &str = "/users/register";
pub const AUTH_REGISTER: &str = "/auth/register";
pub const LOGIN: &str = "/users/login";
pub const ME: &str = "/users/me";
pub const LOGOUT: &str = "/users/logout";
pub const REFRESH: &str = "/users/refresh";
pub const ACCOUNT: &str = "/users";
pub const UPDATE_PROFILE: &str = "/users/update";

pub const CONTENT_ADD: &str = "/content/add";
pub const CONTENT_LIST: &str = "/content/user-content";
pub const CONTENT_SEARCH: &str = "/content/search";
pub const CONTENT_TAGS: &str = "/content/tags";
pub const SHARE_STATUS: &str = "/content/mylink";
pub const SHARE_TOGGLE: &str = "/content/share";

pub const TAG_ADD: &str = "/tags/add";

/// Endpoints whose 401 answers go straight to the caller. Refreshing on
/// any of them would recurse.
pub const REFRESH_EXEMPT: &[&str] = &[LOGIN, REGISTER, AUTH_REGISTER, REFRESH];

/// `/content/{id}` style path with a percent-encoded segment.
pub fn content_item(id: &str) -> String {
    format!("/content/{}", urlencoding::encode(id))
}

pub fn content_tag(content_id: &str, tag_id: &str) -> String {
    format!(
        "/content/{}/tags/{}",
        urlencoding::encode(content_id),
        urlencoding::encode(tag_id)
    )
}
