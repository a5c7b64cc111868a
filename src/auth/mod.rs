//! User accounts, password hashing and cookie based authentication.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod redirect;
mod register;
mod token;
mod user;

pub use cookie::{
    DEFAULT_COOKIE_DURATION, REMEMBER_ME_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie,
};
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{AuthState, auth_guard, auth_guard_hx};
pub use password::{PasswordHash, ValidatedPassword};
pub use redirect::normalize_redirect_url;
pub use register::{get_register_page, register_user};
pub use user::{
    User, UserID, count_users, create_user, create_user_table, get_user_by_email, get_user_by_id,
    update_password,
};

#[cfg(test)]
pub use cookie::COOKIE_TOKEN;
