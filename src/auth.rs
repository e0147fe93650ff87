//! Bearer token persistence and the login gate.

use crate::api::LifehubApi;
use crate::db::local_storage::{self, ACCESS_TOKEN_KEY};
use crate::error::{AppError, AppResult};
use crate::models::user::CurrentUser;
use reqwest::Url;
use rusqlite::Connection;

pub fn access_token(conn: &Connection) -> AppResult<Option<String>> {
    local_storage::get_item(conn, ACCESS_TOKEN_KEY)
}

/// Accepts either the raw token or the whole `/login/success?token=...`
/// URL the OAuth flow lands on.
pub fn token_from_input(input: &str) -> AppResult<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AppError::Invalid("Token cannot be empty".to_string()));
    }

    match Url::parse(input) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url
            .query_pairs()
            .find(|(key, _)| key == "token")
            .map(|(_, value)| value.into_owned())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Invalid("No token found in URL".to_string())),
        _ => Ok(input.to_string()),
    }
}

pub fn save_token(conn: &Connection, input: &str) -> AppResult<String> {
    let token = token_from_input(input)?;
    local_storage::set_item(conn, ACCESS_TOKEN_KEY, &token)?;
    tracing::info!("Token saved to local storage");
    Ok(token)
}

/// Drops everything the client keeps locally, token included.
pub fn logout(conn: &Connection) -> AppResult<()> {
    let removed = local_storage::clear(conn)?;
    tracing::info!(removed, "Local storage cleared");
    Ok(())
}

/// Asks the backend who we are. Any failure means the user has to log in.
pub fn check_login<A: LifehubApi>(api: &A) -> AppResult<CurrentUser> {
    tracing::debug!("Checking login status");
    match api.current_user() {
        Ok(user) => {
            tracing::debug!("Login verified");
            Ok(user)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login check failed, redirecting");
            Err(AppError::LoginRequired {
                login_url: api.login_url(),
            })
        }
    }
}

/// Clears the stored token and sends the user to the OAuth login page.
pub fn redirect_to_login(conn: &Connection, login_url: &str, open_browser: bool) -> AppResult<()> {
    local_storage::remove_item(conn, ACCESS_TOKEN_KEY)?;
    println!("Login required. Sign in at: {}", login_url);
    println!("Then run `lifehub login <token or callback URL>`.");

    if open_browser {
        if let Err(e) = open::that(login_url) {
            tracing::warn!(error = %e, "Failed to open browser");
        }
    }
    Ok(())
}
