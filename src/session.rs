use crate::config::Config;
use actix_session::config::PersistentSession;
use actix_session::storage::CookieSessionStore;
use actix_session::{Session, SessionMiddleware};
use actix_web::cookie::{time, Key, SameSite};

/// Name of the single cookie gating the whole site.
pub const AUTH_COOKIE_NAME: &str = "backontheblog_auth";

/// How long a login lasts.
pub const SESSION_DAYS: i64 = 7;

const AUTHENTICATED: &str = "authenticated";

/// Returns the signing key for session cookies.
/// Must be called once per process; every worker shares the result.
pub fn get_session_key(config: &Config) -> Key {
    match &config.session_key {
        Some(secret) => Key::derive_from(secret),
        None => {
            log::warn!("SESSION_KEY is not set; logins will not survive a restart.");
            Key::generate()
        }
    }
}

/// Cookie session store holding the authenticated flag.
pub fn new_session_middleware(key: Key, secure: bool) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(AUTH_COOKIE_NAME.to_owned())
        .cookie_path("/".to_owned())
        .cookie_http_only(true)
        .cookie_secure(secure)
        .cookie_same_site(SameSite::Lax)
        .session_lifecycle(
            PersistentSession::default().session_ttl(time::Duration::days(SESSION_DAYS)),
        )
        .build()
}

pub fn is_authenticated(session: &Session) -> bool {
    match session.get::<bool>(AUTHENTICATED) {
        Ok(flag) => flag.unwrap_or(false),
        Err(e) => {
            log::warn!("is_authenticated: unreadable session: {}", e);
            false
        }
    }
}

pub fn set_authenticated(session: &Session) -> Result<(), actix_web::Error> {
    session.renew();
    session.insert(AUTHENTICATED, true)?;
    Ok(())
}

/// Compares a submitted password against the site secret.
/// An unconfigured (empty) secret never matches.
pub fn validate_password(config: &Config, password: &str) -> bool {
    !config.site_password.is_empty() && password == config.site_password
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_must_match_exactly() {
        let config = Config {
            site_password: "hunter2".to_owned(),
            ..Default::default()
        };
        assert!(validate_password(&config, "hunter2"));
        assert!(!validate_password(&config, "hunter2 "));
        assert!(!validate_password(&config, "HUNTER2"));
        assert!(!validate_password(&config, ""));
    }

    #[test]
    fn empty_secret_never_matches() {
        let config = Config::default();
        assert!(!validate_password(&config, ""));
        assert!(!validate_password(&config, "anything"));
    }
}
