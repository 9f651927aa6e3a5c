use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use tracing::warn;

use crate::config::Environment;

pub const SESSION_COOKIE_NAME: &str = "session";

/// Transport attributes for the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookiePolicy {
    pub secure: bool,
    pub same_site: &'static str,
    pub max_age_secs: i64,
}

impl CookiePolicy {
    pub fn for_environment(env: Environment, max_age_secs: i64) -> Self {
        // SameSite is only relaxed outside production.
        if env.is_production() {
            Self {
                secure: true,
                same_site: "Strict",
                max_age_secs,
            }
        } else {
            Self {
                secure: false,
                same_site: "Lax",
                max_age_secs,
            }
        }
    }

    /// Renders the `Set-Cookie` value. An empty token yields a clearing cookie.
    pub fn render(&self, token: &str) -> String {
        let max_age = if token.is_empty() { 0 } else { self.max_age_secs };
        let mut cookie = format!(
            "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite={}; Max-Age={max_age}",
            self.same_site
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Appends the session cookie to `headers`; pass `""` to log the client out.
pub fn attach_session_cookie(headers: &mut HeaderMap, policy: &CookiePolicy, token: &str) {
    match HeaderValue::from_str(&policy.render(token)) {
        Ok(value) => {
            headers.append(SET_COOKIE, value);
        }
        Err(e) => warn!(error = %e, "session cookie is not a valid header value"),
    }
}

/// Session token carried by the request's cookies, if any.
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let key = parts.next().unwrap_or_default().trim();
            let val = parts.next().unwrap_or_default().trim();
            if key == SESSION_COOKIE_NAME && !val.is_empty() {
                return Some(val.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn production_cookie_is_strict_and_secure() {
        let policy = CookiePolicy::for_environment(Environment::Production, 604800);
        let cookie = policy.render("abc");
        assert_eq!(
            cookie,
            "session=abc; Path=/; HttpOnly; SameSite=Strict; Max-Age=604800; Secure"
        );
    }

    #[test]
    fn development_cookie_is_relaxed() {
        let policy = CookiePolicy::for_environment(Environment::Development, 604800);
        let cookie = policy.render("abc");
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn empty_token_clears() {
        let policy = CookiePolicy::for_environment(Environment::Production, 604800);
        let mut headers = HeaderMap::new();
        attach_session_cookie(&mut headers, &policy, "");
        let value = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(value.starts_with("session=;"));
        assert!(value.contains("Max-Age=0"));
        assert!(value.contains("HttpOnly"));
    }

    #[test]
    fn reads_token_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; session=tok123; lang=en"));
        assert_eq!(extract_session_token(&headers).as_deref(), Some("tok123"));
    }

    #[test]
    fn empty_cookie_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("session="));
        assert_eq!(extract_session_token(&headers), None);
        assert_eq!(extract_session_token(&HeaderMap::new()), None);
    }
}
