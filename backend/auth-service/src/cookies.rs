/// Cookie handling for the token pair.
///
/// Access token rides on every request (`Path=/`); the refresh token is
/// scoped down to the refresh endpoint so it never leaves the client on
/// any other call. In secure mode cookies are `SameSite=None; Secure`
/// for cross-site frontends, otherwise `SameSite=Strict` for local
/// development over plain http.
use axum::http::header::{HeaderMap, HeaderValue, COOKIE, SET_COOKIE};

use crate::security::jwt::{ACCESS_TOKEN_TTL_MINUTES, REFRESH_TOKEN_TTL_DAYS};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";
pub const REFRESH_COOKIE_PATH: &str = "/api/v1/auth/refresh";

fn attributes(secure: bool) -> &'static str {
    if secure {
        "HttpOnly; SameSite=None; Secure"
    } else {
        "HttpOnly; SameSite=Strict"
    }
}

fn access_cookie(value: &str, max_age: i64, secure: bool) -> String {
    format!(
        "{}={}; Path=/; Max-Age={}; {}",
        ACCESS_TOKEN_COOKIE,
        value,
        max_age,
        attributes(secure)
    )
}

fn refresh_cookie(value: &str, max_age: i64, secure: bool) -> String {
    format!(
        "{}={}; Path={}; Max-Age={}; {}",
        REFRESH_TOKEN_COOKIE,
        value,
        REFRESH_COOKIE_PATH,
        max_age,
        attributes(secure)
    )
}

fn append(headers: &mut HeaderMap, cookie: String) {
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.append(SET_COOKIE, value);
    }
}

/// Set both token cookies after login, registration, or OAuth callback.
pub fn set_auth_cookies(
    headers: &mut HeaderMap,
    access_token: &str,
    refresh_token: &str,
    secure: bool,
) {
    append(
        headers,
        access_cookie(access_token, ACCESS_TOKEN_TTL_MINUTES * 60, secure),
    );
    append(
        headers,
        refresh_cookie(refresh_token, REFRESH_TOKEN_TTL_DAYS * 24 * 3600, secure),
    );
}

pub fn set_access_cookie(headers: &mut HeaderMap, access_token: &str, secure: bool) {
    append(
        headers,
        access_cookie(access_token, ACCESS_TOKEN_TTL_MINUTES * 60, secure),
    );
}

pub fn set_refresh_cookie(headers: &mut HeaderMap, refresh_token: &str, secure: bool) {
    append(
        headers,
        refresh_cookie(refresh_token, REFRESH_TOKEN_TTL_DAYS * 24 * 3600, secure),
    );
}

/// Expire both token cookies on logout, refresh failure, or password
/// reset.
pub fn clear_auth_cookies(headers: &mut HeaderMap, secure: bool) {
    append(headers, access_cookie("", 0, secure));
    append(headers, refresh_cookie("", 0, secure));
}

/// Pull one cookie's value out of the request `Cookie` header.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name && !value.is_empty()).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_auth_cookies_scopes_and_flags() {
        let mut headers = HeaderMap::new();
        set_auth_cookies(&mut headers, "acc", "ref", false);

        let cookies: Vec<&str> = headers
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].starts_with("accessToken=acc; Path=/; Max-Age=900;"));
        assert!(cookies[1].starts_with("refreshToken=ref; Path=/api/v1/auth/refresh; Max-Age=2592000;"));
        assert!(cookies.iter().all(|c| c.contains("HttpOnly")));
        assert!(cookies.iter().all(|c| c.contains("SameSite=Strict")));
    }

    #[test]
    fn test_secure_mode_uses_samesite_none() {
        let mut headers = HeaderMap::new();
        set_auth_cookies(&mut headers, "acc", "ref", true);

        for value in headers.get_all(SET_COOKIE) {
            let cookie = value.to_str().unwrap();
            assert!(cookie.contains("SameSite=None"));
            assert!(cookie.contains("Secure"));
        }
    }

    #[test]
    fn test_clear_auth_cookies_expires_both() {
        let mut headers = HeaderMap::new();
        clear_auth_cookies(&mut headers, false);

        let cookies: Vec<&str> = headers
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert!(cookies[0].starts_with("accessToken=; Path=/; Max-Age=0;"));
        assert!(cookies[1].contains("Max-Age=0"));
    }

    #[test]
    fn test_extract_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("foo=1; accessToken=abc.def.ghi; bar=2"),
        );

        assert_eq!(
            extract_cookie(&headers, ACCESS_TOKEN_COOKIE).as_deref(),
            Some("abc.def.ghi")
        );
        assert_eq!(extract_cookie(&headers, REFRESH_TOKEN_COOKIE), None);
    }

    #[test]
    fn test_extract_cookie_ignores_empty_value() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("accessToken="));
        assert_eq!(extract_cookie(&headers, ACCESS_TOKEN_COOKIE), None);
    }
}
