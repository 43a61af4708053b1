//! Authentication: password hashing, token issuance, and request extraction.

pub mod current_user;
pub mod password;
pub mod tokens;

/// Read a named cookie out of a request's Cookie header.
pub fn cookie_value<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    let cookie_str = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((cookie_name, value)) = cookie.split_once('=')
            && cookie_name == name
        {
            return Some(value);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};

    #[test]
    fn test_cookie_value_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("theme=dark; refreshToken=abc.def.ghi; lang=en"),
        );

        assert_eq!(cookie_value(&headers, "refreshToken"), Some("abc.def.ghi"));
        assert_eq!(cookie_value(&headers, "theme"), Some("dark"));
        assert_eq!(cookie_value(&headers, "missing"), None);

        let empty = HeaderMap::new();
        assert_eq!(cookie_value(&empty, "refreshToken"), None);
    }
}
