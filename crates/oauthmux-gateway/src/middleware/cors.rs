//! CORS layer built from a server's declarative CORS policy
//!
//! Credentials are always allowed. Because browsers reject a literal `*`
//! together with credentials, wildcards are answered by mirroring the
//! request instead.

use http::{HeaderName, HeaderValue, Method};
use oauthmux_core::CorsMeta;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer, ExposeHeaders};
use tracing::warn;

const WILDCARD: &str = "*";

/// Methods allowed when the policy lists none
const DEFAULT_METHODS: [Method; 3] = [Method::GET, Method::POST, Method::HEAD];

/// Headers allowed when the policy lists none
const DEFAULT_HEADERS: [&str; 4] = ["origin", "accept", "content-type", "x-requested-with"];

/// Build the CORS layer for a server
pub fn cors_layer(meta: &CorsMeta) -> CorsLayer {
    CorsLayer::new()
        .allow_credentials(true)
        .allow_origin(allow_origin(&meta.domains))
        .allow_methods(allow_methods(&meta.methods))
        .allow_headers(allow_headers(&meta.request_headers))
        .expose_headers(expose_headers(&meta.exposed_headers))
}

fn allow_origin(domains: &[String]) -> AllowOrigin {
    if domains.is_empty() || domains.iter().any(|d| d == WILDCARD) {
        return AllowOrigin::mirror_request();
    }

    let patterns: Vec<OriginPattern> = domains.iter().map(|d| OriginPattern::new(d)).collect();
    AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        origin
            .to_str()
            .map(|o| patterns.iter().any(|p| p.matches(o)))
            .unwrap_or(false)
    })
}

fn allow_methods(methods: &[String]) -> AllowMethods {
    if methods.is_empty() {
        return AllowMethods::list(DEFAULT_METHODS);
    }
    if methods.iter().any(|m| m == WILDCARD) {
        return AllowMethods::mirror_request();
    }

    let parsed: Vec<Method> = methods
        .iter()
        .filter_map(|m| match Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes()) {
            Ok(method) => Some(method),
            Err(_) => {
                warn!("[CORS] Ignoring invalid method '{}'", m);
                None
            }
        })
        .collect();
    AllowMethods::list(parsed)
}

fn allow_headers(headers: &[String]) -> AllowHeaders {
    if headers.is_empty() {
        return AllowHeaders::list(DEFAULT_HEADERS.map(HeaderName::from_static));
    }
    if headers.iter().any(|h| h == WILDCARD) {
        return AllowHeaders::mirror_request();
    }
    AllowHeaders::list(parse_header_names(headers))
}

fn expose_headers(headers: &[String]) -> ExposeHeaders {
    if headers.iter().any(|h| h == WILDCARD) {
        warn!("[CORS] '*' cannot be exposed with credentials, ignoring");
    }
    let explicit: Vec<String> = headers.iter().filter(|h| *h != WILDCARD).cloned().collect();
    ExposeHeaders::list(parse_header_names(&explicit))
}

fn parse_header_names(headers: &[String]) -> Vec<HeaderName> {
    headers
        .iter()
        .filter_map(|h| match HeaderName::from_bytes(h.trim().to_ascii_lowercase().as_bytes()) {
            Ok(name) => Some(name),
            Err(_) => {
                warn!("[CORS] Ignoring invalid header name '{}'", h);
                None
            }
        })
        .collect()
}

/// Allowed origin, optionally with one `*` (e.g. `https://*.example.com`)
#[derive(Debug, Clone)]
struct OriginPattern {
    prefix: String,
    suffix: Option<String>,
}

impl OriginPattern {
    fn new(domain: &str) -> Self {
        let domain = domain.trim().to_ascii_lowercase();
        match domain.split_once('*') {
            Some((prefix, suffix)) => Self {
                prefix: prefix.to_string(),
                suffix: Some(suffix.to_string()),
            },
            None => Self {
                prefix: domain,
                suffix: None,
            },
        }
    }

    fn matches(&self, origin: &str) -> bool {
        let origin = origin.to_ascii_lowercase();
        match &self.suffix {
            None => origin == self.prefix,
            Some(suffix) => {
                origin.len() >= self.prefix.len() + suffix.len()
                    && origin.starts_with(&self.prefix)
                    && origin.ends_with(suffix.as_str())
            }
        }
    }
}
