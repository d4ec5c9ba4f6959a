//! # Session Cookie
//!
//! Applies [`CookiePolicy`] to the `jwt` cookie through `tower-cookies`.

use lib_auth::{CookiePolicy, AUTH_COOKIE_NAME};
use lib_core::Config;
use tower_cookies::cookie::time::Duration;
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};

fn policy(config: &Config) -> CookiePolicy {
    CookiePolicy::for_env(config.environment, &config.app_domain, config.session_ttl())
}

fn build_cookie(policy: CookiePolicy, value: String, max_age: Duration) -> Cookie<'static> {
    let mut cookie = Cookie::new(AUTH_COOKIE_NAME, value);
    if let Some(domain) = policy.domain {
        cookie.set_domain(domain);
    }
    cookie.set_path(policy.path);
    cookie.set_http_only(policy.http_only);
    cookie.set_secure(policy.secure);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(max_age);
    cookie
}

/// Issue the session cookie carrying `token`.
pub fn set_auth_cookie(cookies: &Cookies, config: &Config, token: String) {
    let policy = policy(config);
    let max_age = Duration::seconds(policy.max_age.num_seconds());
    cookies.add(build_cookie(policy, token, max_age));
}

/// Overwrite the session cookie with an empty, immediately expiring one.
pub fn clear_auth_cookie(cookies: &Cookies, config: &Config) {
    cookies.add(build_cookie(policy(config), String::new(), Duration::ZERO));
}
