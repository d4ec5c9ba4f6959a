//! # Session Cookie Policy
//!
//! Decides the attributes of the `jwt` session cookie for each deployment
//! environment. The web layer turns a [`CookiePolicy`] into a real cookie.

use chrono::Duration;
use lib_utils::Environment;

/// Name of the cookie carrying the session JWT.
pub const AUTH_COOKIE_NAME: &str = "jwt";

/// Attributes applied to the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookiePolicy {
    /// `Domain` attribute. `None` means a host-only cookie.
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub path: &'static str,
    pub max_age: Duration,
}

impl CookiePolicy {
    /// Policy for `env`.
    ///
    /// Deployed environments scope the cookie to `domain` and require TLS.
    /// Local environments use host-only cookies over plain HTTP.
    pub fn for_env(env: Environment, domain: &str, max_age: Duration) -> Self {
        let deployed = env.is_deployed();
        Self {
            domain: deployed.then(|| domain.to_string()),
            secure: deployed,
            http_only: true,
            path: "/",
            max_age,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_policy() {
        let policy = CookiePolicy::for_env(Environment::Production, "tallybook.app", Duration::hours(24));
        assert_eq!(policy.domain.as_deref(), Some("tallybook.app"));
        assert!(policy.secure);
        assert!(policy.http_only);
        assert_eq!(policy.path, "/");
        assert_eq!(policy.max_age, Duration::hours(24));
    }

    #[test]
    fn test_staging_matches_production_flags() {
        let policy = CookiePolicy::for_env(Environment::Staging, "staging.tallybook.app", Duration::hours(1));
        assert_eq!(policy.domain.as_deref(), Some("staging.tallybook.app"));
        assert!(policy.secure);
    }

    #[test]
    fn test_local_policies_are_host_only_and_insecure() {
        for env in [Environment::Development, Environment::Test] {
            let policy = CookiePolicy::for_env(env, "localhost", Duration::hours(1));
            assert_eq!(policy.domain, None);
            assert!(!policy.secure);
            assert!(policy.http_only);
        }
    }
}
