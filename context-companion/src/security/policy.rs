//! Ordered access rules.

use crate::config::CompanionConfig;
use crate::handlers::health::HEALTH_PATH;

/// What a path requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRule {
    Public,
    Authenticated,
}

/// Allow-list first, then authentication for everything else.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    public_paths: Vec<String>,
    public_prefixes: Vec<String>,
}

impl AccessPolicy {
    pub fn new(public_paths: Vec<String>, public_prefixes: Vec<String>) -> Self {
        Self {
            public_paths,
            public_prefixes,
        }
    }

    pub fn from_config(config: &CompanionConfig) -> Self {
        let public_prefixes = match config.admin_console_path() {
            Some(path) => {
                tracing::warn!(
                    path = %path,
                    environment = %config.common.environment,
                    "Admin console path is open without authentication"
                );
                vec![path.trim_end_matches('/').to_string()]
            }
            None => Vec::new(),
        };

        Self::new(vec![HEALTH_PATH.to_string()], public_prefixes)
    }

    pub fn classify(&self, path: &str) -> PathRule {
        if self.public_paths.iter().any(|p| p == path) {
            return PathRule::Public;
        }

        let under_prefix = self.public_prefixes.iter().any(|prefix| {
            path == prefix
                || path
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        });

        if under_prefix {
            PathRule::Public
        } else {
            PathRule::Authenticated
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> AccessPolicy {
        AccessPolicy::new(
            vec!["/actuator/health".to_string()],
            vec!["/h2-console".to_string()],
        )
    }

    #[test]
    fn health_is_public() {
        assert_eq!(policy().classify("/actuator/health"), PathRule::Public);
    }

    #[test]
    fn console_prefix_is_public() {
        let policy = policy();
        assert_eq!(policy.classify("/h2-console"), PathRule::Public);
        assert_eq!(policy.classify("/h2-console/login.do"), PathRule::Public);
    }

    #[test]
    fn lookalike_paths_require_authentication() {
        let policy = policy();
        assert_eq!(policy.classify("/h2-consoles"), PathRule::Authenticated);
        assert_eq!(policy.classify("/actuator/health/db"), PathRule::Authenticated);
        assert_eq!(policy.classify("/actuator"), PathRule::Authenticated);
        assert_eq!(policy.classify("/api/translations"), PathRule::Authenticated);
        assert_eq!(policy.classify("/"), PathRule::Authenticated);
    }

    #[test]
    fn no_prefixes_means_console_is_protected() {
        let policy = AccessPolicy::new(vec!["/actuator/health".to_string()], Vec::new());
        assert_eq!(policy.classify("/h2-console"), PathRule::Authenticated);
    }
}
