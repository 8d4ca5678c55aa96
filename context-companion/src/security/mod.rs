//! Access control gate.
//!
//! Every request is classified against an ordered [`AccessPolicy`]: public
//! paths pass untouched, everything else needs either HTTP Basic
//! credentials of a configured user or a live session cookie. A successful
//! Basic login establishes a session, replacing any previous session of the
//! same principal.

pub mod middleware;
pub mod policy;
pub mod sessions;
pub mod users;

pub use middleware::{access_control_middleware, removal_cookie, CurrentSession, SESSION_COOKIE};
pub use policy::{AccessPolicy, PathRule};
pub use sessions::{Session, SessionId, SessionRegistry};
pub use users::UserDirectory;

use crate::config::CompanionConfig;
use crate::error::GatewayError;
use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::CookieJar;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use secrecy::Secret;

/// Credentials presented on a request. Basic wins over a session cookie.
#[derive(Debug)]
pub enum Credentials {
    None,
    Basic {
        username: String,
        password: Secret<String>,
    },
    Session(SessionId),
    Malformed,
}

impl Credentials {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        if let Some(value) = headers.get(header::AUTHORIZATION) {
            return value
                .to_str()
                .ok()
                .and_then(parse_basic)
                .unwrap_or(Credentials::Malformed);
        }

        match CookieJar::from_headers(headers).get(SESSION_COOKIE) {
            Some(cookie) => cookie
                .value()
                .parse()
                .map(Credentials::Session)
                .unwrap_or(Credentials::Malformed),
            None => Credentials::None,
        }
    }
}

fn parse_basic(value: &str) -> Option<Credentials> {
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some(Credentials::Basic {
        username: username.to_string(),
        password: Secret::new(password.to_string()),
    })
}

/// How a permitted request got through.
#[derive(Debug, Clone)]
pub enum Access {
    Anonymous,
    Authenticated { session: Session, issued: bool },
}

#[derive(Debug, Clone)]
pub enum Decision {
    Permit(Access),
    Reject(&'static str),
}

pub struct AccessGate {
    policy: AccessPolicy,
    users: UserDirectory,
    sessions: SessionRegistry,
}

impl AccessGate {
    pub fn new(policy: AccessPolicy, users: UserDirectory, sessions: SessionRegistry) -> Self {
        Self {
            policy,
            users,
            sessions,
        }
    }

    /// Fails when a configured password hash does not parse.
    pub fn from_config(config: &CompanionConfig) -> Result<Self, GatewayError> {
        Ok(Self::new(
            AccessPolicy::from_config(config),
            UserDirectory::from_config(&config.security.users)?,
            SessionRegistry::new(config.session_idle_timeout()),
        ))
    }

    /// Decide whether a request for `path` may proceed.
    pub fn evaluate(&self, path: &str, credentials: &Credentials) -> Decision {
        if self.policy.classify(path) == PathRule::Public {
            return Decision::Permit(Access::Anonymous);
        }

        match credentials {
            Credentials::None => Decision::Reject("missing credentials"),
            Credentials::Malformed => Decision::Reject("malformed credentials"),
            Credentials::Basic { username, password } => {
                match self.users.verify(username, password) {
                    Some(principal) => {
                        let session = self.sessions.establish(&principal);
                        tracing::info!(principal = %principal, session_id = %session.id, "Session established");
                        Decision::Permit(Access::Authenticated {
                            session,
                            issued: true,
                        })
                    }
                    None => Decision::Reject("invalid username or password"),
                }
            }
            Credentials::Session(id) => match self.sessions.touch(id) {
                Some(session) => Decision::Permit(Access::Authenticated {
                    session,
                    issued: false,
                }),
                None => Decision::Reject("session expired or invalidated"),
            },
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::users::tests::credential;
    use axum::http::HeaderValue;
    use std::time::Duration;

    fn gate() -> AccessGate {
        AccessGate::new(
            AccessPolicy::new(
                vec!["/actuator/health".to_string()],
                vec!["/h2-console".to_string()],
            ),
            UserDirectory::from_config(&[credential("alice", "wonderland")]).unwrap(),
            SessionRegistry::new(Duration::from_secs(60)),
        )
    }

    fn basic(user: &str, password: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let value = format!("Basic {}", STANDARD.encode(format!("{}:{}", user, password)));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&value).unwrap());
        headers
    }

    fn cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, value)).unwrap(),
        );
        headers
    }

    #[test]
    fn parses_basic_credentials() {
        match Credentials::from_headers(&basic("alice", "a:b")) {
            Credentials::Basic { username, password } => {
                use secrecy::ExposeSecret;
                assert_eq!(username, "alice");
                assert_eq!(password.expose_secret(), "a:b");
            }
            other => panic!("unexpected credentials: {:?}", other),
        }
    }

    #[test]
    fn unsupported_scheme_is_malformed() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert!(matches!(
            Credentials::from_headers(&headers),
            Credentials::Malformed
        ));
        assert!(matches!(
            Credentials::from_headers(&cookie("not-a-uuid")),
            Credentials::Malformed
        ));
        assert!(matches!(
            Credentials::from_headers(&HeaderMap::new()),
            Credentials::None
        ));
    }

    #[test]
    fn public_paths_skip_authentication() {
        let gate = gate();
        assert!(matches!(
            gate.evaluate("/actuator/health", &Credentials::None),
            Decision::Permit(Access::Anonymous)
        ));
        assert!(matches!(
            gate.evaluate("/h2-console/login.do", &Credentials::Malformed),
            Decision::Permit(Access::Anonymous)
        ));
    }

    #[test]
    fn protected_paths_reject_without_valid_credentials() {
        let gate = gate();
        assert!(matches!(
            gate.evaluate("/api/features", &Credentials::None),
            Decision::Reject(_)
        ));
        let wrong = Credentials::from_headers(&basic("alice", "nope"));
        assert!(matches!(
            gate.evaluate("/api/features", &wrong),
            Decision::Reject(_)
        ));
        assert_eq!(gate.sessions().active_count(), 0);
    }

    #[test]
    fn basic_login_issues_session_usable_afterwards() {
        let gate = gate();
        let login = Credentials::from_headers(&basic("alice", "wonderland"));
        let session = match gate.evaluate("/auth/login", &login) {
            Decision::Permit(Access::Authenticated { session, issued }) => {
                assert!(issued);
                session
            }
            other => panic!("unexpected decision: {:?}", other),
        };

        let by_cookie = Credentials::from_headers(&cookie(&session.id.to_string()));
        assert!(matches!(
            gate.evaluate("/api/features", &by_cookie),
            Decision::Permit(Access::Authenticated { issued: false, .. })
        ));
    }

    #[test]
    fn new_login_rejects_old_session() {
        let gate = gate();
        let login = Credentials::from_headers(&basic("alice", "wonderland"));
        let Decision::Permit(Access::Authenticated { session: first, .. }) =
            gate.evaluate("/auth/login", &login)
        else {
            panic!("first login rejected");
        };
        gate.evaluate("/auth/login", &login);

        assert!(matches!(
            gate.evaluate("/api/features", &Credentials::Session(first.id)),
            Decision::Reject(_)
        ));
    }
}
