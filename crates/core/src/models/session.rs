use serde::{Deserialize, Serialize};

/// The authenticated user's profile, as returned by `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// An established session: the bearer token plus the profile loaded with it.
///
/// Exactly one session exists per `SessionManager`; it is created on
/// successful login/registration or restored from the persisted token at
/// startup, and destroyed on logout or when the token is rejected. A token
/// without a loaded profile never surfaces as a session — that rules out
/// partially-authenticated states by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}
