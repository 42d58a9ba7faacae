//! Authentication, sessions and capability policy.

pub mod identity;
pub mod policy;
pub mod profile;
pub mod rate_limit;
pub mod registry;
pub mod session;

pub use identity::{AccountDirectory, Identity, IdentityProvider, PasswordIdentityProvider};
pub use policy::{Capabilities, Role};
pub use profile::{ProfileDirectory, UserProfile};
pub use rate_limit::LoginRateLimiter;
pub use registry::{Claims, IssuedSession, SessionRegistry};
pub use session::{SessionManager, SessionPhase, SessionState};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email and password are required")]
    MissingCredentials,

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Invalid or expired session")]
    InvalidSession,

    #[error("Too many requests. Please try again later.")]
    RateLimited,

    #[error("Failed to create session token: {0}")]
    Token(String),

    #[error("Identity provider error: {0}")]
    Provider(String),
}
