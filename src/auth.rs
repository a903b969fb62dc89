//! Token-based sessions. Users come from the remote service, which has no notion of passwords, so
//! a session is just a signed token naming a user id.
pub mod forms;
pub mod service;
pub mod token;

pub use forms::{LoginForm, SignupForm};
pub use service::{Auth, AuthResponse, Revocations, Session};
pub use token::Tokens;
