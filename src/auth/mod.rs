//! Authentication and authorization core: credential hashing, API key
//! identifier generation, the dual-scheme request resolver, and the pure
//! policy predicates the HTTP layer guards with.

pub mod encoder;
pub mod identifier;
pub mod policy;
pub mod principal;
pub mod resolver;

pub use encoder::PasswordEncoder;
pub use identifier::{IDENTIFIER_LENGTH, generate_identifier};
pub use principal::{AuthContext, CredentialKind, Principal};
pub use resolver::{API_KEY_HEADER, AuthAttempt, AuthError, Authenticator, classify_request};
