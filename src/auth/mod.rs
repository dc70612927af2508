// Authentication module
// Registration, login, token renewal, role management and the policy check

pub mod error;
pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use middleware::{Policy, PolicyGate};
pub use repository::{CredentialStore, PgCredentialStore};
pub use service::AuthService;
pub use token::TokenService;
