//! User accounts, credentials and bearer tokens.

pub mod memory;
pub mod postgres;
pub mod provider;
pub mod token;

pub use memory::InMemoryIdentityProvider;
pub use postgres::PostgresIdentityProvider;
pub use provider::{CreateUserOutcome, IdentityError, IdentityProvider, UserProfile};
pub use token::{JwtTokenSigner, SessionClaims, TokenError, TokenSigner};
