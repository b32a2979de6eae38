//! Services for the accounts API.

pub mod auth;
pub mod email;
pub mod qr;
pub mod tokens;

pub use auth::{AuthError, AuthService};
pub use email::{EmailError, EmailService};
pub use qr::{QrError, QrService};
pub use tokens::{TokenError, TokenService};
