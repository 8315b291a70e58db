//! Authentication: password hashing, signed identity tokens, the role gate run at
//! the request boundary, and the signup/login orchestration on top of them.

pub mod extractor;
pub mod gate;
pub mod password;
pub mod service;
pub mod token;

pub use extractor::AuthUser;
pub use gate::{RoleGate, RolePolicy, RoutePolicy};
pub use password::PasswordHasher;
pub use service::AuthService;
pub use token::{Claims, TokenPayload, TokenService};
