//! UserService: business operations over the persistence gateway.

mod password;
mod users;
pub use password::{Argon2Encoder, PasswordEncoder};
pub use users::UserService;
