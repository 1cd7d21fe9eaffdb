//! Credential adapters: bcrypt password hashes and HS256 bearer tokens.

mod bcrypt_hasher;
mod jwt_tokens;

pub use bcrypt_hasher::BcryptPasswordHasher;
pub use jwt_tokens::JwtTokenService;
