//! Infrastructure layer - repositories, hashing, logging and migrations

pub mod logging;
pub mod storage;
pub mod user;

pub use user::{
    Argon2Hasher, CreateUserRequest, InMemoryUserRepository, PasswordHasher,
    PostgresUserRepository, SearchRequest, UpdateUserRequest, UserService,
};
