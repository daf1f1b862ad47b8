//! Repository implementations

mod filesystem_repository;
mod in_memory_repository;

pub use filesystem_repository::FileSystemOAuthServerRepository;
pub use in_memory_repository::InMemoryOAuthServerRepository;
