//! OAuthMux Storage Layer
//!
//! Backing stores for OAuth server definitions.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  OAuth Loader                        │
//! ├──────────────────────────────────────────────────────┤
//! │          OAuthServerRepository (trait)               │
//! ├──────────────────────────┬───────────────────────────┤
//! │  InMemory repository     │  FileSystem repository    │
//! │  (tests, embedding)      │  (directory of *.json)    │
//! └──────────────────────────┴───────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use oauthmux_storage::FileSystemOAuthServerRepository;
//!
//! let repo = FileSystemOAuthServerRepository::new("/etc/oauthmux/oauth");
//! let servers = repo.find_all().await?;
//! ```

mod repositories;

pub use repositories::{FileSystemOAuthServerRepository, InMemoryOAuthServerRepository};
