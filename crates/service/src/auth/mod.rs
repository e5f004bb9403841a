//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Admin accounts live in the `admins` table; sessions are stateless HS256 JWTs.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;

pub use service::AuthService;
