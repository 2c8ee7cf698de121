//! User resource: model, storage, service and HTTP handlers.
//!
//! This module handles:
//! - The `User` entity and its field schema
//! - The repository contract with PostgreSQL and in-memory implementations
//! - The pass-through service
//! - The axum handlers for `/users`

pub mod adapter;
pub mod handler;
pub mod mock;
pub mod model;
pub mod repository;
pub mod service;

pub use adapter::SqlUserAdapter;
pub use mock::MockUserRepository;
pub use model::{FieldDescriptor, PatchValue, User, UserPatch, USER_FIELDS};
pub use repository::UserRepository;
pub use service::UserService;
