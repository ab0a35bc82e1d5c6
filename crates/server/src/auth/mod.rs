//! # Authentication
//!
//! HS256 bearer tokens: minting on register/login and the extractor that
//! guards every user-scoped route.

pub mod middleware;
