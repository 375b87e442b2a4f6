//! HTTP middleware module.
//!
//! ```ignore
//! use axum_helpers::http::create_cors_layer;
//!
//! let cors = create_cors_layer("http://localhost:3000,https://example.com")?;
//! let app = Router::new().layer(cors);
//! ```

pub mod cors;

pub use cors::create_cors_layer;
