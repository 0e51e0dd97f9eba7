//! Network layer.
//!
//! Plain TCP listeners are bound by the caller and handed to the server. TLS
//! is optional; when `listener.tls` is set the server terminates it through
//! `axum-server` with the certificates loaded here.

pub mod tls;

pub use tls::load_tls_config;
