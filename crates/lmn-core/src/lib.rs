//! Core types, validation and operations for the LMN concert notes service.
//!
//! This crate knows nothing about HTTP or SQL. Storage backends implement
//! [`store::LmnStore`]; transports drive [`service::Service`].

#![allow(async_fn_in_trait)]

pub mod badge;
pub mod catalog;
pub mod credentials;
pub mod error;
pub mod input;
pub mod media;
pub mod note;
pub mod rating;
pub mod service;
pub mod store;
pub mod user;

pub use error::{Error, Result};
