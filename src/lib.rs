//! roledoc: parse annotated Ansible role defaults and infer variable types.
//!
//! [`parser`] turns a `defaults/main.yml` into a [`model::RoleInfo`];
//! [`report::build`] adds types, instance names and cross-references;
//! [`render`] turns the report into markdown or JSON.

pub mod config;
pub mod docker;
pub mod error;
pub mod filter;
pub mod inference;
pub mod lookup;
pub mod model;
pub mod parser;
pub mod render;
pub mod report;
pub mod types;

pub use error::{Error, Result};
