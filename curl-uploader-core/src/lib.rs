#![doc = "curl-uploader-core: core logic library for curl-uploader."]

//! This crate holds everything needed to upload a file, or a glob of files, with
//! curl and judge whether every transfer completed.
//!
//! # Usage
//! Build an [`config::UploadConfig`], then call [`upload::upload`] with a
//! [`contract::ToolLocator`] and a [`contract::TransferRunner`]. The CLI crate
//! uses [`runner::PathLocator`] and [`runner::ProcessRunner`]; tests use the
//! mockall-generated mocks.

pub mod arguments;
pub mod config;
pub mod contract;
pub mod error;
pub mod resolve;
pub mod runner;
pub mod upload;
pub mod verify;

pub use error::{Result, UploadError};
