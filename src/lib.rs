//! Marginalia
//!
//! Anchors free-form comments to spans of a rendered document, keeps them
//! attached while the document is re-rendered, draws them as highlight
//! segments and exports them as a markdown feedback digest. The server
//! side stores shared documents behind short codes.

pub mod annotations;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod markup;
pub mod routes;
pub mod session;
pub mod share;
pub mod state;
