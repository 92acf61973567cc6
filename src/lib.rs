pub mod config;
pub mod error;
pub mod frame;
pub mod handler;
pub mod history;
pub mod link;
pub mod metadata;
pub mod model;
pub mod platform;
pub mod preset;
pub mod redirect;
pub mod token;
pub mod util;
pub mod wallet;
