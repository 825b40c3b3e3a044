#![cfg_attr(docsrs, feature(doc_cfg))]
//! Plain data types shared by the `wideload` engine and its runtime shell.
mod config;
mod constants;
mod error;
mod outcome;
mod report;
mod stats;

pub use config::*;
pub use constants::*;
pub use error::*;
pub use outcome::*;
pub use report::*;
pub use stats::*;
