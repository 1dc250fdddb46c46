//! Normalizes bot status reports into a [`botpanel_core::StatusReport`].
//!
//! A report is either an embedded JSON payload or a loosely formatted text
//! block. [`dispatch`] tries the structured path first and falls back to the
//! free-text grammar; both yield the same model.

mod dispatch;
mod error;
mod identity;
mod instructions;
mod marker;
mod progress;
mod scope;
mod text;
mod usage;
mod value;

pub use dispatch::{
    decode_payload, dispatch, dispatch_text, dispatch_value, dispatch_with, DispatchOptions,
};
pub use error::DecodeError;
pub use instructions::classify;
pub use marker::{split_marker, status_for_marker};
