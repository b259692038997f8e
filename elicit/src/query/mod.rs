//! Query accumulation, compilation and response normalization.
//!
//! A query moves through these stages:
//!
//! 1. [`Builder`] accumulates a [`QueryState`]: target, filters and body fields
//! 2. [`Grammar`] compiles the state into a [`RequestDescriptor`], resolving
//!    named path parameters along the way
//! 3. the [`Connection`](crate::Connection) executes the descriptor
//! 4. [`Processor`] reshapes the parsed body according to the connection's
//!    [`ResponseDialect`]

mod builder;
pub mod dynamic;
mod grammar;
mod processor;
mod state;
pub mod template;

pub use builder::Builder;
pub use grammar::{Grammar, RequestDescriptor};
pub use processor::{
    is_empty_body, Processor, ResponseDialect, DEFAULT_ENVELOPE_KEY, EMPTY_DELETE_BODY_IS_SUCCESS,
};
pub use state::{BodyField, Filter, QueryState, Target};

pub(crate) use state::value_text;
