//! `pdfrelay-signing` — signed, tamper-evident correlation tokens.
//!
//! A correlation token carries a small payload (e.g. an attachment id)
//! across an untrusted boundary and back, without server-side session
//! state. Tokens are namespaced so that a token minted for one feature
//! cannot be replayed against another feature's endpoint.

pub mod codec;

pub use codec::{TokenCodec, TokenError};
