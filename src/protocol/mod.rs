//! Protocol leaves: a JSON value model with a recursive-descent parser and
//! an HTTP/1 message parser/serializer. Both are self-contained; the
//! reactor does not depend on them.

pub mod http;
pub mod json;
