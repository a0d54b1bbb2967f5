//! Byte plumbing: the growable [`Buffer`] sockets read into and write from,
//! and a small blocking file helper.

mod buffer;
mod file;

pub use buffer::Buffer;
pub use file::{read_from_file, write_to_file};
