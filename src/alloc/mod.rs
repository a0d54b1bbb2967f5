//! Size-class freelist allocation.
//!
//! [`MemoryPool`] hands out fixed-size blocks carved from chunked backing
//! storage; [`SizeClassAlloc`] fronts one pool per 8-byte size class up to
//! 4 KiB. Neither is on the I/O hot path.

mod classes;
mod pool;

pub use classes::SizeClassAlloc;
pub use pool::MemoryPool;
