use super::pool::MemoryPool;

use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use std::ptr::NonNull;

const ALIGN: usize = 8;
const MAX_POOL_SIZE: usize = 4096;
const NUM_CLASSES: usize = MAX_POOL_SIZE / ALIGN;
const BLOCKS_PER_CHUNK: usize = 1024;

/// Size-class front end over [`MemoryPool`]s.
///
/// One pool per 8-byte class, from 8 to 4096 bytes. Pools allocate their
/// first chunk lazily, so constructing the allocator is cheap. Requests
/// beyond the largest class fall through to the system allocator.
pub struct SizeClassAlloc {
    pools: Vec<MemoryPool>,
}

impl SizeClassAlloc {
    pub fn new() -> SizeClassAlloc {
        let pools = (0..NUM_CLASSES)
            .map(|i| MemoryPool::new((i + 1) * ALIGN, BLOCKS_PER_CHUNK))
            .collect();
        SizeClassAlloc { pools }
    }

    /// Allocates `size` bytes, 8-aligned. Zero-sized requests are treated
    /// as one byte.
    pub fn allocate(&self, size: usize) -> NonNull<u8> {
        let size = size.max(1);
        match class_of(size) {
            Some(class) => self.pools[class].allocate(),
            None => {
                let layout = oversized_layout(size);
                let ptr = unsafe { alloc(layout) };
                match NonNull::new(ptr) {
                    Some(ptr) => ptr,
                    None => handle_alloc_error(layout),
                }
            }
        }
    }

    /// Returns a block obtained from [`allocate`](SizeClassAlloc::allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must have come from `allocate(size)` with the same `size` on
    /// this allocator, and must not be used again afterwards.
    pub unsafe fn deallocate(&self, ptr: NonNull<u8>, size: usize) {
        let size = size.max(1);
        match class_of(size) {
            Some(class) => self.pools[class].deallocate(ptr),
            None => dealloc(ptr.as_ptr(), oversized_layout(size)),
        }
    }
}

impl Default for SizeClassAlloc {
    fn default() -> SizeClassAlloc {
        SizeClassAlloc::new()
    }
}

fn class_of(size: usize) -> Option<usize> {
    let rounded = (size + ALIGN - 1) & !(ALIGN - 1);
    if rounded > MAX_POOL_SIZE {
        return None;
    }
    Some(rounded / ALIGN - 1)
}

fn oversized_layout(size: usize) -> Layout {
    Layout::from_size_align(size, ALIGN).expect("allocation size overflow")
}
