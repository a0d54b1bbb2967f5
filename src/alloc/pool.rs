use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use std::ptr::NonNull;
use std::sync::Mutex;

const BLOCK_ALIGN: usize = 8;

/// Fixed-block pool over chunked backing storage.
///
/// The chunk list exclusively owns the raw allocations; the freelist holds
/// block indices into them, never pointers, so a block can only ever be
/// reached through its owning chunk.
pub struct MemoryPool {
    block_size: usize,
    blocks_per_chunk: usize,
    chunk_layout: Layout,
    state: Mutex<PoolState>,
}

struct PoolState {
    chunks: Vec<Chunk>,
    /// Free blocks as global indices: `chunk * blocks_per_chunk + slot`.
    free: Vec<usize>,
}

struct Chunk {
    data: NonNull<u8>,
}

unsafe impl Send for MemoryPool {}
unsafe impl Sync for MemoryPool {}

impl MemoryPool {
    /// Creates an empty pool; the first allocation brings in a chunk.
    ///
    /// `block_size` is rounded up to 8-byte alignment.
    ///
    /// # Panics
    ///
    /// Panics if `block_size` or `blocks_per_chunk` is zero, or if a chunk
    /// would overflow `isize`.
    pub fn new(block_size: usize, blocks_per_chunk: usize) -> MemoryPool {
        assert!(block_size > 0, "block size must be non-zero");
        assert!(blocks_per_chunk > 0, "chunk must hold at least one block");

        let block_size = align_up(block_size, BLOCK_ALIGN);
        let chunk_layout = Layout::from_size_align(block_size * blocks_per_chunk, BLOCK_ALIGN)
            .expect("chunk size overflow");

        MemoryPool {
            block_size,
            blocks_per_chunk,
            chunk_layout,
            state: Mutex::new(PoolState {
                chunks: Vec::new(),
                free: Vec::new(),
            }),
        }
    }

    /// The rounded-up block size this pool serves.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Hands out one block, growing by a chunk when the freelist is dry.
    pub fn allocate(&self) -> NonNull<u8> {
        let mut state = self.state.lock().unwrap();
        if state.free.is_empty() {
            self.grow(&mut state);
        }
        let index = state.free.pop().expect("freshly grown pool has free blocks");
        self.block_ptr(&state, index)
    }

    /// Returns a block to the pool.
    ///
    /// # Safety
    ///
    /// `ptr` must have come from [`allocate`](MemoryPool::allocate) on this
    /// pool and must not be used again afterwards.
    pub unsafe fn deallocate(&self, ptr: NonNull<u8>) {
        let mut state = self.state.lock().unwrap();
        let index = self
            .index_of(&state, ptr)
            .expect("pointer does not belong to this pool");
        state.free.push(index);
    }

    fn grow(&self, state: &mut PoolState) {
        let data = unsafe { alloc(self.chunk_layout) };
        let data = match NonNull::new(data) {
            Some(data) => data,
            None => handle_alloc_error(self.chunk_layout),
        };

        let base = state.chunks.len() * self.blocks_per_chunk;
        state.chunks.push(Chunk { data });
        state.free.extend(base..base + self.blocks_per_chunk);
    }

    fn block_ptr(&self, state: &PoolState, index: usize) -> NonNull<u8> {
        let chunk = &state.chunks[index / self.blocks_per_chunk];
        let slot = index % self.blocks_per_chunk;
        unsafe { NonNull::new_unchecked(chunk.data.as_ptr().add(slot * self.block_size)) }
    }

    fn index_of(&self, state: &PoolState, ptr: NonNull<u8>) -> Option<usize> {
        let addr = ptr.as_ptr() as usize;
        for (i, chunk) in state.chunks.iter().enumerate() {
            let start = chunk.data.as_ptr() as usize;
            let end = start + self.block_size * self.blocks_per_chunk;
            if addr >= start && addr < end {
                let slot = (addr - start) / self.block_size;
                return Some(i * self.blocks_per_chunk + slot);
            }
        }
        None
    }
}

impl Drop for MemoryPool {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap();
        for chunk in &state.chunks {
            unsafe {
                dealloc(chunk.data.as_ptr(), self.chunk_layout);
            }
        }
    }
}

fn align_up(n: usize, align: usize) -> usize {
    (n + align - 1) & !(align - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_are_distinct_and_reused() {
        let pool = MemoryPool::new(24, 4);
        let a = pool.allocate();
        let b = pool.allocate();
        assert_ne!(a.as_ptr(), b.as_ptr());

        unsafe { pool.deallocate(a) };
        let c = pool.allocate();
        // Freelist is a stack: the freed block comes straight back.
        assert_eq!(a.as_ptr(), c.as_ptr());
    }

    #[test]
    fn grows_past_one_chunk() {
        let pool = MemoryPool::new(16, 2);
        let blocks: Vec<_> = (0..5).map(|_| pool.allocate()).collect();

        let mut addrs: Vec<_> = blocks.iter().map(|p| p.as_ptr() as usize).collect();
        addrs.sort_unstable();
        addrs.dedup();
        assert_eq!(addrs.len(), 5);

        for block in blocks {
            unsafe { pool.deallocate(block) };
        }
    }

    #[test]
    fn block_size_is_aligned_up() {
        let pool = MemoryPool::new(3, 8);
        assert_eq!(pool.block_size(), 8);
    }
}
