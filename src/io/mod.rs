mod block_cache;
mod local;
mod memory;
mod range_reader;

pub use block_cache::{BlockCache, DEFAULT_BLOCK_SIZE, DEFAULT_CACHE_CAPACITY};
pub use local::LocalFile;
pub use memory::MemoryFile;
pub(crate) use range_reader::check_range;
pub use range_reader::{
    read_u16_be, read_u16_le, read_u32_be, read_u32_le, read_u64_be, read_u64_le, RangeReader,
    RangeWriter,
};
