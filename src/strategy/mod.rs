pub mod allocator;
pub mod limiter;
pub mod split;
pub mod traits;
