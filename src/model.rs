//! Pagination state and the pure rules around it

pub mod index_range;
pub mod load_lock;
pub mod pagination;
