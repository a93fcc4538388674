//! Document numbering

pub mod allocator;
pub mod errors;
pub mod records;

pub use allocator::DocumentNumberAllocator;
pub use errors::NumberingError;
pub use records::DocumentType;
