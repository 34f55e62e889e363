//! [`Repository`](crate::traits::Repository) and [`UserStore`](crate::traits::UserStore) implementations.
pub mod memory;
#[cfg(any(feature = "sqlite", feature = "pg"))]
pub mod sea;

pub use memory::MemoryRepository;
pub use memory::MemoryUserStore;
#[cfg(any(feature = "sqlite", feature = "pg"))]
pub use sea::SeaOrmRepository;
