pub mod models;
pub mod repo;

mod memory;
pub use memory::MemoryStore;

pub use models::{
    FocusSession, Mood, NewFocusSession, NewReflection, NewUser, ProfileUpdate, Reflection, Task,
    User, UserProfile,
};
pub use repo::{Store, StoreError};
