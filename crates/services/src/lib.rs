pub mod conversation;
pub mod message_store;
pub mod storage;

pub use conversation::{Conversation, OutgoingRequest, SendRejected};
pub use message_store::{MessageStore, SearchDirection, StoreError};
pub use storage::{FileSlotStorage, MemorySlotStorage, SlotStorage};
