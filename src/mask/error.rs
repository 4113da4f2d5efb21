use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MaskError {
    #[error("mask key {user} out of range for {n_users} encoded users")]
    UserOutOfRange { user: u32, n_users: usize },

    #[error("mask for user {user} holds item {item}, out of range for {n_items} encoded items")]
    ItemOutOfRange { user: u32, item: u32, n_items: usize },

    #[error("mask mapping lists user {user} more than once")]
    DuplicateUser { user: u32 },
}
