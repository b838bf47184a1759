pub mod async_tree;
pub mod filter;
mod index;
pub mod space;
pub mod tree;

// 重新导出主要类型
pub use async_tree::AsyncTree;
pub use space::{Label, OwnerId, Space, SpaceId};
pub use tree::Tree;
