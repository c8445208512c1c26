//! # 磁盘数据结构层
//!
//! myfs 的磁盘布局（以扇区计）：
//! 引导扇区 | 超级块 | inode 区域 | 数据区
//!
//! 所有多字节整数都以小端序存放。

mod super_block;
pub use super_block::SuperBlock;

mod inode;
pub use inode::{DIRECT_COUNT, DiskInode, INODE_SIZE, INODES_PER_SECTOR};

/// 文件项，也属于磁盘文件系统数据结构
mod dir_entry;
pub use dir_entry::DirEntry;
