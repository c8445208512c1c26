#![no_std]

extern crate alloc;

/* myfs 的整体架构，自上而下 */

// 门面层：向分发层提供格式化、挂载、打开、读写等操作
mod control;

// 打开文件表：描述符到 inode 与游标的绑定
mod file;

// 目录层：根目录字节流中的定长目录项
mod directory;

// 字节流层：把游标范围换算成扇区读写
mod io;

// 块分配层：推进超级块的空闲块游标
mod allocator;

// 索引节点存储：按编号存取 inode 记录
mod inode;

// 磁盘数据结构层
mod layout;

mod util;

use block_dev::{SECTOR_SIZE, SectorId};

pub use self::{
    control::MyFileSystem,
    inode::{DiskInodeStore, Inode, InodeKind, InodeStore},
    layout::{DirEntry, SuperBlock},
};

pub const MAGIC: u32 = 0x4D59_4653;
pub const SUPERBLOCK_SECTOR: SectorId = SectorId::new(1);
pub const INODE_AREA_START: SectorId = SectorId::new(2);
/// inode 区域占用的扇区数
pub const INODE_AREA_SECTORS: usize = 20;
/// 根目录的 inode 编号
pub const ROOT_INODE: u32 = 1;
/// 打开文件表的槽位数
pub const MAX_OPEN_FILES: usize = 32;

pub const FS_ID: u32 = 1;
pub const FS_NAME: &str = "MyFS_Standard";

pub type Result<T> = core::result::Result<T, vfs::Error>;

type Sector = [u8; SECTOR_SIZE];
