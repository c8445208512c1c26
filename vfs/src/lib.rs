//! # 虚拟文件系统接口
//!
//! 分发层通过 [`FileSystem`] 调用具体文件系统：
//! 格式化、挂载、打开/读写/关闭文件、遍历目录。
//! 所有操作同步完成，结果以 [`Result`] 区分成功值、目录结束与各类错误。

#![no_std]

extern crate alloc;

mod dirent;
mod error;
mod stat;

use alloc::sync::Arc;
use core::fmt;

use block_dev::BlockDevice;

pub use self::{
    dirent::{DirEntry, DirEntryType},
    error::Error,
    stat::Stat,
};

/// 文件描述符，从1开始编号
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Fd(usize);

impl Fd {
    /// `0`不是合法的描述符
    pub const fn new(raw: usize) -> Option<Self> {
        if raw == 0 { None } else { Some(Self(raw)) }
    }

    /// 由打开文件表的槽位索引得到描述符
    #[inline]
    pub const fn from_slot(index: usize) -> Self {
        Self(index + 1)
    }

    #[inline]
    pub const fn slot(self) -> usize {
        self.0 - 1
    }

    #[inline]
    pub const fn raw(self) -> usize {
        self.0
    }
}

impl fmt::Display for Fd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountIntent {
    Mount,
    Unmount,
}

/// 文件系统向分发层承诺的操作集合
pub trait FileSystem {
    fn id(&self) -> u32;

    fn name(&self) -> &'static str;

    /// 该设备上没有打开的描述符时才能安全卸载
    fn is_idle(&self, dev: &Arc<dyn BlockDevice>) -> bool;

    /// 格式化设备，返回可用块数
    fn format(&mut self, dev: &Arc<dyn BlockDevice>, block_size: u32) -> Result<u32, Error>;

    fn mount(&mut self, dev: &Arc<dyn BlockDevice>, intent: MountIntent) -> Result<(), Error>;

    /// 打开文件，不存在则创建
    fn open(&mut self, dev: &Arc<dyn BlockDevice>, path: &str) -> Result<Fd, Error>;

    fn read(&mut self, fd: Fd, buf: &mut [u8]) -> Result<usize, Error>;

    fn write(&mut self, fd: Fd, buf: &[u8]) -> Result<usize, Error>;

    fn close(&mut self, fd: Fd) -> Result<(), Error>;

    fn open_dir(&mut self, dev: &Arc<dyn BlockDevice>, path: &str) -> Result<Fd, Error>;

    /// `Ok(None)`表示目录已读完
    fn read_dir(&mut self, fd: Fd) -> Result<Option<DirEntry>, Error>;

    fn link(&mut self, fd: Fd, name: &str, inode: u32) -> Result<(), Error>;

    fn unlink(&mut self, fd: Fd, name: &str) -> Result<(), Error>;

    fn close_dir(&mut self, fd: Fd) -> Result<(), Error>;

    #[allow(unused_variables)]
    fn seek(&mut self, fd: Fd, offset: usize) -> Result<usize, Error> {
        Err(Error::Unsupported)
    }

    #[allow(unused_variables)]
    fn stat(&mut self, fd: Fd) -> Result<Stat, Error> {
        Err(Error::Unsupported)
    }
}
