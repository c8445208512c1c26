//! # 块设备接口层
//!
//! 块设备以**扇区**为单位存储数据；
//! [`BlockDevice`] 是对读写块设备的抽象，实现了此特质的类型称为**块设备驱动**。
//!
//! 文件系统只通过扇区号读写整扇区，不关心介质、缓存与重试。

#![no_std]

extern crate alloc;

mod ram_disk;

use core::any::Any;
use core::fmt::Debug;

use derive_more::{Add, Display, From, Into};

pub use self::ram_disk::RamDisk;

/// 扇区的字节量
pub const SECTOR_SIZE: usize = 512;

/// 块设备驱动特质
pub trait BlockDevice: Debug + Send + Sync + Any {
    /// 读取一整个扇区，`buf`的长度必须为[`SECTOR_SIZE`]
    fn read_sector(&self, id: SectorId, buf: &mut [u8]) -> Result<(), Error>;

    /// 写入一整个扇区，`buf`的长度必须为[`SECTOR_SIZE`]
    fn write_sector(&self, id: SectorId, buf: &[u8]) -> Result<(), Error>;

    /// 设备的扇区总数
    fn num_sectors(&self) -> usize;
}

/// 绝对扇区号
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Add, From, Into, Display)]
#[repr(transparent)]
pub struct SectorId(usize);

impl core::ops::Add<usize> for SectorId {
    type Output = Self;

    fn add(self, rhs: usize) -> Self::Output {
        self + Self(rhs)
    }
}

impl SectorId {
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> usize {
        self.0
    }

    /// 扇区在设备上的字节偏移
    #[inline]
    pub const fn byte_offset(self) -> usize {
        self.0 * SECTOR_SIZE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Error {
    /// 扇区号超出设备范围
    #[display(fmt = "sector {} is out of range", _0)]
    OutOfRange(SectorId),
    /// 缓冲区长度不是一个扇区
    #[display(fmt = "buffer of {} bytes is not a sector", _0)]
    BadBuffer(usize),
    /// 介质读写失败
    #[display(fmt = "device I/O failure")]
    Io,
}

impl core::error::Error for Error {}
