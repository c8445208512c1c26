//! # 索引节点存储
//!
//! 按编号创建、读取、保存 inode 记录。
//! 门面与字节流层只通过 [`InodeStore`] 访问 inode，
//! 默认实现 [`DiskInodeStore`] 把记录存放在超级块之后的 inode 区域。

use alloc::sync::Arc;
use alloc::vec::Vec;

use block_dev::{BlockDevice, SECTOR_SIZE, SectorId};
use vfs::{DirEntryType, Error};

use crate::layout::{DIRECT_COUNT, DiskInode, INODE_SIZE, INODES_PER_SECTOR};
use crate::{INODE_AREA_SECTORS, INODE_AREA_START, Result, Sector};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum InodeKind {
    #[default]
    None = 0,
    Regular = 1,
    Directory = 2,
}

/// 内存中的 inode 对象
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inode {
    number: u32,
    kind: InodeKind,
    /// 文件字节数
    size: usize,
    /// 逻辑块索引到起始扇区，0 表示未映射
    blocks: Vec<u32>,
    /// 块映射的最大长度
    capacity: usize,
}

impl Inode {
    pub fn new(number: u32, kind: InodeKind, capacity: usize) -> Self {
        Self {
            number,
            kind,
            size: 0,
            blocks: Vec::new(),
            capacity,
        }
    }

    #[inline]
    pub fn number(&self) -> u32 {
        self.number
    }

    #[inline]
    pub fn kind(&self) -> InodeKind {
        self.kind
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == InodeKind::Directory
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn set_size(&mut self, size: usize) {
        self.size = size;
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 逻辑块所在的起始扇区，未映射时返回空
    pub fn block(&self, index: usize) -> Option<SectorId> {
        self.blocks
            .get(index)
            .filter(|&&addr| addr != 0)
            .map(|&addr| SectorId::new(addr as usize))
    }

    /// 绑定逻辑块，映射随之增长，中间的索引保持未映射
    pub fn map_block(&mut self, index: usize, start: SectorId) -> Result<()> {
        if index >= self.capacity {
            return Err(Error::FileTooLarge);
        }
        let addr = u32::try_from(start.raw()).map_err(|_| Error::NoSpace)?;
        if self.blocks.len() <= index {
            self.blocks.resize(index + 1, 0);
        }
        self.blocks[index] = addr;
        Ok(())
    }

    /// 已映射的块数
    pub fn mapped_blocks(&self) -> usize {
        self.blocks.iter().filter(|&&addr| addr != 0).count()
    }
}

impl From<InodeKind> for DirEntryType {
    #[inline]
    fn from(kind: InodeKind) -> Self {
        match kind {
            InodeKind::Directory => Self::Directory,
            InodeKind::None | InodeKind::Regular => Self::Regular,
        }
    }
}

/// inode 的持久化服务
pub trait InodeStore {
    /// inode 区域的起始扇区
    fn area_start(&self) -> SectorId;

    /// inode 区域占用的扇区数
    fn area_sectors(&self) -> usize;

    /// 合法编号的上界（不含）
    fn max_inodes(&self) -> u32;

    /// 在`number`处写入一条全新的记录
    fn create(&self, dev: &Arc<dyn BlockDevice>, number: u32, kind: InodeKind) -> Result<Inode>;

    /// 未使用的记录返回空
    fn load(&self, dev: &Arc<dyn BlockDevice>, number: u32) -> Result<Option<Inode>>;

    fn save(&self, dev: &Arc<dyn BlockDevice>, inode: &Inode) -> Result<()>;
}

/// 以定长记录形式存放在 inode 区域的 inode
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskInodeStore;

impl DiskInodeStore {
    /// 通过编号获取 inode 在磁盘上的位置：**扇区号**以及**扇区内偏移**
    fn disk_inode_pos(&self, number: u32) -> Result<(SectorId, usize)> {
        if number == 0 || number >= self.max_inodes() {
            return Err(Error::NotFound);
        }
        let number = number as usize;
        Ok((
            INODE_AREA_START + number / INODES_PER_SECTOR,
            number % INODES_PER_SECTOR * INODE_SIZE,
        ))
    }
}

impl InodeStore for DiskInodeStore {
    #[inline]
    fn area_start(&self) -> SectorId {
        INODE_AREA_START
    }

    #[inline]
    fn area_sectors(&self) -> usize {
        INODE_AREA_SECTORS
    }

    #[inline]
    fn max_inodes(&self) -> u32 {
        (INODE_AREA_SECTORS * INODES_PER_SECTOR) as u32
    }

    fn create(&self, dev: &Arc<dyn BlockDevice>, number: u32, kind: InodeKind) -> Result<Inode> {
        let inode = Inode::new(number, kind, DIRECT_COUNT);
        self.save(dev, &inode)?;
        Ok(inode)
    }

    fn load(&self, dev: &Arc<dyn BlockDevice>, number: u32) -> Result<Option<Inode>> {
        let (sid, offset) = self.disk_inode_pos(number)?;
        let mut buf: Sector = [0; SECTOR_SIZE];
        dev.read_sector(sid, &mut buf)?;
        let disk_inode = DiskInode::from_bytes(&buf[offset..offset + INODE_SIZE]);

        let kind = match disk_inode.kind {
            1 => InodeKind::Regular,
            2 => InodeKind::Directory,
            0 => return Ok(None),
            other => {
                log::warn!("inode {number} has unknown kind {other}, treated as unused");
                return Ok(None);
            }
        };
        let block_count = (disk_inode.block_count as usize).min(DIRECT_COUNT);

        Ok(Some(Inode {
            number,
            kind,
            size: disk_inode.size as usize,
            blocks: disk_inode.direct[..block_count].to_vec(),
            capacity: DIRECT_COUNT,
        }))
    }

    fn save(&self, dev: &Arc<dyn BlockDevice>, inode: &Inode) -> Result<()> {
        let (sid, offset) = self.disk_inode_pos(inode.number)?;
        let size = u32::try_from(inode.size).map_err(|_| Error::FileTooLarge)?;
        let mut direct = [0; DIRECT_COUNT];
        let block_count = inode.blocks.len().min(DIRECT_COUNT);
        direct[..block_count].copy_from_slice(&inode.blocks[..block_count]);
        let disk_inode = DiskInode {
            kind: inode.kind as u32,
            size,
            block_count: block_count as u32,
            direct,
        };

        // 同一扇区内还有别的 inode，先读后写
        let mut buf: Sector = [0; SECTOR_SIZE];
        dev.read_sector(sid, &mut buf)?;
        disk_inode.write_bytes(&mut buf[offset..offset + INODE_SIZE]);
        dev.write_sector(sid, &buf)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use block_dev::{BlockDevice, RamDisk, SectorId};
    use vfs::Error;

    use super::*;

    fn disk() -> Arc<dyn BlockDevice> {
        Arc::new(RamDisk::new(64))
    }

    #[test]
    fn create_load_save() {
        let dev = disk();
        let store = DiskInodeStore;

        assert_eq!(None, store.load(&dev, 9).unwrap());

        let mut inode = store.create(&dev, 9, InodeKind::Regular).unwrap();
        assert_eq!(Some(inode.clone()), store.load(&dev, 9).unwrap());

        inode.map_block(0, SectorId::new(22)).unwrap();
        inode.map_block(3, SectorId::new(30)).unwrap();
        inode.set_size(2000);
        store.save(&dev, &inode).unwrap();

        let loaded = store.load(&dev, 9).unwrap().unwrap();
        assert_eq!(inode, loaded);
        assert_eq!(Some(SectorId::new(22)), loaded.block(0));
        assert_eq!(None, loaded.block(1));
        assert_eq!(Some(SectorId::new(30)), loaded.block(3));
        assert_eq!(None, loaded.block(4));
        assert_eq!(2, loaded.mapped_blocks());
    }

    #[test]
    fn neighbours_untouched() {
        let dev = disk();
        let store = DiskInodeStore;
        // 8 与 9 同处一个扇区
        store.create(&dev, 8, InodeKind::Directory).unwrap();
        store.create(&dev, 9, InodeKind::Regular).unwrap();
        assert!(store.load(&dev, 8).unwrap().unwrap().is_dir());
        assert_eq!(
            InodeKind::Regular,
            store.load(&dev, 9).unwrap().unwrap().kind()
        );
    }

    #[test]
    fn number_bounds() {
        let dev = disk();
        let store = DiskInodeStore;
        assert_eq!(Err(Error::NotFound), store.load(&dev, 0));
        assert_eq!(Err(Error::NotFound), store.load(&dev, store.max_inodes()));
        assert!(store.load(&dev, store.max_inodes() - 1).is_ok());
    }

    #[test]
    fn block_map_capacity() {
        let mut inode = Inode::new(2, InodeKind::Regular, DIRECT_COUNT);
        assert!(inode.map_block(DIRECT_COUNT - 1, SectorId::new(40)).is_ok());
        assert_eq!(
            Err(Error::FileTooLarge),
            inode.map_block(DIRECT_COUNT, SectorId::new(41))
        );
    }
}
