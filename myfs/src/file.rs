//! # 打开文件表
//!
//! 定长的槽位表，每个占用的槽位把描述符绑定到 inode、游标与所属设备。
//! 槽位只有空闲与打开两种状态。

use alloc::sync::Arc;
use alloc::vec::Vec;

use block_dev::BlockDevice;
use vfs::{DirEntryType, Error, Fd};

use crate::{Inode, Result};

/// 表示一次打开的文件或目录
#[derive(Debug)]
pub struct OpenFile {
    pub inode: Inode,
    /// 相对文件开头的字节偏移
    pub offset: usize,
    pub dev: Arc<dyn BlockDevice>,
    pub kind: DirEntryType,
}

impl OpenFile {
    #[inline]
    pub fn new(inode: Inode, dev: Arc<dyn BlockDevice>, kind: DirEntryType) -> Self {
        Self {
            inode,
            offset: 0,
            dev,
            kind,
        }
    }

    /// 是否属于设备`dev`
    #[inline]
    pub fn on(&self, dev: &Arc<dyn BlockDevice>) -> bool {
        same_device(&self.dev, dev)
    }
}

#[derive(Debug)]
pub struct FileTable {
    slots: Vec<Option<OpenFile>>,
}

impl FileTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    #[inline]
    pub fn has_vacancy(&self) -> bool {
        self.slots.iter().any(Option::is_none)
    }

    /// 放入空槽位并返回描述符
    pub fn insert(&mut self, file: OpenFile) -> Result<Fd> {
        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(Error::NoFreeDescriptor)?;
        self.slots[index] = Some(file);
        Ok(Fd::from_slot(index))
    }

    pub fn get_mut(&mut self, fd: Fd) -> Result<&mut OpenFile> {
        self.slots
            .get_mut(fd.slot())
            .and_then(Option::as_mut)
            .ok_or(Error::BadDescriptor)
    }

    /// 释放槽位。描述符超出表的范围时报错，槽位本就空闲时返回空
    pub fn remove(&mut self, fd: Fd) -> Result<Option<OpenFile>> {
        self.slots
            .get_mut(fd.slot())
            .map(Option::take)
            .ok_or(Error::BadDescriptor)
    }

    /// 丢弃全部槽位的内容
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    /// 设备上没有打开的文件
    pub fn is_idle(&self, dev: &Arc<dyn BlockDevice>) -> bool {
        !self.slots.iter().flatten().any(|file| file.on(dev))
    }
}

/// 只比较数据指针，同一设备经不同虚表转换仍视为同一个
fn same_device(a: &Arc<dyn BlockDevice>, b: &Arc<dyn BlockDevice>) -> bool {
    Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use block_dev::{BlockDevice, RamDisk};
    use vfs::{DirEntryType, Error, Fd};

    use super::{FileTable, OpenFile};
    use crate::{Inode, InodeKind};

    fn open(dev: &Arc<dyn BlockDevice>) -> OpenFile {
        OpenFile::new(
            Inode::new(2, InodeKind::Regular, 13),
            dev.clone(),
            DirEntryType::Regular,
        )
    }

    #[test]
    fn bounded() {
        let dev: Arc<dyn BlockDevice> = Arc::new(RamDisk::new(1));
        let mut table = FileTable::new(2);

        let a = table.insert(open(&dev)).unwrap();
        let b = table.insert(open(&dev)).unwrap();
        assert_eq!((1, 2), (a.raw(), b.raw()));
        assert!(!table.has_vacancy());
        assert_eq!(Err(Error::NoFreeDescriptor), table.insert(open(&dev)).map(|_| ()));

        assert!(table.remove(a).unwrap().is_some());
        assert_eq!(a, table.insert(open(&dev)).unwrap());
    }

    #[test]
    fn descriptor_checks() {
        let dev: Arc<dyn BlockDevice> = Arc::new(RamDisk::new(1));
        let mut table = FileTable::new(2);
        let fd = table.insert(open(&dev)).unwrap();

        let outside = Fd::new(3).unwrap();
        assert!(matches!(table.get_mut(outside), Err(Error::BadDescriptor)));
        assert!(matches!(table.remove(outside), Err(Error::BadDescriptor)));

        let vacant = Fd::new(2).unwrap();
        assert!(matches!(table.get_mut(vacant), Err(Error::BadDescriptor)));
        assert!(matches!(table.remove(vacant), Ok(None)));

        table.get_mut(fd).unwrap().offset = 7;
        assert_eq!(7, table.get_mut(fd).unwrap().offset);
    }

    #[test]
    fn idle_per_device() {
        let dev_a: Arc<dyn BlockDevice> = Arc::new(RamDisk::new(1));
        let dev_b: Arc<dyn BlockDevice> = Arc::new(RamDisk::new(1));
        let mut table = FileTable::new(4);
        assert!(table.is_idle(&dev_a));

        let fd = table.insert(open(&dev_a)).unwrap();
        assert!(!table.is_idle(&dev_a));
        assert!(table.is_idle(&dev_b));

        table.remove(fd).unwrap();
        assert!(table.is_idle(&dev_a));

        table.insert(open(&dev_b)).unwrap();
        table.clear();
        assert!(table.is_idle(&dev_b));
    }
}
