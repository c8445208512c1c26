//! # 块分配层
//!
//! 从超级块记录的空闲块游标处切出新块，游标只增不减，
//! 释放的块永不回收。

use alloc::sync::Arc;

use block_dev::{BlockDevice, SectorId};
use vfs::Error;

use crate::util::zeroize_sectors;
use crate::{Result, SuperBlock};

/// 分配一个新块并返回其起始扇区。
///
/// 推进后的游标写回磁盘成功后才会生效；新块会被清零。
pub fn alloc(sb: &mut SuperBlock, dev: &Arc<dyn BlockDevice>) -> Result<SectorId> {
    let start = sb.free_block_start;
    let end = start.checked_add(sb.block_size).ok_or(Error::NoSpace)?;
    if end as usize > dev.num_sectors() {
        log::warn!("no block left: free_block_start={start}");
        return Err(Error::NoSpace);
    }

    let next = SuperBlock {
        free_block_start: end,
        ..*sb
    };
    next.save(dev)?;
    *sb = next;

    let start = SectorId::new(start as usize);
    zeroize_sectors(dev, start..SectorId::new(end as usize))?;
    log::trace!("alloc block at sector {start}");

    Ok(start)
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;
    use alloc::vec::Vec;

    use block_dev::{BlockDevice, RamDisk, SectorId};
    use vfs::Error;

    use super::alloc;
    use crate::SuperBlock;

    #[test]
    fn monotonic() {
        let dev: Arc<dyn BlockDevice> = Arc::new(RamDisk::new(64));
        let mut sb = SuperBlock::new(4, 10, 22);
        sb.save(&dev).unwrap();

        let starts: Vec<SectorId> = (0..5).map(|_| alloc(&mut sb, &dev).unwrap()).collect();
        assert_eq!(
            [22, 26, 30, 34, 38].map(SectorId::new).as_slice(),
            starts.as_slice()
        );
        assert_eq!(42, sb.free_block_start);
        assert_eq!(sb, SuperBlock::load(&dev).unwrap());
    }

    #[test]
    fn exhausted() {
        let dev: Arc<dyn BlockDevice> = Arc::new(RamDisk::new(24));
        let mut sb = SuperBlock::new(1, 2, 22);
        sb.save(&dev).unwrap();

        assert!(alloc(&mut sb, &dev).is_ok());
        assert!(alloc(&mut sb, &dev).is_ok());
        assert_eq!(Err(Error::NoSpace), alloc(&mut sb, &dev));
        assert_eq!(24, SuperBlock::load(&dev).unwrap().free_block_start);
    }

    #[test]
    fn unsaved_allocation_is_not_taken() {
        let disk = Arc::new(RamDisk::new(64));
        let dev: Arc<dyn BlockDevice> = disk.clone();
        let mut sb = SuperBlock::new(1, 40, 22);
        sb.save(&dev).unwrap();

        disk.fail_write(0);
        assert!(alloc(&mut sb, &dev).is_err());
        assert_eq!(22, sb.free_block_start);
        assert_eq!(SectorId::new(22), alloc(&mut sb, &dev).unwrap());
    }
}
