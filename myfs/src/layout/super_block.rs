use alloc::sync::Arc;

use block_dev::{BlockDevice, SECTOR_SIZE};

use crate::{MAGIC, Result, SUPERBLOCK_SECTOR, Sector};

/// 超级块：
/// - 提供文件系统合法性校验；
/// - 记录块大小与下一个从未分配过的块
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperBlock {
    /// 魔数：用于校验文件系统合法性
    pub magic: u32,
    /// 一个块包含的扇区数
    pub block_size: u32,
    /// 可用块数
    pub num_blocks: u32,
    /// 下一个空闲块的起始扇区，只增不减
    pub free_block_start: u32,
}

impl SuperBlock {
    #[inline]
    pub fn new(block_size: u32, num_blocks: u32, free_block_start: u32) -> Self {
        Self {
            magic: MAGIC,
            block_size,
            num_blocks,
            free_block_start,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC
    }

    /// 一个块的字节量
    #[inline]
    pub fn block_bytes(&self) -> usize {
        self.block_size as usize * SECTOR_SIZE
    }

    /// 读出超级块，不做校验
    pub fn load(dev: &Arc<dyn BlockDevice>) -> Result<Self> {
        let mut buf: Sector = [0; SECTOR_SIZE];
        dev.read_sector(SUPERBLOCK_SECTOR, &mut buf)?;
        Ok(Self::from_bytes(&buf))
    }

    /// 无条件覆盖磁盘上的超级块
    pub fn save(&self, dev: &Arc<dyn BlockDevice>) -> Result<()> {
        let mut buf: Sector = [0; SECTOR_SIZE];
        self.write_bytes(&mut buf);
        dev.write_sector(SUPERBLOCK_SECTOR, &buf)?;
        Ok(())
    }

    fn from_bytes(buf: &Sector) -> Self {
        let field = |at: usize| u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);
        Self {
            magic: field(0),
            block_size: field(4),
            num_blocks: field(8),
            free_block_start: field(12),
        }
    }

    fn write_bytes(&self, buf: &mut Sector) {
        buf.fill(0);
        buf[0..4].copy_from_slice(&self.magic.to_le_bytes());
        buf[4..8].copy_from_slice(&self.block_size.to_le_bytes());
        buf[8..12].copy_from_slice(&self.num_blocks.to_le_bytes());
        buf[12..16].copy_from_slice(&self.free_block_start.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use block_dev::{BlockDevice, RamDisk, SECTOR_SIZE};

    use super::SuperBlock;
    use crate::{MAGIC, SUPERBLOCK_SECTOR};

    #[test]
    fn save_then_load() {
        let dev: Arc<dyn BlockDevice> = Arc::new(RamDisk::new(8));
        for sb in [
            SuperBlock::new(1, 178, 22),
            SuperBlock::new(8, 3, 46),
            SuperBlock {
                magic: 0xDEAD_BEEF,
                block_size: u32::MAX,
                num_blocks: 0,
                free_block_start: u32::MAX,
            },
        ] {
            sb.save(&dev).unwrap();
            assert_eq!(sb, SuperBlock::load(&dev).unwrap());
        }
    }

    #[test]
    fn little_endian_layout() {
        let dev: Arc<dyn BlockDevice> = Arc::new(RamDisk::new(4));
        SuperBlock::new(2, 7, 22).save(&dev).unwrap();

        let mut raw = [0xFFu8; SECTOR_SIZE];
        dev.read_sector(SUPERBLOCK_SECTOR, &mut raw).unwrap();
        assert_eq!(MAGIC.to_le_bytes(), raw[0..4]);
        assert_eq!([2, 0, 0, 0], raw[4..8]);
        assert_eq!([7, 0, 0, 0], raw[8..12]);
        assert_eq!([22, 0, 0, 0], raw[12..16]);
        assert!(raw[16..].iter().all(|&b| b == 0));
    }

    #[test]
    fn blank_sector_is_not_valid() {
        let dev: Arc<dyn BlockDevice> = Arc::new(RamDisk::new(4));
        assert!(!SuperBlock::load(&dev).unwrap().is_valid());
    }
}
