//! inode 记录
//!
//! 每条记录64字节，一个扇区存放8条：
//!
//! | 偏移 | 字段                         |
//! |------|------------------------------|
//! | 0    | 类型：0 未用，1 文件，2 目录 |
//! | 4    | 文件字节数                   |
//! | 8    | 块映射长度                   |
//! | 12   | 13个块地址，0 表示未映射     |

use block_dev::SECTOR_SIZE;

pub const INODE_SIZE: usize = 64;
pub const INODES_PER_SECTOR: usize = SECTOR_SIZE / INODE_SIZE;
/// 直接索引的块地址个数
pub const DIRECT_COUNT: usize = 13;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiskInode {
    pub kind: u32,
    pub size: u32,
    pub block_count: u32,
    pub direct: [u32; DIRECT_COUNT],
}

impl DiskInode {
    pub fn from_bytes(buf: &[u8]) -> Self {
        debug_assert_eq!(INODE_SIZE, buf.len());
        let field = |nth: usize| {
            let at = nth * 4;
            u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
        };

        let mut direct = [0; DIRECT_COUNT];
        for (i, slot) in direct.iter_mut().enumerate() {
            *slot = field(3 + i);
        }

        Self {
            kind: field(0),
            size: field(1),
            block_count: field(2),
            direct,
        }
    }

    pub fn write_bytes(&self, buf: &mut [u8]) {
        debug_assert_eq!(INODE_SIZE, buf.len());
        let fields = [self.kind, self.size, self.block_count]
            .into_iter()
            .chain(self.direct);
        for (chunk, field) in buf.chunks_exact_mut(4).zip(fields) {
            chunk.copy_from_slice(&field.to_le_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_fits_slot() {
        assert_eq!(INODE_SIZE, (3 + DIRECT_COUNT) * 4);
        assert_eq!(8, INODES_PER_SECTOR);
    }

    #[test]
    fn field_offsets() {
        let mut direct = [0; DIRECT_COUNT];
        direct[0] = 22;
        direct[12] = 0x0102_0304;
        let disk_inode = DiskInode {
            kind: 2,
            size: 96,
            block_count: 13,
            direct,
        };

        let mut buf = [0u8; INODE_SIZE];
        disk_inode.write_bytes(&mut buf);
        assert_eq!([2, 0, 0, 0], buf[0..4]);
        assert_eq!([96, 0, 0, 0], buf[4..8]);
        assert_eq!([13, 0, 0, 0], buf[8..12]);
        assert_eq!([22, 0, 0, 0], buf[12..16]);
        assert_eq!([4, 3, 2, 1], buf[60..64]);

        assert_eq!(disk_inode, DiskInode::from_bytes(&buf));
    }
}
