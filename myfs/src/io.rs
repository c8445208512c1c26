//! # 字节流层
//!
//! 把 inode 内的字节范围换算为扇区读写：
//!
//! - 块索引 = 偏移 / 块字节量，块内偏移 = 偏移 % 块字节量；
//! - 扇区号 = 块起始扇区 + 块内偏移 / 扇区字节量；
//! - 不满一扇区的写入先读出整个扇区再写回，不破坏相邻字节；
//! - 文件大小以内未映射的块读出全 0。
//!
//! 设备中途出错时停止传输：已有字节传输则返回部分字节数，否则返回错误。

use alloc::sync::Arc;

use block_dev::{BlockDevice, SECTOR_SIZE, SectorId};
use vfs::Error;

use crate::{Inode, InodeStore, Result, Sector, SuperBlock, allocator};

/// 从`offset`处读取，最多读到文件末尾
pub fn read_at(
    dev: &Arc<dyn BlockDevice>,
    sb: &SuperBlock,
    inode: &Inode,
    offset: usize,
    buf: &mut [u8],
) -> Result<usize> {
    let block_bytes = sb.block_bytes();
    let end = offset.saturating_add(buf.len()).min(inode.size()); // exclusive

    if offset >= end {
        return Ok(0);
    }

    let mut sector: Sector = [0; SECTOR_SIZE];
    let mut pos = offset;
    while pos < end {
        let (block_index, block_offset) = (pos / block_bytes, pos % block_bytes);
        let in_sector = block_offset % SECTOR_SIZE;
        let len = (SECTOR_SIZE - in_sector).min(end - pos);
        let dst = &mut buf[pos - offset..pos - offset + len];

        match inode.block(block_index) {
            Some(start) => {
                let sid = start + block_offset / SECTOR_SIZE;
                if let Err(e) = dev.read_sector(sid, &mut sector) {
                    return interrupted(pos - offset, e.into());
                }
                dst.copy_from_slice(&sector[in_sector..in_sector + len]);
            }
            // 空洞
            None => dst.fill(0),
        }
        pos += len;
    }

    Ok(end - offset)
}

/// 从`offset`处写入，文件随之增长，结束后保存一次 inode
pub fn write_at<S: InodeStore + ?Sized>(
    dev: &Arc<dyn BlockDevice>,
    sb: &mut SuperBlock,
    store: &S,
    inode: &mut Inode,
    offset: usize,
    buf: &[u8],
) -> Result<usize> {
    let block_bytes = sb.block_bytes();

    let mut sector: Sector = [0; SECTOR_SIZE];
    let mut written = 0;
    let mut failure = None;
    while written < buf.len() {
        let pos = offset + written;
        let (block_index, block_offset) = (pos / block_bytes, pos % block_bytes);
        let in_sector = block_offset % SECTOR_SIZE;
        let len = (SECTOR_SIZE - in_sector).min(buf.len() - written);

        let start = match block_or_alloc(dev, sb, inode, block_index) {
            Ok(start) => start,
            Err(e) => {
                failure = Some(e);
                break;
            }
        };
        let sid = start + block_offset / SECTOR_SIZE;

        // 整扇区覆盖时无需先读
        if len < SECTOR_SIZE {
            if let Err(e) = dev.read_sector(sid, &mut sector) {
                failure = Some(e.into());
                break;
            }
        }
        sector[in_sector..in_sector + len].copy_from_slice(&buf[written..written + len]);
        if let Err(e) = dev.write_sector(sid, &sector) {
            failure = Some(e.into());
            break;
        }

        written += len;
        if pos + len > inode.size() {
            inode.set_size(pos + len);
        }
    }

    store.save(dev, inode)?;

    match failure {
        None => Ok(written),
        Some(e) => interrupted(written, e),
    }
}

/// 解析逻辑块，未映射时分配新块并绑定
fn block_or_alloc(
    dev: &Arc<dyn BlockDevice>,
    sb: &mut SuperBlock,
    inode: &mut Inode,
    block_index: usize,
) -> Result<SectorId> {
    if let Some(start) = inode.block(block_index) {
        return Ok(start);
    }
    // 先确认映射放得下，避免白白消耗一个块
    if block_index >= inode.capacity() {
        return Err(Error::FileTooLarge);
    }
    let start = allocator::alloc(sb, dev)?;
    inode.map_block(block_index, start)?;
    Ok(start)
}

fn interrupted(done: usize, e: Error) -> Result<usize> {
    if done == 0 {
        Err(e)
    } else {
        log::warn!("transfer stopped after {done} bytes: {e}");
        Ok(done)
    }
}
