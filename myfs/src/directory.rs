//! # 目录层
//!
//! 只有一个根目录，内容是只追加的 [`DirEntry`] 序列，
//! 通过与普通文件相同的字节流读写。
//! 同名项不去重，查找总是返回第一个匹配项。

use alloc::sync::Arc;

use block_dev::BlockDevice;
use vfs::Error;

use crate::{DirEntry, Inode, InodeStore, ROOT_INODE, Result, SuperBlock, io};

fn root<S: InodeStore + ?Sized>(dev: &Arc<dyn BlockDevice>, store: &S) -> Result<Inode> {
    store.load(dev, ROOT_INODE)?.ok_or(Error::NotFound)
}

/// 在根目录中查找名字对应的 inode 编号
pub fn lookup<S: InodeStore + ?Sized>(
    dev: &Arc<dyn BlockDevice>,
    sb: &SuperBlock,
    store: &S,
    name: &str,
) -> Result<Option<u32>> {
    let root = root(dev, store)?;
    let target = DirEntry::new(name, 0);

    let mut cursor = 0;
    while let Some(dirent) = next_entry(dev, sb, &root, &mut cursor)? {
        if dirent.same_name(&target) {
            return Ok(Some(dirent.inode_id()));
        }
    }

    Ok(None)
}

/// 在根目录末尾追加目录项
pub fn append<S: InodeStore + ?Sized>(
    dev: &Arc<dyn BlockDevice>,
    sb: &mut SuperBlock,
    store: &S,
    name: &str,
    inode_id: u32,
) -> Result<()> {
    let mut root = root(dev, store)?;
    let end = root.size();
    let dirent = DirEntry::new(name, inode_id);

    let written = io::write_at(dev, sb, store, &mut root, end, dirent.as_bytes())?;
    if written < DirEntry::SIZE {
        // 残缺的目录项会让后续项全部错位
        root.set_size(end);
        store.save(dev, &root)?;
        return Err(Error::Io(block_dev::Error::Io));
    }

    log::debug!("link {name:?} -> inode {inode_id} at offset {end}");
    Ok(())
}

/// 从`cursor`处向后读取下一个有效目录项，跳过空槽；
/// 读到目录末尾时返回空
pub fn next_entry(
    dev: &Arc<dyn BlockDevice>,
    sb: &SuperBlock,
    dir: &Inode,
    cursor: &mut usize,
) -> Result<Option<DirEntry>> {
    let mut dirent = DirEntry::default();
    loop {
        let read = io::read_at(dev, sb, dir, *cursor, dirent.as_bytes_mut())?;
        if read < DirEntry::SIZE {
            return Ok(None);
        }
        *cursor += DirEntry::SIZE;
        if !dirent.is_free() {
            return Ok(Some(dirent));
        }
    }
}
