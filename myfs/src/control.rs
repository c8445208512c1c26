use alloc::string::String;
use alloc::sync::Arc;

use block_dev::BlockDevice;
use vfs::{DirEntryType, Error, Fd, FileSystem, MountIntent, Stat};

use crate::file::{FileTable, OpenFile};
use crate::util::zeroize_sectors;
use crate::{DiskInodeStore, InodeKind, InodeStore, Result, SuperBlock};
use crate::{FS_ID, FS_NAME, MAX_OPEN_FILES, ROOT_INODE, directory, io};

/// 一次文件系统会话：持有 inode 存储与打开文件表。
///
/// 超级块不做缓存，每个操作开始时都从设备重新读取。
/// 所有操作都需要调用方串行执行。
#[derive(Debug)]
pub struct MyFileSystem<S = DiskInodeStore> {
    store: S,
    files: FileTable,
}

impl MyFileSystem {
    pub fn new() -> Self {
        Self::with_store(DiskInodeStore)
    }
}

impl Default for MyFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: InodeStore> MyFileSystem<S> {
    pub fn with_store(store: S) -> Self {
        Self {
            store,
            files: FileTable::new(MAX_OPEN_FILES),
        }
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// 从2号开始寻找未使用的 inode 编号
    fn free_inode(&self, dev: &Arc<dyn BlockDevice>) -> Result<u32> {
        for number in ROOT_INODE + 1..self.store.max_inodes() {
            if self.store.load(dev, number)?.is_none() {
                return Ok(number);
            }
        }
        Err(Error::NoFreeInode)
    }
}

/// 以磁盘上的 inode 为准刷新句柄；同一文件可能被多个描述符修改过
fn refresh<S: InodeStore>(store: &S, file: &mut OpenFile) -> Result<()> {
    file.inode = store
        .load(&file.dev, file.inode.number())?
        .ok_or(Error::NotFound)?;
    Ok(())
}

/// 去掉一个前导`/`，只接受根目录下的名字
fn file_name(path: &str) -> Result<&str> {
    let name = path.strip_prefix('/').unwrap_or(path);
    check_name(name)?;
    Ok(name)
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['/', '\0']) {
        log::error!("unsupported path component {name:?}");
        return Err(Error::InvalidPath);
    }
    Ok(())
}

impl<S: InodeStore> FileSystem for MyFileSystem<S> {
    #[inline]
    fn id(&self) -> u32 {
        FS_ID
    }

    #[inline]
    fn name(&self) -> &'static str {
        FS_NAME
    }

    fn is_idle(&self, dev: &Arc<dyn BlockDevice>) -> bool {
        self.files.is_idle(dev)
    }

    fn format(&mut self, dev: &Arc<dyn BlockDevice>, block_size: u32) -> Result<u32> {
        if block_size == 0 {
            return Err(Error::InvalidBlockSize);
        }
        if !self.is_idle(dev) {
            return Err(Error::Busy);
        }

        let area_start = self.store.area_start();
        let data_start = area_start + self.store.area_sectors();
        let num_blocks = dev
            .num_sectors()
            .checked_sub(data_start.raw())
            .map(|sectors| sectors / block_size as usize)
            .filter(|&blocks| blocks > 0)
            .ok_or(Error::NoSpace)?;
        let num_blocks = u32::try_from(num_blocks).map_err(|_| Error::InvalidBlockSize)?;
        let free_block_start = u32::try_from(data_start.raw()).map_err(|_| Error::NoSpace)?;

        zeroize_sectors(dev, area_start..data_start)?;
        SuperBlock::new(block_size, num_blocks, free_block_start).save(dev)?;
        self.store.create(dev, ROOT_INODE, InodeKind::Directory)?;

        log::info!("formatted: block_size={block_size} num_blocks={num_blocks}");
        Ok(num_blocks)
    }

    fn mount(&mut self, dev: &Arc<dyn BlockDevice>, intent: MountIntent) -> Result<()> {
        match intent {
            MountIntent::Mount => {
                let sb = SuperBlock::load(dev)?;
                if !sb.is_valid() {
                    log::error!("bad magic {:#010x}", sb.magic);
                    return Err(Error::BadMagic);
                }
                self.files.clear();
                log::info!(
                    "mounted: block_size={} num_blocks={} free_block_start={}",
                    sb.block_size,
                    sb.num_blocks,
                    sb.free_block_start
                );
            }
            MountIntent::Unmount => log::debug!("unmount"),
        }
        Ok(())
    }

    fn open(&mut self, dev: &Arc<dyn BlockDevice>, path: &str) -> Result<Fd> {
        let name = file_name(path)?;
        if !self.files.has_vacancy() {
            return Err(Error::NoFreeDescriptor);
        }

        let mut sb = SuperBlock::load(dev)?;
        let number = match directory::lookup(dev, &sb, &self.store, name)? {
            Some(number) => number,
            None => {
                let number = self.free_inode(dev)?;
                self.store.create(dev, number, InodeKind::Regular)?;
                if let Err(e) = directory::append(dev, &mut sb, &self.store, name, number) {
                    // 没有目录项指向它，归还
                    self.store.create(dev, number, InodeKind::None)?;
                    return Err(e);
                }
                log::debug!("created {name:?} as inode {number}");
                number
            }
        };

        let inode = self.store.load(dev, number)?.ok_or(Error::NotFound)?;
        let kind: DirEntryType = inode.kind().into();
        self.files.insert(OpenFile::new(inode, dev.clone(), kind))
    }

    fn read(&mut self, fd: Fd, buf: &mut [u8]) -> Result<usize> {
        let file = self.files.get_mut(fd)?;
        refresh(&self.store, file)?;
        let sb = SuperBlock::load(&file.dev)?;
        let read = io::read_at(&file.dev, &sb, &file.inode, file.offset, buf)?;
        file.offset += read;
        Ok(read)
    }

    fn write(&mut self, fd: Fd, buf: &[u8]) -> Result<usize> {
        let file = self.files.get_mut(fd)?;
        if file.kind == DirEntryType::Directory {
            return Err(Error::IsADirectory);
        }

        refresh(&self.store, file)?;
        let mut sb = SuperBlock::load(&file.dev)?;
        let written = io::write_at(
            &file.dev,
            &mut sb,
            &self.store,
            &mut file.inode,
            file.offset,
            buf,
        )?;
        file.offset += written;
        Ok(written)
    }

    /// 每次写入都已保存 inode，关闭只释放槽位
    fn close(&mut self, fd: Fd) -> Result<()> {
        self.files.remove(fd)?;
        Ok(())
    }

    fn open_dir(&mut self, dev: &Arc<dyn BlockDevice>, path: &str) -> Result<Fd> {
        if path != "/" {
            log::error!("only the root directory can be opened, got {path:?}");
            return Err(Error::InvalidPath);
        }
        if !self.files.has_vacancy() {
            return Err(Error::NoFreeDescriptor);
        }

        let root = self.store.load(dev, ROOT_INODE)?.ok_or(Error::NotFound)?;
        self.files
            .insert(OpenFile::new(root, dev.clone(), DirEntryType::Directory))
    }

    fn read_dir(&mut self, fd: Fd) -> Result<Option<vfs::DirEntry>> {
        let file = self.files.get_mut(fd)?;
        if file.kind != DirEntryType::Directory {
            return Err(Error::NotADirectory);
        }

        // 打开之后目录可能又追加了目录项
        refresh(&self.store, file)?;
        let sb = SuperBlock::load(&file.dev)?;

        let Some(dirent) = directory::next_entry(&file.dev, &sb, &file.inode, &mut file.offset)?
        else {
            return Ok(None);
        };

        // 目录项可能指向未使用或越界的编号
        let ty: DirEntryType = match self.store.load(&file.dev, dirent.inode_id()) {
            Ok(inode) => inode.map(|inode| inode.kind().into()).unwrap_or_default(),
            Err(Error::NotFound) => DirEntryType::default(),
            Err(e) => return Err(e),
        };

        Ok(Some(vfs::DirEntry {
            inode: dirent.inode_id().into(),
            ty,
            name: String::from_utf8_lossy(dirent.name_bytes()).into_owned(),
        }))
    }

    fn link(&mut self, fd: Fd, name: &str, inode: u32) -> Result<()> {
        let file = self.files.get_mut(fd)?;
        if file.kind != DirEntryType::Directory {
            return Err(Error::NotADirectory);
        }
        check_name(name)?;
        if inode == 0 {
            return Err(Error::NotFound);
        }

        let mut sb = SuperBlock::load(&file.dev)?;
        directory::append(&file.dev, &mut sb, &self.store, name, inode)
    }

    fn unlink(&mut self, fd: Fd, name: &str) -> Result<()> {
        self.files.get_mut(fd)?;
        log::debug!("unlink {name:?}: directory entries are never removed");
        Ok(())
    }

    fn close_dir(&mut self, fd: Fd) -> Result<()> {
        self.close(fd)
    }

    fn seek(&mut self, fd: Fd, offset: usize) -> Result<usize> {
        let file = self.files.get_mut(fd)?;
        file.offset = offset;
        Ok(offset)
    }

    fn stat(&mut self, fd: Fd) -> Result<Stat> {
        let file = self.files.get_mut(fd)?;
        refresh(&self.store, file)?;
        let sb = SuperBlock::load(&file.dev)?;
        Ok(Stat {
            mode: file.kind,
            block_size: sb.block_bytes() as u64,
            blocks: file.inode.mapped_blocks() as u64,
            size: file.inode.size() as u64,
        })
    }
}
