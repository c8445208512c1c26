mod block_file;
mod cli;

use std::error::Error;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use block_dev::{BlockDevice, SECTOR_SIZE};
use clap::Parser;
use myfs::MyFileSystem;
use vfs::{DirEntry, FileSystem, MountIntent};

use self::{
    block_file::BlockFile,
    cli::{Cli, Command, Geometry},
};

type Result<T> = std::result::Result<T, Box<dyn Error>>;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut fs = MyFileSystem::new();

    match cli.command {
        Command::Format { geometry } => {
            let dev = create_image(&cli.image, &geometry)?;
            let blocks = fs.format(&dev, geometry.block_size)?;
            println!("{}: {blocks} blocks", cli.image.display());
        }
        Command::Pack { geometry, source } => {
            let dev = create_image(&cli.image, &geometry)?;
            fs.format(&dev, geometry.block_size)?;
            fs.mount(&dev, MountIntent::Mount)?;

            for entry in fs::read_dir(&source)? {
                let entry = entry?;
                if !entry.file_type()?.is_file() {
                    continue;
                }
                let name = entry.file_name().into_string().map_err(|name| {
                    io::Error::other(format!("non UTF-8 file name {name:?}"))
                })?;
                let data = fs::read(entry.path())?;
                put(&mut fs, &dev, &name, &data)?;
                log::info!("packed {name:?} ({} bytes)", data.len());
            }

            fs.mount(&dev, MountIntent::Unmount)?;
        }
        Command::Ls => {
            let dev = open_image(&cli.image)?;
            fs.mount(&dev, MountIntent::Mount)?;
            for entry in list(&mut fs, &dev)? {
                println!("{:>4} {:?} {}", entry.inode, entry.ty, entry.name);
            }
        }
        Command::Cat { name } => {
            let dev = open_image(&cli.image)?;
            fs.mount(&dev, MountIntent::Mount)?;
            // `open` 会创建不存在的文件
            if !list(&mut fs, &dev)?.iter().any(|entry| entry.name == name) {
                return Err(format!("{name}: no such file").into());
            }

            let fd = fs.open(&dev, &name)?;
            let mut stdout = io::stdout().lock();
            let mut buf = [0u8; 4 * SECTOR_SIZE];
            loop {
                let read = fs.read(fd, &mut buf)?;
                if read == 0 {
                    break;
                }
                stdout.write_all(&buf[..read])?;
            }
            fs.close(fd)?;
        }
        Command::Put { source, name } => {
            let name = match name {
                Some(name) => name,
                None => source
                    .file_name()
                    .and_then(|name| name.to_str())
                    .ok_or("cannot derive a file name from the source path")?
                    .to_owned(),
            };
            let dev = open_image(&cli.image)?;
            fs.mount(&dev, MountIntent::Mount)?;
            put(&mut fs, &dev, &name, &fs::read(&source)?)?;
            fs.mount(&dev, MountIntent::Unmount)?;
        }
    }

    Ok(())
}

fn create_image(path: &Path, geometry: &Geometry) -> Result<Arc<dyn BlockDevice>> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.set_len(geometry.sectors * SECTOR_SIZE as u64)?;
    Ok(Arc::new(BlockFile::new(file)?))
}

fn open_image(path: &Path) -> Result<Arc<dyn BlockDevice>> {
    let file = OpenOptions::new().read(true).write(true).open(path)?;
    Ok(Arc::new(BlockFile::new(file)?))
}

/// 新建文件并写入全部内容。文件系统不能截断文件，已存在的名字直接拒绝
fn put(fs: &mut MyFileSystem, dev: &Arc<dyn BlockDevice>, name: &str, data: &[u8]) -> Result<()> {
    // 按目录中存放的（可能截断的）形式比较
    let stored = myfs::DirEntry::new(name, 0);
    if list(fs, dev)?.iter().any(|entry| stored.name() == Some(entry.name.as_str())) {
        return Err(format!("{name}: already exists").into());
    }
    store(fs, dev, name, data)
}

/// 从头写入整个文件；写入被截断时报错
fn store(fs: &mut MyFileSystem, dev: &Arc<dyn BlockDevice>, name: &str, data: &[u8]) -> Result<()> {
    let fd = fs.open(dev, name)?;
    let mut done = 0;
    while done < data.len() {
        let written = fs.write(fd, &data[done..])?;
        if written == 0 {
            break;
        }
        done += written;
    }
    fs.close(fd)?;

    if done < data.len() {
        return Err(format!("{name}: only {done} of {} bytes stored", data.len()).into());
    }
    Ok(())
}

fn list(fs: &mut MyFileSystem, dev: &Arc<dyn BlockDevice>) -> Result<Vec<DirEntry>> {
    let dir = fs.open_dir(dev, "/")?;
    let mut entries = Vec::new();
    while let Some(entry) = fs.read_dir(dir)? {
        entries.push(entry);
    }
    fs.close_dir(dir)?;
    Ok(entries)
}
