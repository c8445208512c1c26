use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Mutex;

use block_dev::{BlockDevice, Error, SECTOR_SIZE, SectorId};

/// 以宿主机上的镜像文件充当块设备
#[derive(Debug)]
pub struct BlockFile {
    inner: Mutex<File>,
    num_sectors: usize,
}

impl BlockFile {
    /// 扇区数由文件长度决定，末尾不足一扇区的部分不可用
    pub fn new(file: File) -> io::Result<Self> {
        let len = file.metadata()?.len();
        Ok(Self {
            inner: Mutex::new(file),
            num_sectors: (len / SECTOR_SIZE as u64) as usize,
        })
    }

    fn locate(&self, id: SectorId, len: usize) -> Result<u64, Error> {
        if id.raw() >= self.num_sectors {
            return Err(Error::OutOfRange(id));
        }
        if len != SECTOR_SIZE {
            return Err(Error::BadBuffer(len));
        }
        Ok(id.byte_offset() as u64)
    }

    fn access(
        &self,
        offset: u64,
        op: impl FnOnce(&mut File) -> io::Result<()>,
    ) -> Result<(), Error> {
        let mut file = self.inner.lock().map_err(|_| {
            log::error!("image file lock poisoned");
            Error::Io
        })?;
        file.seek(SeekFrom::Start(offset))
            .and_then(|_| op(&mut file))
            .map_err(|e| {
                log::error!("image I/O at byte {offset}: {e}");
                Error::Io
            })
    }
}

impl BlockDevice for BlockFile {
    fn read_sector(&self, id: SectorId, buf: &mut [u8]) -> Result<(), Error> {
        let offset = self.locate(id, buf.len())?;
        self.access(offset, |file| file.read_exact(buf))
    }

    fn write_sector(&self, id: SectorId, buf: &[u8]) -> Result<(), Error> {
        let offset = self.locate(id, buf.len())?;
        self.access(offset, |file| file.write_all(buf))
    }

    #[inline]
    fn num_sectors(&self) -> usize {
        self.num_sectors
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{self, OpenOptions};

    use super::*;

    #[test]
    fn image_file_sectors() {
        let path = std::env::temp_dir().join(format!("myfs-block-file-{}.img", std::process::id()));
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .unwrap();
        file.set_len(4 * SECTOR_SIZE as u64 + 100).unwrap();

        let dev = BlockFile::new(file).unwrap();
        assert_eq!(4, dev.num_sectors());

        let sector = [0x5Au8; SECTOR_SIZE];
        dev.write_sector(SectorId::new(2), &sector).unwrap();
        let mut out = [0u8; SECTOR_SIZE];
        dev.read_sector(SectorId::new(2), &mut out).unwrap();
        assert_eq!(sector, out);
        dev.read_sector(SectorId::new(3), &mut out).unwrap();
        assert!(out.iter().all(|&b| b == 0));

        assert_eq!(
            Err(Error::OutOfRange(SectorId::new(4))),
            dev.read_sector(SectorId::new(4), &mut out)
        );
        assert_eq!(Err(Error::BadBuffer(3)), dev.write_sector(SectorId::new(0), &[0; 3]));

        drop(dev);
        fs::remove_file(path).unwrap();
    }
}
