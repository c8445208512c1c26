use alloc::vec;
use alloc::vec::Vec;

use spin::Mutex;

use crate::{BlockDevice, Error, SECTOR_SIZE, SectorId};

/// 内存中的磁盘，内容随实例销毁
#[derive(Debug)]
pub struct RamDisk {
    inner: Mutex<RamDiskInner>,
    num_sectors: usize,
}

#[derive(Debug)]
struct RamDiskInner {
    data: Vec<u8>,
    /// 再过多少次读取后注入一次失败
    read_fault: Option<usize>,
    /// 再过多少次写入后注入一次失败
    write_fault: Option<usize>,
}

/// 倒数到0时触发并撤销
fn trip(fault: &mut Option<usize>) -> bool {
    match *fault {
        Some(0) => {
            *fault = None;
            true
        }
        Some(n) => {
            *fault = Some(n - 1);
            false
        }
        None => false,
    }
}

impl RamDisk {
    pub fn new(num_sectors: usize) -> Self {
        Self {
            inner: Mutex::new(RamDiskInner {
                data: vec![0; num_sectors * SECTOR_SIZE],
                read_fault: None,
                write_fault: None,
            }),
            num_sectors,
        }
    }

    /// 让之后第`nth`次读取（从0数起）报一次[`Error::Io`]
    pub fn fail_read(&self, nth: usize) {
        self.inner.lock().read_fault = Some(nth);
    }

    /// 让之后第`nth`次写入（从0数起）报一次[`Error::Io`]
    pub fn fail_write(&self, nth: usize) {
        self.inner.lock().write_fault = Some(nth);
    }

    /// 撤销尚未触发的故障
    pub fn heal(&self) {
        let mut inner = self.inner.lock();
        inner.read_fault = None;
        inner.write_fault = None;
    }

    fn check(&self, id: SectorId, len: usize) -> Result<(), Error> {
        if id.raw() >= self.num_sectors {
            return Err(Error::OutOfRange(id));
        }
        if len != SECTOR_SIZE {
            return Err(Error::BadBuffer(len));
        }
        Ok(())
    }
}

impl BlockDevice for RamDisk {
    fn read_sector(&self, id: SectorId, buf: &mut [u8]) -> Result<(), Error> {
        self.check(id, buf.len())?;
        let start = id.byte_offset();
        let mut inner = self.inner.lock();
        if trip(&mut inner.read_fault) {
            return Err(Error::Io);
        }
        buf.copy_from_slice(&inner.data[start..start + SECTOR_SIZE]);
        Ok(())
    }

    fn write_sector(&self, id: SectorId, buf: &[u8]) -> Result<(), Error> {
        self.check(id, buf.len())?;
        let start = id.byte_offset();
        let mut inner = self.inner.lock();
        if trip(&mut inner.write_fault) {
            return Err(Error::Io);
        }
        inner.data[start..start + SECTOR_SIZE].copy_from_slice(buf);
        Ok(())
    }

    #[inline]
    fn num_sectors(&self) -> usize {
        self.num_sectors
    }
}
