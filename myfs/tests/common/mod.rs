//! Common utilities for tests

#![allow(dead_code)]

use std::sync::Arc;

use block_dev::{BlockDevice, RamDisk};
use myfs::MyFileSystem;
use vfs::{FileSystem, MountIntent};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A freshly formatted and mounted RAM disk.
pub fn formatted(sectors: usize, block_size: u32) -> (Arc<RamDisk>, Arc<dyn BlockDevice>, MyFileSystem) {
    init_logger();
    let disk = Arc::new(RamDisk::new(sectors));
    let dev: Arc<dyn BlockDevice> = disk.clone();
    let mut fs = MyFileSystem::new();
    fs.format(&dev, block_size).unwrap();
    fs.mount(&dev, MountIntent::Mount).unwrap();
    (disk, dev, fs)
}

/// Deterministic non-repeating-ish payload.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}
