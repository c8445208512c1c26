use alloc::sync::Arc;
use core::ops::Range;

use block_dev::{BlockDevice, SECTOR_SIZE, SectorId};

use crate::Result;

pub fn zeroize_sectors(dev: &Arc<dyn BlockDevice>, sectors: Range<SectorId>) -> Result<()> {
    let zero = [0u8; SECTOR_SIZE];
    for sid in (sectors.start.raw()..sectors.end.raw()).map(SectorId::new) {
        dev.write_sector(sid, &zero)?;
    }
    Ok(())
}
