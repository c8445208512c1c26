use crate::DirEntryType;

/// 打开的文件或目录的元数据快照
#[derive(Debug, Clone, PartialEq, Eq)]
#[repr(C, align(32))]
pub struct Stat {
    pub mode: DirEntryType,
    /// 每块的字节量（扇区数 × 扇区字节量）
    pub block_size: u64,
    /// 已映射的块数，空洞不计
    pub blocks: u64,
    /// 文件字节数
    pub size: u64,
}
