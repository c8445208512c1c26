use derive_more::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Error {
    /// 卷上的魔数不匹配
    #[display(fmt = "bad magic number")]
    BadMagic,
    /// 路径不是受支持的扁平形式
    #[display(fmt = "invalid path")]
    InvalidPath,
    #[display(fmt = "invalid block size")]
    InvalidBlockSize,
    /// 打开文件表已满
    #[display(fmt = "no free descriptor")]
    NoFreeDescriptor,
    /// 搜索上限内没有空闲的inode
    #[display(fmt = "no free inode")]
    NoFreeInode,
    #[display(fmt = "bad descriptor")]
    BadDescriptor,
    #[display(fmt = "not found")]
    NotFound,
    #[display(fmt = "not a directory")]
    NotADirectory,
    #[display(fmt = "is a directory")]
    IsADirectory,
    /// 块映射已满
    #[display(fmt = "file too large")]
    FileTooLarge,
    /// 设备上没有可分配的块
    #[display(fmt = "no space left on device")]
    NoSpace,
    /// 设备上仍有打开的描述符
    #[display(fmt = "device busy")]
    Busy,
    #[display(fmt = "unsupported operation")]
    Unsupported,
    #[display(fmt = "{}", _0)]
    Io(block_dev::Error),
}

impl From<block_dev::Error> for Error {
    #[inline]
    fn from(e: block_dev::Error) -> Self {
        Self::Io(e)
    }
}

impl core::error::Error for Error {}
