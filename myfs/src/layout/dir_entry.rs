use core::{ptr, slice};

const NAME_MAX_LEN: usize = 27;

/// 根目录中的一项：名字到 inode 编号的绑定
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[repr(C)]
pub struct DirEntry {
    // 最后一字节留给 \0
    name: [u8; NAME_MAX_LEN + 1],
    /// 小端序的 inode 编号，0 表示空槽
    inode_id: [u8; 4],
}

impl DirEntry {
    /// 目录项大小恒为32字节
    pub const SIZE: usize = 32;

    /// 名字过长时按字符边界截断
    pub fn new(name: &str, inode_id: u32) -> Self {
        let mut len = name.len().min(NAME_MAX_LEN);
        while !name.is_char_boundary(len) {
            len -= 1;
        }
        let mut buf = [0; NAME_MAX_LEN + 1];
        buf[..len].copy_from_slice(&name.as_bytes()[..len]);

        Self {
            name: buf,
            inode_id: inode_id.to_le_bytes(),
        }
    }

    /// 去掉填充后的名字字节
    pub fn name_bytes(&self) -> &[u8] {
        let len = self
            .name
            .iter()
            .position(|&c| c == 0)
            .unwrap_or(self.name.len());
        &self.name[..len]
    }

    /// 名字不是合法的 UTF-8 时返回空
    pub fn name(&self) -> Option<&str> {
        core::str::from_utf8(self.name_bytes()).ok()
    }

    #[inline]
    pub fn inode_id(&self) -> u32 {
        u32::from_le_bytes(self.inode_id)
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.inode_id() == 0
    }

    /// 按目录中存放的形式比较名字
    pub fn same_name(&self, other: &Self) -> bool {
        self.name_bytes() == other.name_bytes()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(ptr::from_ref(self).cast(), Self::SIZE) }
    }

    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(ptr::from_mut(self).cast(), Self::SIZE) }
    }
}

#[cfg(test)]
mod tests {
    use core::mem;

    use super::*;

    #[test]
    fn layout() {
        assert_eq!(DirEntry::SIZE, mem::size_of::<DirEntry>());
        assert_eq!(1, mem::align_of::<DirEntry>());

        let dirent = DirEntry::new("a.txt", 5);
        let bytes = dirent.as_bytes();
        assert_eq!(b"a.txt", &bytes[..5]);
        assert!(bytes[5..28].iter().all(|&b| b == 0));
        assert_eq!([5, 0, 0, 0], bytes[28..32]);
    }

    #[test]
    fn truncates_long_names() {
        let long = "abcdefghijklmnopqrstuvwxyz0123456789";
        let dirent = DirEntry::new(long, 3);
        assert_eq!(Some(&long[..NAME_MAX_LEN]), dirent.name());
        assert!(dirent.same_name(&DirEntry::new(&long[..30], 9)));

        // 不在多字节字符中间截断
        let wide = "文件系统文件系统文件系统";
        let dirent = DirEntry::new(wide, 3);
        assert_eq!(Some("文件系统文件系统文"), dirent.name());
    }

    #[test]
    fn bytes_roundtrip() {
        let dirent = DirEntry::new("notes.txt", 42);
        let mut copy = DirEntry::default();
        copy.as_bytes_mut().copy_from_slice(dirent.as_bytes());
        assert_eq!(dirent, copy);
        assert_eq!(42, copy.inode_id());
        assert!(!copy.is_free());
        assert!(DirEntry::default().is_free());
    }
}
