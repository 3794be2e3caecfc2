use crate::error::Error;

/// The code segment. Grows only through `append`; `patch` overwrites bytes
/// that were already emitted.
#[derive(Debug, Default, Clone)]
pub struct Output {
    bytes: Vec<u8>,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append and return the offset the bytes were placed at.
    pub fn append(&mut self, bytes: &[u8]) -> usize {
        let offset = self.bytes.len();
        self.bytes.extend_from_slice(bytes);
        offset
    }

    pub fn patch(&mut self, bytes: &[u8], offset: usize) -> Result<(), Error> {
        let end = offset + bytes.len();
        match self.bytes.get_mut(offset..end) {
            Some(slot) => {
                slot.copy_from_slice(bytes);
                Ok(())
            }
            None => Err(Error::Format(format!(
                "patch of {} bytes at {offset:#x} past end of code ({:#x})",
                bytes.len(),
                self.bytes.len()
            ))),
        }
    }

    /// Zero pad to a multiple of `align`, returning the pad length.
    pub fn align(&mut self, align: usize) -> usize {
        let pad = (align - self.bytes.len() % align) % align;
        self.bytes.resize(self.bytes.len() + pad, 0);
        pad
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_patch() {
        let mut out = Output::new();
        assert_eq!(out.append(&[1, 2]), 0);
        assert_eq!(out.append(&[0xFF; 4]), 2);
        out.patch(&[9, 9], 3).unwrap();
        assert_eq!(out.bytes(), &[1, 2, 0xFF, 9, 9, 0xFF]);
        assert!(out.patch(&[0; 4], 4).is_err());
        assert_eq!(out.len(), 6);
    }

    #[test]
    fn align_pads_with_zero() {
        let mut out = Output::new();
        out.append(&[1, 2, 3]);
        assert_eq!(out.align(8), 5);
        assert_eq!(out.len(), 8);
        assert_eq!(out.align(8), 0);
        assert_eq!(&out.bytes()[3..], &[0; 5]);
    }
}
