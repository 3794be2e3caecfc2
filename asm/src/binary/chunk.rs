use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

use crate::error::Error;

pub type Tag = [u8; 8];

pub const MAGIC: &Tag = b"MC64KBin";
pub const CHUNK_LIST: &Tag = b"ChnkList";
pub const TARGET_INFO: &Tag = b"TrgtInfo";
pub const IMPORTED: &Tag = b"Imported";
pub const EXPORTED: &Tag = b"Exported";
pub const BYTE_CODE: &Tag = b"ByteCode";

pub const FILE_HEADER_SIZE: usize = 16;
pub const CHUNK_HEADER_SIZE: usize = 16;
pub const DIRECTORY_ENTRY_SIZE: usize = 16;
pub const ALIGN: usize = 8;

pub fn tag_name(tag: &Tag) -> String {
    String::from_utf8_lossy(tag).into_owned()
}

// ----------------------------------------------------------------------------
// Chunk

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub tag: Tag,
    pub body: Vec<u8>,
}

impl Chunk {
    pub fn new(tag: &Tag, body: Vec<u8>) -> Self {
        Chunk { tag: *tag, body }
    }

    pub fn padding(&self) -> usize {
        (ALIGN - self.body.len() % ALIGN) % ALIGN
    }

    /// Size on disk: header, body and padding.
    pub fn size(&self) -> usize {
        CHUNK_HEADER_SIZE + self.body.len() + self.padding()
    }

    fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(&self.tag)?;
        out.write_u64::<LittleEndian>(self.body.len() as u64)?;
        out.write_all(&self.body)?;
        out.write_all(&[0u8; ALIGN][..self.padding()])
    }
}

// ----------------------------------------------------------------------------
// Writer

/// Lays out the file header, the chunk directory and the registered chunks.
/// The load size in the header is written as zero first and rewritten once
/// the end of the file is known.
pub struct ChunkWriter<W: Write + Seek> {
    out: W,
    chunks: Vec<Chunk>,
}

impl<W: Write + Seek> ChunkWriter<W> {
    pub fn new(out: W) -> Self {
        ChunkWriter {
            out,
            chunks: Vec::new(),
        }
    }

    pub fn register(&mut self, chunk: Chunk) -> &mut Self {
        self.chunks.push(chunk);
        self
    }

    fn directory(&self) -> Chunk {
        let list_size = CHUNK_HEADER_SIZE + self.chunks.len() * DIRECTORY_ENTRY_SIZE;
        let mut offset = FILE_HEADER_SIZE + list_size;
        let mut body = Vec::with_capacity(self.chunks.len() * DIRECTORY_ENTRY_SIZE);
        for chunk in &self.chunks {
            body.extend_from_slice(&chunk.tag);
            let mut field = [0u8; 8];
            LittleEndian::write_u64(&mut field, offset as u64);
            body.extend_from_slice(&field);
            offset += chunk.size();
        }
        Chunk::new(CHUNK_LIST, body)
    }

    pub fn finish(mut self) -> io::Result<W> {
        let start = self.out.stream_position()?;
        self.out.write_all(MAGIC)?;
        self.out.write_u64::<LittleEndian>(0)?;

        self.directory().write_to(&mut self.out)?;
        for chunk in &self.chunks {
            chunk.write_to(&mut self.out)?;
        }

        let end = self.out.stream_position()?;
        self.out.seek(SeekFrom::Start(start + 8))?;
        self.out
            .write_u64::<LittleEndian>(end - start - FILE_HEADER_SIZE as u64)?;
        self.out.seek(SeekFrom::Start(end))?;
        self.out.flush()?;
        Ok(self.out)
    }
}

// ----------------------------------------------------------------------------
// Reader

fn truncated(what: &str) -> impl Fn(io::Error) -> Error + '_ {
    move |_| Error::Format(format!("truncated {what}"))
}

fn read_tag(cur: &mut Cursor<&[u8]>, what: &str) -> Result<Tag, Error> {
    let mut tag = [0u8; 8];
    cur.read_exact(&mut tag).map_err(truncated(what))?;
    Ok(tag)
}

fn read_chunk_at(image: &[u8], offset: usize) -> Result<Chunk, Error> {
    if offset % ALIGN != 0 {
        return Err(Error::Format(format!("chunk at {offset:#x} is not aligned")));
    }
    let mut cur = Cursor::new(image);
    cur.set_position(offset as u64);
    let tag = read_tag(&mut cur, "chunk header")?;
    let len = cur
        .read_u64::<LittleEndian>()
        .map_err(truncated("chunk header"))? as usize;
    let start = offset + CHUNK_HEADER_SIZE;
    let end = start
        .checked_add(len)
        .filter(|&end| end <= image.len())
        .ok_or_else(|| Error::Format(format!("truncated `{}` body", tag_name(&tag))))?;
    let chunk = Chunk::new(&tag, image[start..end].to_vec());
    let pad = image
        .get(end..end + chunk.padding())
        .ok_or_else(|| Error::Format(format!("truncated `{}` padding", tag_name(&tag))))?;
    if pad.iter().any(|&b| b != 0) {
        return Err(Error::Format(format!("non-zero padding after `{}`", tag_name(&tag))));
    }
    Ok(chunk)
}

/// Check the header and the directory, then return the listed chunks in
/// directory order.
pub fn read_chunks(image: &[u8]) -> Result<Vec<Chunk>, Error> {
    let mut cur = Cursor::new(image);
    if &read_tag(&mut cur, "file header")? != MAGIC {
        return Err(Error::Format("bad magic".to_string()));
    }
    let load_size = cur
        .read_u64::<LittleEndian>()
        .map_err(truncated("file header"))? as usize;
    if load_size + FILE_HEADER_SIZE != image.len() {
        return Err(Error::Format(format!(
            "load size {load_size} does not match file length {}",
            image.len()
        )));
    }

    let list = read_chunk_at(image, FILE_HEADER_SIZE)?;
    if &list.tag != CHUNK_LIST {
        return Err(Error::Format("missing chunk directory".to_string()));
    }
    if list.body.len() % DIRECTORY_ENTRY_SIZE != 0 {
        return Err(Error::Format("ragged chunk directory".to_string()));
    }

    let mut entries = Cursor::new(list.body.as_slice());
    let mut chunks = Vec::new();
    for _ in 0..list.body.len() / DIRECTORY_ENTRY_SIZE {
        let tag = read_tag(&mut entries, "directory entry")?;
        let offset = entries
            .read_u64::<LittleEndian>()
            .map_err(truncated("directory entry"))? as usize;
        let chunk = read_chunk_at(image, offset)?;
        if chunk.tag != tag {
            return Err(Error::Format(format!(
                "directory lists `{}` at {offset:#x} but found `{}`",
                tag_name(&tag),
                tag_name(&chunk.tag)
            )));
        }
        chunks.push(chunk);
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(chunks: &[Chunk]) -> Vec<u8> {
        let mut writer = ChunkWriter::new(Cursor::new(Vec::new()));
        for chunk in chunks {
            writer.register(chunk.clone());
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn padding_to_eight() {
        assert_eq!(Chunk::new(BYTE_CODE, vec![0; 5]).padding(), 3);
        assert_eq!(Chunk::new(BYTE_CODE, vec![0; 8]).padding(), 0);
        assert_eq!(Chunk::new(BYTE_CODE, vec![]).size(), 16);
        assert_eq!(Chunk::new(BYTE_CODE, vec![0; 9]).size(), 32);
    }

    #[test]
    fn layout() {
        let image = write(&[
            Chunk::new(TARGET_INFO, vec![1, 2, 3]),
            Chunk::new(BYTE_CODE, vec![0xAA; 8]),
        ]);
        // header + directory (16 + 2 * 16) + 24 + 24
        assert_eq!(image.len(), 16 + 48 + 24 + 24);
        assert_eq!(&image[0..8], MAGIC);
        assert_eq!(&image[8..16], &((image.len() - 16) as u64).to_le_bytes());
        assert_eq!(&image[16..24], CHUNK_LIST);
        assert_eq!(&image[24..32], &32u64.to_le_bytes());
        assert_eq!(&image[32..40], TARGET_INFO);
        assert_eq!(&image[40..48], &64u64.to_le_bytes());
        assert_eq!(&image[48..56], BYTE_CODE);
        assert_eq!(&image[56..64], &88u64.to_le_bytes());
        assert_eq!(&image[64..72], TARGET_INFO);
        assert_eq!(&image[80..88], &[1, 2, 3, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn reads_back() {
        let chunks = vec![
            Chunk::new(IMPORTED, vec![7; 13]),
            Chunk::new(BYTE_CODE, vec![1, 2]),
        ];
        assert_eq!(read_chunks(&write(&chunks)).unwrap(), chunks);
    }

    #[test]
    fn rejects_corruption() {
        let image = write(&[Chunk::new(BYTE_CODE, vec![1])]);

        let mut bad_magic = image.clone();
        bad_magic[0] = b'X';
        assert!(read_chunks(&bad_magic).is_err());

        let mut short = image.clone();
        short.pop();
        assert!(read_chunks(&short).is_err());

        let mut dirty = image.clone();
        let last = dirty.len() - 1;
        dirty[last] = 1;
        assert!(read_chunks(&dirty).is_err());
    }
}
