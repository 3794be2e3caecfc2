pub mod chunk;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::{self, BufRead, Cursor, Seek, Write};

use crate::error::Error;
use crate::label::Qualifiers;
use chunk::{Chunk, ChunkWriter};

// ----------------------------------------------------------------------------
// Target info

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl Version {
    /// `major.minor.patch`, missing trailing parts are zero.
    pub fn parse(s: &str) -> Result<Version, Error> {
        let invalid = || Error::InvalidOption("version".to_string(), format!("`{s}`"));
        let parts = s
            .trim()
            .split('.')
            .map(|p| p.parse::<u8>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;
        match parts.as_slice() {
            [major] => Ok(Version::new(*major, 0, 0)),
            [major, minor] => Ok(Version::new(*major, *minor, 0)),
            [major, minor, patch] => Ok(Version::new(*major, *minor, *patch)),
            _ => Err(invalid()),
        }
    }

    pub fn new(major: u8, minor: u8, patch: u8) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    pub fn packed(self) -> u32 {
        (self.major as u32) << 16 | (self.minor as u32) << 8 | self.patch as u32
    }

    pub fn unpack(packed: u32) -> Self {
        Version::new((packed >> 16) as u8, (packed >> 8) as u8, packed as u8)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub version: Version,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetInfo {
    pub executable: bool,
    pub dependencies: Vec<Dependency>,
}

const FLAG_EXECUTABLE: u32 = 1;

fn write_cstr(out: &mut Vec<u8>, s: &str) -> io::Result<()> {
    out.write_all(s.as_bytes())?;
    out.write_u8(0)
}

fn read_cstr(cur: &mut Cursor<&[u8]>, what: &str) -> Result<String, Error> {
    let mut raw = Vec::new();
    cur.read_until(0, &mut raw)
        .map_err(|_| Error::Format(format!("truncated {what}")))?;
    if raw.pop() != Some(0) {
        return Err(Error::Format(format!("unterminated {what}")));
    }
    String::from_utf8(raw).map_err(|_| Error::Format(format!("{what} is not UTF-8")))
}

fn read_u32(cur: &mut Cursor<&[u8]>, what: &str) -> Result<u32, Error> {
    cur.read_u32::<LittleEndian>()
        .map_err(|_| Error::Format(format!("truncated {what}")))
}

fn expect_end(cur: &Cursor<&[u8]>, what: &str) -> Result<(), Error> {
    if cur.position() as usize != cur.get_ref().len() {
        return Err(Error::Format(format!("trailing bytes in {what}")));
    }
    Ok(())
}

impl TargetInfo {
    pub fn encode(&self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        let flags = if self.executable { FLAG_EXECUTABLE } else { 0 };
        out.write_u32::<LittleEndian>(flags)?;
        out.write_u32::<LittleEndian>(self.dependencies.len() as u32)?;
        for dep in &self.dependencies {
            out.write_u32::<LittleEndian>(dep.version.packed())?;
        }
        for dep in &self.dependencies {
            write_cstr(&mut out, &dep.name)?;
        }
        Ok(out)
    }

    pub fn decode(body: &[u8]) -> Result<TargetInfo, Error> {
        let mut cur = Cursor::new(body);
        let flags = read_u32(&mut cur, "target flags")?;
        let count = read_u32(&mut cur, "dependency count")? as usize;
        let versions = (0..count)
            .map(|_| read_u32(&mut cur, "dependency version").map(Version::unpack))
            .collect::<Result<Vec<_>, _>>()?;
        let mut dependencies = Vec::with_capacity(count);
        for version in versions {
            let name = read_cstr(&mut cur, "dependency name")?;
            dependencies.push(Dependency { name, version });
        }
        expect_end(&cur, "target info")?;
        Ok(TargetInfo {
            executable: flags & FLAG_EXECUTABLE != 0,
            dependencies,
        })
    }
}

// ----------------------------------------------------------------------------
// Import / export lists

pub fn encode_imports(names: &[String]) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    out.write_u32::<LittleEndian>(names.len() as u32)?;
    for name in names {
        write_cstr(&mut out, name)?;
    }
    Ok(out)
}

pub fn decode_imports(body: &[u8]) -> Result<Vec<String>, Error> {
    let mut cur = Cursor::new(body);
    let count = read_u32(&mut cur, "import count")?;
    let names = (0..count)
        .map(|_| read_cstr(&mut cur, "import name"))
        .collect::<Result<Vec<_>, _>>()?;
    expect_end(&cur, "import list")?;
    Ok(names)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub name: String,
    pub offset: u32,
    pub qualifiers: Qualifiers,
}

pub fn encode_exports(exports: &[Export]) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    out.write_u32::<LittleEndian>(exports.len() as u32)?;
    for export in exports {
        out.write_u32::<LittleEndian>(export.offset)?;
    }
    // the qualifier byte terminates each name
    for export in exports {
        out.write_all(export.name.as_bytes())?;
        out.write_u8(export.qualifiers.bits())?;
    }
    Ok(out)
}

pub fn decode_exports(body: &[u8]) -> Result<Vec<Export>, Error> {
    let mut cur = Cursor::new(body);
    let count = read_u32(&mut cur, "export count")?;
    let offsets = (0..count)
        .map(|_| read_u32(&mut cur, "export offset"))
        .collect::<Result<Vec<_>, _>>()?;

    let mut exports = Vec::with_capacity(offsets.len());
    for offset in offsets {
        let mut name = Vec::new();
        let qualifiers = loop {
            let byte = cur
                .read_u8()
                .map_err(|_| Error::Format("truncated export name".to_string()))?;
            if let Some(q) = Qualifiers::from_bits(byte) {
                break q;
            }
            name.push(byte);
        };
        let name = String::from_utf8(name)
            .map_err(|_| Error::Format("export name is not UTF-8".to_string()))?;
        exports.push(Export {
            name,
            offset,
            qualifiers,
        });
    }
    expect_end(&cur, "export list")?;
    Ok(exports)
}

// ----------------------------------------------------------------------------
// Container

/// Everything one binary holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub target: TargetInfo,
    pub imports: Vec<String>,
    pub exports: Vec<Export>,
    pub code: Vec<u8>,
}

impl Container {
    pub fn chunks(&self) -> io::Result<Vec<Chunk>> {
        Ok(vec![
            Chunk::new(chunk::TARGET_INFO, self.target.encode()?),
            Chunk::new(chunk::IMPORTED, encode_imports(&self.imports)?),
            Chunk::new(chunk::EXPORTED, encode_exports(&self.exports)?),
            Chunk::new(chunk::BYTE_CODE, self.code.clone()),
        ])
    }

    pub fn write<W: Write + Seek>(&self, out: W) -> io::Result<W> {
        let mut writer = ChunkWriter::new(out);
        for chunk in self.chunks()? {
            writer.register(chunk);
        }
        writer.finish()
    }

    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        Ok(self.write(Cursor::new(Vec::new()))?.into_inner())
    }

    pub fn parse(image: &[u8]) -> Result<Container, Error> {
        let chunks = chunk::read_chunks(image)?;
        let find = |tag: &chunk::Tag| {
            chunks
                .iter()
                .find(|c| &c.tag == tag)
                .map(|c| c.body.as_slice())
                .ok_or_else(|| Error::Format(format!("missing `{}` chunk", chunk::tag_name(tag))))
        };
        Ok(Container {
            target: TargetInfo::decode(find(chunk::TARGET_INFO)?)?,
            imports: decode_imports(find(chunk::IMPORTED)?)?,
            exports: decode_exports(find(chunk::EXPORTED)?)?,
            code: find(chunk::BYTE_CODE)?.to_vec(),
        })
    }
}
