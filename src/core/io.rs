use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use memchr::memchr;
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub struct MmapSource {
    mmap: Mmap,
}

impl MmapSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        // SAFETY: read-only file mapping.
        let mmap = unsafe { Mmap::map(&file) }.with_context(|| "mmap failed")?;
        Ok(Self { mmap })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.mmap
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputKind {
    Plain,
    Gzip,
}

/// A fully loaded stats file: mapped when plain, decompressed into memory when gzipped.
pub enum StatsSource {
    Mmap(MmapSource),
    Owned(Vec<u8>),
}

impl StatsSource {
    pub fn open(path: &Path) -> Result<(Self, InputKind)> {
        let kind = detect_input_kind(path)?;
        match kind {
            InputKind::Plain => {
                let len = File::open(path)
                    .and_then(|f| f.metadata())
                    .map(|m| m.len())
                    .with_context(|| format!("failed to stat {}", path.display()))?;
                if len == 0 {
                    return Ok((StatsSource::Owned(Vec::new()), kind));
                }
                Ok((StatsSource::Mmap(MmapSource::open(path)?), kind))
            }
            InputKind::Gzip => {
                let mut reader = open_gzip_reader(path)?;
                let mut buf = Vec::new();
                reader
                    .read_to_end(&mut buf)
                    .with_context(|| format!("gzip decompression error in {}", path.display()))?;
                Ok((StatsSource::Owned(buf), kind))
            }
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            StatsSource::Mmap(m) => m.bytes(),
            StatsSource::Owned(v) => v,
        }
    }
}

pub fn detect_input_kind(path: &Path) -> Result<InputKind> {
    if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
        let ext = ext.to_ascii_lowercase();
        if ext == "gz" {
            return Ok(InputKind::Gzip);
        }
    }
    let mut file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut magic = [0u8; 2];
    let n = file
        .read(&mut magic)
        .with_context(|| "failed to read magic bytes")?;
    if n == 2 && magic == [0x1f, 0x8b] {
        Ok(InputKind::Gzip)
    } else {
        Ok(InputKind::Plain)
    }
}

pub fn open_gzip_reader(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Ok(Box::new(MultiGzDecoder::new(BufReader::new(file))))
}

/// Newline-delimited lines with any trailing `\r` removed.
pub struct Lines<'a> {
    bytes: &'a [u8],
    pos: usize,
}

pub fn lines(bytes: &[u8]) -> Lines<'_> {
    Lines { bytes, pos: 0 }
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        let rest = &self.bytes[self.pos..];
        let end = memchr(b'\n', rest).unwrap_or(rest.len());
        self.pos += end + 1;
        let mut line = &rest[..end];
        if let [head @ .., b'\r'] = line {
            line = head;
        }
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    #[test]
    fn splits_lines_and_strips_carriage_returns() {
        let got: Vec<&[u8]> = lines(b"a\tb\r\n\nlast").collect();
        assert_eq!(got, vec![&b"a\tb"[..], &b""[..], &b"last"[..]]);
        assert_eq!(lines(b"").count(), 0);
        assert_eq!(lines(b"one\n").count(), 1);
    }

    #[test]
    fn gzip_and_plain_sources_yield_same_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let content = b"# SN\t[2]id\t[3]key\t[4]value\nSN\t0\tnumber of records:\t3\n";

        let plain = dir.path().join("plain.stats");
        std::fs::write(&plain, content).unwrap();

        // no .gz extension: detection must fall back to the magic bytes
        let gz = dir.path().join("compressed.stats");
        let mut enc = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        enc.write_all(content).unwrap();
        enc.finish().unwrap();

        let (p, pk) = StatsSource::open(&plain).unwrap();
        let (g, gk) = StatsSource::open(&gz).unwrap();
        assert_eq!(pk, InputKind::Plain);
        assert_eq!(gk, InputKind::Gzip);
        assert_eq!(p.bytes(), &content[..]);
        assert_eq!(g.bytes(), &content[..]);
    }

    #[test]
    fn empty_file_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.stats");
        std::fs::write(&path, b"").unwrap();
        let (src, kind) = StatsSource::open(&path).unwrap();
        assert_eq!(kind, InputKind::Plain);
        assert!(src.bytes().is_empty());
    }
}
