// This file is part of pigmap.
//
// pigmap is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// pigmap is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with pigmap.  If not, see <http://www.gnu.org/licenses/>.
use crate::ReadOutcome;
use flate2::read::{GzDecoder, ZlibDecoder};
use std::{
    fs::File,
    io::{ErrorKind, Read},
    path::Path,
};

/// Recommended starting capacity for reusable decompression buffers; a
/// populated chunk inflates to somewhat over 100 KiB.
pub const READBUF_CAPACITY: usize = 262144;

/// Read a gzipped file into `data`, replacing its contents.
pub fn read_gz_file(path: &Path, data: &mut Vec<u8>) -> ReadOutcome {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return ReadOutcome::Missing,
        Err(_) => return ReadOutcome::Corrupt,
    };
    data.clear();
    match GzDecoder::new(file).read_to_end(data) {
        Ok(_) => ReadOutcome::Ok,
        Err(_) => ReadOutcome::Corrupt,
    }
}

/// Inflate gzip- or zlib-compressed bytes into `data`, replacing its
/// contents. The two formats are told apart by the gzip magic; region files
/// declare a scheme byte, but streams in the wild don't always match it, so
/// sniffing is what actually decides.
pub fn inflate_gz_or_zlib(inbuf: &[u8], data: &mut Vec<u8>) -> bool {
    data.clear();
    let result = if inbuf.len() >= 2 && inbuf[0] == 0x1f && inbuf[1] == 0x8b {
        GzDecoder::new(inbuf).read_to_end(data)
    } else {
        ZlibDecoder::new(inbuf).read_to_end(data)
    };
    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{
        write::{GzEncoder, ZlibEncoder},
        Compression,
    };
    use std::io::Write;

    fn gz(bytes: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(bytes).unwrap();
        enc.finish().unwrap()
    }

    fn zlib(bytes: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(bytes).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn test_inflate_detects_both_formats() {
        let payload = b"the quick brown fox".repeat(100);
        let mut out = Vec::with_capacity(READBUF_CAPACITY);
        assert!(inflate_gz_or_zlib(&gz(&payload), &mut out));
        assert_eq!(out, payload);
        assert!(inflate_gz_or_zlib(&zlib(&payload), &mut out));
        assert_eq!(out, payload);
    }

    #[test]
    fn test_inflate_rejects_garbage() {
        let mut out = Vec::new();
        assert!(!inflate_gz_or_zlib(b"definitely not compressed", &mut out));
        assert!(!inflate_gz_or_zlib(&[], &mut out));
        // truncated stream
        let good = zlib(b"hello world hello world");
        assert!(!inflate_gz_or_zlib(&good[..good.len() / 2], &mut out));
    }

    #[test]
    fn test_read_gz_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.0.0.dat");
        std::fs::write(&path, gz(b"chunk bytes")).unwrap();
        let mut out = Vec::new();
        assert_eq!(read_gz_file(&path, &mut out), ReadOutcome::Ok);
        assert_eq!(out, b"chunk bytes");
        assert_eq!(
            read_gz_file(&dir.path().join("nope.dat"), &mut out),
            ReadOutcome::Missing
        );
        std::fs::write(&path, b"not gzip at all").unwrap();
        assert_eq!(read_gz_file(&path, &mut out), ReadOutcome::Corrupt);
    }
}
