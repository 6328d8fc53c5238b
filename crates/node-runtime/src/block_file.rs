//! # Block Files
//!
//! A block file is a sequence of frames. Each frame is a little-endian `u32`
//! length followed by one wire-encoded block. Frames are handed to the queue
//! undecoded; `import_raw` owns decoding.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use shared_types::{encode_block, Block, CodecError, MAX_ENCODED_BLOCK_SIZE};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlockFileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Encoding failed: {0}")]
    Codec(#[from] CodecError),
}

/// Iterator over the raw frames of a block file.
pub struct BlockFileReader<R> {
    inner: R,
}

impl BlockFileReader<BufReader<File>> {
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: Read> BlockFileReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    fn read_frame(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut len = [0u8; 4];
        // A clean end of file is only allowed on a frame boundary.
        loop {
            match self.inner.read(&mut len[..1]) {
                Ok(0) => return Ok(None),
                Ok(_) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        self.inner.read_exact(&mut len[1..])?;

        let len = u32::from_le_bytes(len) as usize;
        if len > MAX_ENCODED_BLOCK_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("frame of {} bytes exceeds {}", len, MAX_ENCODED_BLOCK_SIZE),
            ));
        }

        let mut frame = vec![0u8; len];
        self.inner.read_exact(&mut frame)?;
        Ok(Some(frame))
    }
}

impl<R: Read> Iterator for BlockFileReader<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_frame().transpose()
    }
}

/// Write `blocks` as frames. Returns the number of bytes written.
pub fn write_blocks<W: Write>(writer: W, blocks: &[Block]) -> Result<usize, BlockFileError> {
    let mut writer = BufWriter::new(writer);
    let mut written = 0;
    for block in blocks {
        let bytes = encode_block(block)?;
        writer.write_all(&(bytes.len() as u32).to_le_bytes())?;
        writer.write_all(&bytes)?;
        written += 4 + bytes.len();
    }
    writer.flush()?;
    Ok(written)
}
