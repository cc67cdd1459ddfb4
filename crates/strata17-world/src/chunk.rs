use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use thiserror::Error;

pub const CHUNK_SIZE_X: usize = 16;
pub const CHUNK_SIZE_Y: usize = 128;
pub const CHUNK_SIZE_Z: usize = 16;
const CELLS: usize = CHUNK_SIZE_X * CHUNK_SIZE_Y * CHUNK_SIZE_Z;

/// Wire/disk size of a fully packed chunk: one byte per cell for block ids, plus
/// three nibble-packed planes (metadata, block light, sky light) at half a byte each.
pub const CHUNK_BYTES: usize = CELLS + (CELLS / 2) * 3;

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("zlib compression failed: {0}")]
    Compress(#[source] std::io::Error),
    #[error("zlib decompression failed: {0}")]
    Decompress(#[source] std::io::Error),
    #[error("decompressed chunk was {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// A 16x128x16 voxel column: block ids, metadata, block light and sky light.
///
/// Cells are indexed `y + z*CHUNK_SIZE_Y + x*CHUNK_SIZE_Y*CHUNK_SIZE_Z` (Y-Z-X memory
/// order). This layout, and the packing described below, is the wire/disk contract and
/// must not change independently of the protocol that transports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    blocks: Box<[u8; CELLS]>,
    metadata: Box<[u8; CELLS / 2]>,
    light_block: Box<[u8; CELLS / 2]>,
    light_sky: Box<[u8; CELLS / 2]>,
    changed: bool,
}

impl Chunk {
    pub fn empty() -> Self {
        Self {
            blocks: Box::new([0u8; CELLS]),
            metadata: Box::new([0u8; CELLS / 2]),
            light_block: Box::new([0u8; CELLS / 2]),
            light_sky: Box::new([0u8; CELLS / 2]),
            changed: false,
        }
    }

    #[inline]
    fn index(x: usize, y: usize, z: usize) -> usize {
        y + z * CHUNK_SIZE_Y + x * CHUNK_SIZE_Y * CHUNK_SIZE_Z
    }

    #[inline]
    fn in_bounds(x: usize, y: usize, z: usize) -> bool {
        x < CHUNK_SIZE_X && y < CHUNK_SIZE_Y && z < CHUNK_SIZE_Z
    }

    pub fn get_block(&self, x: usize, y: usize, z: usize) -> u8 {
        if !Self::in_bounds(x, y, z) {
            return 0;
        }
        self.blocks[Self::index(x, y, z)]
    }

    pub fn set_block(&mut self, x: usize, y: usize, z: usize, id: u8) {
        if !Self::in_bounds(x, y, z) {
            return;
        }
        self.blocks[Self::index(x, y, z)] = id;
        self.changed = true;
    }

    /// Legacy cross-boundary lookup: negative `x`/`z` wrap by +16 rather than
    /// missing, matching callers that probe one cell past a chunk edge. `y` is
    /// never negative in this coordinate system, so it isn't wrapped.
    pub fn get_block_wrapping(&self, x: i32, y: usize, z: i32) -> u8 {
        let x = if x < 0 { x + 16 } else { x };
        let z = if z < 0 { z + 16 } else { z };
        if x < 0 || z < 0 {
            return 0;
        }
        self.get_block(x as usize, y, z as usize)
    }

    /// Same wrap as [`Chunk::get_block_wrapping`], for writes.
    pub fn set_block_wrapping(&mut self, x: i32, y: usize, z: i32, id: u8) {
        let x = if x < 0 { x + 16 } else { x };
        let z = if z < 0 { z + 16 } else { z };
        if x < 0 || z < 0 {
            return;
        }
        self.set_block(x as usize, y, z as usize, id);
    }

    /// Stricter sibling of [`Chunk::get_block_wrapping`]: any out-of-range axis
    /// returns `fallback` instead of wrapping. For callers that need to tell
    /// "really out of bounds" apart from "legitimately zero".
    pub fn get_block_or(&self, x: i32, y: i32, z: i32, fallback: u8) -> u8 {
        if x < 0
            || y < 0
            || z < 0
            || x as usize >= CHUNK_SIZE_X
            || y as usize >= CHUNK_SIZE_Y
            || z as usize >= CHUNK_SIZE_Z
        {
            return fallback;
        }
        self.get_block(x as usize, y as usize, z as usize)
    }

    pub fn get_metadata(&self, x: usize, y: usize, z: usize) -> u8 {
        self.get_nibble(&self.metadata, x, y, z)
    }

    pub fn set_metadata(&mut self, x: usize, y: usize, z: usize, value: u8) {
        self.set_nibble_owned(x, y, z, value, |c| &mut c.metadata);
    }

    pub fn get_block_light(&self, x: usize, y: usize, z: usize) -> u8 {
        self.get_nibble(&self.light_block, x, y, z)
    }

    pub fn set_block_light(&mut self, x: usize, y: usize, z: usize, value: u8) {
        self.set_nibble_owned(x, y, z, value, |c| &mut c.light_block);
    }

    pub fn get_sky_light(&self, x: usize, y: usize, z: usize) -> u8 {
        self.get_nibble(&self.light_sky, x, y, z)
    }

    pub fn set_sky_light(&mut self, x: usize, y: usize, z: usize, value: u8) {
        self.set_nibble_owned(x, y, z, value, |c| &mut c.light_sky);
    }

    fn get_nibble(&self, plane: &[u8; CELLS / 2], x: usize, y: usize, z: usize) -> u8 {
        if !Self::in_bounds(x, y, z) {
            return 0;
        }
        let i = Self::index(x, y, z);
        let byte = plane[i / 2];
        if i & 1 == 0 {
            byte & 0x0F
        } else {
            (byte >> 4) & 0x0F
        }
    }

    fn set_nibble_owned(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        value: u8,
        plane: impl FnOnce(&mut Self) -> &mut [u8; CELLS / 2],
    ) {
        if !Self::in_bounds(x, y, z) {
            return;
        }
        let i = Self::index(x, y, z);
        let value = value & 0x0F;
        let slot = &mut plane(self)[i / 2];
        if i & 1 == 0 {
            *slot = (*slot & 0xF0) | value;
        } else {
            *slot = (*slot & 0x0F) | (value << 4);
        }
        self.changed = true;
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn clear_changed(&mut self) {
        self.changed = false;
    }

    /// Packs the four planes in wire order: blocks, metadata, block light, sky light.
    fn pack(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(CHUNK_BYTES);
        out.extend_from_slice(self.blocks.as_slice());
        out.extend_from_slice(self.metadata.as_slice());
        out.extend_from_slice(self.light_block.as_slice());
        out.extend_from_slice(self.light_sky.as_slice());
        out
    }

    fn unpack(data: &[u8]) -> Result<Self, ChunkError> {
        if data.len() != CHUNK_BYTES {
            return Err(ChunkError::SizeMismatch {
                expected: CHUNK_BYTES,
                actual: data.len(),
            });
        }
        let mut chunk = Self::empty();
        chunk.blocks.copy_from_slice(&data[0..CELLS]);
        chunk
            .metadata
            .copy_from_slice(&data[CELLS..CELLS + CELLS / 2]);
        chunk
            .light_block
            .copy_from_slice(&data[CELLS + CELLS / 2..CELLS + CELLS]);
        chunk
            .light_sky
            .copy_from_slice(&data[CELLS + CELLS..CELLS + CELLS + CELLS / 2]);
        Ok(chunk)
    }

    /// Deflates the packed representation into `out`, appending to whatever is there.
    pub fn compress_to_buf(&self, out: &mut Vec<u8>) -> Result<(), ChunkError> {
        let packed = self.pack();
        let mut encoder = ZlibEncoder::new(out, Compression::default());
        encoder.write_all(&packed).map_err(ChunkError::Compress)?;
        encoder.finish().map_err(ChunkError::Compress)?;
        Ok(())
    }

    pub fn compress(&self) -> Result<Vec<u8>, ChunkError> {
        let mut out = Vec::new();
        self.compress_to_buf(&mut out)?;
        Ok(out)
    }

    /// Inflates `data` and overwrites `self` only if the result is exactly
    /// [`CHUNK_BYTES`] long. On failure `self` is left untouched.
    pub fn decompress_from_buf(&mut self, data: &[u8]) -> Result<(), ChunkError> {
        let mut decoder = ZlibDecoder::new(data);
        let mut out = Vec::with_capacity(CHUNK_BYTES);
        decoder
            .read_to_end(&mut out)
            .map_err(ChunkError::Decompress)?;
        let replacement = Self::unpack(&out)?;
        *self = replacement;
        Ok(())
    }

    pub fn decompress(data: &[u8]) -> Result<Self, ChunkError> {
        let mut chunk = Self::empty();
        chunk.decompress_from_buf(data)?;
        Ok(chunk)
    }

    /// Applies a compressed cuboid blob (the chunk-map packet payload) at the given
    /// chunk-local origin and extent.
    #[allow(clippy::too_many_arguments)]
    pub fn splat_cuboid(
        &mut self,
        origin_x: usize,
        origin_y: usize,
        origin_z: usize,
        size_x: usize,
        size_y: usize,
        size_z: usize,
        compressed: &[u8],
    ) -> Result<(), ChunkError> {
        let cells = size_x * size_y * size_z;
        let nibble_bytes = (cells + 1) / 2;
        let expected = cells + nibble_bytes * 3;
        let mut decoder = ZlibDecoder::new(compressed);
        let mut data = Vec::with_capacity(expected);
        decoder
            .read_to_end(&mut data)
            .map_err(ChunkError::Decompress)?;
        if data.len() != expected {
            return Err(ChunkError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        let block_plane = &data[0..cells];
        let meta_plane = &data[cells..cells + nibble_bytes];
        let light_plane = &data[cells + nibble_bytes..cells + nibble_bytes * 2];
        let sky_plane = &data[cells + nibble_bytes * 2..cells + nibble_bytes * 3];

        let local_index = |lx: usize, ly: usize, lz: usize| ly + lz * size_y + lx * size_y * size_z;
        let nibble_at = |plane: &[u8], i: usize| {
            let byte = plane[i / 2];
            if i & 1 == 0 {
                byte & 0x0F
            } else {
                (byte >> 4) & 0x0F
            }
        };

        for lx in 0..size_x {
            for ly in 0..size_y {
                for lz in 0..size_z {
                    let li = local_index(lx, ly, lz);
                    let (x, y, z) = (origin_x + lx, origin_y + ly, origin_z + lz);
                    if !Self::in_bounds(x, y, z) {
                        continue;
                    }
                    self.set_block(x, y, z, block_plane[li]);
                    self.set_metadata(x, y, z, nibble_at(meta_plane, li));
                    self.set_block_light(x, y, z, nibble_at(light_plane, li));
                    self.set_sky_light(x, y, z, nibble_at(sky_plane, li));
                }
            }
        }
        Ok(())
    }

    /// Fills sky light top-down until the first opaque block, and seeds block light
    /// from each block's emission level. Does not propagate light sideways or across
    /// chunk boundaries; see [`Chunk::flood_fill_block_light`] for the bounded BFS pass.
    pub fn seed_lighting(&mut self, is_opaque: impl Fn(u8) -> bool, emission: impl Fn(u8) -> u8) {
        for x in 0..CHUNK_SIZE_X {
            for z in 0..CHUNK_SIZE_Z {
                let mut lit = true;
                for y in (0..CHUNK_SIZE_Y).rev() {
                    let block = self.get_block(x, y, z);
                    if lit && is_opaque(block) {
                        lit = false;
                    }
                    self.set_sky_light(x, y, z, if lit { 15 } else { 0 });
                    let e = emission(block);
                    if e > 0 {
                        self.set_block_light(x, y, z, e);
                    }
                }
            }
        }
    }

    /// A bounded, single-chunk breadth-first flood fill of block light from every
    /// emitting cell. Does not cross chunk boundaries; callers needing cross-chunk
    /// propagation must re-run this after splatting neighbors.
    pub fn flood_fill_block_light(&mut self, is_opaque: impl Fn(u8) -> bool) {
        use std::collections::VecDeque;

        let mut queue: VecDeque<(usize, usize, usize)> = VecDeque::new();
        for x in 0..CHUNK_SIZE_X {
            for y in 0..CHUNK_SIZE_Y {
                for z in 0..CHUNK_SIZE_Z {
                    if self.get_block_light(x, y, z) > 0 {
                        queue.push_back((x, y, z));
                    }
                }
            }
        }

        while let Some((x, y, z)) = queue.pop_front() {
            let level = self.get_block_light(x, y, z);
            if level <= 1 {
                continue;
            }
            let next = level - 1;
            for (dx, dy, dz) in [
                (1i32, 0i32, 0i32),
                (-1, 0, 0),
                (0, 1, 0),
                (0, -1, 0),
                (0, 0, 1),
                (0, 0, -1),
            ] {
                let (nx, ny, nz) = (x as i32 + dx, y as i32 + dy, z as i32 + dz);
                if nx < 0 || ny < 0 || nz < 0 {
                    continue;
                }
                let (nx, ny, nz) = (nx as usize, ny as usize, nz as usize);
                if !Self::in_bounds(nx, ny, nz) || is_opaque(self.get_block(nx, ny, nz)) {
                    continue;
                }
                if self.get_block_light(nx, ny, nz) < next {
                    self.set_block_light(nx, ny, nz, next);
                    queue.push_back((nx, ny, nz));
                }
            }
        }
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_size_matches_spec() {
        assert_eq!(CHUNK_BYTES, 20480);
    }

    #[test]
    fn channel_independence() {
        let mut c = Chunk::empty();
        c.set_block(1, 2, 3, 7);
        c.set_metadata(1, 2, 3, 5);
        c.set_block_light(1, 2, 3, 9);
        c.set_sky_light(1, 2, 3, 15);
        assert_eq!(c.get_block(1, 2, 3), 7);
        assert_eq!(c.get_metadata(1, 2, 3), 5);
        assert_eq!(c.get_block_light(1, 2, 3), 9);
        assert_eq!(c.get_sky_light(1, 2, 3), 15);

        // setting one channel leaves the others at their prior value everywhere else
        c.set_block_light(4, 5, 6, 3);
        assert_eq!(c.get_block(4, 5, 6), 0);
        assert_eq!(c.get_metadata(4, 5, 6), 0);
        assert_eq!(c.get_sky_light(4, 5, 6), 0);
        assert_eq!(c.get_block(1, 2, 3), 7);
    }

    #[test]
    fn compress_round_trip() {
        let mut c = Chunk::empty();
        for x in 0..CHUNK_SIZE_X {
            for z in 0..CHUNK_SIZE_Z {
                c.set_block(x, 0, z, 7);
                c.set_block(x, 1, z, ((x + z) % 16) as u8);
                c.set_metadata(x, 1, z, ((x * z) % 16) as u8);
            }
        }
        let compressed = c.compress().unwrap();
        let decompressed = Chunk::decompress(&compressed).unwrap();
        assert_eq!(c, decompressed);
    }

    #[test]
    fn decompress_rejects_wrong_size() {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&[0u8; 100]).unwrap();
        let bad = encoder.finish().unwrap();
        let mut target = Chunk::empty();
        target.set_block(0, 0, 0, 42);
        assert!(target.decompress_from_buf(&bad).is_err());
        // failed decompress must not corrupt existing state
        assert_eq!(target.get_block(0, 0, 0), 42);
    }

    #[test]
    fn out_of_bounds_reads_return_zero() {
        let c = Chunk::empty();
        assert_eq!(c.get_block(16, 0, 0), 0);
        assert_eq!(c.get_sky_light(0, 128, 0), 0);
    }

    #[test]
    fn splat_cuboid_applies_subregion() {
        let cells = 1 * 3 * 1;
        let nibble_bytes = (cells + 1) / 2;
        let mut raw = vec![0u8; cells + nibble_bytes * 3];
        raw[0] = 3;
        raw[1] = 3;
        raw[2] = 3;
        let mut blob = Vec::new();
        let mut encoder = ZlibEncoder::new(&mut blob, Compression::default());
        encoder.write_all(&raw).unwrap();
        encoder.finish().unwrap();

        let mut dest = Chunk::empty();
        dest.splat_cuboid(5, 60, 7, 1, 3, 1, &blob).unwrap();
        assert_eq!(dest.get_block(5, 60, 7), 3);
        assert_eq!(dest.get_block(5, 61, 7), 3);
        assert_eq!(dest.get_block(5, 62, 7), 3);
    }

    #[test]
    fn get_block_wrapping_folds_negative_x_and_z_by_sixteen() {
        let mut c = Chunk::empty();
        c.set_block(15, 64, 15, 9);
        assert_eq!(c.get_block_wrapping(-1, 64, -1), 9);
        assert_eq!(c.get_block_wrapping(15, 64, 15), 9);
    }

    #[test]
    fn set_block_wrapping_folds_negative_x_and_z_by_sixteen() {
        let mut c = Chunk::empty();
        c.set_block_wrapping(-1, 0, -1, 4);
        assert_eq!(c.get_block(15, 0, 15), 4);
    }

    #[test]
    fn get_block_or_returns_fallback_instead_of_wrapping() {
        let mut c = Chunk::empty();
        c.set_block(15, 0, 15, 9);
        assert_eq!(c.get_block_or(-1, 0, -1, 255), 255);
        assert_eq!(c.get_block_or(15, 0, 15, 255), 9);
        assert_eq!(c.get_block_or(16, 0, 0, 255), 255);
    }

    #[test]
    fn flood_fill_attenuates_by_one_per_step() {
        let mut c = Chunk::empty();
        c.set_block_light(8, 64, 8, 15);
        c.flood_fill_block_light(|_| false);
        assert_eq!(c.get_block_light(9, 64, 8), 14);
        assert_eq!(c.get_block_light(10, 64, 8), 13);
    }
}
