use crate::blocks;
use crate::chunk::{Chunk, CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z};
use crate::noise::GradientNoise;
use crate::prng::ChunkRng;
use strata17_types::{ChunkPos, Dimension};

/// Salt xored into the seed before deriving the cutter (cave/ravine) PRNG stream, so
/// cave placement is independent of ore placement while remaining a pure function of
/// `(seed, chunk_x, chunk_z)`.
const CUTTER_SALT: i64 = 0x5A17_C117;

struct OreSpec {
    block: u8,
    host: u8,
    min_y: i32,
    max_y: i32,
    chance_per_1000: u32,
    vein_size: i32,
}

const OVERWORLD_ORES: &[OreSpec] = &[
    OreSpec { block: blocks::GRAVEL, host: blocks::STONE, min_y: 0, max_y: 128, chance_per_1000: 30, vein_size: 24 },
    OreSpec { block: blocks::DIRT, host: blocks::STONE, min_y: 0, max_y: 128, chance_per_1000: 30, vein_size: 24 },
    OreSpec { block: blocks::CLAY, host: blocks::STONE, min_y: 0, max_y: 32, chance_per_1000: 4, vein_size: 6 },
    OreSpec { block: blocks::COAL_ORE, host: blocks::STONE, min_y: 0, max_y: 128, chance_per_1000: 18, vein_size: 16 },
    OreSpec { block: blocks::COAL_ORE, host: blocks::STONE, min_y: 0, max_y: 64, chance_per_1000: 18, vein_size: 10 },
    OreSpec { block: blocks::LAPIS_ORE, host: blocks::STONE, min_y: 0, max_y: 32, chance_per_1000: 2, vein_size: 6 },
    OreSpec { block: blocks::IRON_ORE, host: blocks::STONE, min_y: 0, max_y: 64, chance_per_1000: 12, vein_size: 8 },
    OreSpec { block: blocks::GOLD_ORE, host: blocks::STONE, min_y: 0, max_y: 32, chance_per_1000: 5, vein_size: 8 },
    OreSpec { block: blocks::REDSTONE_ORE, host: blocks::STONE, min_y: 0, max_y: 16, chance_per_1000: 10, vein_size: 7 },
    OreSpec { block: blocks::DIAMOND_ORE, host: blocks::STONE, min_y: 0, max_y: 16, chance_per_1000: 2, vein_size: 7 },
];

const NETHER_ORES: &[OreSpec] = &[
    OreSpec { block: blocks::GLOWSTONE, host: blocks::NETHERRACK, min_y: 64, max_y: 127, chance_per_1000: 20, vein_size: 10 },
];

/// Deterministic generator entry point: `(seed, chunk_x, chunk_z, dim) -> Chunk`.
/// The output depends only on these inputs, never on generation order or on any
/// mutable state shared between calls.
pub fn generate_chunk(seed: i64, chunk_x: i32, chunk_z: i32, dim: Dimension) -> Chunk {
    match dim {
        Dimension::Overworld => generate_overworld(seed, chunk_x, chunk_z),
        Dimension::Nether => generate_nether(seed, chunk_x, chunk_z),
    }
}

/// Spreads `generate_chunk` over a worker-thread pool. Each thread generates disjoint
/// chunks with no shared mutable state, matching the trivially-parallel contract.
pub fn generate_many(seed: i64, positions: &[ChunkPos], dim: Dimension) -> Vec<Chunk> {
    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .max(1);
    tracing::debug!(count = positions.len(), workers, "generating chunk batch");

    if positions.len() <= 1 || workers == 1 {
        return positions
            .iter()
            .map(|p| generate_chunk(seed, p.x, p.z, dim))
            .collect();
    }

    let chunk_len = positions.len().div_ceil(workers);
    let mut results: Vec<Option<Chunk>> = (0..positions.len()).map(|_| None).collect();

    std::thread::scope(|scope| {
        let mut handles = Vec::new();
        for (batch_idx, batch) in positions.chunks(chunk_len).enumerate() {
            let handle = scope.spawn(move || {
                batch
                    .iter()
                    .map(|p| generate_chunk(seed, p.x, p.z, dim))
                    .collect::<Vec<_>>()
            });
            handles.push((batch_idx, handle));
        }
        for (batch_idx, handle) in handles {
            let generated = handle.join().expect("generator worker panicked");
            let start = batch_idx * chunk_len;
            for (i, c) in generated.into_iter().enumerate() {
                results[start + i] = Some(c);
            }
        }
    });

    results.into_iter().map(|c| c.expect("every position generated")).collect()
}

fn generate_overworld(seed: i64, cx: i32, cz: i32) -> Chunk {
    let mut chunk = Chunk::empty();
    let noise = GradientNoise::new(seed);

    // Step 1-2: biome scalars and stone-layer height, per column.
    let mut heights = [[0i32; CHUNK_SIZE_Z]; CHUNK_SIZE_X];
    let mut arid = [[false; CHUNK_SIZE_Z]; CHUNK_SIZE_X];
    for (x, height_row) in heights.iter_mut().enumerate() {
        for (z, height_cell) in height_row.iter_mut().enumerate() {
            let wx = (cx as f64) * CHUNK_SIZE_X as f64 + x as f64;
            let wz = (cz as f64) * CHUNK_SIZE_Z as f64 + z as f64;

            let temperature = noise.fbm2d(wx * 0.01, wz * 0.01, 3, 0.5) * 50.0 + 50.0;
            let blend = noise.fbm2d(wx * 0.05, wz * 0.05, 4, 0.55);

            let base_height = 64.0 + blend * 24.0;
            let height = base_height.clamp(4.0, (CHUNK_SIZE_Y - 2) as f64) as i32;
            *height_cell = height;
            arid[x][z] = temperature >= 80.0;

            // Step 2: stone layer.
            for y in 1..height {
                chunk.set_block(x, y as usize, z, blocks::STONE);
            }
        }
    }

    // Step 3: biome toppings.
    for x in 0..CHUNK_SIZE_X {
        for z in 0..CHUNK_SIZE_Z {
            let height = heights[x][z];
            let top = (height - 1).max(1) as usize;
            if arid[x][z] {
                chunk.set_block(x, top, z, blocks::SAND);
                if top > 1 {
                    chunk.set_block(x, top - 1, z, blocks::SANDSTONE);
                }
            } else {
                chunk.set_block(x, top, z, blocks::GRASS);
                if top > 1 {
                    chunk.set_block(x, top - 1, z, blocks::DIRT);
                }
            }
        }
    }

    // Step 4: water/lava fill below sea level.
    const SEA_LEVEL: usize = 64;
    for x in 0..CHUNK_SIZE_X {
        for z in 0..CHUNK_SIZE_Z {
            let fill = if arid[x][z] { blocks::LAVA } else { blocks::WATER };
            for y in 1..SEA_LEVEL {
                if chunk.get_block(x, y, z) == blocks::AIR {
                    chunk.set_block(x, y, z, fill);
                }
            }
        }
    }

    // Step 5: ore pass, 3x3 neighbor chance-word iteration.
    run_ore_pass(&mut chunk, seed, cx, cz, OVERWORLD_ORES);

    // Step 6: cutter pass, 11x11 neighbor chance-word iteration.
    run_cutter_pass(&mut chunk, seed, cx, cz);

    // Step 7: bedrock floor.
    for x in 0..CHUNK_SIZE_X {
        for z in 0..CHUNK_SIZE_Z {
            chunk.set_block(x, 0, z, blocks::BEDROCK);
        }
    }

    // Step 8: grass fixup.
    fixup_grass(&mut chunk);

    // Step 9: lighting seed.
    chunk.seed_lighting(blocks::is_opaque, blocks::emission);
    chunk.clear_changed();
    chunk
}

fn generate_nether(seed: i64, cx: i32, cz: i32) -> Chunk {
    let mut chunk = Chunk::empty();

    for x in 0..CHUNK_SIZE_X {
        for z in 0..CHUNK_SIZE_Z {
            chunk.set_block(x, 0, z, blocks::BEDROCK);
            chunk.set_block(x, CHUNK_SIZE_Y - 1, z, blocks::BEDROCK);
            for y in 1..CHUNK_SIZE_Y - 1 {
                let block = if y < 32 {
                    blocks::LAVA
                } else if (4..=120).contains(&y) {
                    blocks::AIR
                } else {
                    blocks::NETHERRACK
                };
                chunk.set_block(x, y, z, block);
            }
            // Shell: netherrack floor/ceiling around the open cavern.
            chunk.set_block(x, 32, z, blocks::NETHERRACK);
            chunk.set_block(x, 33, z, blocks::NETHERRACK);
            chunk.set_block(x, 120, z, blocks::NETHERRACK);
            chunk.set_block(x, 121, z, blocks::SOUL_SAND);
        }
    }

    run_ore_pass(&mut chunk, seed, cx, cz, NETHER_ORES);

    for x in 0..CHUNK_SIZE_X {
        for z in 0..CHUNK_SIZE_Z {
            for y in 0..CHUNK_SIZE_Y {
                if chunk.get_block(x, y, z) == blocks::GLOWSTONE {
                    chunk.set_block_light(x, y, z, blocks::emission(blocks::GLOWSTONE));
                }
            }
        }
    }
    chunk.clear_changed();
    chunk
}

fn fixup_grass(chunk: &mut Chunk) {
    for x in 0..CHUNK_SIZE_X {
        for z in 0..CHUNK_SIZE_Z {
            for y in 1..CHUNK_SIZE_Y - 1 {
                let block = chunk.get_block(x, y, z);
                let above = chunk.get_block(x, y + 1, z);
                if block == blocks::DIRT && above == blocks::AIR {
                    chunk.set_block(x, y, z, blocks::GRASS);
                } else if block == blocks::GRASS && blocks::is_opaque(above) {
                    chunk.set_block(x, y, z, blocks::DIRT);
                }
            }
        }
    }
}

/// Runs every ore spec across the 3x3 neighborhood of `(cx, cz)`: each neighbor chunk's
/// own chance-word stream decides whether a vein starts inside that neighbor, but the
/// resulting walk may place blocks into `chunk` if it wanders across the boundary. This
/// makes vein placement identical no matter which of the nine chunks is generated first.
fn run_ore_pass(chunk: &mut Chunk, seed: i64, cx: i32, cz: i32, specs: &[OreSpec]) {
    for dz in -1..=1 {
        for dx in -1..=1 {
            let ncx = cx + dx;
            let ncz = cz + dz;
            let rng = ChunkRng::for_chunk(seed, ncx, ncz);
            for (i, word) in rng.chance_words().enumerate() {
                let spec = &specs[i % specs.len()];
                if (word % 1000) as u32 >= spec.chance_per_1000 {
                    continue;
                }
                let local_x = ((word >> 8) & 0xF) as i32;
                let local_z = ((word >> 12) & 0xF) as i32;
                let y_span = (spec.max_y - spec.min_y).max(1);
                let local_y = spec.min_y + ((word >> 16) % y_span as u64) as i32;

                let start_wx = ncx * CHUNK_SIZE_X as i32 + local_x;
                let start_wz = ncz * CHUNK_SIZE_Z as i32 + local_z;
                place_vein(chunk, cx, cz, word, start_wx, local_y, start_wz, spec);
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn place_vein(
    chunk: &mut Chunk,
    cx: i32,
    cz: i32,
    seed_word: u64,
    start_wx: i32,
    start_wy: i32,
    start_wz: i32,
    spec: &OreSpec,
) {
    let mut walker = seed_word ^ 0x9E37_79B9_7F4A_7C15;
    let mut next_step = move || -> i32 {
        walker ^= walker << 13;
        walker ^= walker >> 7;
        walker ^= walker << 17;
        ((walker % 3) as i32) - 1
    };

    let (mut wx, mut wy, mut wz) = (start_wx, start_wy, start_wz);
    for _ in 0..spec.vein_size {
        write_host_matched(chunk, cx, cz, wx, wy, wz, spec);
        wx += next_step();
        wy = (wy + next_step()).clamp(1, CHUNK_SIZE_Y as i32 - 2);
        wz += next_step();
    }
}

fn write_host_matched(chunk: &mut Chunk, cx: i32, cz: i32, wx: i32, wy: i32, wz: i32, spec: &OreSpec) {
    let local_x = wx - cx * CHUNK_SIZE_X as i32;
    let local_z = wz - cz * CHUNK_SIZE_Z as i32;
    if !(0..CHUNK_SIZE_X as i32).contains(&local_x) || !(0..CHUNK_SIZE_Z as i32).contains(&local_z) {
        return;
    }
    if wy < 0 || wy >= CHUNK_SIZE_Y as i32 {
        return;
    }
    let (x, y, z) = (local_x as usize, wy as usize, local_z as usize);
    if chunk.get_block(x, y, z) == spec.host {
        chunk.set_block(x, y, z, spec.block);
    }
}

/// Cave/ravine carving: an 11x11 neighborhood of independent chance streams, each
/// tracing a meandering path of sphere stencils that erase terrain.
fn run_cutter_pass(chunk: &mut Chunk, seed: i64, cx: i32, cz: i32) {
    for dz in -5..=5 {
        for dx in -5..=5 {
            let ncx = cx + dx;
            let ncz = cz + dz;
            let rng = ChunkRng::for_chunk(seed ^ CUTTER_SALT, ncx, ncz);
            for (i, word) in rng.chance_words().take(4).enumerate() {
                // One or two carving attempts per neighbor chunk, gated by a fixed
                // low-probability threshold independent of ore chances.
                if (word % 1000) as u32 >= 8 {
                    continue;
                }
                let is_ravine = i % 2 == 1;
                let local_x = ((word >> 8) & 0xF) as i32;
                let local_z = ((word >> 12) & 0xF) as i32;
                let local_y = 8 + ((word >> 16) % 100) as i32;
                let start_wx = ncx * CHUNK_SIZE_X as i32 + local_x;
                let start_wz = ncz * CHUNK_SIZE_Z as i32 + local_z;
                carve_path(chunk, cx, cz, word, start_wx, local_y, start_wz, is_ravine);
            }
        }
    }
}

fn carve_path(
    chunk: &mut Chunk,
    cx: i32,
    cz: i32,
    seed_word: u64,
    start_wx: i32,
    start_wy: i32,
    start_wz: i32,
    is_ravine: bool,
) {
    let mut walker = seed_word ^ 0xD1B5_4A32_D192_ED03;
    let mut next_u64 = move || {
        walker ^= walker << 13;
        walker ^= walker >> 7;
        walker ^= walker << 17;
        walker
    };

    let steps = if is_ravine { 28 } else { 16 };
    let (mut wx, mut wy, mut wz) = (start_wx as f64, start_wy as f64, start_wz as f64);
    for _ in 0..steps {
        let radius = if is_ravine { 1 } else { 2 + (next_u64() % 3) as i32 };
        carve_sphere(chunk, cx, cz, wx as i32, wy as i32, wz as i32, radius);

        let step = next_u64();
        let dx = ((step & 0x3) as i32) - 1;
        let dy = (((step >> 2) & 0x3) as i32) - 1;
        let dz = (((step >> 4) & 0x3) as i32) - 1;
        wx += dx as f64;
        wy += (dy as f64) * 0.5;
        wz += dz as f64;
        wy = wy.clamp(4.0, (CHUNK_SIZE_Y - 4) as f64);
    }
}

fn carve_sphere(chunk: &mut Chunk, cx: i32, cz: i32, cwx: i32, cwy: i32, cwz: i32, radius: i32) {
    for dx in -radius..=radius {
        for dy in -radius..=radius {
            for dz in -radius..=radius {
                if dx * dx + dy * dy + dz * dz > radius * radius {
                    continue;
                }
                let (wx, wy, wz) = (cwx + dx, cwy + dy, cwz + dz);
                let local_x = wx - cx * CHUNK_SIZE_X as i32;
                let local_z = wz - cz * CHUNK_SIZE_Z as i32;
                if !(0..CHUNK_SIZE_X as i32).contains(&local_x)
                    || !(0..CHUNK_SIZE_Z as i32).contains(&local_z)
                    || !(1..CHUNK_SIZE_Y as i32 - 1).contains(&wy)
                {
                    continue;
                }
                let (x, y, z) = (local_x as usize, wy as usize, local_z as usize);
                if chunk.get_block(x, y, z) == blocks::BEDROCK {
                    continue;
                }
                chunk.set_block(x, y, z, if wy < 13 { blocks::LAVA } else { blocks::AIR });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn determinism_same_inputs_same_output() {
        let a = generate_chunk(1234, 5, -2, Dimension::Overworld);
        let b = generate_chunk(1234, 5, -2, Dimension::Overworld);
        assert_eq!(a, b);
    }

    #[test]
    fn order_independence() {
        let positions = [
            ChunkPos { x: 0, z: 0 },
            ChunkPos { x: 1, z: 0 },
            ChunkPos { x: 0, z: 1 },
        ];
        let forward = generate_many(99, &positions, Dimension::Overworld);
        let reversed_positions: Vec<ChunkPos> = positions
            .iter()
            .rev()
            .map(|p| ChunkPos { x: p.x, z: p.z })
            .collect();
        let backward = generate_many(99, &reversed_positions, Dimension::Overworld);
        assert_eq!(forward[0], backward[2]);
        assert_eq!(forward[1], backward[1]);
        assert_eq!(forward[2], backward[0]);
    }

    #[test]
    fn bedrock_floor_present_overworld() {
        let c = generate_chunk(7, 0, 0, Dimension::Overworld);
        for x in 0..CHUNK_SIZE_X {
            for z in 0..CHUNK_SIZE_Z {
                assert_eq!(c.get_block(x, 0, z), blocks::BEDROCK);
            }
        }
    }

    #[test]
    fn bedrock_floor_and_ceiling_nether() {
        let c = generate_chunk(7, 0, 0, Dimension::Nether);
        for x in 0..CHUNK_SIZE_X {
            for z in 0..CHUNK_SIZE_Z {
                assert_eq!(c.get_block(x, 0, z), blocks::BEDROCK);
                assert_eq!(c.get_block(x, CHUNK_SIZE_Y - 1, z), blocks::BEDROCK);
            }
        }
    }

    #[test]
    fn neighbor_vein_coherence() {
        // A vein that starts in chunk (0,0) and walks into (1,0) must leave identical
        // voxels there whether (1,0) is generated standalone or alongside (0,0).
        let seed = 4242;
        let a0 = generate_chunk(seed, 0, 0, Dimension::Overworld);
        let a1 = generate_chunk(seed, 1, 0, Dimension::Overworld);
        let positions = [ChunkPos { x: 0, z: 0 }, ChunkPos { x: 1, z: 0 }];
        let both = generate_many(seed, &positions, Dimension::Overworld);
        assert_eq!(a0, both[0]);
        assert_eq!(a1, both[1]);
    }
}
