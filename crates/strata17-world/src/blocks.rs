/// A fixed table of the block ids the generator and lighting pass need to reason
/// about: whether light passes through a block, and how much light it emits.
///
/// This intentionally does not carry crafting, smelting, or item-form data — that
/// belongs to a client-side item registry, not to world storage.
struct BlockInfo {
    id: u8,
    name: &'static str,
    opaque: bool,
    emission: u8,
}

macro_rules! block_table {
    ($( $id:literal => $name:literal $(, opaque)? $(, emits($e:literal))? ; )*) => {
        &[
            $(
                BlockInfo {
                    id: $id,
                    name: $name,
                    opaque: block_table!(@opaque $($id)? $(opaque)?),
                    emission: block_table!(@emit $($e)?),
                },
            )*
        ]
    };
    (@opaque) => { false };
    (@opaque opaque) => { true };
    (@emit) => { 0u8 };
    (@emit $e:literal) => { $e };
}

#[rustfmt::skip]
static BLOCKS: &[BlockInfo] = block_table! {
    0   => "air";
    1   => "stone", opaque;
    2   => "grass", opaque;
    3   => "dirt", opaque;
    4   => "cobblestone", opaque;
    5   => "planks", opaque;
    6   => "sapling";
    7   => "bedrock", opaque;
    8   => "flowing_water";
    9   => "water";
    10  => "flowing_lava", emits(15);
    11  => "lava", emits(15);
    12  => "sand", opaque;
    13  => "gravel", opaque;
    14  => "gold_ore", opaque;
    15  => "iron_ore", opaque;
    16  => "coal_ore", opaque;
    17  => "log", opaque;
    18  => "leaves";
    19  => "sponge", opaque;
    20  => "glass";
    21  => "lapis_ore", opaque;
    22  => "lapis_block", opaque;
    23  => "dispenser", opaque;
    24  => "sandstone", opaque;
    25  => "noteblock", opaque;
    26  => "bed";
    27  => "powered_rail";
    28  => "detector_rail";
    29  => "sticky_piston", opaque;
    30  => "cobweb";
    31  => "tall_grass";
    32  => "dead_bush";
    33  => "piston", opaque;
    34  => "piston_head";
    35  => "wool", opaque;
    36  => "piston_extension";
    37  => "dandelion";
    38  => "rose";
    39  => "brown_mushroom", emits(1);
    40  => "red_mushroom";
    41  => "gold_block", opaque;
    42  => "iron_block", opaque;
    43  => "double_slab", opaque;
    44  => "slab";
    45  => "brick_block", opaque;
    46  => "tnt", opaque;
    47  => "bookshelf", opaque;
    48  => "mossy_cobblestone", opaque;
    49  => "obsidian", opaque;
    50  => "torch", emits(14);
    51  => "fire", emits(15);
    52  => "mob_spawner", opaque;
    53  => "oak_stairs";
    54  => "chest", opaque;
    55  => "redstone_wire";
    56  => "diamond_ore", opaque;
    57  => "diamond_block", opaque;
    58  => "crafting_table", opaque;
    59  => "wheat_crop";
    60  => "farmland", opaque;
    61  => "furnace", opaque;
    62  => "lit_furnace", opaque, emits(13);
    63  => "sign_post";
    64  => "wooden_door";
    65  => "ladder";
    66  => "rail";
    67  => "cobblestone_stairs";
    68  => "wall_sign";
    69  => "lever";
    70  => "stone_pressure_plate";
    71  => "iron_door";
    72  => "wooden_pressure_plate";
    73  => "redstone_ore", opaque;
    74  => "lit_redstone_ore", opaque, emits(9);
    75  => "unlit_redstone_torch";
    76  => "redstone_torch", emits(7);
    77  => "stone_button";
    78  => "snow_layer";
    79  => "ice";
    80  => "snow_block", opaque;
    81  => "cactus";
    82  => "clay", opaque;
    83  => "sugar_cane";
    84  => "jukebox", opaque;
    85  => "fence";
    86  => "pumpkin", opaque;
    87  => "netherrack", opaque;
    88  => "soul_sand", opaque;
    89  => "glowstone", opaque, emits(15);
    90  => "portal", emits(11);
    91  => "lit_pumpkin", opaque, emits(15);
    92  => "cake";
    93  => "repeater_off";
    94  => "repeater_on", emits(9);
    95  => "locked_chest", opaque, emits(15);
    96  => "trapdoor";
    97  => "monster_egg", opaque;
    98  => "stone_brick", opaque;
    99  => "brown_mushroom_block", opaque;
    100 => "red_mushroom_block", opaque;
    101 => "iron_bars";
    102 => "glass_pane";
    103 => "melon", opaque;
    104 => "pumpkin_stem";
    105 => "melon_stem";
    106 => "vine";
    107 => "fence_gate";
    108 => "brick_stairs";
    109 => "stone_brick_stairs";
    110 => "mycelium", opaque;
    111 => "lily_pad";
    112 => "nether_brick", opaque;
    113 => "nether_brick_fence";
    114 => "nether_brick_stairs";
    115 => "nether_wart";
    116 => "enchantment_table";
    117 => "brewing_stand", emits(1);
    118 => "cauldron";
    119 => "end_portal";
    120 => "end_portal_frame", opaque;
    121 => "end_stone", opaque;
};

pub const BLOCK_COUNT: usize = BLOCKS.len();

fn lookup(id: u8) -> Option<&'static BlockInfo> {
    BLOCKS.iter().find(|b| b.id == id)
}

pub fn is_valid(id: u8) -> bool {
    lookup(id).is_some()
}

pub fn is_opaque(id: u8) -> bool {
    lookup(id).map(|b| b.opaque).unwrap_or(false)
}

pub fn emission(id: u8) -> u8 {
    lookup(id).map(|b| b.emission).unwrap_or(0)
}

pub fn name(id: u8) -> &'static str {
    lookup(id).map(|b| b.name).unwrap_or("unknown")
}

pub const AIR: u8 = 0;
pub const STONE: u8 = 1;
pub const GRASS: u8 = 2;
pub const DIRT: u8 = 3;
pub const GRAVEL: u8 = 13;
pub const CLAY: u8 = 82;
pub const SAND: u8 = 12;
pub const SANDSTONE: u8 = 24;
pub const WATER: u8 = 9;
pub const LAVA: u8 = 11;
pub const BEDROCK: u8 = 7;
pub const COAL_ORE: u8 = 16;
pub const IRON_ORE: u8 = 15;
pub const GOLD_ORE: u8 = 14;
pub const LAPIS_ORE: u8 = 21;
pub const REDSTONE_ORE: u8 = 73;
pub const DIAMOND_ORE: u8 = 56;
pub const GLOWSTONE: u8 = 89;
pub const NETHERRACK: u8 = 87;
pub const SOUL_SAND: u8 = 88;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_around_110_entries() {
        assert!(BLOCK_COUNT >= 100 && BLOCK_COUNT <= 140);
    }

    #[test]
    fn stone_is_opaque_and_dark() {
        assert!(is_opaque(STONE));
        assert_eq!(emission(STONE), 0);
    }

    #[test]
    fn glowstone_emits_full_brightness() {
        assert_eq!(emission(GLOWSTONE), 15);
    }

    #[test]
    fn unknown_id_defaults_safely() {
        assert!(!is_valid(250));
        assert!(!is_opaque(250));
        assert_eq!(emission(250), 0);
    }
}
