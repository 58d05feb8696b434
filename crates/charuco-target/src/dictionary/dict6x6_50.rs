/// Marker codes of the 6x6 dictionary with 50 markers.
///
/// Minimum Hamming distance over all rotations: 13.
pub static CODE_DATA: [u64; 50] = [
    0xe1e5d48b2,
    0x55661e251,
    0xf6fd470bf,
    0x8f3ef1354,
    0xaf29ec428,
    0x06644d75c,
    0x72a82cba3,
    0x5ca999fd0,
    0x58c196047,
    0xf05b357c3,
    0x888450bbd,
    0x423a31a8c,
    0xdb115ea97,
    0x7f2f85d83,
    0xa47c19b96,
    0x1cdccc16e,
    0xb7335665c,
    0xc49c4a2e3,
    0x5ec56f9f4,
    0x13d47de84,
    0x9c612d812,
    0x5875e1a87,
    0xb2f191964,
    0x98bd2675d,
    0x96f817602,
    0x9967b332d,
    0x3c36fc7da,
    0xcf0404c1e,
    0x1ebbc7051,
    0xa31ca27b6,
    0x10ba917a7,
    0xd269e3e08,
    0xe4e76c91f,
    0x56494a6df,
    0xdad6ec210,
    0x6a68410a6,
    0x248784afb,
    0x0ddfbe4eb,
    0xea0f62ac1,
    0xb246d65c4,
    0x417d2c3ff,
    0x9373f85a0,
    0x74a592c21,
    0x9ff5d8aef,
    0xf3f8a9477,
    0x32a4ef434,
    0x00d21409a,
    0x1978c0b75,
    0xe03203f02,
    0x81a3c2074,
];
