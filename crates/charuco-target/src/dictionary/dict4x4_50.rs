/// Marker codes of the 4x4 dictionary with 50 markers.
///
/// Minimum Hamming distance over all rotations: 4.
pub static CODE_DATA: [u64; 50] = [
    0xa2d8,
    0x6062,
    0xb1a4,
    0xcf85,
    0x8275,
    0xcd78,
    0x601c,
    0xd0bb,
    0x19eb,
    0xb05f,
    0x8acf,
    0x77b6,
    0x7a74,
    0x8713,
    0xdee6,
    0x1372,
    0x5281,
    0x3d9a,
    0x4e3d,
    0x9561,
    0xb8ca,
    0xfd54,
    0xa232,
    0x26ea,
    0xf53a,
    0xa4d6,
    0x4d1e,
    0x3021,
    0xd962,
    0x6db9,
    0x33f9,
    0xdbb1,
    0x9a7e,
    0x15b1,
    0x795d,
    0x3112,
    0xec8d,
    0xc199,
    0x483b,
    0x1b1b,
    0xad21,
    0x0a27,
    0x02c6,
    0x8e64,
    0x57ab,
    0x4f50,
    0xcc2a,
    0xe4be,
    0x0568,
    0x6a0e,
];
