/// Marker codes of the 6x6 dictionary with 100 markers.
///
/// Minimum Hamming distance over all rotations: 12.
pub static CODE_DATA: [u64; 100] = [
    0x3f0484a12,
    0xb3e1df44f,
    0xaff48b694,
    0x7997fba2e,
    0xda2ebf892,
    0xf34e03419,
    0xf9a24835e,
    0xd831f51f6,
    0x927b819a2,
    0xccdd391e5,
    0x37a229625,
    0x201c4d7ab,
    0x8bd6281b2,
    0x2288088f5,
    0xa9c23d408,
    0xf7bcae3d3,
    0x68fafd0d1,
    0xd8d49eec3,
    0xb0c587374,
    0xe35d2c807,
    0x2596d3d9d,
    0x9575e4951,
    0x87fb9e0a5,
    0xb1bf1b952,
    0x80ac792b6,
    0xc70a0b9e8,
    0x033653606,
    0xce2527cf5,
    0x330c7915f,
    0x6ccf85839,
    0x53b1ebcb1,
    0x20c0f4fb1,
    0x692833b1a,
    0xab4157a9b,
    0x31f61fee8,
    0x414df8d70,
    0x1592ac1cd,
    0x8979dd7dd,
    0xf61ad8d80,
    0xea55787d6,
    0xce4bcd1be,
    0x560cb2ea3,
    0x6bbd691bc,
    0xb847104b3,
    0xe22901f79,
    0xefba77989,
    0xa42f34900,
    0xb2f4b82ab,
    0x12a017dd1,
    0x2109864b9,
    0xf71733ab0,
    0xae92b52e5,
    0xa2fd52581,
    0x94d1edaac,
    0x483f4b122,
    0x227aaa396,
    0xaaf39b27e,
    0xed6c9dd88,
    0x18a7ddc97,
    0x5871a2565,
    0xe6c48cb6e,
    0x63b23a462,
    0x778541ba6,
    0xc1ca30b41,
    0x6658a5eb6,
    0x1b1b11bf4,
    0xf4bcf8d75,
    0x82cfdc7f7,
    0x037699934,
    0x777daf4fd,
    0xff3bc7317,
    0xb5ee0c3b5,
    0xadce6409b,
    0xfe519b8e4,
    0xe0804b018,
    0x38e58e10a,
    0x3b4995527,
    0x6609b796e,
    0x1de11ae39,
    0x508e734a8,
    0x02b254a72,
    0x29077c2fe,
    0x7c6733f2c,
    0x0701641b2,
    0x54c425b0d,
    0xec220a7c0,
    0x988b8c4dc,
    0x531f4f2ec,
    0x86ac9c8c3,
    0xe32072eae,
    0xfc4a71ff1,
    0xeb9b04cfa,
    0xb13a69041,
    0x099a2467d,
    0x6c6fcc252,
    0x19dd4aa93,
    0x67319808c,
    0x7a7f9087a,
    0x8cc74bb44,
    0x55f3df964,
];
