/// Marker codes of the 5x5 dictionary with 50 markers.
///
/// Minimum Hamming distance over all rotations: 8.
pub static CODE_DATA: [u64; 50] = [
    0x0bba374,
    0x123f611,
    0x1a454a6,
    0x181211e,
    0x17c11f0,
    0x0e17be5,
    0x060b14f,
    0x0b5ec9d,
    0x0ca4990,
    0x036c196,
    0x12cee3e,
    0x19ae49a,
    0x0edf872,
    0x095d84e,
    0x1593aef,
    0x17f9485,
    0x177aa68,
    0x0807021,
    0x14f4a5e,
    0x1cdd6b9,
    0x05861ab,
    0x19f1e1b,
    0x1146de2,
    0x10a27a8,
    0x04f3eb4,
    0x1f23188,
    0x1954b74,
    0x1aeacf3,
    0x1610230,
    0x038bd87,
    0x1d79df1,
    0x0760d40,
    0x0d0660f,
    0x02234d0,
    0x02ad0ce,
    0x0cce79e,
    0x0957780,
    0x0810379,
    0x150a390,
    0x0cc0a45,
    0x17ccdb9,
    0x143059b,
    0x1d8f34a,
    0x07ec42e,
    0x124630f,
    0x0cba84a,
    0x1c6a74f,
    0x0c22d33,
    0x0786e96,
    0x1f13a92,
];
