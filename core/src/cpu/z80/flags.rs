/// Bits of the F register.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flag {
    C = 0x01,  // Carry
    N = 0x02,  // Add/Subtract
    PV = 0x04, // Parity/Overflow
    X = 0x08,  // Unused (bit 3)
    H = 0x10,  // Half Carry
    Y = 0x20,  // Unused (bit 5)
    Z = 0x40,  // Zero
    S = 0x80,  // Sign
}

/// Undefined bits 3 and 5. Instructions carry them over unchanged.
pub(crate) const UNDEFINED_BITS: u8 = Flag::X as u8 | Flag::Y as u8;

/// True when `val` has an even number of set bits.
pub(crate) fn parity(val: u8) -> bool {
    val.count_ones() % 2 == 0
}

/// S, Z and parity-in-PV for `result`; every other bit clear.
pub(crate) fn szp(result: u8) -> u8 {
    let mut f = sz(result);
    if parity(result) { f |= Flag::PV as u8; }
    f
}

/// S and Z for `result`; every other bit clear.
pub(crate) fn sz(result: u8) -> u8 {
    let mut f = 0;
    if result == 0 { f |= Flag::Z as u8; }
    if (result & 0x80) != 0 { f |= Flag::S as u8; }
    f
}
