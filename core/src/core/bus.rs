/// Byte-addressed memory as seen by the CPU.
///
/// Both operations are total over the 16-bit address space. Implementations
/// that back a smaller store wrap the address instead of failing, so the CPU
/// never has to handle an out-of-range access.
pub trait MemoryBus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);

    /// Little-endian 16-bit read (low byte at `addr`).
    fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// Little-endian 16-bit write (low byte at `addr`).
    fn write_word(&mut self, addr: u16, data: u16) {
        self.write(addr, data as u8);
        self.write(addr.wrapping_add(1), (data >> 8) as u8);
    }
}

impl<T: MemoryBus + ?Sized> MemoryBus for &mut T {
    fn read(&mut self, addr: u16) -> u8 {
        (**self).read(addr)
    }

    fn write(&mut self, addr: u16, data: u8) {
        (**self).write(addr, data)
    }
}
