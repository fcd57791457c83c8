//! Bit-packed CDB and response fields
//!
//! MMC defines sub-byte fields by their position on the wire. A field list can be
//! written either lowest bit first (the way a little-endian compiler allocates
//! bit-fields) or highest bit first (big-endian allocation). Both declarations of
//! the same byte must encode identical wire bits; the host-order one is selected
//! with `cfg(target_endian)` by each command module.

/// Declaration order of the fields within one byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOrder {
    LsbFirst,
    MsbFirst,
}

/// Field list for a single byte. `F` is a field identifier, widths must sum to 8.
#[derive(Debug, Clone, Copy)]
pub struct BitLayout<F: 'static> {
    order: BitOrder,
    fields: &'static [(F, u8)],
}

impl<F: Copy + PartialEq + 'static> BitLayout<F> {
    pub const fn new(order: BitOrder, fields: &'static [(F, u8)]) -> Self {
        Self { order, fields }
    }

    pub fn order(&self) -> BitOrder {
        self.order
    }

    /// Total declared width, always 8 for a well formed layout
    pub fn width(&self) -> u32 {
        self.fields.iter().map(|(_, w)| *w as u32).sum()
    }

    /// Shift and mask of `field` inside the byte
    fn locate(&self, field: F) -> Option<(u8, u8)> {
        let mut consumed = 0u8;
        for (f, width) in self.fields {
            if *f == field {
                let shift = match self.order {
                    BitOrder::LsbFirst => consumed,
                    BitOrder::MsbFirst => 8 - consumed - width,
                };
                let mask = ((1u16 << width) - 1) as u8;
                return Some((shift, mask));
            }
            consumed += width;
        }
        None
    }

    /// Store `value` into `field`; bits outside the field are left untouched.
    /// Values wider than the field are truncated.
    pub fn set(&self, byte: &mut u8, field: F, value: u8) {
        debug_assert_eq!(self.width(), 8);
        if let Some((shift, mask)) = self.locate(field) {
            *byte = (*byte & !(mask << shift)) | ((value & mask) << shift);
        }
    }

    pub fn get(&self, byte: u8, field: F) -> u8 {
        debug_assert_eq!(self.width(), 8);
        self.locate(field)
            .map(|(shift, mask)| (byte >> shift) & mask)
            .unwrap_or(0)
    }

    /// Pack a full set of field values into a fresh zeroed byte
    pub fn pack(&self, values: &[(F, u8)]) -> u8 {
        let mut byte = 0u8;
        for (field, value) in values {
            self.set(&mut byte, *field, *value);
        }
        byte
    }

    pub fn unpack(&self, byte: u8) -> Vec<(F, u8)> {
        self.fields
            .iter()
            .map(|(field, _)| (*field, self.get(byte, *field)))
            .collect()
    }
}

/// Big-endian multi-byte helpers: MMC integers are always big-endian on the wire
pub fn get_be16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

pub fn get_be32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

pub fn set_be16(bytes: &mut [u8], value: u16) {
    bytes[..2].copy_from_slice(&value.to_be_bytes());
}

pub fn set_be32(bytes: &mut [u8], value: u32) {
    bytes[..4].copy_from_slice(&value.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Field {
        Low,
        Flag,
        High,
    }

    const LSB: BitLayout<Field> =
        BitLayout::new(BitOrder::LsbFirst, &[(Field::Low, 2), (Field::Flag, 1), (Field::High, 5)]);
    const MSB: BitLayout<Field> =
        BitLayout::new(BitOrder::MsbFirst, &[(Field::High, 5), (Field::Flag, 1), (Field::Low, 2)]);

    #[test]
    fn test_lsb_first_positions() {
        let byte = LSB.pack(&[(Field::Low, 0b11), (Field::Flag, 1), (Field::High, 0)]);
        assert_eq!(byte, 0b0000_0111);
        assert_eq!(
            MSB.unpack(byte),
            vec![(Field::High, 0), (Field::Flag, 1), (Field::Low, 0b11)]
        );
        assert_eq!(MSB.order(), BitOrder::MsbFirst);
    }

    #[test]
    fn test_mirror_layouts_agree() {
        for raw in 0..=255u8 {
            assert_eq!(LSB.get(raw, Field::Low), MSB.get(raw, Field::Low));
            assert_eq!(LSB.get(raw, Field::Flag), MSB.get(raw, Field::Flag));
            assert_eq!(LSB.get(raw, Field::High), MSB.get(raw, Field::High));
        }
    }

    #[test]
    fn test_set_truncates_and_preserves_other_bits() {
        let mut byte = 0xFF;
        LSB.set(&mut byte, Field::Flag, 0);
        assert_eq!(byte, 0b1111_1011);
        LSB.set(&mut byte, Field::Low, 0b101);
        assert_eq!(LSB.get(byte, Field::Low), 0b01);
    }

    #[test]
    fn test_be_helpers() {
        let mut buf = [0u8; 4];
        set_be32(&mut buf, 0x0102_0304);
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(get_be32(&buf), 0x0102_0304);
        set_be16(&mut buf, 0xBEEF);
        assert_eq!(get_be16(&buf), 0xBEEF);
    }
}
