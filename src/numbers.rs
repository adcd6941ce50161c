/// Implements sign extension as described at [Sign extension](https://en.wikipedia.org/wiki/Sign_extension).
///
/// `bits` is read as a `valid_bits` wide two's-complement field, bits above the field are
/// ignored. Widths of 16 and more return the value unchanged.
#[must_use]
pub const fn sign_extend(bits: u16, valid_bits: u8) -> u16 {
    debug_assert!(valid_bits > 0, "sign extension of an empty bit field");
    if valid_bits >= 16 {
        return bits;
    }
    let field = bits & ((1 << valid_bits) - 1);
    let most_significant_bit = field >> (valid_bits - 1);
    if most_significant_bit == 1 {
        // negative: 1-extend
        field | (0xFFFF << valid_bits)
    } else {
        // positive, already 0-extended
        field
    }
}

#[must_use]
pub const fn twos_complement_to_decimal(bin_rep: u16) -> i16 {
    bin_rep.cast_signed()
}
