use alloc::vec::Vec;

/// FITS block size in bytes (each logical record is one block).
pub const BLOCK_SIZE: usize = 2880;

/// FITS card (keyword record) size in bytes.
pub const CARD_SIZE: usize = 80;

/// Number of cards that fit in a single block.
pub const CARDS_PER_BLOCK: usize = BLOCK_SIZE / CARD_SIZE;

/// Padding byte used for header blocks (ASCII space).
pub const HEADER_PAD_BYTE: u8 = 0x20;

/// Padding byte used for data blocks (zero).
pub const DATA_PAD_BYTE: u8 = 0x00;

/// Returns the number of fill bytes needed to round `size` up to a multiple
/// of [`BLOCK_SIZE`].
///
/// `padding(0) == 0`, `padding(2880) == 0`, `padding(2881) == 2879`.
pub const fn padding(size: usize) -> usize {
    (BLOCK_SIZE - size % BLOCK_SIZE) % BLOCK_SIZE
}

/// Returns `size` rounded up to the next multiple of [`BLOCK_SIZE`].
pub const fn padded_len(size: usize) -> usize {
    size + padding(size)
}

/// Extends `buf` with ASCII spaces up to the next block boundary, as required
/// for FITS header segments.
pub fn pad_header(buf: &mut Vec<u8>) {
    let fill = padding(buf.len());
    buf.resize(buf.len() + fill, HEADER_PAD_BYTE);
}

/// Extends `buf` with zero bytes up to the next block boundary, as required
/// for FITS data segments.
pub fn pad_data(buf: &mut Vec<u8>) {
    let fill = padding(buf.len());
    buf.resize(buf.len() + fill, DATA_PAD_BYTE);
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    // ---- padding ----

    #[test]
    fn padding_zero() {
        assert_eq!(padding(0), 0);
    }

    #[test]
    fn padding_one_byte() {
        assert_eq!(padding(1), 2879);
    }

    #[test]
    fn padding_exact_block() {
        assert_eq!(padding(BLOCK_SIZE), 0);
        assert_eq!(padding(2 * BLOCK_SIZE), 0);
    }

    #[test]
    fn padding_one_over() {
        assert_eq!(padding(BLOCK_SIZE + 1), BLOCK_SIZE - 1);
    }

    #[test]
    fn padded_len_is_always_block_aligned() {
        for size in [0usize, 1, 79, 80, 2879, 2880, 2881, 5760, 5761, 100_000] {
            assert_eq!(padded_len(size) % BLOCK_SIZE, 0, "size {}", size);
            assert!(padded_len(size) >= size);
            assert!(padded_len(size) - size < BLOCK_SIZE);
        }
    }

    // ---- constants ----

    #[test]
    fn constant_relationships() {
        assert_eq!(BLOCK_SIZE, 2880);
        assert_eq!(CARD_SIZE, 80);
        assert_eq!(CARDS_PER_BLOCK, 36);
        assert_eq!(CARDS_PER_BLOCK * CARD_SIZE, BLOCK_SIZE);
    }

    // ---- pad_header / pad_data ----

    #[test]
    fn pad_header_fills_with_spaces() {
        let mut buf = vec![b'X'; CARD_SIZE];
        pad_header(&mut buf);
        assert_eq!(buf.len(), BLOCK_SIZE);
        assert!(buf[..CARD_SIZE].iter().all(|&b| b == b'X'));
        assert!(buf[CARD_SIZE..].iter().all(|&b| b == HEADER_PAD_BYTE));
    }

    #[test]
    fn pad_data_fills_with_zeros() {
        let mut buf = vec![0xFFu8; 100];
        pad_data(&mut buf);
        assert_eq!(buf.len(), BLOCK_SIZE);
        assert!(buf[100..].iter().all(|&b| b == DATA_PAD_BYTE));
    }

    #[test]
    fn pad_aligned_buffer_is_noop() {
        let mut buf = vec![0xAAu8; BLOCK_SIZE];
        pad_data(&mut buf);
        assert_eq!(buf.len(), BLOCK_SIZE);

        let mut buf = vec![b'Y'; 2 * BLOCK_SIZE];
        pad_header(&mut buf);
        assert_eq!(buf.len(), 2 * BLOCK_SIZE);
    }

    #[test]
    fn pad_empty_buffer() {
        let mut buf: Vec<u8> = Vec::new();
        pad_data(&mut buf);
        assert!(buf.is_empty());
        pad_header(&mut buf);
        assert!(buf.is_empty());
    }

    #[test]
    fn pad_multi_block() {
        let mut buf = vec![1u8; BLOCK_SIZE + 7];
        pad_data(&mut buf);
        assert_eq!(buf.len(), 2 * BLOCK_SIZE);
        assert!(buf[BLOCK_SIZE + 7..].iter().all(|&b| b == 0));
    }
}
