//! Binary layout decoder for the bonding-curve account.

use crate::error::SniperError;

/// Minimum account size we accept. The price sits in the first 8 bytes; the
/// deployed layout guarantees at least 16 bytes of state.
const MIN_ACCOUNT_LEN: usize = 16;

/// Decoded snapshot of a bonding-curve account. Re-fetched on every price
/// query; never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BondingCurveState {
    pub price_lamports: u64,
}

/// Decode a raw bonding-curve account buffer.
///
/// Bytes `[0, 8)` hold the price as a little-endian u64. Bytes past the
/// fields we read are tolerated and ignored.
pub fn decode_bonding_curve(data: &[u8]) -> Result<BondingCurveState, SniperError> {
    if data.len() < MIN_ACCOUNT_LEN {
        return Err(SniperError::TruncatedAccountData { len: data.len() });
    }

    let mut raw = [0u8; 8];
    raw.copy_from_slice(&data[..8]);

    Ok(BondingCurveState {
        price_lamports: u64::from_le_bytes(raw),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_buffers_shorter_than_sixteen_bytes() {
        for len in 0..MIN_ACCOUNT_LEN {
            let err = decode_bonding_curve(&vec![0u8; len]).unwrap_err();
            assert!(matches!(err, SniperError::TruncatedAccountData { len: l } if l == len));
        }
    }

    #[test]
    fn reads_price_as_little_endian_u64() {
        let mut data = vec![0u8; 16];
        data[..8].copy_from_slice(&42_000_000u64.to_le_bytes());
        let state = decode_bonding_curve(&data).unwrap();
        assert_eq!(state.price_lamports, 42_000_000);
    }

    #[test]
    fn preserves_full_unsigned_range() {
        let mut data = vec![0u8; 16];
        data[..8].copy_from_slice(&u64::MAX.to_le_bytes());
        assert_eq!(decode_bonding_curve(&data).unwrap().price_lamports, u64::MAX);
    }

    #[test]
    fn ignores_trailing_bytes() {
        let mut data = vec![0xFFu8; 64];
        data[..8].copy_from_slice(&7u64.to_le_bytes());
        assert_eq!(decode_bonding_curve(&data).unwrap().price_lamports, 7);
    }
}
