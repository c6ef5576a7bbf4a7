use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock time in whole seconds.
pub fn local_block_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Seconds to add to local time to get chain time. `margin` absorbs the
/// delay between paginated queries of one cycle.
pub fn block_time_offset(chain_block_time: u64, local_block_time: u64, margin: u64) -> i64 {
    chain_block_time as i64 - local_block_time as i64 + margin as i64
}

pub fn block_time_with_offset(local_block_time: u64, offset: i64) -> u64 {
    (local_block_time as i64 + offset).max(0) as u64
}

pub fn block_time(offset: i64) -> u64 {
    block_time_with_offset(local_block_time(), offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_time_offset() {
        let offset = block_time_offset(1_000, 990, 10);
        assert_eq!(offset, 20);
        assert_eq!(block_time_with_offset(995, offset), 1_015);

        // local clock ahead of the chain
        let offset = block_time_offset(1_000, 1_050, 10);
        assert_eq!(offset, -40);
        assert_eq!(block_time_with_offset(1_060, offset), 1_020);
        assert_eq!(block_time_with_offset(10, offset), 0);
    }

    #[test]
    fn test_local_block_time_is_recent() {
        // 2020-09-13
        assert!(local_block_time() > 1_600_000_000);
    }
}
