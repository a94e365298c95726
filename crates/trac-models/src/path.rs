//! Deterministic `dataItem` path tokens:
//!
//! ```text
//! data/table/{objectId}/snap-{S}/delta-{D}-x{hex}
//! file/{objectId}/version-{V}
//! ```

use rand::RngCore;

/// Builds the dataItem path token for a DATA delta.
pub fn data_item_path(object_id: &str, snap_index: u32, delta_index: u32, suffix_hex: &str) -> String {
    format!("data/table/{object_id}/snap-{snap_index}/delta-{delta_index}-x{suffix_hex}")
}

/// Builds the dataItem path token for a FILE version.
pub fn file_item_path(object_id: &str, version: u32) -> String {
    format!("file/{object_id}/version-{version}")
}

/// Generates a random hex suffix used to disambiguate delta path tokens
/// written within the same snap/delta index (e.g. after a retried write).
pub fn random_suffix_hex(len_bytes: usize) -> String {
    let mut bytes = vec![0u8; len_bytes];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_item_path_matches_deterministic_shape() {
        let p = data_item_path("abc-123", 0, 0, "deadbeef");
        assert_eq!(p, "data/table/abc-123/snap-0/delta-0-xdeadbeef");
    }

    #[test]
    fn file_item_path_matches_deterministic_shape() {
        let p = file_item_path("abc-123", 2);
        assert_eq!(p, "file/abc-123/version-2");
    }

    #[test]
    fn random_suffix_has_requested_length() {
        let s = random_suffix_hex(8);
        assert_eq!(s.len(), 16);
    }
}
