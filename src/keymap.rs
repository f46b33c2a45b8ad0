//! Filename → object-key derivation.
//!
//! Recorder files encode their grouping segments with a `%` marker, e.g.
//! `2021-02-10%XBTUSD%quote.dat`. Only the first marker becomes a key
//! separator, so the object lands under a one-level date "folder" in the
//! bucket: `2021-02-10/XBTUSD%quote.dat`. Later markers stay part of the
//! object name; downstream consumers rely on that, so it must not be
//! "fixed" to replace all of them.

/// Marker character separating grouping segments in a recorder filename.
pub const GROUP_MARKER: char = '%';

/// Separator that forms folder levels in object keys.
pub const KEY_SEPARATOR: char = '/';

/// Derive the object key for a filename.
///
/// Replaces only the first [`GROUP_MARKER`] with [`KEY_SEPARATOR`]. A
/// filename without a marker maps to itself. Pure and deterministic, so
/// re-running a sync targets the same key.
pub fn derive_key(filename: &str) -> String {
    filename.replacen(GROUP_MARKER, &KEY_SEPARATOR.to_string(), 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_first_marker_with_separator() {
        assert_eq!(
            derive_key("2021-02-10%XBTUSD%quote.dat"),
            "2021-02-10/XBTUSD%quote.dat"
        );
    }

    #[test]
    fn later_markers_are_preserved() {
        assert_eq!(derive_key("a%b%c%d"), "a/b%c%d");
    }

    #[test]
    fn no_marker_is_identity() {
        assert_eq!(derive_key("plain-file.txt"), "plain-file.txt");
    }

    #[test]
    fn idempotent_once_markers_are_exhausted() {
        let key = derive_key("2021-02-10%quote.dat");
        assert_eq!(derive_key(&key), key);
    }

    #[test]
    fn empty_filename_maps_to_empty_key() {
        assert_eq!(derive_key(""), "");
    }
}
