//! Storage key codec.
//!
//! A file's identity lives only in its key:
//! `owners/{owner_id}/{file_id}_{file_name}`. Nothing is escaped. An owner id
//! or file name containing `/` decodes to the wrong segments, and a file id is
//! assumed never to contain `_` (it is always a generated UUID). Callers must
//! not treat the key layout as a security boundary.

use super::policy::{APPLICATION_OCTET_STREAM, APPLICATION_PDF, IMAGE_JPEG, IMAGE_PNG};

const OWNERS_SEGMENT: &str = "owners";
const ID_SEPARATOR: char = '_';

/// Identity fields recovered from a storage key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedKey {
    pub owner_id: String,
    pub file_id: String,
    pub file_name: String,
}

pub fn encode_key(owner_id: &str, file_id: &str, file_name: &str) -> String {
    format!("{OWNERS_SEGMENT}/{owner_id}/{file_id}{ID_SEPARATOR}{file_name}")
}

/// Listing prefix holding every key of one owner.
pub fn owner_prefix(owner_id: &str) -> String {
    format!("{OWNERS_SEGMENT}/{owner_id}/")
}

/// Decodes any key, including ones this codec did not write.
///
/// The owner is the segment after `owners`, or empty when the key lives
/// elsewhere. The last segment is split on its first `_`; without one, both
/// the id and the name are the whole segment.
pub fn decode_key(key: &str) -> DecodedKey {
    let segments: Vec<&str> = key.split('/').collect();

    let owner_id = match segments.as_slice() {
        [root, owner, _, ..] if *root == OWNERS_SEGMENT => *owner,
        _ => "",
    };

    let last = segments.last().copied().unwrap_or(key);
    let (file_id, file_name) = last.split_once(ID_SEPARATOR).unwrap_or((last, last));

    DecodedKey {
        owner_id: owner_id.to_owned(),
        file_id: file_id.to_owned(),
        file_name: file_name.to_owned(),
    }
}

/// Content type derived from the key's extension. Authoritative on reads.
///
/// Suffixes match case-sensitively: `A.PDF` is `application/octet-stream`.
pub fn infer_content_type(key: &str) -> &'static str {
    if key.ends_with(".pdf") {
        APPLICATION_PDF
    } else if key.ends_with(".png") {
        IMAGE_PNG
    } else if key.ends_with(".jpg") || key.ends_with(".jpeg") {
        IMAGE_JPEG
    } else {
        APPLICATION_OCTET_STREAM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(owner_id: &str, file_id: &str, file_name: &str) -> DecodedKey {
        DecodedKey {
            owner_id: owner_id.to_owned(),
            file_id: file_id.to_owned(),
            file_name: file_name.to_owned(),
        }
    }

    #[test]
    fn test_encode_layout() {
        assert_eq!(encode_key("u1", "F", "a.pdf"), "owners/u1/F_a.pdf");
        assert_eq!(owner_prefix("u1"), "owners/u1/");
    }

    #[test]
    fn test_round_trip() {
        let file_id = uuid::Uuid::new_v4().to_string();
        for (owner, name) in [
            ("u1", "a.pdf"),
            ("user-42", "scan 2024.png"),
            ("u1", "my_holiday_photo.jpeg"),
            ("u1", "_leading.pdf"),
            ("u1", "trailing_"),
            ("ünïcødé", "résumé.pdf"),
        ] {
            let key = encode_key(owner, &file_id, name);
            assert_eq!(decode_key(&key), decoded(owner, &file_id, name), "key {key}");
        }
    }

    #[test]
    fn test_decode_splits_on_first_underscore_only() {
        let key = "owners/u1/abc_report_final_v2.pdf";
        assert_eq!(decode_key(key), decoded("u1", "abc", "report_final_v2.pdf"));
    }

    #[test]
    fn test_slash_in_file_name_corrupts_decoding() {
        // Unescaped separators are a known limitation of the key layout.
        let key = encode_key("u1", "abc", "dir/b.pdf");
        let result = decode_key(&key);
        assert_eq!(result.owner_id, "u1");
        assert_eq!(result.file_id, "b.pdf");
        assert_ne!(result.file_name, "dir/b.pdf");
    }

    #[test]
    fn test_slash_in_owner_id_corrupts_decoding() {
        let key = encode_key("team/alice", "abc", "a.pdf");
        let result = decode_key(&key);
        assert_eq!(result.owner_id, "team");
        assert_eq!(result.file_id, "abc");
    }

    #[test]
    fn test_decode_foreign_keys() {
        assert_eq!(decode_key("legacy/photo.png"), decoded("", "photo.png", "photo.png"));
        assert_eq!(decode_key("loose_file.pdf"), decoded("", "loose", "file.pdf"));
        assert_eq!(decode_key("owners/u1"), decoded("", "u1", "u1"));
    }

    #[test]
    fn test_infer_content_type() {
        assert_eq!(infer_content_type("owners/u1/F_a.pdf"), "application/pdf");
        assert_eq!(infer_content_type("owners/u1/F_a.png"), "image/png");
        assert_eq!(infer_content_type("owners/u1/F_a.jpg"), "image/jpeg");
        assert_eq!(infer_content_type("owners/u1/F_a.jpeg"), "image/jpeg");
        assert_eq!(
            infer_content_type("owners/u1/F_A.PDF"),
            "application/octet-stream"
        );
        assert_eq!(
            infer_content_type("owners/u1/F_B.JPG"),
            "application/octet-stream"
        );
        assert_eq!(
            infer_content_type("owners/u1/F_notes.txt"),
            "application/octet-stream"
        );
        assert_eq!(
            infer_content_type("owners/u1/F_no-extension"),
            "application/octet-stream"
        );
        assert_eq!(
            infer_content_type("owners/u.pdf/F_pdf"),
            "application/octet-stream"
        );
    }
}
