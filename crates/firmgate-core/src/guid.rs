//! GUID helpers

use uuid::Uuid;

const GUID_DASHES: [usize; 4] = [8, 13, 18, 23];

/// Whether `guid` is a non-nil GUID in canonical 8-4-4-4-12 form
pub fn is_valid(guid: &str) -> bool {
    if guid.len() != 36 {
        return false;
    }
    let shape_ok = guid.bytes().enumerate().all(|(i, b)| {
        if GUID_DASHES.contains(&i) {
            b == b'-'
        } else {
            b.is_ascii_hexdigit()
        }
    });
    shape_ok && Uuid::try_parse(guid).is_ok_and(|u| !u.is_nil())
}

/// Derive a GUID from an instance id (RFC 4122 v5, DNS namespace)
pub fn from_instance_id(instance_id: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, instance_id.as_bytes()).to_string()
}

/// Split a `|`-separated GUID list, rejecting anything that is not a GUID
pub fn split_list(text: &str) -> crate::Result<Vec<String>> {
    text.split('|')
        .map(|guid| {
            if is_valid(guid) {
                Ok(guid.to_string())
            } else {
                Err(crate::Error::NotSupported(format!(
                    "{} is not a valid GUID",
                    guid
                )))
            }
        })
        .collect()
}
