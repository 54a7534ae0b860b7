use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Reserved prefix for ids minted offline. Remote ids never carry it.
pub const LOCAL_ID_PREFIX: &str = "local-";

const SHORT_HASH_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOrigin {
    Local,
    Remote,
}

pub fn origin_of(id: &str) -> TaskOrigin {
    if is_local_origin(id) {
        TaskOrigin::Local
    } else {
        TaskOrigin::Remote
    }
}

pub fn is_local_origin(id: &str) -> bool {
    id.starts_with(LOCAL_ID_PREFIX)
}

pub fn generate_local_id<F>(mut exists: F) -> String
where
    F: FnMut(&str) -> bool,
{
    for _ in 0..64 {
        let seed = Uuid::now_v7().to_string();
        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        let candidate = format!("{}{}", LOCAL_ID_PREFIX, &digest[..SHORT_HASH_LEN]);
        if !exists(&candidate) {
            return candidate;
        }
    }

    format!(
        "{}{}",
        LOCAL_ID_PREFIX,
        &Uuid::now_v7().simple().to_string()[..16]
    )
}

/// Short form for terminal output: local ids lose their prefix, remote ids
/// keep their tail.
pub fn display_id(id: &str) -> &str {
    if let Some(rest) = id.strip_prefix(LOCAL_ID_PREFIX) {
        return rest;
    }
    let len = id.len();
    if len > 10 && id.is_char_boundary(len - 10) {
        &id[len - 10..]
    } else {
        id
    }
}
