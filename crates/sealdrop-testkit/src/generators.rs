//! Proptest generators for property-based testing.

use proptest::prelude::*;

use sealdrop_core::{FileId, Identity, User, MAX_IDENTITY_LEN};

/// Generate a random Identity.
pub fn identity() -> impl Strategy<Value = Identity> {
    prop::collection::vec(any::<u8>(), 1..=MAX_IDENTITY_LEN)
        .prop_map(|bytes| Identity::new(bytes).expect("length within MAX_IDENTITY_LEN"))
}

/// Generate a file name, sometimes with a known extension.
pub fn file_name() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _-]{1,24}(\\.(pdf|txt|png|jpg|csv|bin))?".prop_map(String::from)
}

/// Generate content bytes of specified max length.
pub fn contents(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate opaque wrapped-key bytes.
pub fn wrapped_key() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..=80)
}

/// Generate a profile.
pub fn user() -> impl Strategy<Value = User> {
    ("[A-Z][a-z]{0,11}", "[A-Z][a-z]{0,11}", any::<[u8; 32]>())
        .prop_map(|(first, last, key)| User::new(first, last, key.to_vec()))
}

/// One exchange call, with callers and files as small indexes so that
/// generated sequences hit the same files again.
#[derive(Debug, Clone)]
pub enum Op {
    SetUser { caller: usize, user: User },
    RequestFile { caller: usize, file_name: String },
    UploadFile { caller: usize, file_id: FileId, contents: Vec<u8>, owner_key: Vec<u8> },
    UploadFileAtomic { caller: usize, name: String, contents: Vec<u8> },
    ShareFile { caller: usize, target: usize, file_id: FileId, wrapped_key: Vec<u8> },
    DownloadFile { caller: usize, file_id: FileId },
}

/// Generate one call among `callers` parties touching file ids below `max_file_id`.
pub fn op(callers: usize, max_file_id: FileId) -> impl Strategy<Value = Op> {
    let caller = 0..callers.max(1);
    let file = 0..max_file_id.max(1);
    prop_oneof![
        (caller.clone(), user()).prop_map(|(caller, user)| Op::SetUser { caller, user }),
        (caller.clone(), file_name())
            .prop_map(|(caller, file_name)| Op::RequestFile { caller, file_name }),
        (caller.clone(), file.clone(), contents(64), wrapped_key()).prop_map(
            |(caller, file_id, contents, owner_key)| Op::UploadFile {
                caller,
                file_id,
                contents,
                owner_key
            }
        ),
        (caller.clone(), file_name(), contents(64))
            .prop_map(|(caller, name, contents)| Op::UploadFileAtomic { caller, name, contents }),
        (caller.clone(), caller.clone(), file.clone(), wrapped_key()).prop_map(
            |(caller, target, file_id, wrapped_key)| Op::ShareFile {
                caller,
                target,
                file_id,
                wrapped_key
            }
        ),
        (caller, file).prop_map(|(caller, file_id)| Op::DownloadFile { caller, file_id }),
    ]
}

/// Generate a sequence of calls.
pub fn ops(callers: usize, max_file_id: FileId, max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op(callers, max_file_id), 0..=max_len)
}
