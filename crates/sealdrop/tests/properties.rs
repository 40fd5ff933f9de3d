//! Property tests over random call sequences.

use std::collections::HashSet;

use proptest::prelude::*;

use sealdrop::{
    FileDownloadResponse, FileSharingResponse, UploadFileAtomicRequest, UploadFileError,
    UploadFileRequest,
};
use sealdrop_testkit::generators::{file_name, ops, Op};
use sealdrop_testkit::{Party, TestExchange};

const CALLERS: usize = 4;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn cast() -> Vec<Party> {
    ["p0", "p1", "p2", "p3"].iter().map(|n| Party::new(n)).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn requests_get_distinct_aliases_and_ids(names in prop::collection::vec(file_name(), 1..30)) {
        runtime().block_on(async {
            let exchange = TestExchange::new();
            let owner = Party::new("owner");

            let mut aliases = HashSet::new();
            let mut ids = HashSet::new();
            for name in &names {
                let alias = exchange.request_file(&owner.identity, name).await.unwrap();
                let info = exchange.get_alias_info(&alias).await;
                // Owner has no profile, so the alias resolves to nothing visible.
                assert!(info.is_err());
                aliases.insert(alias);
            }
            for record in exchange.snapshot().await.files().iter() {
                ids.insert(record.file_id);
            }
            assert_eq!(aliases.len(), names.len());
            assert_eq!(ids.len(), names.len());
        });
    }

    #[test]
    fn random_calls_keep_the_ledger_consistent(ops in ops(CALLERS, 8, 40)) {
        runtime().block_on(async {
            let exchange = TestExchange::new();
            let parties = cast();
            // Party 3 never registers.
            exchange.register(&[&parties[0], &parties[1], &parties[2]]).await;

            for op in ops {
                let before = exchange.snapshot().await;
                match op {
                    Op::SetUser { caller, user } => {
                        exchange.set_user(&parties[caller].identity, user).await.unwrap();
                    }
                    Op::RequestFile { caller, file_name } => {
                        let next = before.files().next_file_id();
                        exchange.request_file(&parties[caller].identity, &file_name).await.unwrap();
                        let after = exchange.snapshot().await;
                        assert!(after.files().get(next).unwrap().is_pending());
                    }
                    Op::UploadFile { caller, file_id, contents, owner_key } => {
                        let response = exchange
                            .upload_file(
                                &parties[caller].identity,
                                UploadFileRequest {
                                    file_id,
                                    file_content: contents.clone(),
                                    file_type: "bin".to_string(),
                                    owner_key,
                                },
                            )
                            .await
                            .unwrap();
                        let after = exchange.snapshot().await;
                        match before.files().get(file_id) {
                            None => assert_eq!(response, Err(UploadFileError::NotRequested)),
                            Some(record) if record.is_pending() => {
                                assert_eq!(response, Ok(()));
                                let alias = record.alias().unwrap();
                                assert!(!after.aliases().contains(alias));
                                assert_eq!(
                                    after.files().get(file_id).unwrap().payload().unwrap().contents,
                                    contents
                                );
                            }
                            Some(_) => {
                                assert_eq!(response, Err(UploadFileError::AlreadyUploaded));
                                assert_eq!(after, before);
                            }
                        }
                    }
                    Op::UploadFileAtomic { caller, name, contents } => {
                        let file_id = exchange
                            .upload_file_atomic(
                                &parties[caller].identity,
                                UploadFileAtomicRequest {
                                    name,
                                    owner_key: vec![1],
                                    content: contents,
                                },
                            )
                            .await
                            .unwrap();
                        assert_eq!(file_id, before.files().next_file_id());
                    }
                    Op::ShareFile { caller, target, file_id, wrapped_key } => {
                        let response = exchange
                            .share_file(
                                &parties[caller].identity,
                                &parties[target].identity,
                                file_id,
                                wrapped_key.clone(),
                            )
                            .await
                            .unwrap();
                        let allowed = before
                            .files()
                            .get(file_id)
                            .map(|r| r.owner == parties[caller].identity)
                            .unwrap_or(false)
                            && before.users().contains(&parties[target].identity);
                        let after = exchange.snapshot().await;
                        if allowed {
                            assert_eq!(response, FileSharingResponse::Ok);
                            let record = after.files().get(file_id).unwrap();
                            assert_eq!(
                                record.shared_with.get(&parties[target].identity),
                                Some(&wrapped_key)
                            );
                        } else {
                            assert_eq!(response, FileSharingResponse::PermissionError);
                            assert_eq!(after, before);
                        }
                    }
                    Op::DownloadFile { caller, file_id } => {
                        let caller = &parties[caller].identity;
                        let response = exchange.download_file(caller, file_id).await;
                        match before.files().get(file_id) {
                            None => assert_eq!(response, FileDownloadResponse::NotFoundFile),
                            Some(r) if r.is_pending() => {
                                assert_eq!(response, FileDownloadResponse::NotUploadedFile)
                            }
                            Some(r) if r.owner == *caller => match response {
                                FileDownloadResponse::FoundFile(data) => {
                                    assert_eq!(data.owner_key, r.payload().unwrap().owner_key)
                                }
                                other => panic!("owner got {:?}", other),
                            },
                            Some(r) => match r.shared_with.get(caller) {
                                Some(key) => match response {
                                    FileDownloadResponse::FoundFile(data) => {
                                        assert_eq!(&data.owner_key, key)
                                    }
                                    other => panic!("recipient got {:?}", other),
                                },
                                None => assert_eq!(response, FileDownloadResponse::PermissionError),
                            },
                        }
                        assert_eq!(exchange.snapshot().await, before);
                    }
                }

                exchange.snapshot().await.check_invariants().unwrap();
            }

            // Whatever happened, replaying the journal gives the same ledger.
            assert_eq!(exchange.reopen().await.snapshot().await, exchange.snapshot().await);
        });
    }
}
