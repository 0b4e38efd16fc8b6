//! tests/history_tests.rs - pagination, fetch/skip semantics and log filtering

#[cfg(test)]
mod tests {
    use crate::{
        blockchain::{
            client::ClientError,
            filter_logs,
            history::{find_log_matches, log_matches},
            next_page, HistoryScan, ScanError, ScanOptions, SignaturePaginator,
        },
        models::SignatureListEntry,
        tests::mock_ledger::{test_record, test_signature, MockLedger},
    };
    use futures::StreamExt;
    use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey, signature::Signature};
    use std::time::{Duration, Instant};
    use tokio_util::sync::CancellationToken;

    fn options(page_size: usize) -> ScanOptions {
        ScanOptions {
            page_size,
            commitment: CommitmentConfig::confirmed(),
            fetch_delay: Duration::ZERO,
            max_records: None,
        }
    }

    async fn collect_signatures(ledger: &MockLedger, opts: &ScanOptions) -> Vec<Signature> {
        let mut scan = HistoryScan::new(ledger, Pubkey::new_unique(), opts, CancellationToken::new());
        let mut seen = Vec::new();
        while let Some(record) = scan.next_record().await {
            seen.push(record.expect("scan should not fail").signature);
        }
        seen
    }

    #[tokio::test]
    async fn test_pagination_is_complete_for_any_page_size() {
        let ledger_size = 25;
        let expected: Vec<SignatureListEntry> = MockLedger::with_history(ledger_size).signatures;

        for page_size in [1, 2, 3, 5, 7, 10, 24, 25, 26, 1000] {
            let ledger = MockLedger::with_history(ledger_size);
            let mut paginator = SignaturePaginator::new(Pubkey::new_unique(), page_size, CommitmentConfig::confirmed());

            let mut all = Vec::new();
            while !paginator.is_done() {
                let page = paginator.next_page(&ledger).await.unwrap();
                assert!(page.entries.len() <= page_size);
                all.extend(page.entries);
            }

            assert_eq!(all, expected, "page size {}", page_size);
            assert_eq!(ledger.list_call_count(), ledger_size / page_size + 1, "page size {}", page_size);

            // Every cursor sent is distinct
            let cursors: Vec<Option<Signature>> = ledger.list_calls.lock().unwrap().iter().map(|c| c.before).collect();
            for (i, cursor) in cursors.iter().enumerate() {
                assert!(!cursors[..i].contains(cursor), "cursor repeated for page size {}", page_size);
            }
        }
    }

    #[tokio::test]
    async fn test_three_signatures_fit_in_one_page() {
        let ledger = MockLedger::with_history(3);

        let page = next_page(&ledger, &Pubkey::new_unique(), None, 1000, CommitmentConfig::confirmed())
            .await
            .unwrap();

        assert_eq!(page.entries.len(), 3);
        assert!(page.done);
        assert_eq!(page.cursor, Some(test_signature(2)));
        // Newest first
        assert!(page.entries.windows(2).all(|w| w[0].slot > w[1].slot));
    }

    #[tokio::test]
    async fn test_full_page_then_empty_page() {
        let ledger = MockLedger::with_history(1000);
        let address = Pubkey::new_unique();

        let first = next_page(&ledger, &address, None, 1000, CommitmentConfig::confirmed())
            .await
            .unwrap();
        assert_eq!(first.entries.len(), 1000);
        assert!(!first.done);
        assert_eq!(first.cursor, Some(test_signature(999)));

        let second = next_page(&ledger, &address, first.cursor, 1000, CommitmentConfig::confirmed())
            .await
            .unwrap();
        assert!(second.entries.is_empty());
        assert!(second.done);

        let calls = ledger.list_calls.lock().unwrap();
        assert_eq!(calls[0].before, None);
        assert_eq!(calls[1].before, Some(test_signature(999)));
        assert!(calls.iter().all(|c| c.limit == 1000));
    }

    #[tokio::test]
    async fn test_paginator_stops_requesting_once_done() {
        let ledger = MockLedger::with_history(3);
        let mut paginator = SignaturePaginator::new(Pubkey::new_unique(), 10, CommitmentConfig::confirmed());

        let page = paginator.next_page(&ledger).await.unwrap();
        assert!(page.done);

        let again = paginator.next_page(&ledger).await.unwrap();
        assert!(again.done);
        assert!(again.entries.is_empty());
        assert_eq!(ledger.list_call_count(), 1);
    }

    #[tokio::test]
    async fn test_paginator_page_size_is_clamped() {
        let ledger = MockLedger::with_history(3);
        let mut paginator = SignaturePaginator::new(Pubkey::new_unique(), 0, CommitmentConfig::confirmed());

        let page = paginator.next_page(&ledger).await.unwrap();
        assert_eq!(page.entries.len(), 1);
        assert!(!page.done);
        assert_eq!(ledger.list_calls.lock().unwrap()[0].limit, 1);
    }

    #[tokio::test]
    async fn test_paginator_listing_error_propagates() {
        let mut ledger = MockLedger::with_history(3);
        ledger.fail_listing_on(0, ClientError::Transport("connection refused".to_string()));
        let mut paginator = SignaturePaginator::new(Pubkey::new_unique(), 10, CommitmentConfig::confirmed());

        let err = paginator.next_page(&ledger).await.unwrap_err();
        assert_eq!(err, ClientError::Transport("connection refused".to_string()));
        assert!(!paginator.is_done());
    }

    #[tokio::test]
    async fn test_scan_yields_records_in_node_order_across_pages() {
        let ledger = MockLedger::with_history(10);

        let seen = collect_signatures(&ledger, &options(3)).await;

        let expected: Vec<Signature> = (0..10).map(test_signature).collect();
        assert_eq!(seen, expected);
        assert_eq!(ledger.fetch_call_count(), 10);
    }

    #[tokio::test]
    async fn test_absent_record_is_skipped() {
        let mut ledger = MockLedger::with_history(3);
        ledger.set_record(1, Ok(None));

        let mut scan = HistoryScan::new(&ledger, Pubkey::new_unique(), &options(1000), CancellationToken::new());
        let mut seen = Vec::new();
        while let Some(record) = scan.next_record().await {
            seen.push(record.unwrap().signature);
        }

        assert_eq!(seen, vec![test_signature(0), test_signature(2)]);
        assert_eq!(scan.stats().absent, 1);
        assert_eq!(scan.stats().fetched, 2);
        // It was still asked for
        assert!(ledger.fetch_calls.lock().unwrap().contains(&test_signature(1)));
    }

    #[tokio::test]
    async fn test_record_errors_do_not_stop_the_scan() {
        let mut ledger = MockLedger::with_history(4);
        ledger.set_record(0, Err(ClientError::Transport("timed out".to_string())));
        ledger.set_record(
            2,
            Err(ClientError::Decode("transaction has no status metadata".to_string())),
        );

        let mut scan = HistoryScan::new(&ledger, Pubkey::new_unique(), &options(2), CancellationToken::new());
        let mut seen = Vec::new();
        while let Some(record) = scan.next_record().await {
            seen.push(record.unwrap().signature);
        }

        assert_eq!(seen, vec![test_signature(1), test_signature(3)]);
        let stats = scan.stats();
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.listed, 4);
    }

    #[tokio::test]
    async fn test_listing_error_ends_the_stream() {
        let mut ledger = MockLedger::with_history(5);
        ledger.fail_listing_on(1, ClientError::Transport("node unreachable".to_string()));

        let scan = HistoryScan::new(&ledger, Pubkey::new_unique(), &options(2), CancellationToken::new());
        let items: Vec<_> = scan.into_stream().collect().await;

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap().signature, test_signature(0));
        assert_eq!(items[1].as_ref().unwrap().signature, test_signature(1));
        assert!(matches!(
            &items[2],
            Err(ScanError::Listing { source: ClientError::Transport(_), .. })
        ));
        assert_eq!(ledger.list_call_count(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_scan_makes_no_calls() {
        let ledger = MockLedger::with_history(3);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut scan = HistoryScan::new(&ledger, Pubkey::new_unique(), &options(10), cancel);

        assert!(matches!(scan.next_record().await, Some(Err(ScanError::Cancelled))));
        assert!(scan.next_record().await.is_none());
        assert_eq!(ledger.list_call_count(), 0);
        assert_eq!(ledger.fetch_call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_mid_scan_stops_before_next_fetch() {
        let ledger = MockLedger::with_history(5);
        let cancel = CancellationToken::new();
        let mut scan = HistoryScan::new(&ledger, Pubkey::new_unique(), &options(10), cancel.clone());

        let first = scan.next_record().await.unwrap().unwrap();
        assert_eq!(first.signature, test_signature(0));

        cancel.cancel();
        assert!(matches!(scan.next_record().await, Some(Err(ScanError::Cancelled))));
        assert_eq!(ledger.fetch_call_count(), 1);
    }

    #[tokio::test]
    async fn test_max_records_limits_the_scan() {
        let ledger = MockLedger::with_history(10);
        let opts = ScanOptions {
            max_records: Some(1),
            ..options(1000)
        };

        let seen = collect_signatures(&ledger, &opts).await;

        assert_eq!(seen, vec![test_signature(0)]);
        assert_eq!(ledger.fetch_call_count(), 1);
    }

    #[tokio::test]
    async fn test_fetches_are_spaced_by_delay() {
        let ledger = MockLedger::with_history(3);
        let opts = ScanOptions {
            fetch_delay: Duration::from_millis(20),
            ..options(1000)
        };

        let started = Instant::now();
        let seen = collect_signatures(&ledger, &opts).await;

        assert_eq!(seen.len(), 3);
        assert!(started.elapsed() >= Duration::from_millis(35));
    }

    #[test]
    fn test_filter_finds_marker_with_context() {
        let record = test_record(
            test_signature(7),
            4242,
            &["Program X invoke", "InitializeMint2", "Program X success"],
        );

        let matches = filter_logs(&record, "InitializeMint2");

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].line, "InitializeMint2");
        assert_eq!(matches[0].line_index, 1);
        assert_eq!(matches[0].signature, test_signature(7));
        assert_eq!(matches[0].slot, 4242);
    }

    #[test]
    fn test_filter_is_pure_and_ordered() {
        let record = test_record(
            test_signature(1),
            1,
            &[
                "Program log: Instruction: InitializeMint2",
                "Program log: other",
                "Program log: Instruction: InitializeMint2 again",
            ],
        );
        let before = record.clone();

        let first = filter_logs(&record, "InitializeMint2");
        let second = filter_logs(&record, "InitializeMint2");

        assert_eq!(first, second);
        assert_eq!(record, before);
        assert_eq!(first.iter().map(|m| m.line_index).collect::<Vec<_>>(), vec![0, 2]);
        assert!(filter_logs(&record, "CloseAccount").is_empty());
    }

    #[tokio::test]
    async fn test_log_matches_stream() {
        let mut ledger = MockLedger::with_history(6);
        ledger.set_logs(1, &["Program T invoke [1]", "Program log: Instruction: InitializeMint2"]);
        ledger.set_logs(4, &["Program log: Instruction: InitializeMint2"]);
        ledger.set_record(2, Ok(None));

        let scan = HistoryScan::new(&ledger, Pubkey::new_unique(), &options(4), CancellationToken::new());
        let found: Vec<_> = log_matches(scan.into_stream(), "InitializeMint2")
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].signature, test_signature(1));
        assert_eq!(found[0].line_index, 1);
        assert_eq!(found[1].signature, test_signature(4));
    }

    #[tokio::test]
    async fn test_find_log_matches_reports_stats() {
        let mut ledger = MockLedger::with_history(3);
        ledger.set_logs(2, &["Program log: Instruction: InitializeMint2"]);

        let (found, stats) = find_log_matches(
            &ledger,
            Pubkey::new_unique(),
            &options(1000),
            "InitializeMint2",
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].slot, 10_000 - 2);
        assert_eq!(stats.fetched, 3);
        assert_eq!(stats.pages, 1);
    }
}
