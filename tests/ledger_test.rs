/// マイグレーション台帳のテスト
///
/// filter_pending と commit の二段階手順、ファイル永続化、エンコーディング、
/// 破損ファイルの扱いを確認します。
use shardwright::core::ledger::LedgerEncoding;
use shardwright::services::migration_ledger::{LedgerFileStore, MigrationCommandLedger};
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

#[cfg(test)]
mod ledger_tests {
    use super::*;

    const STORE: &str = "Blog.Data.BlogAccessor";
    const FINGERPRINT: &str = "fp-development";

    fn ledger(dir: &TempDir, encoding: LedgerEncoding) -> MigrationCommandLedger {
        MigrationCommandLedger::new(LedgerFileStore::new(dir.path(), encoding))
    }

    fn commands() -> Vec<&'static str> {
        vec![
            "CREATE TABLE Articles_2024 (Id INT)",
            "CREATE INDEX IX_Articles_2024 ON Articles_2024 (Id)",
        ]
    }

    /// コミット前は同じ入力に対して同じ結果が返ることを確認
    #[test]
    fn test_filter_is_repeatable_before_commit() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir, LedgerEncoding::Utf8);

        let first = ledger.filter_pending(STORE, FINGERPRINT, &commands()).unwrap();
        let second = ledger.filter_pending(STORE, FINGERPRINT, &commands()).unwrap();

        assert_eq!(first, commands());
        assert_eq!(second, commands());
        assert_eq!(ledger.uncommitted_count(STORE).unwrap(), 2);
    }

    /// コミット後は新しいインスタンスでも未適用コマンドが空になることを確認
    #[test]
    fn test_committed_commands_survive_restart() {
        let dir = TempDir::new().unwrap();
        {
            let ledger = ledger(&dir, LedgerEncoding::Utf8);
            ledger.filter_pending(STORE, FINGERPRINT, &commands()).unwrap();
            let committed = ledger.commit(STORE).unwrap();
            assert_eq!(committed.len(), 2);
        }

        let restarted = ledger(&dir, LedgerEncoding::Utf8);
        let pending = restarted
            .filter_pending(STORE, FINGERPRINT, &commands())
            .unwrap();

        assert!(pending.is_empty());
    }

    /// 空白の違いは同じコマンドとして扱われることを確認
    #[test]
    fn test_whitespace_is_normalized() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir, LedgerEncoding::Utf8);
        ledger
            .filter_pending(STORE, FINGERPRINT, &["CREATE TABLE X (Id INT)"])
            .unwrap();
        ledger.commit(STORE).unwrap();

        let pending = ledger
            .filter_pending(STORE, FINGERPRINT, &["  CREATE   TABLE X\n(Id INT)  "])
            .unwrap();

        assert!(pending.is_empty());
    }

    /// 接続フィンガープリントが異なれば同じコマンドでも未適用になることを確認
    #[test]
    fn test_fingerprint_separates_targets() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir, LedgerEncoding::Utf8);
        ledger.filter_pending(STORE, FINGERPRINT, &commands()).unwrap();
        ledger.commit(STORE).unwrap();

        let pending = ledger
            .filter_pending(STORE, "fp-production", &commands())
            .unwrap();

        assert_eq!(pending, commands());
    }

    /// 入力内の重複と空コマンドが除外されることを確認
    #[test]
    fn test_duplicates_and_empty_commands() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir, LedgerEncoding::Utf8);

        let pending = ledger
            .filter_pending(STORE, FINGERPRINT, &["A", "  ", "A", "B"])
            .unwrap();

        assert_eq!(pending, vec!["A", "B"]);
    }

    /// UTF-16LE の台帳がBOM付きで書き出され、読み戻せることを確認
    #[test]
    fn test_utf16le_ledger() {
        let dir = TempDir::new().unwrap();
        {
            let ledger = ledger(&dir, LedgerEncoding::Utf16Le);
            ledger.filter_pending(STORE, FINGERPRINT, &commands()).unwrap();
            ledger.commit(STORE).unwrap();
        }

        let path = LedgerFileStore::new(dir.path(), LedgerEncoding::Utf16Le).path_for(STORE);
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xFE]);

        let restarted = ledger(&dir, LedgerEncoding::Utf16Le);
        assert_eq!(restarted.entries(STORE).unwrap().len(), 2);
    }

    /// 破損した台帳ファイルは空とみなさずエラーになることを確認
    #[test]
    fn test_corrupted_ledger_fails_fast() {
        let dir = TempDir::new().unwrap();
        let path = LedgerFileStore::new(dir.path(), LedgerEncoding::Utf8).path_for(STORE);
        fs::write(&path, "{ not a ledger").unwrap();

        let error = ledger(&dir, LedgerEncoding::Utf8)
            .filter_pending(STORE, FINGERPRINT, &commands())
            .unwrap_err();

        assert!(error.is_corrupted());
    }

    /// ストアキーごとに独立した台帳ファイルになることを確認
    #[test]
    fn test_stores_are_independent() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir, LedgerEncoding::Utf8);
        ledger.filter_pending("Store.A", FINGERPRINT, &["X"]).unwrap();
        ledger.commit("Store.A").unwrap();

        let pending = ledger.filter_pending("Store.B", FINGERPRINT, &["X"]).unwrap();

        assert_eq!(pending, vec!["X"]);
        assert!(dir.path().join("Store.A.ledger.json").exists());
        assert!(!dir.path().join("Store.B.ledger.json").exists());
    }

    /// 複数スレッドからの同時アクセスでも記録が失われないことを確認
    #[test]
    fn test_concurrent_filter_and_commit() {
        let dir = TempDir::new().unwrap();
        let ledger = Arc::new(ledger(&dir, LedgerEncoding::Utf8));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    let command = format!("CREATE TABLE T{} (Id INT)", i);
                    ledger.filter_pending(STORE, FINGERPRINT, &[command]).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        ledger.commit(STORE).unwrap();

        let restarted = MigrationCommandLedger::new(LedgerFileStore::new(
            dir.path(),
            LedgerEncoding::Utf8,
        ));
        assert_eq!(restarted.entries(STORE).unwrap().len(), 8);
    }
}
