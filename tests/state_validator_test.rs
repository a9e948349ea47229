/// データベース状態バリデーターのテスト
///
/// センチネルファイルの作成・判定・上書きと、非同期版のキャンセル確認を検証します。
use shardwright::core::accessor::AccessorIdentity;
use shardwright::core::state::StateKind;
use shardwright::services::state_validator::DatabaseStateValidator;
use std::fs;
use std::sync::atomic::AtomicBool;
use tempfile::TempDir;

#[cfg(test)]
mod state_validator_tests {
    use super::*;

    fn accessor(name: &str) -> AccessorIdentity {
        AccessorIdentity::from_qualified_name(name)
    }

    /// 作成済みと初期化済みが独立して記録されることを確認
    #[test]
    fn test_created_and_initialized_are_independent() {
        let dir = TempDir::new().unwrap();
        let validator = DatabaseStateValidator::new(dir.path());
        let blog = accessor("Blog.Data.BlogAccessor");

        validator.set_created(&blog).unwrap();

        assert!(validator.is_created(&blog));
        assert!(!validator.is_initialized(&blog));
        assert!(dir
            .path()
            .join("created/Blog.Data.BlogAccessor.txt")
            .exists());
    }

    /// アクセサーごとにマーカーが分かれることを確認
    #[test]
    fn test_markers_are_per_accessor() {
        let dir = TempDir::new().unwrap();
        let validator = DatabaseStateValidator::new(dir.path());

        validator.set_initialized(&accessor("Blog.Data.BlogAccessor")).unwrap();

        assert!(validator.is_initialized(&accessor("Blog.Data.BlogAccessor")));
        assert!(!validator.is_initialized(&accessor("Shop.Data.ShopAccessor")));
    }

    /// 再設定はマーカーを上書きし、状態は変わらないことを確認
    #[test]
    fn test_set_twice_overwrites() {
        let dir = TempDir::new().unwrap();
        let validator = DatabaseStateValidator::new(dir.path());
        let blog = accessor("Blog.Data.BlogAccessor");

        let path = validator.set_created(&blog).unwrap();
        fs::write(&path, "stale content").unwrap();
        validator.set_created(&blog).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_ne!(content, "stale content");
        assert!(content.contains("Blog.Data.BlogAccessor"));
        assert_eq!(path, validator.marker_path(&blog, StateKind::Created));
    }

    /// 作成できないディレクトリへの書き込みはエラーになることを確認
    #[test]
    fn test_unwritable_report_dir() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("reports");
        fs::write(&blocker, "not a directory").unwrap();
        let validator = DatabaseStateValidator::new(&blocker);

        assert!(validator.set_created(&accessor("Blog.Data.BlogAccessor")).is_err());
    }

    /// キャンセル済みのフラグでは非同期操作が開始されないことを確認
    #[tokio::test]
    async fn test_async_cancellation() {
        let dir = TempDir::new().unwrap();
        let validator = DatabaseStateValidator::new(dir.path());
        let blog = accessor("Blog.Data.BlogAccessor");
        let cancelled = AtomicBool::new(true);
        let running = AtomicBool::new(false);

        let error = validator
            .set_created_async(&blog, Some(&cancelled))
            .await
            .unwrap_err();
        assert!(error.is_cancelled());
        assert!(!validator.is_created(&blog));

        validator.set_created_async(&blog, Some(&running)).await.unwrap();
        assert!(validator.is_created_async(&blog, None).await.unwrap());
    }

    /// ランタイム外からも非同期版を同期的に待てることを確認
    #[test]
    fn test_async_wrappers_block_on() {
        let dir = TempDir::new().unwrap();
        let validator = DatabaseStateValidator::new(dir.path());
        let blog = accessor("Blog.Data.BlogAccessor");

        tokio_test::block_on(validator.set_initialized_async(&blog, None)).unwrap();

        assert!(tokio_test::block_on(validator.is_initialized_async(&blog, None)).unwrap());
        assert!(!tokio_test::block_on(validator.is_created_async(&blog, None)).unwrap());
    }
}
