// エラー型定義
//
// アプリケーション全体で使用されるカスタムエラー型を提供します。
// thiserrorを使用して、ShardingError, LedgerError, CompileError, StateError,
// DatabaseError, IoError を定義します。

use std::path::Path;
use thiserror::Error;

/// シャーディング設定エラー
///
/// 設定の代入時・呼び出し時に即座に発生し、解決時まで遅延されることはありません。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShardingError {
    /// Unknown or incapable rule type
    #[error("Sharding rule '{name}' is not registered. Available rules: {available}")]
    UnknownRule {
        /// 指定されたルール名
        name: String,
        /// 登録済みのルール名（カンマ区切り）
        available: String,
    },

    /// Invalid formatting descriptor
    #[error("Invalid formatting '{key}': {reason}")]
    InvalidFormatting {
        /// プレースホルダーキー
        key: String,
        /// 不正な理由
        reason: String,
    },

    /// Invalid argument
    #[error("Invalid argument '{argument}': {reason}")]
    InvalidArgument {
        /// 引数名
        argument: String,
        /// 不正な理由
        reason: String,
    },
}

impl ShardingError {
    /// 未登録ルールエラーかどうか
    pub fn is_unknown_rule(&self) -> bool {
        matches!(self, ShardingError::UnknownRule { .. })
    }

    /// フォーマット記述子エラーかどうか
    pub fn is_invalid_formatting(&self) -> bool {
        matches!(self, ShardingError::InvalidFormatting { .. })
    }

    /// 引数エラーかどうか
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, ShardingError::InvalidArgument { .. })
    }
}

/// マイグレーション台帳エラー
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Ledger file I/O failure
    #[error("Ledger I/O error for store '{store_key}': {source}")]
    Io {
        /// ストアキー
        store_key: String,
        /// I/Oエラー
        #[source]
        source: IoError,
    },

    /// Ledger file exists but cannot be decoded
    #[error("Ledger for store '{store_key}' is corrupted ({path}): {cause}")]
    Corrupted {
        /// ストアキー
        store_key: String,
        /// 台帳ファイルのパス
        path: String,
        /// 破損の原因
        cause: String,
    },

    /// Serialization failure on commit
    #[error("Failed to serialize ledger for store '{store_key}': {cause}")]
    Serialize {
        /// ストアキー
        store_key: String,
        /// エラー原因
        cause: String,
    },
}

impl LedgerError {
    /// I/Oエラーかどうか
    pub fn is_io(&self) -> bool {
        matches!(self, LedgerError::Io { .. })
    }

    /// 台帳破損エラーかどうか
    pub fn is_corrupted(&self) -> bool {
        matches!(self, LedgerError::Corrupted { .. })
    }
}

/// スナップショットコンパイルエラー
///
/// コンパイラ協調者から返されたエラーはそのまま呼び出し元へ伝播します。
#[derive(Debug, Error)]
pub enum CompileError {
    /// Reference resolution failure
    #[error("Failed to resolve references for '{accessor}': {cause}")]
    References {
        /// アクセサー名
        accessor: String,
        /// エラー原因
        cause: String,
    },

    /// Compiler rejected the generated source
    #[error("Compilation failed: {diagnostics}")]
    Compiler {
        /// コンパイラ診断メッセージ
        diagnostics: String,
    },

    /// Source generation failure (e.g. sharding could not be resolved)
    #[error("Failed to generate snapshot source for '{accessor}': {cause}")]
    Generation {
        /// アクセサー名
        accessor: String,
        /// エラー原因
        cause: String,
    },

    /// Compression failure
    #[error("Failed to (de)compress snapshot: {cause}")]
    Compression {
        /// エラー原因
        cause: String,
    },

    /// Compiler process could not be launched
    #[error("Failed to invoke compiler '{program}': {cause}")]
    Invocation {
        /// コンパイラ実行ファイル
        program: String,
        /// エラー原因
        cause: String,
    },

    /// Compression or export I/O failure
    #[error(transparent)]
    Io(#[from] IoError),
}

impl CompileError {
    /// コンパイラ診断エラーかどうか
    pub fn is_compiler(&self) -> bool {
        matches!(self, CompileError::Compiler { .. })
    }

    /// 参照解決エラーかどうか
    pub fn is_references(&self) -> bool {
        matches!(self, CompileError::References { .. })
    }
}

/// データベース状態マーカーエラー
#[derive(Debug, Error)]
pub enum StateError {
    /// Marker file I/O failure
    #[error("State marker error for '{accessor}': {source}")]
    Io {
        /// アクセサー名
        accessor: String,
        /// I/Oエラー
        #[source]
        source: IoError,
    },

    /// Operation cancelled before it started
    #[error("Operation cancelled before start: {operation}")]
    Cancelled {
        /// 操作名
        operation: String,
    },
}

impl StateError {
    /// キャンセルされたかどうか
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StateError::Cancelled { .. })
    }
}

/// データベースエラー
///
/// データベース操作時に発生するエラーを表現します。
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Connection error
    #[error("Database connection error: {message} (cause: {cause})")]
    Connection {
        /// エラーメッセージ
        message: String,
        /// エラー原因
        cause: String,
    },

    /// Query execution error
    #[error("Query execution error: {message}")]
    Query {
        /// エラーメッセージ
        message: String,
        /// 失敗したSQL
        sql: Option<String>,
    },
}

impl DatabaseError {
    /// 接続エラーかどうか
    pub fn is_connection(&self) -> bool {
        matches!(self, DatabaseError::Connection { .. })
    }

    /// クエリエラーかどうか
    pub fn is_query(&self) -> bool {
        matches!(self, DatabaseError::Query { .. })
    }
}

/// I/Oエラー
///
/// ファイル操作時に発生するエラーを表現します。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IoError {
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound {
        /// ファイルパス
        path: String,
    },

    /// File read error
    #[error("Failed to read file: {path} (cause: {cause})")]
    FileRead {
        /// ファイルパス
        path: String,
        /// エラー原因
        cause: String,
    },

    /// File write error
    #[error("Failed to write file: {path} (cause: {cause})")]
    FileWrite {
        /// ファイルパス
        path: String,
        /// エラー原因
        cause: String,
    },

    /// Directory creation error
    #[error("Failed to create directory: {path} (cause: {cause})")]
    DirectoryCreate {
        /// ディレクトリパス
        path: String,
        /// エラー原因
        cause: String,
    },
}

impl IoError {
    /// 読み込みエラーを作成
    pub fn read(path: &Path, error: impl ToString) -> Self {
        IoError::FileRead {
            path: path.display().to_string(),
            cause: error.to_string(),
        }
    }

    /// 書き込みエラーを作成
    pub fn write(path: &Path, error: impl ToString) -> Self {
        IoError::FileWrite {
            path: path.display().to_string(),
            cause: error.to_string(),
        }
    }

    /// ディレクトリ作成エラーを作成
    pub fn create_dir(path: &Path, error: impl ToString) -> Self {
        IoError::DirectoryCreate {
            path: path.display().to_string(),
            cause: error.to_string(),
        }
    }

    /// ファイルが見つからないエラーかどうか
    pub fn is_file_not_found(&self) -> bool {
        matches!(self, IoError::FileNotFound { .. })
    }

    /// ファイル読み込みエラーかどうか
    pub fn is_file_read(&self) -> bool {
        matches!(self, IoError::FileRead { .. })
    }

    /// ファイル書き込みエラーかどうか
    pub fn is_file_write(&self) -> bool {
        matches!(self, IoError::FileWrite { .. })
    }

    /// ディレクトリ作成エラーかどうか
    pub fn is_directory_create(&self) -> bool {
        matches!(self, IoError::DirectoryCreate { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sharding_error_variants() {
        let unknown = ShardingError::UnknownRule {
            name: "hourly".to_string(),
            available: "default, year".to_string(),
        };
        assert!(unknown.is_unknown_rule());
        assert!(unknown.to_string().contains("hourly"));

        let argument = ShardingError::InvalidArgument {
            argument: "schema".to_string(),
            reason: "must not be empty".to_string(),
        };
        assert!(argument.is_invalid_argument());
        assert!(!argument.is_invalid_formatting());
    }

    #[test]
    fn test_ledger_error_variants() {
        let corrupted = LedgerError::Corrupted {
            store_key: "Blog".to_string(),
            path: "/cfg/Blog.ledger.json".to_string(),
            cause: "expected value".to_string(),
        };
        assert!(corrupted.is_corrupted());
        assert!(!corrupted.is_io());

        let io = LedgerError::Io {
            store_key: "Blog".to_string(),
            source: IoError::FileWrite {
                path: "/cfg".to_string(),
                cause: "Disk full".to_string(),
            },
        };
        assert!(io.is_io());
    }

    #[test]
    fn test_compile_error_from_io() {
        let error: CompileError = IoError::FileWrite {
            path: "/out".to_string(),
            cause: "Permission denied".to_string(),
        }
        .into();
        assert!(!error.is_compiler());
        assert!(error.to_string().contains("/out"));
    }

    #[test]
    fn test_io_error_variants() {
        let not_found = IoError::FileNotFound {
            path: "/path/to/file".to_string(),
        };
        assert!(not_found.is_file_not_found());

        let read_error = IoError::read(Path::new("/path/to/file"), "Permission denied");
        assert!(read_error.is_file_read());

        let write_error = IoError::write(Path::new("/path/to/file"), "Disk full");
        assert!(write_error.is_file_write());

        let dir_error = IoError::create_dir(Path::new("/path/to/dir"), "Permission denied");
        assert!(dir_error.is_directory_create());
    }
}
