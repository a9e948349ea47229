// スナップショットコンパイラアダプター
//
// 生成されたスキーマ記述ソースを、参照集合とともにバイナリ成果物へ変換します。
// コンパイラが返したエラーは加工せずに呼び出し元へ返します。

use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

use crate::core::error::{CompileError, IoError};
use crate::core::snapshot::Reference;

/// メタデータ形式の識別子
pub const METADATA_FORMAT: &str = "shardwright-snapshot/1";

/// スナップショットコンパイラのトレイト
pub trait SnapshotCompiler: std::fmt::Debug + Send + Sync {
    /// ソースをコンパイルして成果物のバイト列を返す
    fn compile(&self, references: &[Reference], source: &str) -> Result<Vec<u8>, CompileError>;
}

/// メタデータコンパイラ
///
/// 外部ツールを使わず、参照集合とソースをJSONエンベロープにまとめます。
/// パス付きの参照は、そのパスが存在しない場合にコンパイルエラーになります。
#[derive(Debug, Clone, Default)]
pub struct MetadataSnapshotCompiler;

#[derive(Serialize)]
struct MetadataEnvelope<'a> {
    format: &'a str,
    references: &'a [Reference],
    source: &'a str,
}

impl MetadataSnapshotCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl SnapshotCompiler for MetadataSnapshotCompiler {
    fn compile(&self, references: &[Reference], source: &str) -> Result<Vec<u8>, CompileError> {
        let missing: Vec<String> = references
            .iter()
            .filter(|r| r.path.as_ref().is_some_and(|p| !p.exists()))
            .map(|r| r.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(CompileError::Compiler {
                diagnostics: format!("unresolved reference(s): {}", missing.join(", ")),
            });
        }

        let envelope = MetadataEnvelope {
            format: METADATA_FORMAT,
            references,
            source,
        };
        serde_json::to_vec_pretty(&envelope).map_err(|e| CompileError::Compiler {
            diagnostics: e.to_string(),
        })
    }
}

/// rustcコンパイラ
///
/// `rustc` を子プロセスとして起動し、ソースをrlibとしてビルドします。
/// パス付きの参照は `--extern name=path` として渡され、パスなしの参照は無視されます。
#[derive(Debug, Clone)]
pub struct RustcSnapshotCompiler {
    program: String,
    edition: String,
    crate_name: String,
    work_dir: PathBuf,
}

impl RustcSnapshotCompiler {
    /// PATH上の `rustc` を使用するコンパイラを作成
    pub fn new() -> Self {
        Self {
            program: "rustc".to_string(),
            edition: "2021".to_string(),
            crate_name: "model_snapshot".to_string(),
            work_dir: std::env::temp_dir(),
        }
    }

    /// 実行ファイルを指定
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// 出力クレート名を指定
    pub fn with_crate_name(mut self, crate_name: impl Into<String>) -> Self {
        self.crate_name = crate_name.into();
        self
    }

    /// 中間成果物の出力先を指定
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    fn output_path(&self, crate_name: &str) -> PathBuf {
        self.work_dir.join(format!(
            "lib{}_{}_{}.rlib",
            crate_name,
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ))
    }

    fn invocation_error(&self, cause: impl ToString) -> CompileError {
        CompileError::Invocation {
            program: self.program.clone(),
            cause: cause.to_string(),
        }
    }
}

impl Default for RustcSnapshotCompiler {
    fn default() -> Self {
        Self::new()
    }
}

/// クレート名として使える形に変換
pub fn sanitize_crate_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    match sanitized.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => sanitized,
        _ => format!("snapshot_{}", sanitized),
    }
}

impl SnapshotCompiler for RustcSnapshotCompiler {
    fn compile(&self, references: &[Reference], source: &str) -> Result<Vec<u8>, CompileError> {
        let crate_name = sanitize_crate_name(&self.crate_name);

        fs::create_dir_all(&self.work_dir)
            .map_err(|e| IoError::create_dir(&self.work_dir, e))?;
        let output = self.output_path(&crate_name);

        let mut command = Command::new(&self.program);
        command
            .args(["-", "--crate-type", "rlib", "--crate-name", crate_name.as_str()])
            .args(["--edition", self.edition.as_str(), "-o"])
            .arg(&output);
        for reference in references {
            if let Some(path) = &reference.path {
                command
                    .arg("--extern")
                    .arg(format!("{}={}", sanitize_crate_name(&reference.name), path.display()));
            }
        }

        debug!(program = %self.program, crate_name = %crate_name, "Invoking snapshot compiler");

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.invocation_error(e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(source.as_bytes())
                .map_err(|e| self.invocation_error(e))?;
        }

        let result = child
            .wait_with_output()
            .map_err(|e| self.invocation_error(e))?;

        if !result.status.success() {
            let _ = fs::remove_file(&output);
            return Err(CompileError::Compiler {
                diagnostics: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        let bytes = fs::read(&output).map_err(|e| IoError::read(&output, e))?;
        let _ = fs::remove_file(&output);
        Ok(bytes)
    }
}
