// スキーマスナップショットコンパイラ
//
// 論理スキーマモデルから記述ソースを生成し、コンパイラで成果物に変換して
// gzip圧縮した上でアクセサーごとにキャッシュします。
// ソースのSHA-256が前回と一致する場合はコンパイラを呼び出しません。

use dashmap::DashMap;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::adapters::snapshot_compiler::SnapshotCompiler;
use crate::core::accessor::AccessorIdentity;
use crate::core::error::{CompileError, IoError};
use crate::core::naming;
use crate::core::schema::Schema;
use crate::core::snapshot::{Reference, SnapshotArtifact};
use crate::services::snapshot_codegen::SnapshotCodeGenerator;

/// アクセサーが必要とするコンパイラ参照を列挙するトレイト
pub trait ReferenceResolver: std::fmt::Debug + Send + Sync {
    fn resolve(&self, accessor: &AccessorIdentity) -> Result<Vec<Reference>, CompileError>;
}

/// 固定の参照集合を返すリゾルバー（設定ファイルの `references`）
#[derive(Debug, Clone, Default)]
pub struct StaticReferenceResolver {
    references: Vec<Reference>,
}

impl StaticReferenceResolver {
    pub fn new(references: Vec<Reference>) -> Self {
        Self { references }
    }

    /// `name` / `name=path` 形式の文字列から作成
    pub fn from_specs<S: AsRef<str>>(specs: &[S]) -> Self {
        Self::new(specs.iter().map(|s| Reference::parse(s.as_ref())).collect())
    }
}

impl ReferenceResolver for StaticReferenceResolver {
    fn resolve(&self, _accessor: &AccessorIdentity) -> Result<Vec<Reference>, CompileError> {
        Ok(self.references.clone())
    }
}

/// ソーステキストのSHA-256（16進数小文字）
pub fn hash_source(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn compress(bytes: &[u8]) -> Result<Vec<u8>, CompileError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(bytes)
        .map_err(|e| CompileError::Compression { cause: e.to_string() })?;
    encoder
        .finish()
        .map_err(|e| CompileError::Compression { cause: e.to_string() })
}

/// スキーマスナップショットコンパイラ
///
/// 参照集合と成果物のキャッシュはこのインスタンスの生存期間中保持され、破棄されません。
#[derive(Debug)]
pub struct SchemaSnapshotCompiler {
    generator: Arc<dyn SnapshotCodeGenerator>,
    compiler: Arc<dyn SnapshotCompiler>,
    resolver: Arc<dyn ReferenceResolver>,
    references: DashMap<AccessorIdentity, Arc<Vec<Reference>>>,
    artifacts: DashMap<AccessorIdentity, SnapshotArtifact>,
}

impl SchemaSnapshotCompiler {
    /// 新しいコンパイラサービスを作成
    pub fn new(
        generator: Arc<dyn SnapshotCodeGenerator>,
        compiler: Arc<dyn SnapshotCompiler>,
        resolver: Arc<dyn ReferenceResolver>,
    ) -> Self {
        Self {
            generator,
            compiler,
            resolver,
            references: DashMap::new(),
            artifacts: DashMap::new(),
        }
    }

    /// アクセサーの参照集合
    ///
    /// 名前順にソートされ、名前ごとに一つだけ含みます。
    /// アクセサー自身への参照はリゾルバーが返さなかった場合に追加されます。
    /// 同じアクセサーへの同時初回アクセスでも解決は一度だけ行われます。
    pub fn references(&self, accessor: &AccessorIdentity) -> Result<Arc<Vec<Reference>>, CompileError> {
        let entry = self
            .references
            .entry(accessor.clone())
            .or_try_insert_with(|| {
                let mut references = self.resolver.resolve(accessor).map_err(|e| match e {
                    CompileError::References { .. } => e,
                    other => CompileError::References {
                        accessor: accessor.qualified_name().to_string(),
                        cause: other.to_string(),
                    },
                })?;
                let own = Reference::for_accessor(accessor);
                if !references.iter().any(|r| r.name == own.name) {
                    references.push(own);
                }
                // 同名の参照はパス付きのものを残す
                references.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| b.path.cmp(&a.path)));
                references.dedup_by(|later, kept| later.name == kept.name);

                debug!(accessor = %accessor, count = references.len(), "Resolved compiler references");
                Ok::<_, CompileError>(Arc::new(references))
            })?;
        Ok(Arc::clone(entry.value()))
    }

    /// 生成ソースのハッシュのみを計算（コンパイルしない）
    pub fn source_hash(&self, accessor: &AccessorIdentity, model: &Schema) -> Result<String, CompileError> {
        let source = self.generator.generate(accessor, model)?;
        Ok(hash_source(&source))
    }

    /// メモリ上でコンパイル
    ///
    /// 前回と同じソースハッシュであればキャッシュ済みの成果物を返します。
    /// コンパイラのエラーはそのまま返し、再試行しません。
    pub fn compile_in_memory(
        &self,
        accessor: &AccessorIdentity,
        model: &Schema,
    ) -> Result<SnapshotArtifact, CompileError> {
        let source = self.generator.generate(accessor, model)?;
        let source_hash = hash_source(&source);

        if let Some(cached) = self.artifacts.get(accessor) {
            if cached.matches_hash(&source_hash) {
                debug!(accessor = %accessor, hash = %source_hash, "Snapshot cache hit");
                return Ok(cached.clone());
            }
        }

        let references = self.references(accessor)?;
        let compiled = self.compiler.compile(&references, &source)?;
        let binary = compress(&compiled)?;

        info!(
            accessor = %accessor,
            hash = %source_hash,
            compiled_bytes = compiled.len(),
            compressed_bytes = binary.len(),
            "Compiled model snapshot"
        );

        let artifact = SnapshotArtifact {
            accessor: accessor.clone(),
            source_hash,
            binary,
            reference_set: references.as_ref().clone(),
        };
        self.artifacts.insert(accessor.clone(), artifact.clone());
        Ok(artifact)
    }

    /// コンパイルしてファイルに書き出す
    ///
    /// `{export_dir}/{表示名}.ModelSnapshot{ソース拡張子}` に非圧縮の成果物を書き、
    /// 隣にソースハッシュを記録します。
    pub fn compile_to_file(
        &self,
        accessor: &AccessorIdentity,
        model: &Schema,
        export_dir: &Path,
    ) -> Result<PathBuf, CompileError> {
        let artifact = self.compile_in_memory(accessor, model)?;
        let bytes = Self::decompress(&artifact)?;

        fs::create_dir_all(export_dir).map_err(|e| IoError::create_dir(export_dir, e))?;

        let path = naming::snapshot_export_path(export_dir, accessor, self.generator.source_extension());
        fs::write(&path, bytes).map_err(|e| IoError::write(&path, e))?;

        let hash_path = naming::snapshot_hash_path(export_dir, accessor);
        fs::write(&hash_path, &artifact.source_hash).map_err(|e| IoError::write(&hash_path, e))?;

        info!(accessor = %accessor, path = %path.display(), "Exported model snapshot");
        Ok(path)
    }

    /// 前回エクスポート時に記録したソースハッシュ
    pub fn recorded_hash(
        &self,
        accessor: &AccessorIdentity,
        export_dir: &Path,
    ) -> Result<Option<String>, CompileError> {
        let hash_path = naming::snapshot_hash_path(export_dir, accessor);
        match fs::read_to_string(&hash_path) {
            Ok(content) => Ok(Some(content.trim().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(IoError::read(&hash_path, e).into()),
        }
    }

    /// エクスポート済みスナップショットが現在のモデルより古いかどうか
    ///
    /// 記録がない場合も古いとみなします。
    pub fn is_stale(
        &self,
        accessor: &AccessorIdentity,
        model: &Schema,
        export_dir: &Path,
    ) -> Result<bool, CompileError> {
        let current = self.source_hash(accessor, model)?;
        Ok(self.recorded_hash(accessor, export_dir)?.as_deref() != Some(current.as_str()))
    }

    /// キャッシュ済みの成果物
    pub fn cached(&self, accessor: &AccessorIdentity) -> Option<SnapshotArtifact> {
        self.artifacts.get(accessor).map(|a| a.clone())
    }

    /// 成果物のバイナリを展開
    pub fn decompress(artifact: &SnapshotArtifact) -> Result<Vec<u8>, CompileError> {
        let mut decoder = GzDecoder::new(artifact.binary.as_slice());
        let mut bytes = Vec::new();
        decoder
            .read_to_end(&mut bytes)
            .map_err(|e| CompileError::Compression { cause: e.to_string() })?;
        Ok(bytes)
    }
}
