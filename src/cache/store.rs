//! On-disk response cache
//!
//! One pretty-printed JSON file per key under `<root>/<namespace>/`.
//! Entries never expire; they live until [`DiskCache::clear`].

use crate::cache::key::CacheKey;
use crate::error::{AwsmapError, AwsmapResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

/// Summary of one cached entry, used for listing
#[derive(Debug, Clone)]
pub struct CacheEntryInfo {
    /// Entry path relative to the cache root, without extension
    pub key: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Durable key-value store for raw API responses
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.relative_path())
    }

    /// Read an entry. A missing entry is `Ok(None)`.
    pub async fn get(&self, key: &CacheKey) -> AwsmapResult<Option<Value>> {
        let path = self.entry_path(key);

        let content = match fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Cache miss: {}", key);
                return Ok(None);
            }
            Err(e) => {
                return Err(AwsmapError::io(
                    format!("reading cache entry {}", path.display()),
                    e,
                ))
            }
        };

        debug!("Cache hit: {}", key);
        serde_json::from_slice(&content)
            .map(Some)
            .map_err(|source| AwsmapError::CacheCorrupt { path, source })
    }

    /// Store an entry, fully replacing any previous value.
    ///
    /// Returns the value as a later [`get`](Self::get) would see it, after
    /// the canonical serialization round trip.
    pub async fn put<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T) -> AwsmapResult<Value> {
        let rendered = encode(value)?;
        let path = self.entry_path(key);
        let dir = self.root.join(key.namespace());

        fs::create_dir_all(&dir)
            .await
            .map_err(|e| AwsmapError::io(format!("creating cache dir {}", dir.display()), e))?;

        let tmp = dir.join(format!(".{}.{}.tmp", key.file_name(), Uuid::new_v4().simple()));
        fs::write(&tmp, &rendered)
            .await
            .map_err(|e| AwsmapError::io(format!("writing cache entry {}", tmp.display()), e))?;

        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(AwsmapError::io(
                format!("replacing cache entry {}", path.display()),
                e,
            ));
        }

        debug!("Cached {} ({} bytes)", key, rendered.len());
        Ok(serde_json::from_slice(&rendered)?)
    }

    /// Remove every entry in this cache.
    ///
    /// Only `<namespace>/*.json` entries and leftover write temps are
    /// deleted; anything else under the root is kept. Namespace directories,
    /// and then the root, are removed once empty. Racing `clear` against
    /// `get`/`put` is left to callers to serialize.
    pub async fn clear(&self) -> AwsmapResult<usize> {
        let mut namespaces = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Cache root {} does not exist", self.root.display());
                return Ok(0);
            }
            Err(e) => return Err(AwsmapError::io("reading cache root", e)),
        };

        let mut removed = 0;
        while let Some(ns) = namespaces
            .next_entry()
            .await
            .map_err(|e| AwsmapError::io("reading cache root entry", e))?
        {
            let dir = ns.path();
            if !dir.is_dir() {
                continue;
            }

            let mut files = fs::read_dir(&dir)
                .await
                .map_err(|e| AwsmapError::io(format!("reading cache dir {}", dir.display()), e))?;
            while let Some(file) = files
                .next_entry()
                .await
                .map_err(|e| AwsmapError::io("reading cache entry", e))?
            {
                let name = file.file_name().to_string_lossy().into_owned();
                if !is_cache_file(&name) || !file.path().is_file() {
                    continue;
                }
                fs::remove_file(file.path()).await.map_err(|e| {
                    AwsmapError::io(format!("deleting {}", file.path().display()), e)
                })?;
                if !name.starts_with('.') {
                    removed += 1;
                }
            }

            remove_if_empty(&dir).await;
        }

        remove_if_empty(&self.root).await;
        debug!("Cleared {} entries from {}", removed, self.root.display());
        Ok(removed)
    }

    /// List all entries, sorted by key
    pub async fn entries(&self) -> AwsmapResult<Vec<CacheEntryInfo>> {
        let mut out = Vec::new();

        let mut namespaces = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(AwsmapError::io("reading cache root", e)),
        };

        while let Some(ns) = namespaces
            .next_entry()
            .await
            .map_err(|e| AwsmapError::io("reading cache root entry", e))?
        {
            if !ns.path().is_dir() {
                continue;
            }
            let ns_name = ns.file_name().to_string_lossy().into_owned();

            let mut files = fs::read_dir(ns.path())
                .await
                .map_err(|e| AwsmapError::io(format!("reading cache dir {}", ns_name), e))?;

            while let Some(file) = files
                .next_entry()
                .await
                .map_err(|e| AwsmapError::io("reading cache entry", e))?
            {
                let path = file.path();
                let file_name = file.file_name().to_string_lossy().into_owned();
                if file_name.starts_with('.') {
                    continue;
                }
                let Some(stem) = file_name.strip_suffix(".json") else {
                    continue;
                };

                let meta = file
                    .metadata()
                    .await
                    .map_err(|e| AwsmapError::io(format!("stat {}", path.display()), e))?;
                let modified = meta
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(|_| Utc::now());

                out.push(CacheEntryInfo {
                    key: format!("{}/{}", ns_name, stem),
                    size: meta.len(),
                    modified,
                });
            }
        }

        out.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(out)
    }
}

/// Entry files (`*.json`) and the dot-prefixed temps `put` writes next to them
fn is_cache_file(name: &str) -> bool {
    if name.starts_with('.') {
        name.ends_with(".tmp") && name.contains(".json.")
    } else {
        name.ends_with(".json")
    }
}

/// Remove a directory only if nothing is left in it
async fn remove_if_empty(dir: &Path) {
    let empty = match fs::read_dir(dir).await {
        Ok(mut entries) => matches!(entries.next_entry().await, Ok(None)),
        Err(_) => false,
    };
    if empty {
        if let Err(e) = fs::remove_dir(dir).await {
            debug!("Keeping {}: {}", dir.display(), e);
        }
    }
}

/// Canonical encoding: recursively sorted keys, 4-space indentation.
fn encode<T: Serialize + ?Sized>(value: &T) -> AwsmapResult<Vec<u8>> {
    let value = sort_keys(serde_json::to_value(value)?);

    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::key::Topic;
    use chrono::TimeZone;
    use serde_json::json;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn test_cache() -> (DiskCache, TempDir) {
        let temp = TempDir::new().unwrap();
        let cache = DiskCache::new(temp.path().join("cache"));
        (cache, temp)
    }

    fn key(topic: Topic) -> CacheKey {
        CacheKey::new("123456789012", "us-east-1", topic).unwrap()
    }

    fn subnets(vpc_id: &str) -> CacheKey {
        key(Topic::Subnets {
            vpc_id: vpc_id.to_string(),
        })
    }

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let (cache, _temp) = test_cache();
        let envelope = json!({"Vpcs": [{"VpcId": "vpc-1", "CidrBlock": "10.0.0.0/16", "IsDefault": false}]});

        let stored = cache.put(&key(Topic::Vpcs), &envelope).await.unwrap();
        let loaded = cache.get(&key(Topic::Vpcs)).await.unwrap().unwrap();

        assert_eq!(stored, envelope);
        assert_eq!(loaded, stored);
    }

    #[tokio::test]
    async fn missing_entry_is_absent() {
        let (cache, _temp) = test_cache();
        assert!(cache.get(&key(Topic::Vpcs)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_coerces_non_primitive_values() {
        #[derive(Serialize)]
        struct Described {
            #[serde(rename = "CreateTime")]
            create_time: DateTime<Utc>,
            #[serde(rename = "Weights")]
            weights: HashMap<u32, f64>,
            #[serde(rename = "Ratio")]
            ratio: f64,
        }

        let (cache, _temp) = test_cache();
        let mut weights = HashMap::new();
        weights.insert(7, 0.5);
        let value = Described {
            create_time: Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap(),
            weights,
            ratio: f64::NAN,
        };

        let stored = cache.put(&key(Topic::Vpcs), &value).await.unwrap();

        // Timestamps become strings
        assert_eq!(stored["CreateTime"], json!("2021-03-04T05:06:07Z"));
        // Integer map keys become string keys
        assert_eq!(stored["Weights"]["7"], json!(0.5));
        // Non-finite floats become null
        assert!(stored["Ratio"].is_null());
        assert_eq!(cache.get(&key(Topic::Vpcs)).await.unwrap().unwrap(), stored);
    }

    #[tokio::test]
    async fn file_has_sorted_keys_and_four_space_indent() {
        let (cache, _temp) = test_cache();
        let k = key(Topic::Vpcs);
        cache
            .put(&k, &json!({"b": 1, "a": {"d": 1, "c": 2}}))
            .await
            .unwrap();

        let text = std::fs::read_to_string(cache.root().join(k.relative_path())).unwrap();
        assert!(text.find("\"a\"").unwrap() < text.find("\"b\"").unwrap());
        assert!(text.find("\"c\"").unwrap() < text.find("\"d\"").unwrap());
        assert!(text.contains("\n    \"a\": {"));
    }

    #[tokio::test]
    async fn put_is_isolated_per_key() {
        let (cache, _temp) = test_cache();
        cache.put(&subnets("vpc-1"), &json!({"Subnets": [1]})).await.unwrap();

        assert!(cache.get(&subnets("vpc-2")).await.unwrap().is_none());

        cache.put(&subnets("vpc-2"), &json!({"Subnets": [2]})).await.unwrap();
        let first = cache.get(&subnets("vpc-1")).await.unwrap().unwrap();
        assert_eq!(first, json!({"Subnets": [1]}));
    }

    #[tokio::test]
    async fn put_overwrites_whole_entry() {
        let (cache, _temp) = test_cache();
        let k = key(Topic::Vpcs);
        cache.put(&k, &json!({"Vpcs": [1, 2, 3], "Extra": true})).await.unwrap();
        cache.put(&k, &json!({"Vpcs": []})).await.unwrap();

        assert_eq!(cache.get(&k).await.unwrap().unwrap(), json!({"Vpcs": []}));
    }

    #[tokio::test]
    async fn namespace_dir_created_lazily() {
        let (cache, _temp) = test_cache();
        let ns_dir = cache.root().join("123456789012");
        assert!(!ns_dir.exists());

        cache.put(&key(Topic::Vpcs), &json!({})).await.unwrap();
        assert!(ns_dir.is_dir());
    }

    #[tokio::test]
    async fn put_leaves_no_temp_files() {
        let (cache, _temp) = test_cache();
        cache.put(&key(Topic::Vpcs), &json!({"Vpcs": []})).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(cache.root().join("123456789012"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["us-east-1_vpcs.json".to_string()]);
    }

    #[tokio::test]
    async fn concurrent_puts_never_interleave() {
        let (cache, _temp) = test_cache();
        let k = key(Topic::Vpcs);

        let mut handles = Vec::new();
        for i in 0..8 {
            let cache = cache.clone();
            let k = k.clone();
            handles.push(tokio::spawn(async move {
                let body: Vec<String> = (0..200).map(|n| format!("writer-{}-{}", i, n)).collect();
                cache.put(&k, &json!({ "Writer": i, "Body": body })).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let value = cache.get(&k).await.unwrap().unwrap();
        let writer = value["Writer"].as_u64().unwrap();
        assert_eq!(value["Body"].as_array().unwrap().len(), 200);
        assert_eq!(value["Body"][199], json!(format!("writer-{}-199", writer)));
    }

    #[tokio::test]
    async fn clear_removes_every_entry() {
        let (cache, _temp) = test_cache();
        let keys = vec![
            key(Topic::Vpcs),
            subnets("vpc-1"),
            CacheKey::caller_identity("default").unwrap(),
        ];
        for k in &keys {
            cache.put(k, &json!({"x": 1})).await.unwrap();
        }

        assert_eq!(cache.clear().await.unwrap(), 3);

        for k in &keys {
            assert!(cache.get(k).await.unwrap().is_none());
        }
        assert!(!cache.root().exists());
    }

    #[tokio::test]
    async fn clear_missing_root_is_ok() {
        let (cache, _temp) = test_cache();
        assert_eq!(cache.clear().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn clear_keeps_files_it_did_not_write() {
        let (cache, _temp) = test_cache();
        cache.put(&key(Topic::Vpcs), &json!({"Vpcs": []})).await.unwrap();
        let ns = cache.root().join("123456789012");
        std::fs::write(cache.root().join("notes.txt"), "keep me").unwrap();
        std::fs::write(ns.join("README"), "keep me too").unwrap();
        std::fs::write(ns.join(".us-east-1_vpcs.json.0a1b.tmp"), "{").unwrap();

        assert_eq!(cache.clear().await.unwrap(), 1);

        assert!(cache.get(&key(Topic::Vpcs)).await.unwrap().is_none());
        assert!(cache.root().join("notes.txt").exists());
        assert!(ns.join("README").exists());
        assert!(!ns.join(".us-east-1_vpcs.json.0a1b.tmp").exists());
        assert!(cache.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_entry_is_reported() {
        let (cache, _temp) = test_cache();
        let k = key(Topic::Vpcs);
        let path = cache.root().join(k.relative_path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{\"Vpcs\": [").unwrap();

        let err = cache.get(&k).await.unwrap_err();
        assert!(matches!(err, AwsmapError::CacheCorrupt { .. }));
    }

    #[tokio::test]
    async fn entries_lists_namespaced_keys() {
        let (cache, _temp) = test_cache();
        cache.put(&subnets("vpc-1"), &json!({})).await.unwrap();
        cache.put(&key(Topic::Vpcs), &json!({})).await.unwrap();

        let entries = cache.entries().await.unwrap();
        let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["123456789012/us-east-1_vpc-1_subnets", "123456789012/us-east-1_vpcs"]
        );
        assert!(entries.iter().all(|e| e.size > 0));
    }
}
