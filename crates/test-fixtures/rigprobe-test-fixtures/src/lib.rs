use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    skeletons: HashMap<String, String>,
    clips: HashMap<String, String>,
    pipelines: HashMap<String, PipelineEntry>,
}

/// Pipeline configs name the skeleton and clip fixtures they run against.
#[derive(Debug, Deserialize)]
struct PipelineEntry {
    config: String,
    skeleton: String,
    clip: String,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

fn sorted_keys<T>(map: &HashMap<String, T>) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().cloned().collect();
    keys.sort();
    keys
}

pub mod skeletons {
    use super::*;

    pub fn keys() -> Vec<String> {
        sorted_keys(&MANIFEST.skeletons)
    }

    pub fn json(name: &str) -> Result<String> {
        let rel = lookup(&MANIFEST.skeletons, "skeleton", name)?;
        read_to_string(rel)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let rel = lookup(&MANIFEST.skeletons, "skeleton", name)?;
        super::load_json(rel)
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let rel = lookup(&MANIFEST.skeletons, "skeleton", name)?;
        Ok(resolve_path(rel))
    }
}

pub mod clips {
    use super::*;

    pub fn keys() -> Vec<String> {
        sorted_keys(&MANIFEST.clips)
    }

    pub fn json(name: &str) -> Result<String> {
        let rel = lookup(&MANIFEST.clips, "clip", name)?;
        read_to_string(rel)
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let rel = lookup(&MANIFEST.clips, "clip", name)?;
        super::load_json(rel)
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let rel = lookup(&MANIFEST.clips, "clip", name)?;
        Ok(resolve_path(rel))
    }
}

pub mod pipelines {
    use super::*;

    pub fn keys() -> Vec<String> {
        sorted_keys(&MANIFEST.pipelines)
    }

    pub fn config_json(name: &str) -> Result<String> {
        let entry = lookup(&MANIFEST.pipelines, "pipeline", name)?;
        read_to_string(&entry.config)
    }

    pub fn config<T: DeserializeOwned>(name: &str) -> Result<T> {
        let entry = lookup(&MANIFEST.pipelines, "pipeline", name)?;
        super::load_json(&entry.config)
    }

    pub fn config_path(name: &str) -> Result<PathBuf> {
        let entry = lookup(&MANIFEST.pipelines, "pipeline", name)?;
        Ok(resolve_path(&entry.config))
    }

    /// Skeleton fixture key this pipeline runs against.
    pub fn skeleton_key(name: &str) -> Result<String> {
        Ok(lookup(&MANIFEST.pipelines, "pipeline", name)?.skeleton.clone())
    }

    /// Clip fixture key this pipeline runs against.
    pub fn clip_key(name: &str) -> Result<String> {
        Ok(lookup(&MANIFEST.pipelines, "pipeline", name)?.clip.clone())
    }

    /// Load (config, skeleton, clip) for a pipeline fixture.
    pub fn load_all<C, S, K>(name: &str) -> Result<(C, S, K)>
    where
        C: DeserializeOwned,
        S: DeserializeOwned,
        K: DeserializeOwned,
    {
        let entry = lookup(&MANIFEST.pipelines, "pipeline", name)?;
        let config = super::load_json(&entry.config)?;
        let skeleton = super::skeletons::load(&entry.skeleton)
            .with_context(|| format!("pipeline '{name}' skeleton"))?;
        let clip = super::clips::load(&entry.clip)
            .with_context(|| format!("pipeline '{name}' clip"))?;
        Ok((config, skeleton, clip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_manifest_entry_reads() {
        for key in skeletons::keys() {
            let _: serde_json::Value = skeletons::load(&key).unwrap();
        }
        for key in clips::keys() {
            let _: serde_json::Value = clips::load(&key).unwrap();
        }
        for key in pipelines::keys() {
            let _: serde_json::Value = pipelines::config(&key).unwrap();
            assert!(skeletons::path(&pipelines::skeleton_key(&key).unwrap())
                .unwrap()
                .exists());
            assert!(clips::path(&pipelines::clip_key(&key).unwrap())
                .unwrap()
                .exists());
        }
    }

    #[test]
    fn unknown_key_errors() {
        assert!(clips::json("does-not-exist").is_err());
    }
}
