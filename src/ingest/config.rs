// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::types::Source;

pub const ENV_SOURCES_PATH: &str = "FG_SOURCES_PATH";

/// Built-in catalog used when no sources file is configured.
pub fn default_sources() -> Vec<Source> {
    vec![
        Source::new(
            "gfw-slayer-iran",
            "GFW-Slayer (Iran Optimized)",
            "https://raw.githubusercontent.com/voidr3aper-anon/GFW-slayer/main/configs/regional/iran/serverless-iran-friendly.json",
        ),
        Source::new(
            "v2ray-aggregator-eternity",
            "V2Ray Aggregator (Eternity)",
            "https://raw.githubusercontent.com/mahdibland/V2RayAggregator/master/Eternity",
        ),
        Source::new(
            "tvc-mix",
            "TVC Mix",
            "https://raw.githubusercontent.com/yebekhe/TVC/main/subscriptions/xray/normal/mix",
        ),
        Source::new(
            "gfw-slayer-global",
            "GFW-Slayer (Global)",
            "https://raw.githubusercontent.com/voidr3aper-anon/GFW-slayer/main/configs/general/serverless-v2ray.json",
        ),
    ]
}

/// Load a source catalog from an explicit path. Supports TOML or JSON formats.
pub fn load_sources_from(path: &Path) -> Result<Vec<Source>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_sources(&content, ext.as_str())
}

/// Load the catalog using env var + fallbacks:
/// 1) $FG_SOURCES_PATH
/// 2) config/sources.toml
/// 3) config/sources.json
/// 4) built-in defaults
pub fn load_sources_default() -> Result<Vec<Source>> {
    if let Ok(p) = std::env::var(ENV_SOURCES_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_sources_from(&pb);
        } else {
            return Err(anyhow!("{ENV_SOURCES_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/sources.toml");
    if toml_p.exists() {
        return load_sources_from(&toml_p);
    }
    let json_p = PathBuf::from("config/sources.json");
    if json_p.exists() {
        return load_sources_from(&json_p);
    }
    Ok(default_sources())
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<Vec<Source>> {
    // TOML first if hinted or the content has a [[sources]] table.
    let try_toml = hint_ext == "toml" || s.contains("[[sources]]");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported sources format"))
}

fn parse_toml(s: &str) -> Result<Vec<Source>> {
    #[derive(serde::Deserialize)]
    struct TomlSources {
        sources: Vec<Source>,
    }
    let v: TomlSources = toml::from_str(s)?;
    Ok(clean_list(v.sources))
}

fn parse_json(s: &str) -> Result<Vec<Source>> {
    let v: Vec<Source> = serde_json::from_str(s)?;
    Ok(clean_list(v))
}

/// Trim fields, drop entries without id or url, keep the first of duplicate ids.
fn clean_list(items: Vec<Source>) -> Vec<Source> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let id = it.id.trim();
        let url = it.url.trim();
        if id.is_empty() || url.is_empty() || !seen.insert(id.to_string()) {
            continue;
        }
        let name = it.display_name.trim();
        out.push(Source::new(id, if name.is_empty() { id } else { name }, url));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_and_json_are_cleaned() {
        let toml = r#"
[[sources]]
id = " a "
display_name = "Alpha"
url = "https://a.test/sub"

[[sources]]
id = "a"
display_name = "Dup"
url = "https://dup.test"

[[sources]]
id = "b"
display_name = ""
url = "https://b.test"

[[sources]]
id = "c"
display_name = "No url"
url = "  "
"#;
        let out = parse_toml(toml).unwrap();
        assert_eq!(
            out,
            vec![
                Source::new("a", "Alpha", "https://a.test/sub"),
                Source::new("b", "b", "https://b.test"),
            ]
        );

        let json = r#"[{"id":"x","name":"X feed","url":"https://x.test"}]"#;
        assert_eq!(
            parse_json(json).unwrap(),
            vec![Source::new("x", "X feed", "https://x.test")]
        );
    }

    #[test]
    fn unknown_format_is_an_error() {
        assert!(parse_sources("not a catalog", "txt").is_err());
    }

    #[test]
    fn defaults_have_unique_ids() {
        let d = default_sources();
        let ids: HashSet<_> = d.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids.len(), d.len());
    }
}
