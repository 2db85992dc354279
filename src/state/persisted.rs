//! On-disk shapes of the favorites keys.
//!
//! Writes use a versioned envelope. Reads also accept the bare array and bare
//! object written before versioning.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::Article;

pub const FAVORITES_VERSION: u32 = 1;

#[derive(Serialize)]
struct IdsEnvelope<'a> {
    version: u32,
    ids: &'a [String],
}

#[derive(Serialize)]
struct DataEnvelope<'a> {
    version: u32,
    articles: &'a HashMap<String, Article>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredIds {
    Versioned {
        #[allow(dead_code)]
        version: u32,
        ids: Vec<String>,
    },
    Legacy(Vec<String>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredData {
    Versioned {
        #[allow(dead_code)]
        version: u32,
        articles: HashMap<String, Article>,
    },
    Legacy(HashMap<String, Article>),
}

pub fn encode_ids(ids: &[String]) -> serde_json::Result<String> {
    serde_json::to_string(&IdsEnvelope {
        version: FAVORITES_VERSION,
        ids,
    })
}

pub fn encode_data(articles: &HashMap<String, Article>) -> serde_json::Result<String> {
    serde_json::to_string(&DataEnvelope {
        version: FAVORITES_VERSION,
        articles,
    })
}

pub fn decode_ids(raw: &str) -> serde_json::Result<Vec<String>> {
    Ok(match serde_json::from_str(raw)? {
        StoredIds::Versioned { ids, .. } => ids,
        StoredIds::Legacy(ids) => ids,
    })
}

pub fn decode_data(raw: &str) -> serde_json::Result<HashMap<String, Article>> {
    Ok(match serde_json::from_str(raw)? {
        StoredData::Versioned { articles, .. } => articles,
        StoredData::Legacy(articles) => articles,
    })
}
