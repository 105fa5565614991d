//! Repost records as they appear in the dataset JSON.

use serde::{Deserialize, Serialize};

/// Metadata about the channel a post was reposted from.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceInfo {
    pub title: Option<String>,
    pub link: Option<String>,
    pub participants_cnt: Option<u64>,
    pub peer_type: Option<String>,
    pub category: Option<String>,
    pub about: Option<String>,
    pub rkn_verification: Option<String>,
    pub country: Option<String>,
    pub language: Option<String>,
    pub red_label: Option<bool>,
    pub black_label: Option<bool>,
}

/// Metadata about the channel that reposted.
///
/// The dataset only carries display fields for targets, so a channel that is
/// never seen as a source has no category or verification data.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TargetInfo {
    pub title: Option<String>,
    pub link: Option<String>,
    pub participants_cnt: Option<u64>,
    pub about: Option<String>,
}

/// The post that was reposted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Post {
    pub id: Option<i64>,
    /// Unix seconds
    pub date: Option<i64>,
    pub views: Option<u64>,
    pub link: Option<String>,
    pub text: Option<String>,
}

/// One observed repost: `target` reposted a post from `source`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RepostRecord {
    pub source: Option<String>,
    pub target: Option<String>,
    pub source_info: Option<SourceInfo>,
    pub target_info: Option<TargetInfo>,
    pub post: Post,
}

impl RepostRecord {
    /// Category of the source channel. Empty names count as missing.
    pub fn category(&self) -> Option<&str> {
        self.source_info
            .as_ref()
            .and_then(|info| info.category.as_deref())
            .filter(|c| !c.is_empty())
    }

    /// Source channel id; empty ids count as missing.
    pub fn source_id(&self) -> Option<&str> {
        self.source.as_deref().filter(|s| !s.is_empty())
    }

    /// Target channel id; empty ids count as missing.
    pub fn target_id(&self) -> Option<&str> {
        self.target.as_deref().filter(|t| !t.is_empty())
    }

    /// Both endpoints, when present and distinct.
    pub fn edge_endpoints(&self) -> Option<(&str, &str)> {
        match (self.source_id(), self.target_id()) {
            (Some(source), Some(target)) if source != target => Some((source, target)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_record() {
        let json = r#"{
            "source": "@alpha",
            "target": "@beta",
            "source_info": {
                "title": "Alpha",
                "link": "t.me/alpha",
                "participants_cnt": 1200,
                "peer_type": "channel",
                "category": "news",
                "about": "Daily news",
                "rkn_verification": "applied",
                "country": "Russia",
                "language": "Russian",
                "red_label": false,
                "black_label": null
            },
            "target_info": {"title": "Beta", "link": "t.me/beta", "participants_cnt": 50, "about": null},
            "post": {"id": 7, "date": 1700000000, "views": 321, "link": "t.me/alpha/7", "text": "hi"}
        }"#;

        let record: RepostRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.category(), Some("news"));
        assert_eq!(record.edge_endpoints(), Some(("@alpha", "@beta")));
        let info = record.source_info.unwrap();
        assert_eq!(info.participants_cnt, Some(1200));
        assert_eq!(info.red_label, Some(false));
        assert_eq!(info.black_label, None);
        assert_eq!(record.post.views, Some(321));
    }

    #[test]
    fn missing_fields_default_to_absent() {
        let record: RepostRecord =
            serde_json::from_str(r#"{"source": null, "post": {"date": 5}}"#).unwrap();
        assert_eq!(record.source, None);
        assert_eq!(record.target, None);
        assert_eq!(record.category(), None);
        assert_eq!(record.post.date, Some(5));
        assert_eq!(record.post.link, None);
    }

    #[test]
    fn self_loop_has_no_edge_endpoints() {
        let record = RepostRecord {
            source: Some("a".into()),
            target: Some("a".into()),
            ..Default::default()
        };
        assert_eq!(record.edge_endpoints(), None);
    }

    #[test]
    fn empty_strings_count_as_missing() {
        let record = RepostRecord {
            source: Some(String::new()),
            target: Some("b".into()),
            source_info: Some(SourceInfo {
                category: Some(String::new()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(record.source_id(), None);
        assert_eq!(record.target_id(), Some("b"));
        assert_eq!(record.category(), None);
        assert_eq!(record.edge_endpoints(), None);
    }
}
