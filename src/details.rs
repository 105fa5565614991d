//! Display-ready view of a selected channel.

use crate::graph::GraphState;
use chrono::{Local, TimeZone};

const PLACEHOLDER: &str = "-";
const NO_DESCRIPTION: &str = "No description";

/// One incoming repost as shown in the details panel.
#[derive(Debug, Clone, PartialEq)]
pub struct RepostRow {
    /// Merged label of the channel the post came from
    pub origin: String,
    pub date: String,
    pub views: String,
    pub link: Option<String>,
}

/// Everything the details panel shows for a channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelDetails {
    pub title: String,
    /// `https://` + the channel link, when present
    pub link_url: Option<String>,
    pub link_text: String,
    pub participants: String,
    pub peer_type: String,
    pub category: String,
    pub country: String,
    pub language: String,
    pub verification: String,
    pub red_label: String,
    pub black_label: String,
    pub outgoing: String,
    pub about: String,
    pub reposts: Vec<RepostRow>,
}

impl ChannelDetails {
    /// Resolve node `index` of `state`, formatting dates in local time.
    pub fn resolve(state: &GraphState, index: usize) -> Option<Self> {
        Self::resolve_in(state, index, &Local)
    }

    pub fn resolve_in<Tz: TimeZone>(state: &GraphState, index: usize, tz: &Tz) -> Option<Self>
    where
        Tz::Offset: std::fmt::Display,
    {
        let node = state.data.nodes.get(index)?;

        let reposts = node
            .incoming_reposts
            .iter()
            .map(|repost| RepostRow {
                origin: state
                    .get_node(&repost.from)
                    .map(|origin| origin.label.clone())
                    .unwrap_or_else(|| repost.from.clone()),
                date: repost
                    .post
                    .date
                    .and_then(|secs| format_timestamp(secs, tz))
                    .unwrap_or_else(|| PLACEHOLDER.to_string()),
                views: repost
                    .post
                    .views
                    .map(group_thousands)
                    .unwrap_or_else(|| PLACEHOLDER.to_string()),
                link: repost.post.link.clone().filter(|l| !l.is_empty()),
            })
            .collect();

        let url = node.url.as_deref().filter(|u| !u.is_empty());

        Some(Self {
            title: if node.label.is_empty() { node.id.clone() } else { node.label.clone() },
            link_url: url.map(external_url),
            link_text: url.unwrap_or(PLACEHOLDER).to_string(),
            participants: node
                .participants
                .filter(|&p| p > 0)
                .map(group_thousands)
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            peer_type: or_placeholder(node.peer_type.as_deref()),
            category: or_placeholder(node.category.as_deref()),
            country: or_placeholder(node.country.as_deref()),
            language: or_placeholder(node.language.as_deref()),
            verification: or_placeholder(node.rkn_verification.as_deref()),
            red_label: yes_no(node.red_label).to_string(),
            black_label: yes_no(node.black_label).to_string(),
            outgoing: node.outgoing_count.to_string(),
            about: node
                .about
                .as_deref()
                .filter(|a| !a.is_empty())
                .unwrap_or(NO_DESCRIPTION)
                .to_string(),
            reposts,
        })
    }
}

fn or_placeholder(value: Option<&str>) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or(PLACEHOLDER).to_string()
}

/// Only an explicit value shows Yes or No; a missing key renders the
/// placeholder just like null.
pub fn yes_no(flag: Option<bool>) -> &'static str {
    match flag {
        Some(true) => "Yes",
        Some(false) => "No",
        None => PLACEHOLDER,
    }
}

/// Channel links are stored without a scheme (`t.me/name`).
pub fn external_url(link: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        link.to_string()
    } else {
        format!("https://{}", link)
    }
}

/// `1234567` -> `1,234,567`
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_timestamp<Tz: TimeZone>(secs: i64, tz: &Tz) -> Option<String>
where
    Tz::Offset: std::fmt::Display,
{
    tz.timestamp_opt(secs, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
}
