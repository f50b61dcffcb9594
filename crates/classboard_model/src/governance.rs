//! Leadership posts, class representatives, group CRs and parties.

use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

/// Status of an office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    /// Office is held.
    Active,
    /// Holder suspended; office not vacant.
    Suspended,
    /// Tenure over. Sticky against a stale `active` for the same holder.
    Ended,
    /// Nobody holds the office.
    Vacant,
}

impl Default for PostStatus {
    fn default() -> Self {
        PostStatus::Vacant
    }
}

/// Veto allowance granted per month to the holder of a post.
pub fn veto_quota_for_post(post: &str) -> i64 {
    let upper = post.trim().to_uppercase();
    if upper.starts_with("LEADER OF OPPOSITION") {
        2
    } else if upper.starts_with("CO-LEADER") {
        3
    } else if upper.starts_with("LEADER") {
        5
    } else if upper.starts_with("CR") || upper.contains("(CR)") {
        2
    } else {
        0
    }
}

/// Tenure length in months for a post.
pub fn tenure_months_for_post(post: &str) -> u32 {
    let upper = post.trim().to_uppercase();
    if upper.starts_with("LEADER") {
        // Covers LEADER and LEADER OF OPPOSITION.
        2
    } else {
        1
    }
}

/// A leadership office and its current holder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadershipPost {
    /// Post id.
    pub id: i64,
    /// Post title, e.g. "LEADER OF OPPOSITION (LoP)".
    #[serde(default)]
    pub post: String,
    /// Display name of the holder; empty when vacant.
    #[serde(default)]
    pub holder: String,
    /// Office status.
    #[serde(default)]
    pub status: PostStatus,
    /// Monthly veto allowance while held.
    #[serde(default)]
    pub veto_quota: i64,
    /// Tenure length in months.
    #[serde(default = "default_tenure")]
    pub tenure_months: u32,
    /// "YYYY-MM" the current tenure started, if held.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since_month: Option<String>,
    /// Last-update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

fn default_tenure() -> u32 {
    1
}

impl LeadershipPost {
    /// Backfills quota and tenure from the post title when unset.
    pub fn normalize(&mut self) {
        self.post = self.post.trim().to_string();
        self.holder = self.holder.trim().to_string();
        if self.veto_quota == 0 {
            self.veto_quota = veto_quota_for_post(&self.post);
        }
        if self.tenure_months == 0 {
            self.tenure_months = tenure_months_for_post(&self.post);
        }
        if self.holder.is_empty() && self.status == PostStatus::Active {
            self.status = PostStatus::Vacant;
        }
    }

    /// Returns true if the office currently has a holder.
    pub fn is_populated(&self) -> bool {
        !self.holder.is_empty()
    }
}

/// Class representative for one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRep {
    /// Class number this rep covers (identity key).
    pub class: i64,
    /// Roll of the representative; empty when vacant.
    #[serde(default)]
    pub roll: String,
    /// Office status.
    #[serde(default)]
    pub status: PostStatus,
    /// Last-update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// Group CR for one group letter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupCr {
    /// Group letter this CR covers (identity key).
    pub group: String,
    /// Roll of the CR; empty when vacant.
    #[serde(default)]
    pub roll: String,
    /// Office status.
    #[serde(default)]
    pub status: PostStatus,
    /// Last-update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// A party in the class party system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    /// Party id.
    pub id: i64,
    /// Short code, e.g. "SSP" (secondary identity).
    #[serde(default)]
    pub code: String,
    /// Full name.
    #[serde(default)]
    pub name: String,
    /// Combined voting power.
    #[serde(default)]
    pub power: i64,
    /// Last-update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl Party {
    /// Trims and upper-cases the code.
    pub fn normalize(&mut self) {
        self.code = self.code.trim().to_uppercase();
    }
}
