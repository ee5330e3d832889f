//! Message selection and grouping for one question.
//!
//! Selection policy:
//! - named members: all of their messages are candidates;
//! - nobody named: the `fallback_per_member` newest messages of every member.
//!
//! Candidates are then taken round-robin across members, newest first, until
//! `cap` messages are picked. Each member's group comes back in chronological
//! order.

use std::collections::{BTreeMap, BTreeSet};

use crate::store::MessageRecord;

/// Per-request grouping: member name → messages, oldest first.
pub type ContextBundle = BTreeMap<String, Vec<MessageRecord>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    /// Upper bound on selected messages across all members.
    pub cap: usize,
    /// Sample size per member when the question names nobody.
    pub fallback_per_member: usize,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            cap: 350,
            fallback_per_member: 30,
        }
    }
}

/// Selects and groups the messages relevant to `matched` members.
pub fn filter(
    messages: &[MessageRecord],
    matched: &BTreeSet<String>,
    opts: &FilterOptions,
) -> ContextBundle {
    let mut by_member: BTreeMap<&str, Vec<&MessageRecord>> = BTreeMap::new();
    for msg in messages {
        if matched.is_empty() || matched.contains(&msg.member) {
            by_member.entry(msg.member.as_str()).or_default().push(msg);
        }
    }

    for group in by_member.values_mut() {
        group.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
        if matched.is_empty() {
            group.truncate(opts.fallback_per_member);
        }
    }

    let mut bundle = take_round_robin(&by_member, opts.cap);
    for group in bundle.values_mut() {
        group.reverse();
    }
    bundle
}

/// Picks depth by depth across members until `cap` is reached.
/// Groups must be sorted newest first; output keeps that order.
fn take_round_robin(groups: &BTreeMap<&str, Vec<&MessageRecord>>, cap: usize) -> ContextBundle {
    let mut out = ContextBundle::new();
    let mut taken = 0usize;
    let mut depth = 0usize;

    while taken < cap {
        let mut progressed = false;
        for (member, group) in groups {
            if taken >= cap {
                break;
            }
            if let Some(msg) = group.get(depth) {
                out.entry((*member).to_string())
                    .or_default()
                    .push((*msg).clone());
                taken += 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
        depth += 1;
    }

    out
}

/// Total number of messages in a bundle.
pub fn selected_count(bundle: &ContextBundle) -> usize {
    bundle.values().map(Vec::len).sum()
}
