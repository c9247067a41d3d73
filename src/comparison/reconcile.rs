use std::collections::HashMap;
use std::collections::hash_map::Entry;

use super::{LogEntry, LogType, LogTypeFilter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Compare plates case-insensitively, ignoring whitespace and hyphens,
    /// when grouping common entries. Off means exact string match.
    pub normalize_plates: bool,
}

/// Filter, deduplicate and order raw comparison rows for display.
pub fn reconcile(raw: &[LogEntry], filter: LogTypeFilter) -> Vec<LogEntry> {
    reconcile_with(raw, filter, &ReconcileOptions::default())
}

pub fn reconcile_with(
    raw: &[LogEntry],
    filter: LogTypeFilter,
    options: &ReconcileOptions,
) -> Vec<LogEntry> {
    let retained: Vec<LogEntry> = raw
        .iter()
        .filter(|entry| filter.matches(&entry.log_type))
        .cloned()
        .collect();

    let mut result = if filter.admits_common() {
        dedup_common(retained, options)
    } else {
        retained
    };

    sort_for_display(&mut result);
    result
}

/// Keep one common entry per vehicle: the latest `created_at`, larger id on
/// a tie. Non-common entries pass through untouched. Relative order of the
/// survivors follows each vehicle's first appearance.
fn dedup_common(entries: Vec<LogEntry>, options: &ReconcileOptions) -> Vec<LogEntry> {
    let mut result: Vec<LogEntry> = Vec::with_capacity(entries.len());
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut collapsed = 0usize;

    for entry in entries {
        if entry.log_type != LogType::Common {
            result.push(entry);
            continue;
        }

        match slots.entry(plate_key(&entry.vehicle_number, options)) {
            Entry::Occupied(slot) => {
                collapsed += 1;
                let kept = &mut result[*slot.get()];
                if supersedes(&entry, kept) {
                    *kept = entry;
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(result.len());
                result.push(entry);
            }
        }
    }

    if collapsed > 0 {
        tracing::debug!("Collapsed {collapsed} duplicate common entries");
    }

    result
}

fn supersedes(candidate: &LogEntry, current: &LogEntry) -> bool {
    (&candidate.created_at, &candidate.id) > (&current.created_at, &current.id)
}

fn plate_key(plate: &str, options: &ReconcileOptions) -> String {
    if options.normalize_plates {
        plate
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .flat_map(char::to_uppercase)
            .collect()
    } else {
        plate.to_string()
    }
}

/// Priority ascending, then newest first. Stable, so equal keys keep input order.
pub fn sort_for_display(entries: &mut [LogEntry]) {
    entries.sort_by(|a, b| {
        a.log_type
            .priority()
            .cmp(&b.log_type.priority())
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}
