//! Estimated arrival time for each slot.
//!
//! A one-song slot takes 5 minutes, anything longer takes 8. The first slot
//! starts at the event start; each following slot starts when the previous
//! one ends.

use chrono::{DateTime, Duration, Utc};

use crate::slot::TimeSlot;

const SINGLE_UNIT_MINUTES: i64 = 5;
const MULTI_UNIT_MINUTES: i64 = 8;

/// Stage time allotted to a slot with `unit_count` songs.
pub fn slot_duration(unit_count: u32) -> Duration {
    if unit_count == 1 {
        Duration::minutes(SINGLE_UNIT_MINUTES)
    } else {
        Duration::minutes(MULTI_UNIT_MINUTES)
    }
}

/// Start time of every slot, in lineup order.
pub fn arrival_times(start: DateTime<Utc>, slots: &[TimeSlot]) -> Vec<DateTime<Utc>> {
    let mut at = start;
    slots
        .iter()
        .map(|slot| {
            let slot_start = at;
            at += slot_duration(slot.unit_count());
            slot_start
        })
        .collect()
}

/// Wire format for every timestamp in a snapshot (RFC 2822, numeric zone).
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc2822()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use lineup_core::{EventId, PerformerId, SlotId, key_between};

    use crate::slot::Performer;

    fn slots(unit_counts: &[u32]) -> Vec<TimeSlot> {
        let event_id = EventId::new();
        let mut last = None;
        unit_counts
            .iter()
            .map(|&units| {
                let key = key_between(last.as_ref(), None).unwrap();
                last = Some(key.clone());
                TimeSlot::new(
                    SlotId::new(),
                    event_id,
                    key,
                    Performer::new(PerformerId::new(), "p"),
                    units,
                )
            })
            .collect()
    }

    #[test]
    fn durations_depend_on_unit_count() {
        assert_eq!(slot_duration(1), Duration::minutes(5));
        assert_eq!(slot_duration(2), Duration::minutes(8));
        assert_eq!(slot_duration(7), Duration::minutes(8));
    }

    #[test]
    fn arrivals_accumulate_from_event_start() {
        let start = Utc.with_ymd_and_hms(2024, 5, 3, 21, 0, 0).unwrap();
        let times = arrival_times(start, &slots(&[1, 2, 1]));

        assert_eq!(times[0], start);
        assert_eq!(times[1], start + Duration::minutes(5));
        assert_eq!(times[2], start + Duration::minutes(13));
        assert_eq!(format_timestamp(times[2]), "Fri, 3 May 2024 21:13:00 +0000");
    }

    #[test]
    fn empty_lineup_has_no_arrivals() {
        let start = Utc.with_ymd_and_hms(2024, 5, 3, 21, 0, 0).unwrap();
        assert!(arrival_times(start, &[]).is_empty());
    }
}
