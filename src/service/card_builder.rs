use crate::models::event::Bout;

/// Cards whose name carries this marker have no prelims section.
pub const NO_PRELIMS_MARKER: &str = "contender series";

/// Display-ready card: each section is ordered main event first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FightCard {
    pub main_card: Vec<Bout>,
    pub prelims: Vec<Bout>,
}

/// Stable sort by scheduled time; bouts with no time sort ahead of timed ones
/// and keep their input order.
pub fn sort_bouts(bouts: &[Bout]) -> Vec<Bout> {
    let mut sorted = bouts.to_vec();
    sorted.sort_by_key(|bout| bout.scheduled);
    sorted
}

/// Splits a card into (main card, prelims), both still in ascending time
/// order. The main card is the tail of the sorted list.
pub fn split_card(bouts: &[Bout]) -> (Vec<Bout>, Vec<Bout>) {
    let sorted = sort_bouts(bouts);
    let n = sorted.len();
    let cutoff = match n {
        n if n >= 10 => n - 6,
        n if n >= 6 => n - 3,
        _ => 0,
    };
    let mut prelims = sorted;
    let main_card = prelims.split_off(cutoff);
    (main_card, prelims)
}

pub fn is_no_prelims_card(name: &str, short_name: &str) -> bool {
    [name, short_name]
        .iter()
        .any(|n| n.trim().to_lowercase().contains(NO_PRELIMS_MARKER))
}

pub fn build_card(name: &str, short_name: &str, bouts: &[Bout]) -> FightCard {
    let (mut main_card, mut prelims) = if is_no_prelims_card(name, short_name) {
        (sort_bouts(bouts), Vec::new())
    } else {
        split_card(bouts)
    };
    main_card.reverse();
    prelims.reverse();
    FightCard { main_card, prelims }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn timed_bouts(n: usize) -> Vec<Bout> {
        let base = Utc.with_ymd_and_hms(2025, 3, 8, 22, 0, 0).unwrap();
        (0..n)
            .map(|i| Bout {
                red_name: format!("Red {i}"),
                blue_name: format!("Blue {i}"),
                scheduled: Some(base + Duration::minutes(30 * i as i64)),
                ..Bout::default()
            })
            .collect()
    }

    #[test]
    fn split_sizes_follow_card_thresholds() {
        for (n, main, prelims) in [(0, 0, 0), (5, 5, 0), (6, 3, 3), (9, 3, 6), (10, 6, 4), (15, 6, 9)] {
            let card = build_card("UFC Fight Night", "", &timed_bouts(n));
            assert_eq!(card.main_card.len(), main, "main for {n}");
            assert_eq!(card.prelims.len(), prelims, "prelims for {n}");
        }
    }

    #[test]
    fn contender_series_has_no_prelims() {
        for n in [0, 5, 6, 10, 15] {
            let card = build_card("Dana White's Contender Series: Week 1", "", &timed_bouts(n));
            assert!(card.prelims.is_empty());
            assert_eq!(card.main_card.len(), n);
        }
        let card = build_card("", "DWCS Contender Series", &timed_bouts(12));
        assert!(card.prelims.is_empty());
    }

    #[test]
    fn main_card_is_reverse_time_order() {
        let mut input = timed_bouts(10);
        input.reverse();
        let card = build_card("UFC 313", "", &input);
        let names: Vec<_> = card.main_card.iter().map(|b| b.red_name.as_str()).collect();
        assert_eq!(names, ["Red 9", "Red 8", "Red 7", "Red 6", "Red 5", "Red 4"]);
        assert_eq!(card.prelims.first().unwrap().red_name, "Red 3");
    }

    #[test]
    fn unknown_times_sort_first_in_input_order() {
        let mut bouts = timed_bouts(3);
        bouts.insert(1, Bout { red_name: "TBD a".into(), ..Bout::default() });
        bouts.push(Bout { red_name: "TBD b".into(), ..Bout::default() });
        let sorted = sort_bouts(&bouts);
        let names: Vec<_> = sorted.iter().map(|b| b.red_name.as_str()).collect();
        assert_eq!(names, ["TBD a", "TBD b", "Red 0", "Red 1", "Red 2"]);
        let first_timed = sorted.iter().position(|b| b.scheduled.is_some()).unwrap();
        assert!(sorted[first_timed..].iter().all(|b| b.scheduled.is_some()));
    }

    #[test]
    fn source_list_is_untouched() {
        let mut input = timed_bouts(6);
        input.reverse();
        let before = input.clone();
        let _ = build_card("UFC 313", "", &input);
        assert_eq!(input, before);
    }
}
