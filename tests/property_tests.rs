use chrono::{Days, NaiveDate};
use perftrack::engine::{compute_performance, CashflowEvent, EngineConfig, ValuationSnapshot};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn day(offset: u16) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1)
        .unwrap()
        .checked_add_days(Days::new(u64::from(offset)))
        .unwrap()
}

fn cents(amount: i64) -> Decimal {
    Decimal::new(amount, 2)
}

fn flows_strategy() -> impl Strategy<Value = Vec<CashflowEvent>> {
    prop::collection::vec((0u16..1500, -50_000i64..200_000), 0..12).prop_map(|rows| {
        rows.into_iter()
            .map(|(offset, amount)| CashflowEvent::new(day(offset), cents(amount), "generated"))
            .collect()
    })
}

fn valuations_strategy() -> impl Strategy<Value = Vec<ValuationSnapshot>> {
    prop::collection::vec((0u16..1500, 1_000_000i64..5_000_000), 0..16).prop_map(|rows| {
        rows.into_iter()
            .map(|(offset, amount)| ValuationSnapshot::new(day(offset), cents(amount)))
            .collect()
    })
}

proptest! {
    #[test]
    fn input_order_does_not_matter(flows in flows_strategy(), values in valuations_strategy()) {
        let config = EngineConfig::default();
        let forward = compute_performance(&flows, &values, &config).unwrap();

        let mut reversed_flows = flows.clone();
        reversed_flows.reverse();
        let mut reversed_values = values.clone();
        reversed_values.reverse();
        let backward = compute_performance(&reversed_flows, &reversed_values, &config).unwrap();

        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn timeline_and_sub_periods_are_well_formed(
        flows in flows_strategy(),
        values in valuations_strategy(),
    ) {
        let result = compute_performance(&flows, &values, &EngineConfig::default()).unwrap();

        prop_assert!(result.timeline.windows(2).all(|p| p[0].event_date < p[1].event_date));
        prop_assert!(result.sub_periods.iter().all(|p| p.start_value > Decimal::ZERO));
        prop_assert!(result.sub_periods.windows(2).all(|p| p[0].end_date <= p[1].start_date));
        prop_assert!(result.years_elapsed >= Decimal::ZERO);
        prop_assert_eq!(result.insufficient_data, values.is_empty());
    }

    #[test]
    fn without_flows_twrr_is_last_over_first(
        amounts in prop::collection::vec(1i64..50_000_000, 2..24),
    ) {
        let values: Vec<ValuationSnapshot> = amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| ValuationSnapshot::new(day((i * 30) as u16), cents(*amount)))
            .collect();

        let result = compute_performance(&[], &values, &EngineConfig::default()).unwrap();

        let first = values[0].portfolio_value;
        let last = values[values.len() - 1].portfolio_value;
        let expected = last / first - Decimal::ONE;
        let tolerance = Decimal::new(1, 9) * (Decimal::ONE + expected.abs());
        prop_assert!(
            (result.since_inception_twrr - expected).abs() <= tolerance,
            "twrr {} vs {}", result.since_inception_twrr, expected
        );
    }
}
