//! Joint-account aggregation
//!
//! A joint account is evaluated by combining its members into a single owner
//! input (cash flows and valuations summed per date) and running the ordinary
//! single-owner engine on it.
//!
//! When members are valued on different dates the combined valuation on such
//! a date only contains the members valued that day, so the joint return is an
//! approximation; it is exact when every member's snapshot dates coincide.

use chrono::NaiveDate;
use itertools::Itertools;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

use crate::engine::{CashflowEvent, OwnerInput, OwnerKind, ValuationSnapshot};

/// Combine member owners into one joint owner input.
pub fn aggregate_joint(joint_id: &str, members: &[OwnerInput]) -> OwnerInput {
    let cashflows = sum_by_date(
        members
            .iter()
            .flat_map(|member| member.cashflows.iter())
            .map(|event| (event.event_date, event.amount)),
    )
    .into_iter()
    .map(|(date, amount)| CashflowEvent::new(date, amount, "joint"))
    .collect();

    let valuations = sum_by_date(
        members
            .iter()
            .flat_map(|member| member.valuations.iter())
            .map(|snapshot| (snapshot.snapshot_date, snapshot.portfolio_value)),
    )
    .into_iter()
    .map(|(date, value)| ValuationSnapshot::new(date, value))
    .collect();

    let partial = non_coincident_valuation_dates(members);
    if !partial.is_empty() {
        warn!(
            "Joint account {}: {} valuation dates not shared by every member; joint return is approximate",
            joint_id,
            partial.len()
        );
    }
    debug!(
        "Aggregated joint account {} from {} members",
        joint_id,
        members.len()
    );

    OwnerInput {
        owner_id: joint_id.to_string(),
        owner_kind: OwnerKind::Joint,
        cashflows,
        valuations,
    }
}

/// Valuation dates on which some, but not all, valued members have a snapshot.
pub fn non_coincident_valuation_dates(members: &[OwnerInput]) -> Vec<NaiveDate> {
    let date_sets: Vec<BTreeSet<NaiveDate>> = members
        .iter()
        .filter(|member| !member.valuations.is_empty())
        .map(|member| member.valuations.iter().map(|v| v.snapshot_date).collect())
        .collect();

    let all_dates: BTreeSet<NaiveDate> = date_sets.iter().flatten().copied().collect();
    all_dates
        .into_iter()
        .filter(|date| date_sets.iter().any(|set| !set.contains(date)))
        .collect()
}

/// Build joint owner inputs from `(joint_id, member_id)` pairs.
///
/// Members missing from `singles` are skipped with a warning; joint accounts
/// left without any member are dropped.
pub fn build_joint_inputs(mapping: &[(String, String)], singles: &[OwnerInput]) -> Vec<OwnerInput> {
    let by_id: HashMap<&str, &OwnerInput> = singles
        .iter()
        .map(|owner| (owner.owner_id.as_str(), owner))
        .collect();

    mapping
        .iter()
        .map(|(joint_id, member_id)| (joint_id.as_str(), member_id.as_str()))
        .into_group_map()
        .into_iter()
        .sorted_by_key(|(joint_id, _)| *joint_id)
        .filter_map(|(joint_id, member_ids)| {
            let members: Vec<OwnerInput> = member_ids
                .into_iter()
                .unique()
                .filter_map(|member_id| match by_id.get(member_id) {
                    Some(owner) => Some((*owner).clone()),
                    None => {
                        warn!("Joint account {}: unknown member {}", joint_id, member_id);
                        None
                    }
                })
                .collect();
            if members.is_empty() {
                warn!("Joint account {} has no known members; skipped", joint_id);
                return None;
            }
            Some(aggregate_joint(joint_id, &members))
        })
        .collect()
}

fn sum_by_date<I>(pairs: I) -> Vec<(NaiveDate, Decimal)>
where
    I: Iterator<Item = (NaiveDate, Decimal)>,
{
    pairs
        .into_grouping_map()
        .sum()
        .into_iter()
        .sorted_by_key(|(date, _)| *date)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn member(id: &str, flows: &[(NaiveDate, Decimal)], values: &[(NaiveDate, Decimal)]) -> OwnerInput {
        OwnerInput::single(
            id,
            flows
                .iter()
                .map(|(d, a)| CashflowEvent::new(*d, *a, "deposit"))
                .collect(),
            values
                .iter()
                .map(|(d, v)| ValuationSnapshot::new(*d, *v))
                .collect(),
        )
    }

    #[test]
    fn test_sums_flows_and_values_per_date() {
        let a = member(
            "A1",
            &[(date(2022, 4, 1), dec!(100))],
            &[(date(2022, 4, 30), dec!(110)), (date(2022, 5, 31), dec!(120))],
        );
        let b = member(
            "B1",
            &[(date(2022, 4, 1), dec!(50)), (date(2022, 4, 10), dec!(25))],
            &[(date(2022, 4, 30), dec!(80))],
        );

        let joint = aggregate_joint("J1", &[a, b]);

        assert_eq!(joint.owner_kind, OwnerKind::Joint);
        assert_eq!(joint.owner_id, "J1");
        assert_eq!(joint.cashflows.len(), 2);
        assert_eq!(joint.cashflows[0].amount, dec!(150));
        assert_eq!(joint.cashflows[1].amount, dec!(25));
        assert_eq!(joint.valuations[0].portfolio_value, dec!(190));
        assert_eq!(joint.valuations[1].portfolio_value, dec!(120));
    }

    #[test]
    fn test_detects_non_coincident_dates() {
        let a = member("A1", &[], &[(date(2022, 4, 30), dec!(1)), (date(2022, 5, 31), dec!(1))]);
        let b = member("B1", &[], &[(date(2022, 4, 30), dec!(1))]);
        let c = member("C1", &[(date(2022, 4, 1), dec!(5))], &[]);

        assert_eq!(
            non_coincident_valuation_dates(&[a, b, c]),
            vec![date(2022, 5, 31)]
        );
    }

    #[test]
    fn test_build_joint_inputs_skips_unknown_members() {
        let a = member("A1", &[], &[(date(2022, 4, 30), dec!(10))]);
        let b = member("B1", &[], &[(date(2022, 4, 30), dec!(20))]);
        let mapping = vec![
            ("J1".to_string(), "A1".to_string()),
            ("J1".to_string(), "B1".to_string()),
            ("J1".to_string(), "B1".to_string()),
            ("J2".to_string(), "ZZ".to_string()),
        ];

        let joints = build_joint_inputs(&mapping, &[a, b]);

        assert_eq!(joints.len(), 1);
        assert_eq!(joints[0].owner_id, "J1");
        assert_eq!(joints[0].valuations[0].portfolio_value, dec!(30));
    }
}
