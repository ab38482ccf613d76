use anyhow::Result;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use cli_helpers::{
    base_cmd, decimal_from_value, run_cmd_json, setup_temp_home, write_file, BATCH_CASHFLOWS,
    BATCH_VALUATIONS, SINGLE_CASHFLOWS, SINGLE_VALUATIONS,
};

fn assert_close(actual: Decimal, expected: Decimal) {
    assert!(
        (actual - expected).abs() < dec!(0.000001),
        "expected {} to be close to {}",
        actual,
        expected
    );
}

#[test]
fn performance_table_without_ansi_when_no_color() {
    let home = setup_temp_home();
    let flows = write_file(&home, "flows.csv", SINGLE_CASHFLOWS);
    let values = write_file(&home, "values.csv", SINGLE_VALUATIONS);

    let mut cmd = base_cmd(&home);
    cmd.arg("performance")
        .arg("--cashflows")
        .arg(&flows)
        .arg("--valuations")
        .arg(&values)
        .arg("--periods");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("16.88%"))
        .stdout(predicate::str::contains("FY 2022-23"))
        .stdout(predicate::str::contains("₹ 1,60,000.00"))
        .stdout(predicate::str::contains("\u{001b}[").not());
}

#[test]
fn performance_json_isolates_cash_flows() -> Result<()> {
    let home = setup_temp_home();
    let flows = write_file(&home, "flows.csv", SINGLE_CASHFLOWS);
    let values = write_file(&home, "values.csv", SINGLE_VALUATIONS);

    let json = run_cmd_json(
        &home,
        &[
            "performance",
            "--cashflows",
            flows.to_str().unwrap(),
            "--valuations",
            values.to_str().unwrap(),
        ],
    )?;

    assert_eq!(json["owner_id"], "default");
    assert_eq!(json["insufficient_data"], false);
    assert_close(decimal_from_value(&json["since_inception_twrr"])?, dec!(0.16875));
    assert_close(decimal_from_value(&json["current_fiscal_year_twrr"])?, dec!(0.16875));

    let periods = json["sub_periods"].as_array().unwrap();
    assert_eq!(periods.len(), 2);
    assert_eq!(decimal_from_value(&periods[1]["start_value"])?, dec!(160000));
    assert_close(decimal_from_value(&periods[1]["return"])?, dec!(0.0625));

    let timeline = json["timeline"].as_array().unwrap();
    assert_eq!(timeline[0]["anchor"], true);
    assert_eq!(decimal_from_value(&timeline[1]["period_end_value"])?, dec!(160000));
    Ok(())
}

#[test]
fn performance_requires_owner_when_files_hold_several() {
    let home = setup_temp_home();
    let flows = write_file(&home, "flows.csv", BATCH_CASHFLOWS);
    let values = write_file(&home, "values.csv", BATCH_VALUATIONS);

    let mut cmd = base_cmd(&home);
    cmd.arg("performance")
        .arg("--cashflows")
        .arg(&flows)
        .arg("--valuations")
        .arg(&values);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--owner"));

    let mut cmd = base_cmd(&home);
    cmd.arg("performance")
        .arg("--cashflows")
        .arg(&flows)
        .arg("--valuations")
        .arg(&values)
        .arg("--owner")
        .arg("B1");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("5.00%"));
}

#[test]
fn batch_reports_failures_without_aborting() -> Result<()> {
    let home = setup_temp_home();
    let flows = write_file(&home, "flows.csv", BATCH_CASHFLOWS);
    let values = write_file(&home, "values.csv", BATCH_VALUATIONS);

    let json = run_cmd_json(
        &home,
        &[
            "batch",
            "--cashflows",
            flows.to_str().unwrap(),
            "--valuations",
            values.to_str().unwrap(),
        ],
    )?;

    assert_eq!(json["summary"]["computed"], 2);
    assert_eq!(json["summary"]["failed"], 1);

    let reports = json["reports"].as_array().unwrap();
    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0]["owner_id"], "A1");
    assert_eq!(reports[0]["outcome"]["status"], "computed");
    assert_close(
        decimal_from_value(&reports[0]["outcome"]["result"]["since_inception_twrr"])?,
        dec!(0.1),
    );
    assert_eq!(reports[2]["owner_id"], "C1");
    assert_eq!(reports[2]["outcome"]["status"], "failed");
    assert!(reports[2]["outcome"]["error"]
        .as_str()
        .unwrap()
        .contains("negative valuation"));
    Ok(())
}

#[test]
fn batch_aggregates_joint_accounts() -> Result<()> {
    let home = setup_temp_home();
    let flows = write_file(&home, "flows.csv", BATCH_CASHFLOWS);
    let values = write_file(&home, "values.csv", BATCH_VALUATIONS);
    let joint = write_file(&home, "joint.csv", "joint_id,owner_id\nJ1,A1\nJ1,B1\n");

    let json = run_cmd_json(
        &home,
        &[
            "batch",
            "--cashflows",
            flows.to_str().unwrap(),
            "--valuations",
            values.to_str().unwrap(),
            "--joint",
            joint.to_str().unwrap(),
        ],
    )?;

    let reports = json["reports"].as_array().unwrap();
    let joint_report = reports
        .iter()
        .find(|r| r["owner_id"] == "J1")
        .expect("joint account report");
    assert_eq!(joint_report["owner_kind"], "joint");
    // (110000 + 52500) / (100000 + 50000) - 1
    assert_close(
        decimal_from_value(&joint_report["outcome"]["result"]["since_inception_twrr"])?,
        dec!(0.0833333333),
    );
    Ok(())
}

#[test]
fn batch_table_lists_every_owner() {
    let home = setup_temp_home();
    let flows = write_file(&home, "flows.csv", BATCH_CASHFLOWS);
    let values = write_file(&home, "values.csv", BATCH_VALUATIONS);

    let mut cmd = base_cmd(&home);
    cmd.arg("batch")
        .arg("--cashflows")
        .arg(&flows)
        .arg("--valuations")
        .arg(&values);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("A1"))
        .stdout(predicate::str::contains("10.00%"))
        .stdout(predicate::str::contains("negative valuation"))
        .stdout(predicate::str::contains("2 computed"));
}

#[test]
fn value_prints_csv_ready_for_performance() {
    let home = setup_temp_home();
    let holdings = write_file(
        &home,
        "holdings.csv",
        "date,symbol,quantity\n2022-04-30,INFY,10\n2022-04-30,TCS,3\n2022-04-30,CASH,2500\n",
    );
    let prices = write_file(
        &home,
        "prices.csv",
        "date,symbol,close\n2022-04-29,INFY,1500\n2022-04-29,TCS,3500\n",
    );

    let mut cmd = base_cmd(&home);
    cmd.arg("value")
        .arg("--holdings")
        .arg(&holdings)
        .arg("--prices")
        .arg(&prices)
        .arg("--csv");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("date,value"))
        .stdout(predicate::str::contains("2022-04-30,28000"));
}

#[test]
fn value_fails_on_missing_price() {
    let home = setup_temp_home();
    let holdings = write_file(&home, "holdings.csv", "date,symbol,quantity\n2022-04-30,INFY,10\n");
    let prices = write_file(&home, "prices.csv", "date,symbol,close\n2022-04-29,TCS,3500\n");

    let mut cmd = base_cmd(&home);
    cmd.arg("value")
        .arg("--holdings")
        .arg(&holdings)
        .arg("--prices")
        .arg(&prices);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("INFY"));
}

#[test]
fn allocate_renormalizes_leveraged_baskets() -> Result<()> {
    let home = setup_temp_home();
    let brackets = write_file(
        &home,
        "brackets.toml",
        r#"
[[brackets]]
id = 1
name = "All"
min = 0
max = 100000000

[[brackets.baskets]]
basket_id = 1
name = "Core Equity"
allocation_pct = 80

[[brackets.baskets]]
basket_id = 2
name = "Momentum (Leveraged)"
allocation_pct = 40
"#,
    );

    let json = run_cmd_json(
        &home,
        &[
            "allocate",
            "--amount",
            "100000",
            "--brackets",
            brackets.to_str().unwrap(),
        ],
    )?;

    assert_eq!(json["bracket_id"], 1);
    assert_eq!(decimal_from_value(&json["total_pct"])?, dec!(100));
    assert_eq!(decimal_from_value(&json["baskets"][1]["allocation_pct"])?, dec!(20));
    assert_eq!(decimal_from_value(&json["baskets"][1]["amount"])?, dec!(20000));
    Ok(())
}

#[test]
fn config_file_selects_previous_day_dating() -> Result<()> {
    let home = setup_temp_home();
    let flows = write_file(&home, "flows.csv", "date,amount\n");
    let values = write_file(
        &home,
        "values.csv",
        "date,value\n2022-04-01,100000\n2022-05-01,105000\n2023-04-01,120000\n",
    );
    let config = write_file(
        &home,
        "perftrack.toml",
        "[engine]\nvaluation_dating = \"previous_day\"\n",
    );
    let args = [
        "performance",
        "--cashflows",
        flows.to_str().unwrap(),
        "--valuations",
        values.to_str().unwrap(),
    ];

    let as_reported = run_cmd_json(&home, &args)?;
    assert_eq!(
        decimal_from_value(&as_reported["current_fiscal_year_twrr"])?,
        Decimal::ZERO
    );

    let mut with_config = vec!["--config", config.to_str().unwrap()];
    with_config.extend_from_slice(&args);
    let previous_day = run_cmd_json(&home, &with_config)?;
    assert_close(
        decimal_from_value(&previous_day["current_fiscal_year_twrr"])?,
        dec!(0.2),
    );
    Ok(())
}

#[test]
fn missing_input_file_fails() {
    let home = setup_temp_home();
    let values = write_file(&home, "values.csv", SINGLE_VALUATIONS);

    let mut cmd = base_cmd(&home);
    cmd.arg("performance")
        .arg("--cashflows")
        .arg(home.path().join("missing.csv"))
        .arg("--valuations")
        .arg(&values);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open CSV file"));
}
