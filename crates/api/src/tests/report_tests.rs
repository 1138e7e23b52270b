// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Summary reports, CSV export and rate propagation.

use donation_domain::{TransactionStatus, VisibilityScope};
use rust_decimal_macros::dec;

use super::helpers::World;
use crate::{
    ApiError, ProgramRequest, PropagateRatesRequest, PropagateRatesResponse, TransactionQuery,
    TransactionSummaryResponse, ValidateTransactionRequest, export_transactions_csv,
    get_transaction, propagate_rates, report::EXPORT_HEADERS, transaction_summary,
    update_program, validate_transaction,
};

fn reprice_zakat(world: &mut World, rate: rust_decimal::Decimal) {
    let admin = world.admin.clone();
    update_program(
        &mut world.persistence,
        &admin,
        world.zakat,
        &ProgramRequest {
            code: String::from("ZKT"),
            name: String::from("Zakat"),
            description: None,
            rate,
            is_active: None,
        },
    )
    .unwrap();
}

#[test]
fn test_summary_totals_follow_scope() {
    let mut world: World = World::new();
    let admin = world.admin.clone();
    let staff = world.north_staff.clone();

    world.record(&admin, world.ana, dec!(100000));
    world.record(&admin, world.ana, dec!(50000));
    world.record(&admin, world.budi, dec!(20000));

    let everything: TransactionSummaryResponse =
        transaction_summary(&mut world.persistence, &admin, &TransactionQuery::default()).unwrap();
    assert_eq!(everything.scope, VisibilityScope::All);
    assert_eq!(everything.summary.count, 3);
    assert_eq!(everything.summary.total_amount, dec!(170000));
    assert_eq!(everything.summary.total_allocation, dec!(4250));
    assert_eq!(everything.summary.by_branch.len(), 2);

    let north: TransactionSummaryResponse =
        transaction_summary(&mut world.persistence, &staff, &TransactionQuery::default()).unwrap();
    assert_eq!(north.scope, VisibilityScope::Branch(world.north_branch));
    assert_eq!(north.summary.count, 2);
    assert_eq!(north.summary.total_amount, dec!(150000));
    assert_eq!(north.summary.by_branch[0].label, "NORTH");
    assert_eq!(north.summary.by_program[0].label, "ZKT");
}

#[test]
fn test_summary_counts_every_status() {
    let mut world: World = World::new();
    let admin = world.admin.clone();
    let id: i64 = world.record(&admin, world.ana, dec!(1000)).transaction.transaction_id;
    world.record(&admin, world.ana, dec!(2000));
    validate_transaction(
        &mut world.persistence,
        &admin,
        id,
        &ValidateTransactionRequest {
            status: String::from("valid"),
            reason: None,
        },
    )
    .unwrap();

    let summary = transaction_summary(
        &mut world.persistence,
        &admin,
        &TransactionQuery {
            status: Some(String::from("valid")),
            ..TransactionQuery::default()
        },
    )
    .unwrap()
    .summary;

    assert_eq!(summary.count, 1);
    assert_eq!(summary.by_status.len(), 3);
    let valid = summary
        .by_status
        .iter()
        .find(|b| b.key == TransactionStatus::Valid.as_str())
        .unwrap();
    assert_eq!(valid.count, 1);
    assert_eq!(valid.total_amount, dec!(1000));
}

#[test]
fn test_volunteers_get_no_reports() {
    let mut world: World = World::new();
    let ana = world.ana_account.clone();

    assert!(matches!(
        transaction_summary(&mut world.persistence, &ana, &TransactionQuery::default()),
        Err(ApiError::Unauthorized { .. })
    ));
    assert!(matches!(
        export_transactions_csv(&mut world.persistence, &ana, &TransactionQuery::default()),
        Err(ApiError::Unauthorized { .. })
    ));
}

#[test]
fn test_export_is_scoped_csv() {
    let mut world: World = World::new();
    let admin = world.admin.clone();
    let staff = world.north_staff.clone();

    world.record(&admin, world.ana, dec!(150000));
    world.record(&admin, world.budi, dec!(20000));

    let csv: String =
        export_transactions_csv(&mut world.persistence, &staff, &TransactionQuery::default())
            .unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], EXPORT_HEADERS.join(","));
    assert!(lines[1].contains(",NORTH,Ana Putri,ZKT,Cash,"));
    assert!(lines[1].contains(",150000,2.5,3750,"));
}

#[test]
fn test_rate_propagation_is_admin_only() {
    let mut world: World = World::new();
    let validator = world.validator.clone();

    assert!(matches!(
        propagate_rates(
            &mut world.persistence,
            &validator,
            PropagateRatesRequest::default()
        ),
        Err(ApiError::Unauthorized { .. })
    ));
}

#[test]
fn test_rate_propagation_rewrites_allocations() {
    let mut world: World = World::new();
    let admin = world.admin.clone();
    let pending: i64 = world.record(&admin, world.ana, dec!(100000)).transaction.transaction_id;
    let decided: i64 = world.record(&admin, world.budi, dec!(100000)).transaction.transaction_id;
    validate_transaction(
        &mut world.persistence,
        &admin,
        decided,
        &ValidateTransactionRequest {
            status: String::from("valid"),
            reason: None,
        },
    )
    .unwrap();

    reprice_zakat(&mut world, dec!(5));

    let dry: PropagateRatesResponse = propagate_rates(
        &mut world.persistence,
        &admin,
        PropagateRatesRequest {
            program_id: None,
            pending_only: true,
            dry_run: true,
        },
    )
    .unwrap();
    assert!(dry.dry_run);
    assert_eq!(dry.transactions_updated, 1);
    let untouched = get_transaction(&mut world.persistence, &admin, pending).unwrap();
    assert_eq!(untouched.transaction.allocation, dec!(2500));

    let applied: PropagateRatesResponse = propagate_rates(
        &mut world.persistence,
        &admin,
        PropagateRatesRequest {
            program_id: Some(world.zakat),
            pending_only: false,
            dry_run: false,
        },
    )
    .unwrap();
    assert_eq!(applied.programs_scanned, 1);
    assert_eq!(applied.transactions_updated, 2);

    for id in [pending, decided] {
        let tx = get_transaction(&mut world.persistence, &admin, id).unwrap();
        assert_eq!(tx.transaction.rate, dec!(5));
        assert_eq!(tx.transaction.allocation, dec!(5000));
    }

    let again: PropagateRatesResponse = propagate_rates(
        &mut world.persistence,
        &admin,
        PropagateRatesRequest::default(),
    )
    .unwrap();
    assert_eq!(again.transactions_updated, 0);
}

#[test]
fn test_rate_propagation_for_unknown_program() {
    let mut world: World = World::new();
    let admin = world.admin.clone();

    assert!(matches!(
        propagate_rates(
            &mut world.persistence,
            &admin,
            PropagateRatesRequest {
                program_id: Some(999),
                pending_only: false,
                dry_run: false,
            },
        ),
        Err(ApiError::ResourceNotFound { .. })
    ));
}
