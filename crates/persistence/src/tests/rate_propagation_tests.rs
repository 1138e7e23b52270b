// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Rate propagation batch.

use diesel::prelude::*;
use donation_domain::{Rate, TransactionStatus, VisibilityScope};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{Seed, create_program, record, seed};
use crate::{
    BackendConnection, PersistenceError, RatePropagationOptions, RatePropagationReport,
    SqlitePersistence,
};

fn change_rate(persistence: &mut SqlitePersistence, program_id: i64, rate: Decimal) {
    let mut program = persistence.get_program(program_id).unwrap().unwrap();
    program.rate = Rate::new(rate).unwrap();
    persistence.update_program(program_id, &program).unwrap();
}

fn stored(persistence: &mut SqlitePersistence, id: i64) -> (Decimal, Decimal) {
    let transaction = persistence
        .get_transaction(id, VisibilityScope::All)
        .unwrap()
        .unwrap();
    (transaction.rate.value(), transaction.allocation)
}

fn overwrite_stored_rate(persistence: &mut SqlitePersistence, id: i64, rate: &str) {
    let BackendConnection::Sqlite(conn) = &mut persistence.conn else {
        panic!("expected a SQLite connection");
    };
    diesel::sql_query("UPDATE donation_transactions SET rate = ? WHERE transaction_id = ?")
        .bind::<diesel::sql_types::Text, _>(rate)
        .bind::<diesel::sql_types::BigInt, _>(id)
        .execute(conn)
        .unwrap();
}

fn record_for(persistence: &mut SqlitePersistence, seed: &Seed, program_id: i64, amount: &str) -> i64 {
    record(
        persistence,
        seed,
        seed.volunteer_id,
        seed.branch_id,
        program_id,
        amount,
        1,
    )
}

#[test]
fn test_propagation_rewrites_rate_and_allocation() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let seed = seed(&mut persistence);
    let first = record_for(&mut persistence, &seed, seed.program_id, "1000");
    let second = record_for(&mut persistence, &seed, seed.program_id, "333.33");

    change_rate(&mut persistence, seed.program_id, dec!(12.5));
    let report = persistence
        .propagate_rates(RatePropagationOptions::default())
        .unwrap();

    assert_eq!(
        report,
        RatePropagationReport {
            programs_scanned: 1,
            transactions_examined: 2,
            transactions_updated: 2,
            dry_run: false,
        }
    );
    assert_eq!(stored(&mut persistence, first), (dec!(12.5), dec!(125)));
    // 333.33 * 12.5% = 41.66625
    assert_eq!(stored(&mut persistence, second), (dec!(12.5), dec!(41.67)));
}

#[test]
fn test_second_run_updates_nothing() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let seed = seed(&mut persistence);
    record_for(&mut persistence, &seed, seed.program_id, "1000");
    change_rate(&mut persistence, seed.program_id, dec!(5));

    persistence
        .propagate_rates(RatePropagationOptions::default())
        .unwrap();
    let report = persistence
        .propagate_rates(RatePropagationOptions::default())
        .unwrap();

    assert_eq!(report.transactions_examined, 1);
    assert_eq!(report.transactions_updated, 0);
}

#[test]
fn test_unchanged_program_is_scanned_but_untouched() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let seed = seed(&mut persistence);
    let other = create_program(&mut persistence, "INFAQ", dec!(2.5));
    record_for(&mut persistence, &seed, seed.program_id, "1000");
    let untouched = record_for(&mut persistence, &seed, other, "1000");

    change_rate(&mut persistence, seed.program_id, dec!(20));
    let report = persistence
        .propagate_rates(RatePropagationOptions::default())
        .unwrap();

    assert_eq!(report.programs_scanned, 2);
    assert_eq!(report.transactions_examined, 2);
    assert_eq!(report.transactions_updated, 1);
    assert_eq!(stored(&mut persistence, untouched), (dec!(2.5), dec!(25)));
}

#[test]
fn test_dry_run_counts_without_writing() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let seed = seed(&mut persistence);
    let id = record_for(&mut persistence, &seed, seed.program_id, "1000");
    change_rate(&mut persistence, seed.program_id, dec!(15));

    let report = persistence
        .propagate_rates(RatePropagationOptions {
            dry_run: true,
            ..RatePropagationOptions::default()
        })
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(report.transactions_updated, 1);
    assert_eq!(stored(&mut persistence, id), (dec!(10), dec!(100)));
}

#[test]
fn test_pending_only_skips_decided_transactions() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let seed = seed(&mut persistence);
    let pending = record_for(&mut persistence, &seed, seed.program_id, "1000");
    let validated = record_for(&mut persistence, &seed, seed.program_id, "1000");
    persistence
        .set_transaction_status(validated, TransactionStatus::Valid, seed.operator_id, None)
        .unwrap();
    change_rate(&mut persistence, seed.program_id, dec!(15));

    let report = persistence
        .propagate_rates(RatePropagationOptions {
            pending_only: true,
            ..RatePropagationOptions::default()
        })
        .unwrap();

    assert_eq!(report.transactions_examined, 1);
    assert_eq!(report.transactions_updated, 1);
    assert_eq!(stored(&mut persistence, pending), (dec!(15), dec!(150)));
    assert_eq!(stored(&mut persistence, validated), (dec!(10), dec!(100)));
}

#[test]
fn test_without_pending_only_decided_transactions_follow_the_program() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let seed = seed(&mut persistence);
    let validated = record_for(&mut persistence, &seed, seed.program_id, "1000");
    persistence
        .set_transaction_status(validated, TransactionStatus::Valid, seed.operator_id, None)
        .unwrap();
    change_rate(&mut persistence, seed.program_id, dec!(15));

    persistence
        .propagate_rates(RatePropagationOptions::default())
        .unwrap();

    let transaction = persistence
        .get_transaction(validated, VisibilityScope::All)
        .unwrap()
        .unwrap();
    assert_eq!(transaction.status, TransactionStatus::Valid);
    assert_eq!(transaction.allocation, dec!(150));
}

#[test]
fn test_single_program_run() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let seed = seed(&mut persistence);
    let other = create_program(&mut persistence, "INFAQ", dec!(2.5));
    let in_other = record_for(&mut persistence, &seed, other, "1000");
    record_for(&mut persistence, &seed, seed.program_id, "1000");
    change_rate(&mut persistence, seed.program_id, dec!(20));
    change_rate(&mut persistence, other, dec!(3));

    let report = persistence
        .propagate_rates(RatePropagationOptions {
            program_id: Some(seed.program_id),
            ..RatePropagationOptions::default()
        })
        .unwrap();

    assert_eq!(report.programs_scanned, 1);
    assert_eq!(report.transactions_updated, 1);
    assert_eq!(stored(&mut persistence, in_other), (dec!(2.5), dec!(25)));
}

#[test]
fn test_failure_in_a_later_program_rolls_back_earlier_updates() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let seed = seed(&mut persistence);
    let other = create_program(&mut persistence, "INFAQ", dec!(2.5));
    let first = record_for(&mut persistence, &seed, seed.program_id, "1000");
    let second = record_for(&mut persistence, &seed, seed.program_id, "400");
    let broken = record_for(&mut persistence, &seed, other, "1000");
    change_rate(&mut persistence, seed.program_id, dec!(20));
    change_rate(&mut persistence, other, dec!(3));
    overwrite_stored_rate(&mut persistence, broken, "not-a-rate");

    let result = persistence.propagate_rates(RatePropagationOptions::default());

    assert!(matches!(result, Err(PersistenceError::CorruptValue(_))));
    assert_eq!(stored(&mut persistence, first), (dec!(10), dec!(100)));
    assert_eq!(stored(&mut persistence, second), (dec!(10), dec!(40)));
}

#[test]
fn test_unknown_program_is_not_found() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    seed(&mut persistence);

    let result = persistence.propagate_rates(RatePropagationOptions {
        program_id: Some(999),
        ..RatePropagationOptions::default()
    });
    assert!(matches!(result, Err(PersistenceError::NotFound(_))));
}

#[test]
fn test_empty_store_reports_zeroes() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();

    let report = persistence
        .propagate_rates(RatePropagationOptions::default())
        .unwrap();
    assert_eq!(report, RatePropagationReport::default());
}
