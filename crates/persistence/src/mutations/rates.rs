// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Rate propagation.
//!
//! A program's rate is captured on each transaction when it is recorded.
//! After an administrator changes a program's rate, propagation copies the
//! current rate back onto the program's transactions and recomputes their
//! allocations. It is a plain loop: one program at a time, one transaction at
//! a time, all inside a single database transaction.

use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel::{MysqlConnection, SqliteConnection};
use donation_domain::{Amount, Rate};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::data_models::{RatePropagationOptions, RatePropagationReport};
use crate::diesel_schema::{donation_programs, donation_transactions};
use crate::error::PersistenceError;

backend_fn! {
/// Propagates current program rates onto recorded transactions.
///
/// For every selected program, each of its transactions whose stored rate
/// differs from the program's rate receives the program's rate and a
/// recomputed allocation. With `dry_run` set, changes are counted but not
/// written.
///
/// # Errors
///
/// Returns `NotFound` if `program_id` names no program, `CorruptValue` if a
/// stored amount or rate cannot be decoded, or a database error. Any error
/// rolls back every change made by the run.
pub fn propagate_rates(
    conn: &mut _,
    options: RatePropagationOptions,
) -> Result<RatePropagationReport, PersistenceError> {
    info!(
        program_id = ?options.program_id,
        pending_only = options.pending_only,
        dry_run = options.dry_run,
        "Starting rate propagation"
    );

    let report: RatePropagationReport = conn.transaction::<_, PersistenceError, _>(|conn| {
        let mut report: RatePropagationReport = RatePropagationReport {
            dry_run: options.dry_run,
            ..RatePropagationReport::default()
        };

        let mut program_query = donation_programs::table
            .select((donation_programs::program_id, donation_programs::rate))
            .order(donation_programs::program_id.asc())
            .into_boxed();
        if let Some(id) = options.program_id {
            program_query = program_query.filter(donation_programs::program_id.eq(id));
        }
        let programs: Vec<(i64, String)> = program_query.load(conn)?;

        if programs.is_empty() {
            if let Some(id) = options.program_id {
                return Err(PersistenceError::NotFound(format!(
                    "Program with ID {id} not found"
                )));
            }
        }

        for (program_id, program_rate) in programs {
            let program_rate: Rate = Rate::parse(&program_rate)?;
            report.programs_scanned += 1;

            let mut transaction_query = donation_transactions::table
                .filter(donation_transactions::program_id.eq(program_id))
                .select((
                    donation_transactions::transaction_id,
                    donation_transactions::amount,
                    donation_transactions::rate,
                ))
                .order(donation_transactions::transaction_id.asc())
                .into_boxed();
            if options.pending_only {
                transaction_query =
                    transaction_query.filter(donation_transactions::status.eq("pending"));
            }
            let transactions: Vec<(i64, String, String)> = transaction_query.load(conn)?;

            let mut program_updates: u64 = 0;
            for (transaction_id, amount, stored_rate) in transactions {
                report.transactions_examined += 1;

                if Rate::parse(&stored_rate)? == program_rate {
                    continue;
                }

                if !options.dry_run {
                    let allocation: Decimal =
                        program_rate.allocation_for(Amount::parse(&amount)?)?;
                    diesel::update(donation_transactions::table)
                        .filter(donation_transactions::transaction_id.eq(transaction_id))
                        .set((
                            donation_transactions::rate.eq(program_rate.to_string()),
                            donation_transactions::allocation.eq(allocation.to_string()),
                            donation_transactions::updated_at.eq(sql::<Text>("CURRENT_TIMESTAMP")),
                        ))
                        .execute(conn)?;
                }
                program_updates += 1;
            }

            debug!(program_id, rate = %program_rate, updated = program_updates, "Program processed");
            report.transactions_updated += program_updates;
        }

        Ok(report)
    })?;

    info!(
        programs_scanned = report.programs_scanned,
        transactions_examined = report.transactions_examined,
        transactions_updated = report.transactions_updated,
        dry_run = report.dry_run,
        "Rate propagation finished"
    );
    Ok(report)
}
}
