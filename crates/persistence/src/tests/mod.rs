// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod backend_validation_tests;
mod catalog_tests;
mod rate_propagation_tests;

use donation_domain::{
    Amount, Branch, DonationProgram, DonationTransaction, PaymentMethod, Rate, Team,
    TransactionDraft, Volunteer,
};
use rust_decimal::Decimal;
use time::{Date, Month};

use crate::{NewOperator, SqlitePersistence};

/// Identifiers of the rows created by [`seed`].
pub struct Seed {
    pub branch_id: i64,
    pub team_id: i64,
    pub volunteer_id: i64,
    pub program_id: i64,
    pub payment_method_id: i64,
    pub operator_id: i64,
}

/// Creates one branch with a team, a volunteer, a 10% program, a payment
/// method and an admin operator.
pub fn seed(persistence: &mut SqlitePersistence) -> Seed {
    let branch_id = persistence
        .create_branch(&Branch::new("north", "North Branch", Some("1 Main St")).unwrap())
        .unwrap();
    let team_id = persistence
        .create_team(&Team::new(branch_id, "Alpha").unwrap())
        .unwrap();
    let volunteer_id = create_volunteer(persistence, team_id, branch_id, "Ana Putri");
    let program_id = create_program(persistence, "ZKT", Decimal::TEN);
    let payment_method_id = persistence
        .create_payment_method(&PaymentMethod::new("Cash", None).unwrap())
        .unwrap();
    let operator_id = persistence
        .create_operator(&NewOperator {
            login_name: "admin",
            display_name: "Admin",
            password: "password",
            role: "Admin",
            branch_id: None,
            volunteer_id: None,
        })
        .unwrap();

    Seed {
        branch_id,
        team_id,
        volunteer_id,
        program_id,
        payment_method_id,
        operator_id,
    }
}

pub fn create_volunteer(
    persistence: &mut SqlitePersistence,
    team_id: i64,
    branch_id: i64,
    name: &str,
) -> i64 {
    persistence
        .create_volunteer(&Volunteer::new(team_id, branch_id, name, None, None).unwrap())
        .unwrap()
}

pub fn create_program(persistence: &mut SqlitePersistence, code: &str, rate: Decimal) -> i64 {
    persistence
        .create_program(
            &DonationProgram::new(code, &format!("{code} Program"), None, Rate::new(rate).unwrap())
                .unwrap(),
        )
        .unwrap()
}

pub fn test_date(day: u8) -> Date {
    Date::from_calendar_date(2026, Month::March, day).expect("Valid test date")
}

/// Records a pending transaction at the program's current rate.
pub fn record(
    persistence: &mut SqlitePersistence,
    seed: &Seed,
    volunteer_id: i64,
    branch_id: i64,
    program_id: i64,
    amount: &str,
    day: u8,
) -> i64 {
    let rate = persistence.get_program(program_id).unwrap().unwrap().rate;
    let receipt_number = persistence.next_receipt_number(2026).unwrap();
    let draft = TransactionDraft {
        receipt_number,
        volunteer_id,
        branch_id,
        program_id,
        payment_method_id: seed.payment_method_id,
        donor_name: String::from("Budi"),
        donor_phone: None,
        amount: Amount::parse(amount).unwrap(),
        donated_on: test_date(day),
        notes: None,
    };
    let transaction = DonationTransaction::record(draft, rate, seed.operator_id).unwrap();
    persistence.insert_transaction(&transaction).unwrap()
}
