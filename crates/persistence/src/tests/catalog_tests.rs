// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Donation program and payment method persistence.

use donation_domain::{DonationProgram, PaymentMethod, Rate};
use rust_decimal_macros::dec;

use super::{create_program, record, seed};
use crate::{PersistenceError, SqlitePersistence};

#[test]
fn test_program_rate_survives_round_trip() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let program_id = create_program(&mut persistence, "infaq", dec!(12.5));

    let program = persistence.get_program(program_id).unwrap().unwrap();
    assert_eq!(program.code, "INFAQ");
    assert_eq!(program.rate.value(), dec!(12.5));
    assert!(program.is_active);
}

#[test]
fn test_update_program_rate() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let program_id = create_program(&mut persistence, "ZKT", dec!(10));

    let mut program = persistence.get_program(program_id).unwrap().unwrap();
    program.rate = Rate::new(dec!(12.5)).unwrap();
    program.is_active = false;
    persistence.update_program(program_id, &program).unwrap();

    let loaded = persistence.get_program(program_id).unwrap().unwrap();
    assert_eq!(loaded.rate.value(), dec!(12.5));
    assert!(!loaded.is_active);
}

#[test]
fn test_list_programs_orders_by_code() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    create_program(&mut persistence, "ZKT", dec!(10));
    create_program(&mut persistence, "INFAQ", dec!(5));

    let codes: Vec<String> = persistence
        .list_programs()
        .unwrap()
        .into_iter()
        .map(|p| p.code)
        .collect();
    assert_eq!(codes, vec!["INFAQ", "ZKT"]);
}

#[test]
fn test_program_code_exists() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let program_id = create_program(&mut persistence, "ZKT", dec!(10));

    assert!(persistence.program_code_exists("ZKT", None).unwrap());
    assert!(!persistence.program_code_exists("ZKT", Some(program_id)).unwrap());
}

#[test]
fn test_delete_program_in_use_is_refused() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let seed = seed(&mut persistence);
    record(
        &mut persistence,
        &seed,
        seed.volunteer_id,
        seed.branch_id,
        seed.program_id,
        "10000",
        2,
    );

    let result = persistence.delete_program(seed.program_id);
    assert!(matches!(
        result,
        Err(PersistenceError::Referenced {
            entity: "Program",
            ..
        })
    ));

    let unused = persistence
        .create_program(&DonationProgram::new("UNUSED", "Unused", None, Rate::ZERO).unwrap())
        .unwrap();
    persistence.delete_program(unused).unwrap();
    assert!(persistence.get_program(unused).unwrap().is_none());
}

#[test]
fn test_payment_method_crud() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();

    let method_id = persistence
        .create_payment_method(&PaymentMethod::new("Bank Transfer", Some("123-456")).unwrap())
        .unwrap();
    let method = persistence.get_payment_method(method_id).unwrap().unwrap();
    assert_eq!(method.name, "Bank Transfer");
    assert_eq!(method.account_number.as_deref(), Some("123-456"));

    let renamed = PaymentMethod::new("Transfer", None).unwrap();
    persistence.update_payment_method(method_id, &renamed).unwrap();
    assert!(persistence.payment_method_name_exists("Transfer", None).unwrap());
    assert!(
        !persistence
            .payment_method_name_exists("Transfer", Some(method_id))
            .unwrap()
    );

    persistence.delete_payment_method(method_id).unwrap();
    assert!(persistence.list_payment_methods().unwrap().is_empty());
}

#[test]
fn test_delete_payment_method_in_use_is_refused() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let seed = seed(&mut persistence);
    record(
        &mut persistence,
        &seed,
        seed.volunteer_id,
        seed.branch_id,
        seed.program_id,
        "10000",
        2,
    );

    let result = persistence.delete_payment_method(seed.payment_method_id);
    assert!(matches!(result, Err(PersistenceError::Referenced { .. })));
}

#[test]
fn test_delete_missing_payment_method_is_not_found() {
    let mut persistence = SqlitePersistence::new_in_memory().unwrap();
    let result = persistence.delete_payment_method(5);
    assert!(matches!(result, Err(PersistenceError::NotFound(_))));
}
