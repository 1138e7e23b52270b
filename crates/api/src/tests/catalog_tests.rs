// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Donation programs and payment methods.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::helpers::World;
use crate::{
    ApiError, PaymentMethodInfo, PaymentMethodRequest, ProgramInfo, ProgramRequest,
    create_payment_method, create_program, delete_payment_method, delete_program,
    get_payment_method, list_payment_methods, list_programs, update_payment_method,
    update_program,
};

fn program_request(code: &str, rate: Decimal, is_active: Option<bool>) -> ProgramRequest {
    ProgramRequest {
        code: String::from(code),
        name: String::from("Infaq"),
        description: Some(String::from("General purpose giving")),
        rate,
        is_active,
    }
}

#[test]
fn test_program_rate_is_normalized() {
    let mut world: World = World::new();
    let admin = world.admin.clone();

    let program: ProgramInfo = create_program(
        &mut world.persistence,
        &admin,
        &program_request("inf", dec!(12.500), None),
    )
    .unwrap();
    assert_eq!(program.code, "INF");
    assert_eq!(program.rate.to_string(), "12.5");
    assert!(program.is_active);
}

#[test]
fn test_program_rate_must_be_a_percentage() {
    let mut world: World = World::new();
    let admin = world.admin.clone();

    for rate in [dec!(-1), dec!(100.01)] {
        let result = create_program(
            &mut world.persistence,
            &admin,
            &program_request("bad", rate, None),
        );
        assert!(matches!(
            result,
            Err(ApiError::InvalidInput { ref field, .. }) if field == "rate"
        ));
    }
}

#[test]
fn test_program_codes_are_unique_and_admin_only() {
    let mut world: World = World::new();
    let admin = world.admin.clone();
    let validator = world.validator.clone();

    assert!(matches!(
        create_program(&mut world.persistence, &admin, &program_request("ZKT", dec!(5), None)),
        Err(ApiError::Conflict { .. })
    ));
    assert!(matches!(
        create_program(
            &mut world.persistence,
            &validator,
            &program_request("NEW", dec!(5), None)
        ),
        Err(ApiError::Unauthorized { .. })
    ));
}

#[test]
fn test_program_update_keeps_activity_unless_given() {
    let mut world: World = World::new();
    let admin = world.admin.clone();

    let paused: ProgramInfo = update_program(
        &mut world.persistence,
        &admin,
        world.zakat,
        &program_request("ZKT", dec!(2.5), Some(false)),
    )
    .unwrap();
    assert!(!paused.is_active);

    let repriced: ProgramInfo = update_program(
        &mut world.persistence,
        &admin,
        world.zakat,
        &program_request("ZKT", dec!(5), None),
    )
    .unwrap();
    assert!(!repriced.is_active);
    assert_eq!(repriced.rate, dec!(5));
}

#[test]
fn test_program_in_use_cannot_be_deleted() {
    let mut world: World = World::new();
    let admin = world.admin.clone();
    world.record(&admin, world.ana, dec!(50000));

    assert!(matches!(
        delete_program(&mut world.persistence, &admin, world.zakat),
        Err(ApiError::Conflict { .. })
    ));

    let unused: ProgramInfo = create_program(
        &mut world.persistence,
        &admin,
        &program_request("WQF", dec!(0), None),
    )
    .unwrap();
    delete_program(&mut world.persistence, &admin, unused.program_id).unwrap();
    assert_eq!(list_programs(&mut world.persistence).unwrap().programs.len(), 1);
}

#[test]
fn test_payment_method_lifecycle() {
    let mut world: World = World::new();
    let admin = world.admin.clone();

    let transfer: PaymentMethodInfo = create_payment_method(
        &mut world.persistence,
        &admin,
        &PaymentMethodRequest {
            name: String::from("Bank Transfer"),
            account_number: Some(String::from("123-456-789")),
            is_active: None,
        },
    )
    .unwrap();
    assert!(transfer.is_active);

    let duplicate = create_payment_method(
        &mut world.persistence,
        &admin,
        &PaymentMethodRequest {
            name: String::from("Cash"),
            account_number: None,
            is_active: None,
        },
    );
    assert!(matches!(duplicate, Err(ApiError::Conflict { .. })));

    let retired: PaymentMethodInfo = update_payment_method(
        &mut world.persistence,
        &admin,
        transfer.payment_method_id,
        &PaymentMethodRequest {
            name: String::from("Bank Transfer (old)"),
            account_number: None,
            is_active: Some(false),
        },
    )
    .unwrap();
    assert!(!retired.is_active);
    assert_eq!(retired.account_number, None);

    delete_payment_method(&mut world.persistence, &admin, transfer.payment_method_id).unwrap();
    assert!(matches!(
        get_payment_method(&mut world.persistence, transfer.payment_method_id),
        Err(ApiError::ResourceNotFound { .. })
    ));
    assert_eq!(
        list_payment_methods(&mut world.persistence)
            .unwrap()
            .payment_methods
            .len(),
        1
    );
}
