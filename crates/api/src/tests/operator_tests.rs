// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Operator lifecycle: creation, role bindings, disable, delete, passwords.

use rust_decimal_macros::dec;

use super::helpers::{TEST_PASSWORD, World};
use crate::{
    ApiError, AuthenticationService, ChangePasswordRequest, CreateOperatorRequest,
    CreateOperatorResponse, ListOperatorsResponse, OperatorInfo, ResetPasswordRequest,
    change_password, create_operator, delete_operator, disable_operator, enable_operator,
    list_operators, reset_password,
};

fn operator_request(
    login_name: &str,
    role: &str,
    branch_id: Option<i64>,
    volunteer_id: Option<i64>,
) -> CreateOperatorRequest {
    CreateOperatorRequest {
        login_name: String::from(login_name),
        display_name: format!("{login_name} display"),
        password: String::from(TEST_PASSWORD),
        password_confirmation: String::from(TEST_PASSWORD),
        role: String::from(role),
        branch_id,
        volunteer_id,
    }
}

#[test]
fn test_branch_staff_requires_an_existing_branch() {
    let mut world: World = World::new();
    let admin = world.admin.clone();

    let missing = create_operator(
        &mut world.persistence,
        &admin,
        &operator_request("south-staff", "BranchStaff", None, None),
    );
    assert!(matches!(
        missing,
        Err(ApiError::InvalidInput { ref field, .. }) if field == "branch_id"
    ));

    let unknown = create_operator(
        &mut world.persistence,
        &admin,
        &operator_request("south-staff", "BranchStaff", Some(999), None),
    );
    assert!(matches!(unknown, Err(ApiError::ResourceNotFound { .. })));

    let created: CreateOperatorResponse = create_operator(
        &mut world.persistence,
        &admin,
        &operator_request("south-staff", "BranchStaff", Some(world.south_branch), None),
    )
    .unwrap();
    assert_eq!(created.login_name, "SOUTH-STAFF");
    assert_eq!(created.role, "BranchStaff");
}

#[test]
fn test_volunteer_account_requires_a_volunteer() {
    let mut world: World = World::new();
    let admin = world.admin.clone();

    let missing = create_operator(
        &mut world.persistence,
        &admin,
        &operator_request("budi", "Volunteer", None, None),
    );
    assert!(matches!(
        missing,
        Err(ApiError::InvalidInput { ref field, .. }) if field == "volunteer_id"
    ));

    let created = create_operator(
        &mut world.persistence,
        &admin,
        &operator_request("budi", "Volunteer", None, Some(world.budi)),
    )
    .unwrap();
    let stored = world
        .persistence
        .get_operator_by_id(created.operator_id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.volunteer_id, Some(world.budi));
    assert_eq!(stored.branch_id, None);
}

#[test]
fn test_validator_bindings_are_dropped() {
    let mut world: World = World::new();
    let admin = world.admin.clone();

    let created = create_operator(
        &mut world.persistence,
        &admin,
        &operator_request("auditor", "Validator", Some(world.north_branch), Some(world.ana)),
    )
    .unwrap();
    let stored = world
        .persistence
        .get_operator_by_id(created.operator_id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.branch_id, None);
    assert_eq!(stored.volunteer_id, None);
}

#[test]
fn test_create_operator_rejects_unknown_role_and_taken_login() {
    let mut world: World = World::new();
    let admin = world.admin.clone();

    let bad_role = create_operator(
        &mut world.persistence,
        &admin,
        &operator_request("someone", "Treasurer", None, None),
    );
    assert!(matches!(
        bad_role,
        Err(ApiError::InvalidInput { ref field, .. }) if field == "role"
    ));

    let taken = create_operator(
        &mut world.persistence,
        &admin,
        &operator_request("CHECKER", "Validator", None, None),
    );
    assert!(matches!(taken, Err(ApiError::Conflict { .. })));
}

#[test]
fn test_only_admins_manage_operators() {
    let mut world: World = World::new();
    let staff = world.north_staff.clone();
    let staff_operator = world.operator(&staff);

    assert!(matches!(
        create_operator(
            &mut world.persistence,
            &staff,
            &operator_request("intruder", "Admin", None, None),
        ),
        Err(ApiError::Unauthorized { .. })
    ));
    assert!(matches!(
        list_operators(&mut world.persistence, &staff, &staff_operator),
        Err(ApiError::Unauthorized { .. })
    ));
}

#[test]
fn test_last_active_admin_cannot_be_disabled() {
    let mut world: World = World::new();
    let admin = world.admin.clone();

    let result = disable_operator(&mut world.persistence, &admin, admin.operator_id);
    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "last_active_admin"
    ));
}

#[test]
fn test_disable_ends_sessions_and_enable_restores_login() {
    let mut world: World = World::new();
    let admin = world.admin.clone();
    let (token, _, _) =
        AuthenticationService::login(&mut world.persistence, "checker", TEST_PASSWORD).unwrap();

    disable_operator(&mut world.persistence, &admin, world.validator.operator_id).unwrap();
    assert!(AuthenticationService::validate_session(&mut world.persistence, &token).is_err());

    enable_operator(&mut world.persistence, &admin, world.validator.operator_id).unwrap();
    assert!(
        AuthenticationService::login(&mut world.persistence, "checker", TEST_PASSWORD).is_ok()
    );
}

#[test]
fn test_delete_operator_guards() {
    let mut world: World = World::new();
    let admin = world.admin.clone();

    let own = delete_operator(&mut world.persistence, &admin, admin.operator_id);
    assert!(matches!(
        own,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "self_delete"
    ));

    let staff = world.north_staff.clone();
    world.record(&staff, world.ana, dec!(10000));
    let referenced = delete_operator(&mut world.persistence, &admin, staff.operator_id);
    assert!(matches!(referenced, Err(ApiError::Conflict { .. })));

    delete_operator(&mut world.persistence, &admin, world.validator.operator_id).unwrap();
    assert!(
        world
            .persistence
            .get_operator_by_id(world.validator.operator_id)
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_list_operators_marks_last_admin_and_self() {
    let mut world: World = World::new();
    let admin = world.admin.clone();
    let admin_operator = world.operator(&admin);

    let response: ListOperatorsResponse =
        list_operators(&mut world.persistence, &admin, &admin_operator).unwrap();
    assert_eq!(response.operators.len(), 4);

    let me: &OperatorInfo = response
        .operators
        .iter()
        .find(|o| o.operator_id == admin.operator_id)
        .unwrap();
    assert!(!me.capabilities.can_disable.is_allowed());
    assert!(!me.capabilities.can_delete.is_allowed());

    let checker: &OperatorInfo = response
        .operators
        .iter()
        .find(|o| o.operator_id == world.validator.operator_id)
        .unwrap();
    assert!(checker.capabilities.can_disable.is_allowed());
    assert!(checker.capabilities.can_delete.is_allowed());
}

#[test]
fn test_change_password_checks_current_and_ends_sessions() {
    let mut world: World = World::new();
    let ana = world.ana_account.clone();
    let operator = world.operator(&ana);
    let (token, _, _) =
        AuthenticationService::login(&mut world.persistence, "ana", TEST_PASSWORD).unwrap();

    let wrong = change_password(
        &mut world.persistence,
        &operator,
        &ChangePasswordRequest {
            current_password: String::from("Not-The-Password1"),
            new_password: String::from("Sedekah-2027!"),
            new_password_confirmation: String::from("Sedekah-2027!"),
        },
    );
    assert!(matches!(wrong, Err(ApiError::AuthenticationFailed { .. })));

    change_password(
        &mut world.persistence,
        &operator,
        &ChangePasswordRequest {
            current_password: String::from(TEST_PASSWORD),
            new_password: String::from("Sedekah-2027!"),
            new_password_confirmation: String::from("Sedekah-2027!"),
        },
    )
    .unwrap();

    assert!(AuthenticationService::validate_session(&mut world.persistence, &token).is_err());
    assert!(
        AuthenticationService::login(&mut world.persistence, "ana", "Sedekah-2027!").is_ok()
    );
}

#[test]
fn test_reset_password_applies_policy() {
    let mut world: World = World::new();
    let admin = world.admin.clone();

    let weak = reset_password(
        &mut world.persistence,
        &admin,
        world.validator.operator_id,
        &ResetPasswordRequest {
            new_password: String::from("password"),
            new_password_confirmation: String::from("password"),
        },
    );
    assert!(matches!(weak, Err(ApiError::PasswordPolicyViolation { .. })));

    reset_password(
        &mut world.persistence,
        &admin,
        world.validator.operator_id,
        &ResetPasswordRequest {
            new_password: String::from("Infaq-Reset-01"),
            new_password_confirmation: String::from("Infaq-Reset-01"),
        },
    )
    .unwrap();
    assert!(
        AuthenticationService::login(&mut world.persistence, "checker", "Infaq-Reset-01").is_ok()
    );
}
