// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use donation_domain::{Branch, DonationProgram, PaymentMethod, Rate, Team, Volunteer};
use donation_persistence::{NewOperator, OperatorData, Persistence};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::request_response::{RecordTransactionRequest, TransactionDetailResponse};
use crate::{AuthenticatedActor, Role, record_transaction};

/// Password shared by every seeded operator. Satisfies the policy.
pub const TEST_PASSWORD: &str = "Donasi-2026!";

pub fn actor_for(operator_id: i64, role: Role) -> AuthenticatedActor {
    AuthenticatedActor::new(operator_id, format!("OPERATOR-{operator_id}"), role)
}

pub fn operator_data(operator_id: i64, role: &str) -> OperatorData {
    OperatorData {
        operator_id,
        login_name: format!("OPERATOR-{operator_id}"),
        display_name: format!("Operator {operator_id}"),
        password_hash: String::new(),
        role: String::from(role),
        branch_id: None,
        volunteer_id: None,
        is_disabled: false,
        created_at: String::from("2026-01-01 00:00:00"),
        disabled_at: None,
        last_login_at: None,
    }
}

/// Two branches with one team and one volunteer each, a catalog, and one
/// operator per role.
///
/// Branch staff and the volunteer account both belong to the north branch.
pub struct World {
    pub persistence: Persistence,
    pub north_branch: i64,
    pub south_branch: i64,
    pub north_team: i64,
    pub south_team: i64,
    /// Volunteer in the north branch with an operator account.
    pub ana: i64,
    /// Volunteer in the south branch without an operator account.
    pub budi: i64,
    pub zakat: i64,
    pub cash: i64,
    pub admin: AuthenticatedActor,
    pub validator: AuthenticatedActor,
    pub north_staff: AuthenticatedActor,
    pub ana_account: AuthenticatedActor,
}

impl World {
    pub fn new() -> Self {
        let mut persistence: Persistence = Persistence::new_in_memory().unwrap();

        let north_branch: i64 = persistence
            .create_branch(&Branch::new("north", "North Branch", None).unwrap())
            .unwrap();
        let south_branch: i64 = persistence
            .create_branch(&Branch::new("south", "South Branch", None).unwrap())
            .unwrap();
        let north_team: i64 = persistence
            .create_team(&Team::new(north_branch, "Alpha").unwrap())
            .unwrap();
        let south_team: i64 = persistence
            .create_team(&Team::new(south_branch, "Beta").unwrap())
            .unwrap();
        let ana: i64 = persistence
            .create_volunteer(
                &Volunteer::new(north_team, north_branch, "Ana Putri", None, None).unwrap(),
            )
            .unwrap();
        let budi: i64 = persistence
            .create_volunteer(
                &Volunteer::new(south_team, south_branch, "Budi Santoso", None, None).unwrap(),
            )
            .unwrap();
        let zakat: i64 = persistence
            .create_program(
                &DonationProgram::new("zkt", "Zakat", None, Rate::new(dec!(2.5)).unwrap())
                    .unwrap(),
            )
            .unwrap();
        let cash: i64 = persistence
            .create_payment_method(&PaymentMethod::new("Cash", None).unwrap())
            .unwrap();

        let admin = create_actor(&mut persistence, "admin", Role::Admin, None, None);
        let validator = create_actor(&mut persistence, "checker", Role::Validator, None, None);
        let north_staff = create_actor(
            &mut persistence,
            "north-staff",
            Role::BranchStaff,
            Some(north_branch),
            None,
        );
        let ana_account = create_actor(&mut persistence, "ana", Role::Volunteer, None, Some(ana));

        Self {
            persistence,
            north_branch,
            south_branch,
            north_team,
            south_team,
            ana,
            budi,
            zakat,
            cash,
            admin,
            validator,
            north_staff,
            ana_account,
        }
    }

    /// Loads the stored operator row behind an actor.
    pub fn operator(&mut self, actor: &AuthenticatedActor) -> OperatorData {
        self.persistence
            .get_operator_by_id(actor.operator_id)
            .unwrap()
            .unwrap()
    }

    /// Records a donation as `actor` for `volunteer_id`.
    pub fn record(
        &mut self,
        actor: &AuthenticatedActor,
        volunteer_id: i64,
        amount: Decimal,
    ) -> TransactionDetailResponse {
        let request: RecordTransactionRequest = donation(Some(volunteer_id), self.zakat, self.cash, amount);
        record_transaction(&mut self.persistence, actor, &request).unwrap()
    }
}

pub fn create_actor(
    persistence: &mut Persistence,
    login_name: &str,
    role: Role,
    branch_id: Option<i64>,
    volunteer_id: Option<i64>,
) -> AuthenticatedActor {
    let operator_id: i64 = persistence
        .create_operator(&NewOperator {
            login_name,
            display_name: login_name,
            password: TEST_PASSWORD,
            role: role.as_str(),
            branch_id,
            volunteer_id,
        })
        .unwrap();
    let operator: OperatorData = persistence.get_operator_by_id(operator_id).unwrap().unwrap();
    AuthenticatedActor::from_operator(&operator).unwrap()
}

pub fn donation(
    volunteer_id: Option<i64>,
    program_id: i64,
    payment_method_id: i64,
    amount: Decimal,
) -> RecordTransactionRequest {
    RecordTransactionRequest {
        volunteer_id,
        program_id,
        payment_method_id,
        donor_name: String::from("Hamba Allah"),
        donor_phone: None,
        amount,
        donated_on: String::from("2026-03-04"),
        notes: None,
    }
}
