// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Branches, teams and volunteers under role scoping.

use super::helpers::World;
use crate::{
    ApiError, BranchInfo, BranchRequest, CreateTeamRequest, CreateVolunteerRequest, TeamInfo,
    TeamQuery, UpdateTeamRequest, UpdateVolunteerRequest, VolunteerInfo, VolunteerQuery,
    create_branch, create_team, create_volunteer, delete_branch, delete_team, delete_volunteer,
    get_team, get_volunteer, list_branches, list_teams, list_volunteers, set_volunteer_active,
    update_branch, update_team, update_volunteer,
};

fn branch_request(code: &str, name: &str) -> BranchRequest {
    BranchRequest {
        code: String::from(code),
        name: String::from(name),
        address: Some(String::from("  Jl. Merdeka 1 ")),
    }
}

#[test]
fn test_admin_creates_and_updates_branches() {
    let mut world: World = World::new();
    let admin = world.admin.clone();

    let created: BranchInfo =
        create_branch(&mut world.persistence, &admin, &branch_request("east", "East")).unwrap();
    assert_eq!(created.code, "EAST");
    assert_eq!(created.address.as_deref(), Some("Jl. Merdeka 1"));

    let updated: BranchInfo = update_branch(
        &mut world.persistence,
        &admin,
        created.branch_id,
        &branch_request("east-2", "East Two"),
    )
    .unwrap();
    assert_eq!(updated.code, "EAST-2");
    assert_eq!(list_branches(&mut world.persistence).unwrap().branches.len(), 3);
}

#[test]
fn test_branch_codes_are_unique() {
    let mut world: World = World::new();
    let admin = world.admin.clone();

    let duplicate = create_branch(&mut world.persistence, &admin, &branch_request("North", "N"));
    assert!(matches!(duplicate, Err(ApiError::Conflict { .. })));

    let renamed = update_branch(
        &mut world.persistence,
        &admin,
        world.south_branch,
        &branch_request("north", "South"),
    );
    assert!(matches!(renamed, Err(ApiError::Conflict { .. })));

    let same_code = update_branch(
        &mut world.persistence,
        &admin,
        world.south_branch,
        &branch_request("south", "South Renamed"),
    );
    assert!(same_code.is_ok());
}

#[test]
fn test_branch_staff_cannot_edit_branches() {
    let mut world: World = World::new();
    let staff = world.north_staff.clone();

    assert!(matches!(
        create_branch(&mut world.persistence, &staff, &branch_request("west", "West")),
        Err(ApiError::Unauthorized { .. })
    ));
    assert!(matches!(
        delete_branch(&mut world.persistence, &staff, world.north_branch),
        Err(ApiError::Unauthorized { .. })
    ));
}

#[test]
fn test_branch_with_teams_cannot_be_deleted() {
    let mut world: World = World::new();
    let admin = world.admin.clone();

    assert!(matches!(
        delete_branch(&mut world.persistence, &admin, world.south_branch),
        Err(ApiError::Conflict { .. })
    ));
    assert!(matches!(
        delete_branch(&mut world.persistence, &admin, 999),
        Err(ApiError::ResourceNotFound { .. })
    ));

    let empty: BranchInfo =
        create_branch(&mut world.persistence, &admin, &branch_request("tmp", "Temp")).unwrap();
    delete_branch(&mut world.persistence, &admin, empty.branch_id).unwrap();
}

#[test]
fn test_branch_staff_manage_teams_of_their_own_branch() {
    let mut world: World = World::new();
    let staff = world.north_staff.clone();

    let own: TeamInfo = create_team(
        &mut world.persistence,
        &staff,
        &CreateTeamRequest {
            branch_id: world.north_branch,
            name: String::from("Gamma"),
        },
    )
    .unwrap();
    assert_eq!(own.branch_id, world.north_branch);

    let other = create_team(
        &mut world.persistence,
        &staff,
        &CreateTeamRequest {
            branch_id: world.south_branch,
            name: String::from("Gamma"),
        },
    );
    assert!(matches!(other, Err(ApiError::Unauthorized { .. })));

    let rename_other = update_team(
        &mut world.persistence,
        &staff,
        world.south_team,
        &UpdateTeamRequest {
            name: String::from("Mine now"),
        },
    );
    assert!(matches!(rename_other, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_team_names_are_unique_per_branch() {
    let mut world: World = World::new();
    let admin = world.admin.clone();

    let clash = create_team(
        &mut world.persistence,
        &admin,
        &CreateTeamRequest {
            branch_id: world.north_branch,
            name: String::from("Alpha"),
        },
    );
    assert!(matches!(clash, Err(ApiError::Conflict { .. })));

    let other_branch = create_team(
        &mut world.persistence,
        &admin,
        &CreateTeamRequest {
            branch_id: world.south_branch,
            name: String::from("Alpha"),
        },
    );
    assert!(other_branch.is_ok());
}

#[test]
fn test_team_listing_follows_scope() {
    let mut world: World = World::new();
    let admin = world.admin.clone();
    let staff = world.north_staff.clone();
    let ana = world.ana_account.clone();

    let all = list_teams(&mut world.persistence, &admin, TeamQuery::default()).unwrap();
    assert_eq!(all.teams.len(), 2);

    let own = list_teams(&mut world.persistence, &staff, TeamQuery::default()).unwrap();
    assert_eq!(own.teams.len(), 1);
    assert_eq!(own.teams[0].team_id, world.north_team);

    let asked_elsewhere = list_teams(
        &mut world.persistence,
        &staff,
        TeamQuery {
            branch_id: Some(world.south_branch),
        },
    )
    .unwrap();
    assert!(asked_elsewhere.teams.is_empty());

    let volunteer_view = list_teams(&mut world.persistence, &ana, TeamQuery::default()).unwrap();
    assert_eq!(volunteer_view.teams.len(), 1);
    assert_eq!(volunteer_view.teams[0].team_id, world.north_team);

    assert!(matches!(
        get_team(&mut world.persistence, &staff, world.south_team),
        Err(ApiError::ResourceNotFound { .. })
    ));
}

#[test]
fn test_team_with_volunteers_cannot_be_deleted() {
    let mut world: World = World::new();
    let admin = world.admin.clone();

    assert!(matches!(
        delete_team(&mut world.persistence, &admin, world.north_team),
        Err(ApiError::Conflict { .. })
    ));
}

#[test]
fn test_volunteer_branch_follows_team() {
    let mut world: World = World::new();
    let staff = world.north_staff.clone();

    let created: VolunteerInfo = create_volunteer(
        &mut world.persistence,
        &staff,
        &CreateVolunteerRequest {
            team_id: world.north_team,
            name: String::from("Citra Lestari"),
            phone: Some(String::from("+62 812 3456 7890")),
            email: None,
        },
    )
    .unwrap();
    assert_eq!(created.branch_id, world.north_branch);
    assert!(created.is_active);

    let elsewhere = create_volunteer(
        &mut world.persistence,
        &staff,
        &CreateVolunteerRequest {
            team_id: world.south_team,
            name: String::from("Dewi"),
            phone: None,
            email: None,
        },
    );
    assert!(matches!(elsewhere, Err(ApiError::Unauthorized { .. })));
}

#[test]
fn test_volunteer_listing_follows_scope() {
    let mut world: World = World::new();
    let admin = world.admin.clone();
    let staff = world.north_staff.clone();
    let ana = world.ana_account.clone();

    let all = list_volunteers(&mut world.persistence, &admin, VolunteerQuery::default()).unwrap();
    assert_eq!(all.volunteers.len(), 2);

    let branch = list_volunteers(&mut world.persistence, &staff, VolunteerQuery::default()).unwrap();
    assert_eq!(branch.volunteers.len(), 1);
    assert_eq!(branch.volunteers[0].volunteer_id, world.ana);

    let own = list_volunteers(&mut world.persistence, &ana, VolunteerQuery::default()).unwrap();
    assert_eq!(own.volunteers.len(), 1);

    let filtered_away = list_volunteers(
        &mut world.persistence,
        &ana,
        VolunteerQuery {
            branch_id: Some(world.south_branch),
            team_id: None,
        },
    )
    .unwrap();
    assert!(filtered_away.volunteers.is_empty());

    assert!(matches!(
        get_volunteer(&mut world.persistence, &staff, world.budi),
        Err(ApiError::ResourceNotFound { .. })
    ));
    assert!(get_volunteer(&mut world.persistence, &ana, world.ana).is_ok());
}

#[test]
fn test_moving_a_volunteer_across_branches_needs_both_branches() {
    let mut world: World = World::new();
    let staff = world.north_staff.clone();
    let admin = world.admin.clone();

    let request: UpdateVolunteerRequest = UpdateVolunteerRequest {
        team_id: world.south_team,
        name: String::from("Ana Putri"),
        phone: None,
        email: None,
        is_active: true,
    };

    assert!(matches!(
        update_volunteer(&mut world.persistence, &staff, world.ana, &request),
        Err(ApiError::Unauthorized { .. })
    ));

    let moved: VolunteerInfo =
        update_volunteer(&mut world.persistence, &admin, world.ana, &request).unwrap();
    assert_eq!(moved.team_id, world.south_team);
    assert_eq!(moved.branch_id, world.south_branch);
}

#[test]
fn test_deactivated_volunteer_keeps_record() {
    let mut world: World = World::new();
    let staff = world.north_staff.clone();

    let inactive: VolunteerInfo =
        set_volunteer_active(&mut world.persistence, &staff, world.ana, false).unwrap();
    assert!(!inactive.is_active);

    let active: VolunteerInfo =
        set_volunteer_active(&mut world.persistence, &staff, world.ana, true).unwrap();
    assert!(active.is_active);

    assert!(matches!(
        set_volunteer_active(&mut world.persistence, &staff, world.budi, false),
        Err(ApiError::Unauthorized { .. })
    ));
}

#[test]
fn test_volunteer_with_account_cannot_be_deleted() {
    let mut world: World = World::new();
    let admin = world.admin.clone();

    assert!(matches!(
        delete_volunteer(&mut world.persistence, &admin, world.ana),
        Err(ApiError::Conflict { .. })
    ));
    delete_volunteer(&mut world.persistence, &admin, world.budi).unwrap();
}
