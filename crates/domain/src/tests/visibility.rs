// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::VisibilityScope;

#[test]
fn test_all_scope_permits_everything() {
    assert!(VisibilityScope::All.permits(1, 1));
    assert!(VisibilityScope::All.covers_branch(42));
}

#[test]
fn test_branch_scope_matches_branch_only() {
    let scope = VisibilityScope::Branch(2);
    assert!(scope.permits(10, 2));
    assert!(!scope.permits(10, 3));
    assert!(scope.covers_branch(2));
    assert!(!scope.covers_branch(3));
}

#[test]
fn test_volunteer_scope_matches_volunteer_only() {
    let scope = VisibilityScope::Volunteer(10);
    assert!(scope.permits(10, 2));
    assert!(!scope.permits(11, 2));
    assert!(!scope.covers_branch(2));
}

#[test]
fn test_scope_display() {
    assert_eq!(VisibilityScope::All.to_string(), "all");
    assert_eq!(VisibilityScope::Branch(4).to_string(), "branch:4");
    assert_eq!(VisibilityScope::Volunteer(9).to_string(), "volunteer:9");
}
