// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{DomainError, TransactionStatus};

#[test]
fn test_domain_error_display() {
    let err: DomainError = DomainError::InvalidCode(String::from("test"));
    assert_eq!(format!("{err}"), "Invalid code: test");

    let err: DomainError = DomainError::InvalidStatus(String::from("done"));
    assert_eq!(
        format!("{err}"),
        "Invalid status 'done'. Must be one of: pending, valid, rejected"
    );

    let err: DomainError = DomainError::InvalidStatusTransition {
        from: TransactionStatus::Valid,
        to: TransactionStatus::Rejected,
    };
    assert_eq!(
        format!("{err}"),
        "Cannot change transaction status from valid to rejected"
    );

    let err: DomainError = DomainError::TransactionAlreadyDecided {
        transaction_id: 7,
        status: TransactionStatus::Rejected,
    };
    assert_eq!(
        format!("{err}"),
        "Transaction 7 is already rejected and cannot be modified"
    );
}
