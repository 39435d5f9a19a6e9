use uuid::Uuid;

use super::repo_types::{Purpose, TransactionLine};
use super::TransactionStore;
use crate::error::LedgerError;

/// Credits minus debits, or `None` if the sum leaves the `i64` range.
pub fn sum_lines(lines: &[TransactionLine]) -> Option<i64> {
    lines.iter().try_fold(0i64, |total, line| match line.purpose {
        Purpose::Credit => total.checked_add(line.amount),
        Purpose::Debit => total.checked_sub(line.amount),
    })
}

/// Replays every line of the account. Nothing is cached, so the result is
/// always consistent with what the unit of work can see.
pub async fn account_balance<S>(store: &mut S, account_id: Uuid) -> Result<i64, LedgerError>
where
    S: TransactionStore + ?Sized,
{
    let lines = store.lines_for_account(account_id).await?;
    sum_lines(&lines).ok_or(LedgerError::BalanceOverflow(account_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use time::OffsetDateTime;

    fn line(amount: i64, purpose: Purpose) -> TransactionLine {
        TransactionLine {
            id: Uuid::new_v4(),
            transaction_id: Uuid::new_v4(),
            account_id: Uuid::nil(),
            amount,
            purpose,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn empty_account_has_zero_balance() {
        assert_eq!(sum_lines(&[]), Some(0));
    }

    #[test]
    fn credits_minus_debits() {
        let lines = [
            line(20_000, Purpose::Credit),
            line(10_000, Purpose::Debit),
            line(2_500, Purpose::Credit),
        ];
        assert_eq!(sum_lines(&lines), Some(12_500));
    }

    #[test]
    fn overflow_is_reported_not_wrapped() {
        let lines = [line(i64::MAX, Purpose::Credit), line(1, Purpose::Credit)];
        assert_eq!(sum_lines(&lines), None);

        let lines = [line(i64::MAX, Purpose::Debit), line(2, Purpose::Debit)];
        assert_eq!(sum_lines(&lines), None);
    }

    proptest! {
        #[test]
        fn matches_wide_arithmetic(entries in prop::collection::vec((1i64..1_000_000_000, any::<bool>()), 0..64)) {
            let lines: Vec<_> = entries
                .iter()
                .map(|&(amount, credit)| line(amount, if credit { Purpose::Credit } else { Purpose::Debit }))
                .collect();
            let expected: i128 = entries
                .iter()
                .map(|&(amount, credit)| if credit { amount as i128 } else { -(amount as i128) })
                .sum();
            prop_assert_eq!(sum_lines(&lines).map(i128::from), Some(expected));
        }

        #[test]
        fn order_does_not_matter(entries in prop::collection::vec((1i64..1_000_000, any::<bool>()), 0..32)) {
            let mut lines: Vec<_> = entries
                .iter()
                .map(|&(amount, credit)| line(amount, if credit { Purpose::Credit } else { Purpose::Debit }))
                .collect();
            let forward = sum_lines(&lines);
            lines.reverse();
            prop_assert_eq!(forward, sum_lines(&lines));
        }
    }
}
