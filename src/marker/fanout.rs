//! Resolve which recipients a read text must be marked in.

use crate::kom::{ConfNo, LocalNo, RecipientRole, TextNo, TextStat};

/// One mark-as-read call to make for a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkTarget {
    pub recipient: ConfNo,
    pub role: RecipientRole,
    pub local_no: LocalNo,
}

/// Collect one target per distinct recipient of `text`.
///
/// Roles are scanned To, Cc, Bcc; the first occurrence of a recipient wins.
pub fn resolve_targets(text: TextNo, stat: &TextStat) -> Vec<MarkTarget> {
    let mut targets: Vec<MarkTarget> = Vec::new();

    for role in RecipientRole::ALL {
        for sel in stat.selections_for(role) {
            if sel.recipient == 0 {
                continue;
            }
            if targets.iter().any(|t| t.recipient == sel.recipient) {
                tracing::debug!(
                    "Text {}: recipient {} already resolved, skipping {:?} entry",
                    text,
                    sel.recipient,
                    role
                );
                continue;
            }
            let Some(local_no) = sel.local_no else {
                tracing::debug!(
                    "Text {}: recipient {} has no local number",
                    text,
                    sel.recipient
                );
                continue;
            };
            targets.push(MarkTarget {
                recipient: sel.recipient,
                role,
                local_no,
            });
        }
    }

    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kom::MiscInfo;

    #[test]
    fn test_one_target_per_role() {
        let stat = TextStat::new(vec![
            MiscInfo::Recipient(1),
            MiscInfo::LocalNo(10),
            MiscInfo::CcRecipient(2),
            MiscInfo::LocalNo(20),
            MiscInfo::BccRecipient(3),
            MiscInfo::LocalNo(30),
        ]);

        let targets = resolve_targets(100, &stat);
        let pairs: Vec<_> = targets.iter().map(|t| (t.recipient, t.local_no)).collect();
        assert_eq!(pairs, vec![(1, 10), (2, 20), (3, 30)]);
    }

    #[test]
    fn test_duplicate_recipient_keeps_first_role() {
        // Cc entry comes first in the list, but To is scanned first
        let stat = TextStat::new(vec![
            MiscInfo::CcRecipient(5),
            MiscInfo::LocalNo(50),
            MiscInfo::Recipient(5),
            MiscInfo::LocalNo(51),
        ]);

        let targets = resolve_targets(100, &stat);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].role, RecipientRole::To);
        assert_eq!(targets[0].local_no, 51);
    }

    #[test]
    fn test_zero_recipient_and_missing_local_no_are_skipped() {
        let stat = TextStat::new(vec![
            MiscInfo::Recipient(0),
            MiscInfo::LocalNo(1),
            MiscInfo::CcRecipient(8),
            MiscInfo::SentAt(0),
        ]);

        assert!(resolve_targets(100, &stat).is_empty());
    }

    #[test]
    fn test_no_recipients() {
        let stat = TextStat::new(vec![MiscInfo::CommentTo(7)]);
        assert!(resolve_targets(100, &stat).is_empty());
    }
}
