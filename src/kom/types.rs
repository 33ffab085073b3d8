//! Text status and misc-info types as the conference server reports them.

use serde::Deserialize;

/// Global text number.
pub type TextNo = u32;

/// Conference (or letterbox) number. Recipients are conferences.
pub type ConfNo = u32;

/// Person number.
pub type PersNo = u32;

/// Per-recipient local text number.
pub type LocalNo = u32;

/// The role under which a conference receives a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipientRole {
    To,
    Cc,
    Bcc,
}

impl RecipientRole {
    /// Order in which roles are considered when resolving recipients.
    pub const ALL: [RecipientRole; 3] = [RecipientRole::To, RecipientRole::Cc, RecipientRole::Bcc];
}

/// One entry of a text's misc-info list.
///
/// The server sends these as a flat sequence: a recipient entry is followed by
/// the entries that qualify it (local number, receive time, sender...), up to
/// the next group-starting entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum MiscInfo {
    Recipient(ConfNo),
    CcRecipient(ConfNo),
    BccRecipient(ConfNo),
    LocalNo(LocalNo),
    ReceivedAt(i64),
    Sender(PersNo),
    SentAt(i64),
    CommentTo(TextNo),
    CommentedIn(TextNo),
    FootnoteTo(TextNo),
    FootnotedIn(TextNo),
}

impl MiscInfo {
    /// The recipient role and conference if this entry starts a recipient group.
    pub fn as_recipient(&self) -> Option<(RecipientRole, ConfNo)> {
        match *self {
            MiscInfo::Recipient(conf) => Some((RecipientRole::To, conf)),
            MiscInfo::CcRecipient(conf) => Some((RecipientRole::Cc, conf)),
            MiscInfo::BccRecipient(conf) => Some((RecipientRole::Bcc, conf)),
            _ => None,
        }
    }

    fn starts_group(&self) -> bool {
        matches!(
            self,
            MiscInfo::Recipient(_)
                | MiscInfo::CcRecipient(_)
                | MiscInfo::BccRecipient(_)
                | MiscInfo::CommentTo(_)
                | MiscInfo::CommentedIn(_)
                | MiscInfo::FootnoteTo(_)
                | MiscInfo::FootnotedIn(_)
        )
    }
}

/// A recipient entry together with its qualifying misc-info entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub role: RecipientRole,
    pub recipient: ConfNo,
    pub local_no: Option<LocalNo>,
}

/// Server-held status of a text. Only the parts read-marking needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TextStat {
    #[serde(default)]
    pub author: PersNo,
    #[serde(default)]
    pub misc: Vec<MiscInfo>,
}

impl TextStat {
    pub fn new(misc: Vec<MiscInfo>) -> Self {
        Self { author: 0, misc }
    }

    /// Group the flat misc-info list into one selection per recipient entry.
    pub fn recipient_selections(&self) -> Vec<Selection> {
        let mut selections = Vec::new();
        let mut current: Option<Selection> = None;

        for info in &self.misc {
            if info.starts_group() {
                if let Some(done) = current.take() {
                    selections.push(done);
                }
                if let Some((role, recipient)) = info.as_recipient() {
                    current = Some(Selection {
                        role,
                        recipient,
                        local_no: None,
                    });
                }
                continue;
            }

            if let (Some(sel), MiscInfo::LocalNo(n)) = (current.as_mut(), info)
                && sel.local_no.is_none()
            {
                sel.local_no = Some(*n);
            }
        }

        if let Some(done) = current {
            selections.push(done);
        }
        selections
    }

    /// Selections for a single role, in misc-info order.
    pub fn selections_for(&self, role: RecipientRole) -> Vec<Selection> {
        self.recipient_selections()
            .into_iter()
            .filter(|s| s.role == role)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_local_no_with_preceding_recipient() {
        let stat = TextStat::new(vec![
            MiscInfo::Recipient(42),
            MiscInfo::LocalNo(7),
            MiscInfo::ReceivedAt(1_700_000_000),
            MiscInfo::CcRecipient(9),
            MiscInfo::LocalNo(1200),
        ]);

        let sels = stat.recipient_selections();
        assert_eq!(sels.len(), 2);
        assert_eq!(
            sels[0],
            Selection {
                role: RecipientRole::To,
                recipient: 42,
                local_no: Some(7)
            }
        );
        assert_eq!(sels[1].role, RecipientRole::Cc);
        assert_eq!(sels[1].local_no, Some(1200));
    }

    #[test]
    fn test_comment_entry_closes_recipient_group() {
        // The local number after CommentTo belongs to no recipient
        let stat = TextStat::new(vec![
            MiscInfo::Recipient(5),
            MiscInfo::CommentTo(100),
            MiscInfo::LocalNo(3),
        ]);

        let sels = stat.recipient_selections();
        assert_eq!(sels.len(), 1);
        assert_eq!(sels[0].local_no, None);
    }

    #[test]
    fn test_selections_for_role() {
        let stat = TextStat::new(vec![
            MiscInfo::BccRecipient(3),
            MiscInfo::LocalNo(30),
            MiscInfo::Recipient(1),
            MiscInfo::LocalNo(10),
        ]);

        let bcc = stat.selections_for(RecipientRole::Bcc);
        assert_eq!(bcc.len(), 1);
        assert_eq!(bcc[0].recipient, 3);
        assert!(stat.selections_for(RecipientRole::Cc).is_empty());
    }

    #[test]
    fn test_parse_misc_info_from_toml() {
        let toml = r#"
            misc = [
                { type = "recipient", value = 42 },
                { type = "local-no", value = 7 },
                { type = "comment-to", value = 99 },
            ]
        "#;

        let stat: TextStat = toml::from_str(toml).unwrap();
        assert_eq!(stat.misc.len(), 3);
        assert_eq!(stat.misc[2], MiscInfo::CommentTo(99));
    }
}
