use serde::{Deserialize, Serialize};

use crate::types::LimitSubject;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

/// A forge operation as seen by the quota gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Operation {
    /// Git push or commit through the API. `visibility` is the target repo's,
    /// when known.
    PushCommit {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        visibility: Option<Visibility>,
    },
    LfsUpload,
    IssueAttachmentUpload,
    ReleaseAttachmentUpload,
    ArtifactUpload,
    PackageUpload,
    /// Repository created in, or forked into, the target principal.
    RepoCreate,
    RepoFork,
    Read,
    Delete,
}

impl Operation {
    /// The leaf subject this operation writes to. `None` means the operation
    /// is never gated.
    #[must_use]
    pub fn subject(&self) -> Option<LimitSubject> {
        let subject = match self {
            Self::PushCommit { visibility: None } => LimitSubject::SizeGitAll,
            Self::PushCommit {
                visibility: Some(Visibility::Public),
            } => LimitSubject::SizeReposPublic,
            Self::PushCommit {
                visibility: Some(Visibility::Private),
            } => LimitSubject::SizeReposPrivate,
            Self::LfsUpload => LimitSubject::SizeGitLfs,
            Self::IssueAttachmentUpload => LimitSubject::SizeAssetsAttachmentsIssues,
            Self::ReleaseAttachmentUpload => LimitSubject::SizeAssetsAttachmentsReleases,
            Self::ArtifactUpload => LimitSubject::SizeAssetsArtifacts,
            Self::PackageUpload => LimitSubject::SizeAssetsPackagesAll,
            Self::RepoCreate | Self::RepoFork => LimitSubject::SizeReposAll,
            Self::Read | Self::Delete => return None,
        };
        Some(subject)
    }

    #[must_use]
    pub fn is_gated(&self) -> bool {
        self.subject().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_table() {
        let cases = [
            (Operation::PushCommit { visibility: None }, Some("size:git:all")),
            (
                Operation::PushCommit {
                    visibility: Some(Visibility::Public),
                },
                Some("size:repos:public"),
            ),
            (
                Operation::PushCommit {
                    visibility: Some(Visibility::Private),
                },
                Some("size:repos:private"),
            ),
            (Operation::LfsUpload, Some("size:git:lfs")),
            (
                Operation::IssueAttachmentUpload,
                Some("size:assets:attachments:issues"),
            ),
            (
                Operation::ReleaseAttachmentUpload,
                Some("size:assets:attachments:releases"),
            ),
            (Operation::ArtifactUpload, Some("size:assets:artifacts")),
            (Operation::PackageUpload, Some("size:assets:packages:all")),
            (Operation::RepoCreate, Some("size:repos:all")),
            (Operation::RepoFork, Some("size:repos:all")),
            (Operation::Read, None),
            (Operation::Delete, None),
        ];

        for (operation, expected) in cases {
            assert_eq!(
                operation.subject().map(LimitSubject::as_str),
                expected,
                "{operation:?}"
            );
        }
    }

    #[test]
    fn test_reads_and_deletes_are_not_gated() {
        assert!(!Operation::Read.is_gated());
        assert!(!Operation::Delete.is_gated());
        assert!(Operation::LfsUpload.is_gated());
    }

    #[test]
    fn test_wire_format() {
        let op: Operation = serde_json::from_str(r#"{"type":"lfs-upload"}"#).unwrap();
        assert_eq!(op, Operation::LfsUpload);

        let op: Operation =
            serde_json::from_str(r#"{"type":"push-commit","visibility":"private"}"#).unwrap();
        assert_eq!(
            op,
            Operation::PushCommit {
                visibility: Some(Visibility::Private)
            }
        );

        let op: Operation = serde_json::from_str(r#"{"type":"push-commit"}"#).unwrap();
        assert_eq!(op, Operation::PushCommit { visibility: None });
    }
}
