use serde::{Deserialize, Serialize};

use super::LimitSubject;

/// Storage consumed by one principal, materialized from the forge's tables.
/// Never persisted; recomputed for every check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Used {
    pub git: UsedGit,
    pub assets: UsedAssets,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedGit {
    pub code: UsedCode,
    pub lfs: i64,
}

/// Repository (non-LFS) size, partitioned by visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedCode {
    pub public: i64,
    pub private: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedAssets {
    pub attachments: UsedAttachments,
    pub artifacts: i64,
    pub packages: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedAttachments {
    pub issues: i64,
    pub releases: i64,
}

impl UsedCode {
    #[must_use]
    pub fn total(&self) -> i64 {
        nonneg(self.public).saturating_add(nonneg(self.private))
    }
}

impl UsedAttachments {
    #[must_use]
    pub fn total(&self) -> i64 {
        nonneg(self.issues).saturating_add(nonneg(self.releases))
    }
}

impl Used {
    /// Git.Code + Git.LFS
    #[must_use]
    pub fn git(&self) -> i64 {
        self.git.code.total().saturating_add(nonneg(self.git.lfs))
    }

    /// Attachments (issues and releases) + artifacts + packages
    #[must_use]
    pub fn assets(&self) -> i64 {
        self.assets
            .attachments
            .total()
            .saturating_add(nonneg(self.assets.artifacts))
            .saturating_add(nonneg(self.assets.packages))
    }

    #[must_use]
    pub fn total(&self) -> i64 {
        self.git().saturating_add(self.assets())
    }

    /// Bytes counted against `subject`. Monotone over the containment lattice:
    /// a covering subject never reads less than a subject it contains.
    #[must_use]
    pub fn for_subject(&self, subject: LimitSubject) -> i64 {
        match subject {
            LimitSubject::SizeAll => self.total(),
            LimitSubject::SizeGitAll => self.git(),
            LimitSubject::SizeReposAll => self.git.code.total(),
            LimitSubject::SizeReposPublic => nonneg(self.git.code.public),
            LimitSubject::SizeReposPrivate => nonneg(self.git.code.private),
            LimitSubject::SizeGitLfs => nonneg(self.git.lfs),
            LimitSubject::SizeAssetsAll => self.assets(),
            LimitSubject::SizeAssetsAttachmentsAll => self.assets.attachments.total(),
            LimitSubject::SizeAssetsAttachmentsIssues => nonneg(self.assets.attachments.issues),
            LimitSubject::SizeAssetsAttachmentsReleases => {
                nonneg(self.assets.attachments.releases)
            }
            LimitSubject::SizeAssetsArtifacts => nonneg(self.assets.artifacts),
            LimitSubject::SizeAssetsPackagesAll => nonneg(self.assets.packages),
            // Wiki storage is not measured yet.
            LimitSubject::SizeWiki => 0,
        }
    }
}

fn nonneg(value: i64) -> i64 {
    value.max(0)
}
