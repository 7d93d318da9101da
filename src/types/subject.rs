use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A named storage category. Leaves are physically disjoint; roll-ups are
/// unions of the subjects listed under them in [`CHILDREN`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LimitSubject {
    #[serde(rename = "size:all")]
    SizeAll,
    #[serde(rename = "size:repos:all")]
    SizeReposAll,
    #[serde(rename = "size:repos:public")]
    SizeReposPublic,
    #[serde(rename = "size:repos:private")]
    SizeReposPrivate,
    #[serde(rename = "size:git:all")]
    SizeGitAll,
    #[serde(rename = "size:git:lfs")]
    SizeGitLfs,
    #[serde(rename = "size:assets:all")]
    SizeAssetsAll,
    #[serde(rename = "size:assets:attachments:all")]
    SizeAssetsAttachmentsAll,
    #[serde(rename = "size:assets:attachments:issues")]
    SizeAssetsAttachmentsIssues,
    #[serde(rename = "size:assets:attachments:releases")]
    SizeAssetsAttachmentsReleases,
    #[serde(rename = "size:assets:artifacts")]
    SizeAssetsArtifacts,
    #[serde(rename = "size:assets:packages:all")]
    SizeAssetsPackagesAll,
    #[serde(rename = "size:assets:wiki")]
    SizeWiki,
}

use LimitSubject::*;

impl LimitSubject {
    pub const ALL: [LimitSubject; 13] = [
        SizeAll,
        SizeReposAll,
        SizeReposPublic,
        SizeReposPrivate,
        SizeGitAll,
        SizeGitLfs,
        SizeAssetsAll,
        SizeAssetsAttachmentsAll,
        SizeAssetsAttachmentsIssues,
        SizeAssetsAttachmentsReleases,
        SizeAssetsArtifacts,
        SizeAssetsPackagesAll,
        SizeWiki,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SizeAll => "size:all",
            SizeReposAll => "size:repos:all",
            SizeReposPublic => "size:repos:public",
            SizeReposPrivate => "size:repos:private",
            SizeGitAll => "size:git:all",
            SizeGitLfs => "size:git:lfs",
            SizeAssetsAll => "size:assets:all",
            SizeAssetsAttachmentsAll => "size:assets:attachments:all",
            SizeAssetsAttachmentsIssues => "size:assets:attachments:issues",
            SizeAssetsAttachmentsReleases => "size:assets:attachments:releases",
            SizeAssetsArtifacts => "size:assets:artifacts",
            SizeAssetsPackagesAll => "size:assets:packages:all",
            SizeWiki => "size:assets:wiki",
        }
    }

    /// Parses the canonical string form.
    pub fn parse(s: &str) -> Result<LimitSubject, Error> {
        Self::ALL
            .into_iter()
            .find(|subject| subject.as_str() == s)
            .ok_or_else(|| Error::UnknownSubject(s.to_string()))
    }

    /// Parses a list of canonical strings, failing on the first unknown one.
    pub fn parse_many<S: AsRef<str>>(strs: &[S]) -> Result<Vec<LimitSubject>, Error> {
        strs.iter().map(|s| Self::parse(s.as_ref())).collect()
    }

    /// True when nothing else is contained in this subject.
    #[must_use]
    pub fn is_leaf(self) -> bool {
        children_of(self).is_empty()
    }

    /// Every subject whose union closure contains `self`, nearest first.
    #[must_use]
    pub fn indirect_covers(self) -> &'static [LimitSubject] {
        COVERS.get(&self).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every subject contained in the union closure of `self`, excluding
    /// `self`. Inverse of [`LimitSubject::indirect_covers`].
    #[must_use]
    pub fn direct_subjects(self) -> &'static [LimitSubject] {
        CONTAINS.get(&self).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Parent to direct children. The only hand-maintained part of the lattice;
/// both transitive maps below are derived from it.
const CHILDREN: &[(LimitSubject, &[LimitSubject])] = &[
    (SizeAll, &[SizeGitAll, SizeAssetsAll, SizeWiki]),
    (SizeGitAll, &[SizeReposAll, SizeGitLfs]),
    (SizeReposAll, &[SizeReposPublic, SizeReposPrivate]),
    (
        SizeAssetsAll,
        &[SizeAssetsAttachmentsAll, SizeAssetsArtifacts, SizeAssetsPackagesAll],
    ),
    (
        SizeAssetsAttachmentsAll,
        &[SizeAssetsAttachmentsIssues, SizeAssetsAttachmentsReleases],
    ),
];

fn children_of(subject: LimitSubject) -> &'static [LimitSubject] {
    CHILDREN
        .iter()
        .find(|(parent, _)| *parent == subject)
        .map(|(_, children)| *children)
        .unwrap_or(&[])
}

fn parent_of(subject: LimitSubject) -> Option<LimitSubject> {
    CHILDREN
        .iter()
        .find(|(_, children)| children.contains(&subject))
        .map(|(parent, _)| *parent)
}

static COVERS: LazyLock<HashMap<LimitSubject, Vec<LimitSubject>>> = LazyLock::new(|| {
    LimitSubject::ALL
        .into_iter()
        .map(|subject| {
            let mut ancestors = Vec::new();
            let mut current = parent_of(subject);
            while let Some(parent) = current {
                ancestors.push(parent);
                current = parent_of(parent);
            }
            (subject, ancestors)
        })
        .collect()
});

static CONTAINS: LazyLock<HashMap<LimitSubject, Vec<LimitSubject>>> = LazyLock::new(|| {
    let mut contains: HashMap<LimitSubject, Vec<LimitSubject>> = LimitSubject::ALL
        .into_iter()
        .map(|subject| (subject, Vec::new()))
        .collect();

    for subject in LimitSubject::ALL {
        for ancestor in &COVERS[&subject] {
            if let Some(entry) = contains.get_mut(ancestor) {
                entry.push(subject);
            }
        }
    }

    contains
});

impl fmt::Display for LimitSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LimitSubject {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
