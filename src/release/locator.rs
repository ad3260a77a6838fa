//! Release selection.
//!
//! The selected release is the first one, in listing order, that publishes
//! an archive named exactly `ferromon-<tag>-<target>.tar.gz`. There is no
//! scoring: a release either carries the archive or it does not.

use log::debug;
use semver::Version;

use crate::error::InstallError;
use crate::platform::Target;

use super::{Release, ReleaseAsset};

pub const ARTIFACT_PREFIX: &str = "ferromon";
pub const ARCHIVE_EXT: &str = "tar.gz";

/// Name of the release archive for a tag and target.
pub fn archive_name(tag: &str, target: Target) -> String {
    format!("{}-{}-{}.{}", ARTIFACT_PREFIX, tag, target, ARCHIVE_EXT)
}

/// Name of the checksum sidecar published next to an archive.
pub fn checksum_name(archive: &str) -> String {
    format!("{}.sha256", archive)
}

/// How the listing is ordered before the first-match scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReleaseOrder {
    /// Trust the upstream order (newest first).
    #[default]
    Listing,
    /// Highest semantic version first; tags that are not versions go last.
    Semver,
}

/// The release chosen for installation and where to fetch its files.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedRelease {
    pub tag: String,
    pub archive: ReleaseAsset,
    pub checksum_url: String,
}

impl SelectedRelease {
    pub fn checksum_name(&self) -> String {
        checksum_name(&self.archive.name)
    }
}

fn parse_version(tag: &str) -> Option<Version> {
    Version::parse(tag.strip_prefix('v').unwrap_or(tag)).ok()
}

/// Applies the ordering policy. Sorting is stable, so releases that compare
/// equal (or are not versions) keep their listing order.
pub fn order_releases(mut releases: Vec<Release>, order: ReleaseOrder) -> Vec<Release> {
    if order == ReleaseOrder::Semver {
        releases.sort_by(|a, b| match (parse_version(&a.tag), parse_version(&b.tag)) {
            (Some(va), Some(vb)) => vb.cmp(&va),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
    }
    releases
}

/// Handles the 'v' prefix flexibly (e.g., "v1.0.0" matches "1.0.0").
fn tags_match(t1: &str, t2: &str) -> bool {
    let n1 = t1.strip_prefix('v').unwrap_or(t1);
    let n2 = t2.strip_prefix('v').unwrap_or(t2);
    n1 == n2
}

/// Select the first eligible release for `target`.
///
/// With `pinned` set, only releases whose tag matches it are considered.
#[tracing::instrument(skip(releases), fields(count = releases.len()))]
pub fn locate(
    releases: &[Release],
    target: Target,
    pinned: Option<&str>,
) -> Result<SelectedRelease, InstallError> {
    for release in releases {
        if release.draft {
            debug!("Skipping draft release {}", release.tag);
            continue;
        }
        if let Some(wanted) = pinned
            && !tags_match(&release.tag, wanted)
        {
            continue;
        }

        let expected = archive_name(&release.tag, target);
        let Some(archive) = release.asset(&expected) else {
            debug!("Release {} has no asset {}", release.tag, expected);
            continue;
        };

        let sidecar = checksum_name(&expected);
        let checksum_url = release
            .asset(&sidecar)
            .map(|a| a.download_url.clone())
            .unwrap_or_else(|| checksum_name(&archive.download_url));

        debug!("Selected release {} ({})", release.tag, archive.download_url);
        return Ok(SelectedRelease {
            tag: release.tag.clone(),
            archive: archive.clone(),
            checksum_url,
        });
    }

    Err(InstallError::NotFound {
        target: target.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINUX: Target = Target::X86_64LinuxMusl;

    fn asset(name: &str) -> ReleaseAsset {
        ReleaseAsset {
            name: name.to_string(),
            download_url: format!("https://example.com/download/{}", name),
        }
    }

    fn release(tag: &str, asset_names: &[String]) -> Release {
        Release {
            tag: tag.to_string(),
            assets: asset_names.iter().map(|n| asset(n)).collect(),
            ..Default::default()
        }
    }

    fn release_for(tag: &str, target: Target) -> Release {
        let archive = archive_name(tag, target);
        let sidecar = checksum_name(&archive);
        release(tag, &[archive, sidecar])
    }

    #[test]
    fn test_archive_and_checksum_names() {
        let archive = archive_name("v0.3.1", LINUX);
        assert_eq!(archive, "ferromon-v0.3.1-x86_64-unknown-linux-musl.tar.gz");
        assert_eq!(
            checksum_name(&archive),
            "ferromon-v0.3.1-x86_64-unknown-linux-musl.tar.gz.sha256"
        );
    }

    #[test]
    fn test_locate_single_release() {
        let releases = vec![release_for("v0.3.1", LINUX)];
        let selected = locate(&releases, LINUX, None).unwrap();

        assert_eq!(selected.tag, "v0.3.1");
        assert_eq!(
            selected.archive.name,
            "ferromon-v0.3.1-x86_64-unknown-linux-musl.tar.gz"
        );
        assert_eq!(
            selected.checksum_url,
            "https://example.com/download/ferromon-v0.3.1-x86_64-unknown-linux-musl.tar.gz.sha256"
        );
    }

    #[test]
    fn test_locate_skips_newest_without_matching_asset() {
        let releases = vec![
            release_for("v0.4.0", Target::Aarch64Darwin),
            release_for("v0.3.1", LINUX),
            release_for("v0.3.0", LINUX),
        ];

        let selected = locate(&releases, LINUX, None).unwrap();
        assert_eq!(selected.tag, "v0.3.1");
    }

    #[test]
    fn test_locate_first_match_wins_over_higher_version() {
        // Listing order is authoritative, not version order.
        let releases = vec![release_for("v0.2.0", LINUX), release_for("v0.9.0", LINUX)];

        let selected = locate(&releases, LINUX, None).unwrap();
        assert_eq!(selected.tag, "v0.2.0");
    }

    #[test]
    fn test_locate_empty_listing_is_not_found() {
        match locate(&[], LINUX, None) {
            Err(InstallError::NotFound { target }) => {
                assert_eq!(target, "x86_64-unknown-linux-musl")
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_locate_requires_exact_name() {
        let releases = vec![release(
            "v0.3.1",
            &[
                "ferromon-v0.3.1-x86_64-unknown-linux-gnu.tar.gz".to_string(),
                "ferromon-0.3.1-x86_64-unknown-linux-musl.tar.gz".to_string(),
                "ferromon-v0.3.1-x86_64-unknown-linux-musl.zip".to_string(),
                "ferromon-v0.3.1-x86_64-unknown-linux-musl.tar.gz.sha256".to_string(),
            ],
        )];

        assert!(matches!(
            locate(&releases, LINUX, None),
            Err(InstallError::NotFound { .. })
        ));
    }

    #[test]
    fn test_locate_skips_drafts() {
        let mut draft = release_for("v0.4.0", LINUX);
        draft.draft = true;
        let releases = vec![draft, release_for("v0.3.1", LINUX)];

        assert_eq!(locate(&releases, LINUX, None).unwrap().tag, "v0.3.1");
    }

    #[test]
    fn test_locate_derives_checksum_url_when_sidecar_unlisted() {
        let releases = vec![release("v0.3.1", &[archive_name("v0.3.1", LINUX)])];

        let selected = locate(&releases, LINUX, None).unwrap();
        assert_eq!(
            selected.checksum_url,
            format!("{}.sha256", selected.archive.download_url)
        );
        assert_eq!(
            selected.checksum_name(),
            "ferromon-v0.3.1-x86_64-unknown-linux-musl.tar.gz.sha256"
        );
    }

    #[test]
    fn test_locate_pinned_tag() {
        let releases = vec![
            release_for("v0.4.0", LINUX),
            release_for("v0.3.1", LINUX),
        ];

        assert_eq!(
            locate(&releases, LINUX, Some("0.3.1")).unwrap().tag,
            "v0.3.1"
        );
        assert!(matches!(
            locate(&releases, LINUX, Some("v9.9.9")),
            Err(InstallError::NotFound { .. })
        ));
    }

    #[test]
    fn test_locate_pinned_tag_without_target_asset() {
        let releases = vec![
            release_for("v0.4.0", Target::X86_64Darwin),
            release_for("v0.3.1", LINUX),
        ];

        assert!(matches!(
            locate(&releases, LINUX, Some("v0.4.0")),
            Err(InstallError::NotFound { .. })
        ));
    }

    #[test]
    fn test_order_listing_keeps_order() {
        let releases = vec![release_for("v0.2.0", LINUX), release_for("v0.9.0", LINUX)];
        let ordered = order_releases(releases, ReleaseOrder::Listing);
        let tags: Vec<&str> = ordered.iter().map(|r| r.tag.as_str()).collect();
        assert_eq!(tags, vec!["v0.2.0", "v0.9.0"]);
    }

    #[test]
    fn test_order_semver_sorts_descending() {
        let releases = vec![
            release_for("v0.2.0", LINUX),
            release_for("nightly", LINUX),
            release_for("v0.10.0", LINUX),
            release_for("0.9.1", LINUX),
            release_for("v1.0.0-rc.1", LINUX),
            release_for("latest", LINUX),
        ];

        let ordered = order_releases(releases, ReleaseOrder::Semver);
        let tags: Vec<&str> = ordered.iter().map(|r| r.tag.as_str()).collect();
        assert_eq!(
            tags,
            vec!["v1.0.0-rc.1", "v0.10.0", "0.9.1", "v0.2.0", "nightly", "latest"]
        );

        assert_eq!(locate(&ordered, LINUX, None).unwrap().tag, "v1.0.0-rc.1");
    }
}
