//! Property-based tests for pipeline parsing and run modes
//!
//! These tests use proptest to verify invariants across many random inputs.

use domain::{ArtifactKind, DeployerKind, DomainError, PipelineConfig, RunMode};
use proptest::prelude::*;

/// Minimal TOML body for a builder table
fn builder_table(kind: ArtifactKind) -> String {
    let body = match kind {
        ArtifactKind::Bazel => "target = \"//app:image.tar\"\n",
        ArtifactKind::Buildpacks => "builder = \"paketobuildpacks/builder:base\"\n",
        _ => "",
    };
    format!("[build.artifacts.{}]\n{body}", kind.label())
}

/// Minimal TOML body for a deployer table
fn deployer_table(kind: DeployerKind) -> String {
    let body = match kind {
        DeployerKind::Kpt => "dir = \"pkg\"\n",
        _ => "",
    };
    format!("[deploy.{}]\n{body}", kind.label())
}

// ============================================================================
// Builder classification
// ============================================================================

mod builder_tests {
    use super::*;

    proptest! {
        #[test]
        fn artifact_parses_only_with_exactly_one_builder(
            mask in proptest::collection::vec(any::<bool>(), ArtifactKind::ALL.len())
        ) {
            let chosen: Vec<ArtifactKind> = ArtifactKind::ALL
                .into_iter()
                .zip(mask)
                .filter_map(|(kind, on)| on.then_some(kind))
                .collect();

            let mut source = String::from("[[build.artifacts]]\nimage = \"app\"\n");
            for kind in &chosen {
                source.push_str(&builder_table(*kind));
            }

            let result = PipelineConfig::from_toml(&source);
            if chosen.len() == 1 {
                let pipeline = result.unwrap();
                prop_assert_eq!(pipeline.artifacts()[0].kind(), chosen[0]);
            } else {
                prop_assert!(matches!(result, Err(DomainError::InvalidPipeline(_))));
            }
        }

        #[test]
        fn artifact_order_is_preserved(
            kinds in proptest::collection::vec(prop::sample::select(ArtifactKind::ALL.to_vec()), 0..12)
        ) {
            let mut source = String::new();
            for (i, kind) in kinds.iter().enumerate() {
                source.push_str(&format!("[[build.artifacts]]\nimage = \"img-{i}\"\n"));
                source.push_str(&builder_table(*kind));
            }

            let pipeline = PipelineConfig::from_toml(&source).unwrap();
            let parsed: Vec<ArtifactKind> = pipeline.artifacts().iter().map(|a| a.kind()).collect();
            prop_assert_eq!(parsed, kinds);
        }
    }
}

// ============================================================================
// Deployer classification
// ============================================================================

mod deployer_tests {
    use super::*;

    proptest! {
        #[test]
        fn deploy_parses_only_with_exactly_one_deployer(
            mask in proptest::collection::vec(any::<bool>(), DeployerKind::ALL.len())
        ) {
            let chosen: Vec<DeployerKind> = DeployerKind::ALL
                .into_iter()
                .zip(mask)
                .filter_map(|(kind, on)| on.then_some(kind))
                .collect();

            let mut source = String::from("[deploy]\n");
            for kind in &chosen {
                source.push_str(&deployer_table(*kind));
            }

            let result = PipelineConfig::from_toml(&source);
            if chosen.len() == 1 {
                prop_assert_eq!(result.unwrap().deployer_kind(), Some(chosen[0]));
            } else {
                prop_assert!(result.is_err());
            }
        }
    }
}

// ============================================================================
// RunMode Property Tests
// ============================================================================

mod run_mode_tests {
    use super::*;

    proptest! {
        #[test]
        fn parse_ignores_case(
            mode in prop::sample::select(RunMode::ALL.to_vec()),
            upper in proptest::collection::vec(any::<bool>(), 6)
        ) {
            let mixed: String = mode
                .as_str()
                .chars()
                .zip(upper.into_iter().cycle())
                .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c })
                .collect();

            prop_assert_eq!(mixed.parse::<RunMode>().unwrap(), mode);
        }

        #[test]
        fn unknown_names_are_rejected(name in "[a-z]{7,12}") {
            prop_assert!(name.parse::<RunMode>().is_err());
        }
    }
}
