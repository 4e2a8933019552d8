//! Property-Based Tests for Layout Classification
//!
//! # Test Properties
//!
//! 1. **Staleness**: once the new layout exists nothing needs migration
//! 2. **Legacy Names**: any `hregion_<i32>` is a movable old region
//! 3. **Log Files**: `log_*` is always a log-file anomaly, whatever else holds
//! 4. **Reference Tokens**: only `<digits>.<name>` yields a token

#![cfg(test)]

use proptest::prelude::*;

use super::policy::{Action, AnomalyClass};
use super::scanner::classify_entry;
use crate::domain::layout::{self, Classification};

// =============================================================================
// Property Strategies
// =============================================================================

/// Arbitrary top-level entry names.
fn name_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_.\\-]{1,24}"
}

/// Names that do not carry either reserved prefix.
fn plain_name_strategy() -> impl Strategy<Value = String> {
    name_strategy().prop_filter("reserved prefix", |n| {
        !n.starts_with(layout::OLD_REGION_PREFIX) && !n.starts_with(layout::LOG_FILE_PREFIX)
    })
}

// =============================================================================
// Classification Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_nothing_migrates_once_new_layout_exists(name in name_strategy()) {
        let c = classify_entry(&name, true);
        prop_assert!(!c.needs_migration);
    }

    #[test]
    fn prop_legacy_names_are_movable(encoded in any::<i32>()) {
        let name = layout::old_region_dir_name(&encoded.to_string());
        let c = classify_entry(&name, false);

        prop_assert_eq!(c.classification, Classification::OldRegionDir(encoded.to_string()));
        prop_assert!(c.anomaly.is_none());
        prop_assert!(c.needs_migration);
    }

    #[test]
    fn prop_old_prefix_always_needs_migration_without_new_layout(suffix in "[a-zA-Z0-9_]{0,16}") {
        let name = format!("{}{}", layout::OLD_REGION_PREFIX, suffix);
        let c = classify_entry(&name, false);

        prop_assert!(c.needs_migration);
        // Unparseable names are flagged, parseable ones are not
        prop_assert_eq!(
            c.anomaly.is_some(),
            layout::parse_legacy_encoded_name(&suffix).is_none()
        );
    }

    #[test]
    fn prop_log_files_use_log_action(suffix in "[a-zA-Z0-9_.]{0,16}", present in any::<bool>()) {
        let name = format!("{}{}", layout::LOG_FILE_PREFIX, suffix);
        let c = classify_entry(&name, present);

        prop_assert_eq!(c.classification, Classification::LogFile);
        let anomaly = c.anomaly.expect("log files are anomalies");
        prop_assert_eq!(anomaly.class, AnomalyClass::LogFile);
    }

    #[test]
    fn prop_plain_names_flagged_only_before_migration(name in plain_name_strategy()) {
        let before = classify_entry(&name, false);
        let after = classify_entry(&name, true);

        prop_assert_eq!(before.anomaly.map(|a| a.class), Some(AnomalyClass::Other));
        prop_assert_eq!(after.classification, Classification::Normal);
        prop_assert!(after.anomaly.is_none());
    }
}

// =============================================================================
// Reference Token Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_reference_token_extracted(file_id in any::<u64>(), encoded in "[a-zA-Z0-9]{1,12}") {
        let file_name = format!("{}.{}", file_id, encoded);
        prop_assert_eq!(layout::reference_token(&file_name), Some(encoded.as_str()));
    }

    #[test]
    fn prop_plain_store_file_has_no_token(file_id in any::<u64>()) {
        let file_name = file_id.to_string();
        prop_assert_eq!(layout::reference_token(&file_name), None);
    }

    #[test]
    fn prop_non_numeric_file_id_has_no_token(file_id in "[a-z]{1,8}", encoded in "[0-9]{1,8}") {
        let file_name = format!("{}.{}", file_id, encoded);
        prop_assert_eq!(layout::reference_token(&file_name), None);
    }
}

// =============================================================================
// Action Parsing Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_unknown_action_rejected(s in "[a-z]{1,10}") {
        prop_assume!(!["abort", "ignore", "delete", "prompt"].contains(&s.as_str()));
        prop_assert!(s.parse::<Action>().is_err());
    }
}
