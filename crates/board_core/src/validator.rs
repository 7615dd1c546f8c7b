//! Formation Validator
//!
//! Evaluates a committed arrangement against structural rules. The validator
//! never mutates anything and never fails: every problem is a [`Finding`].
//!
//! | Severity   | Key                                        | Blocks finalize |
//! |------------|--------------------------------------------|-----------------|
//! | error      | `formation.error.capacity_mismatch`        | yes             |
//! | error      | `formation.error.duplicate_slot`           | yes             |
//! | error      | `formation.error.required_slot_empty`      | yes             |
//! | warning    | `formation.warning.too_few_{category}`     | no              |
//! | suggestion | `formation.suggestion.lateral_imbalance`   | no              |
//! | suggestion | `formation.suggestion.role_mismatch`       | no              |
//!
//! Keys are stable; message text is the host's concern.

use serde::{Deserialize, Serialize};

use crate::error::{BoardError, Result};
use crate::formation::{RoleCategory, SlotId};
use crate::spatial::{SpatialModel, TokenId};

pub const KEY_CAPACITY_MISMATCH: &str = "formation.error.capacity_mismatch";
pub const KEY_DUPLICATE_SLOT: &str = "formation.error.duplicate_slot";
pub const KEY_REQUIRED_SLOT_EMPTY: &str = "formation.error.required_slot_empty";
pub const KEY_TOO_FEW_DEFENDERS: &str = "formation.warning.too_few_defenders";
pub const KEY_TOO_FEW_MIDFIELDERS: &str = "formation.warning.too_few_midfielders";
pub const KEY_TOO_FEW_FORWARDS: &str = "formation.warning.too_few_forwards";
pub const KEY_LATERAL_IMBALANCE: &str = "formation.suggestion.lateral_imbalance";
pub const KEY_ROLE_MISMATCH: &str = "formation.suggestion.role_mismatch";

/// Tokens within this distance of the centre line count as neither side.
const LATERAL_DEADZONE: f32 = 0.05;

/// Tunable thresholds for the warning and suggestion checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    pub min_defenders: usize,
    pub min_midfielders: usize,
    pub min_forwards: usize,
    /// Largest tolerated |left − right| outfield count
    pub max_lateral_imbalance: usize,
    pub suggest_role_mismatch: bool,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_defenders: 3,
            min_midfielders: 2,
            min_forwards: 1,
            max_lateral_imbalance: 2,
            suggest_role_mismatch: true,
        }
    }
}

impl ValidationRules {
    pub fn validate(&self) -> Result<()> {
        if self.max_lateral_imbalance == 0 {
            return Err(BoardError::InvalidConfig(
                "validation.max_lateral_imbalance must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn minimum_for(&self, category: RoleCategory) -> Option<(usize, &'static str)> {
        match category {
            RoleCategory::Defender => Some((self.min_defenders, KEY_TOO_FEW_DEFENDERS)),
            RoleCategory::Midfielder => Some((self.min_midfielders, KEY_TOO_FEW_MIDFIELDERS)),
            RoleCategory::Forward => Some((self.min_forwards, KEY_TOO_FEW_FORWARDS)),
            RoleCategory::Goalkeeper => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Suggestion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    /// Localization key
    pub key: String,
    pub slots: Vec<SlotId>,
    pub tokens: Vec<TokenId>,
}

impl Finding {
    fn new(severity: Severity, key: &str, slots: Vec<SlotId>, tokens: Vec<TokenId>) -> Self {
        Self { severity, key: key.to_string(), slots, tokens }
    }
}

/// Ordered findings: errors, then warnings, then suggestions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn error_count(&self) -> usize {
        self.of(Severity::Error).count()
    }

    pub fn of(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.findings.iter().any(|f| f.key == key)
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormationValidator {
    rules: ValidationRules,
}

impl FormationValidator {
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    pub fn validate(&self, model: &SpatialModel) -> ValidationReport {
        let mut findings = Vec::new();
        self.check_capacity(model, &mut findings);
        self.check_slot_claims(model, &mut findings);
        self.check_required_slots(model, &mut findings);
        self.check_role_counts(model, &mut findings);
        self.check_lateral_balance(model, &mut findings);
        if self.rules.suggest_role_mismatch {
            self.check_role_mismatch(model, &mut findings);
        }

        // Stable: emission order survives within a severity
        findings.sort_by_key(|f| f.severity);
        log::debug!(
            "validated '{}': {} finding(s)",
            model.formation().name(),
            findings.len()
        );
        ValidationReport { findings }
    }

    // ========================
    // Errors
    // ========================

    fn check_capacity(&self, model: &SpatialModel, out: &mut Vec<Finding>) {
        let capacity = model.formation().capacity();
        if model.len() == capacity {
            return;
        }
        let (slots, tokens) = if model.mode().uses_slots() {
            let empty = model
                .formation()
                .slots()
                .iter()
                .filter(|s| model.occupant(&s.id).is_none())
                .map(|s| s.id.clone())
                .collect();
            let unassigned =
                model.tokens().iter().filter(|t| t.slot.is_none()).map(|t| t.id.clone()).collect();
            (empty, unassigned)
        } else {
            (Vec::new(), Vec::new())
        };
        out.push(Finding::new(Severity::Error, KEY_CAPACITY_MISMATCH, slots, tokens));
    }

    fn check_slot_claims(&self, model: &SpatialModel, out: &mut Vec<Finding>) {
        for slot in model.formation().slots() {
            let holders: Vec<TokenId> = model
                .tokens()
                .iter()
                .filter(|t| t.slot.as_ref() == Some(&slot.id))
                .map(|t| t.id.clone())
                .collect();
            if holders.len() > 1 {
                out.push(Finding::new(
                    Severity::Error,
                    KEY_DUPLICATE_SLOT,
                    vec![slot.id.clone()],
                    holders,
                ));
            }
        }
    }

    fn check_required_slots(&self, model: &SpatialModel, out: &mut Vec<Finding>) {
        for slot in model.formation().slots().iter().filter(|s| s.required) {
            // Freeform has no anchors: any token of the slot's category covers it
            let covered = if model.mode().uses_slots() {
                model.occupant(&slot.id).is_some()
            } else {
                model.tokens().iter().any(|t| t.role.category() == slot.role.category())
            };
            if !covered {
                out.push(Finding::new(
                    Severity::Error,
                    KEY_REQUIRED_SLOT_EMPTY,
                    vec![slot.id.clone()],
                    Vec::new(),
                ));
            }
        }
    }

    // ========================
    // Warnings
    // ========================

    fn check_role_counts(&self, model: &SpatialModel, out: &mut Vec<Finding>) {
        for category in [RoleCategory::Defender, RoleCategory::Midfielder, RoleCategory::Forward] {
            let Some((minimum, key)) = self.rules.minimum_for(category) else {
                continue;
            };
            let members: Vec<TokenId> = model
                .tokens()
                .iter()
                .filter(|t| t.role.category() == category)
                .map(|t| t.id.clone())
                .collect();
            if members.len() < minimum {
                out.push(Finding::new(Severity::Warning, key, Vec::new(), members));
            }
        }
    }

    // ========================
    // Suggestions
    // ========================

    fn check_lateral_balance(&self, model: &SpatialModel, out: &mut Vec<Finding>) {
        let outfield =
            model.tokens().iter().filter(|t| t.role.category() != RoleCategory::Goalkeeper);
        let mut left = Vec::new();
        let mut right = Vec::new();
        for token in outfield {
            if token.position.x < 0.5 - LATERAL_DEADZONE {
                left.push(token.id.clone());
            } else if token.position.x > 0.5 + LATERAL_DEADZONE {
                right.push(token.id.clone());
            }
        }
        if left.len().abs_diff(right.len()) > self.rules.max_lateral_imbalance {
            let heavy = if left.len() > right.len() { left } else { right };
            out.push(Finding::new(Severity::Suggestion, KEY_LATERAL_IMBALANCE, Vec::new(), heavy));
        }
    }

    fn check_role_mismatch(&self, model: &SpatialModel, out: &mut Vec<Finding>) {
        for token in model.tokens() {
            let Some(slot) = token.slot.as_ref().and_then(|id| model.formation().slot(id)) else {
                continue;
            };
            if !token.role.is_compatible_with(slot.role) {
                out.push(Finding::new(
                    Severity::Suggestion,
                    KEY_ROLE_MISMATCH,
                    vec![slot.id.clone()],
                    vec![token.id.clone()],
                ));
            }
        }
    }
}
