//! Token → slot assignment
//!
//! Minimum total cost matching between tokens and formation slots using the
//! Hungarian algorithm. Used for the initial roster placement and when a new
//! formation replaces the current one.
//!
//! Cost per (token, slot) pair:
//! - role: 0 exact, 200 same category, 10 000 other category
//! - goalkeeper ↔ outfield: 1 000 000 (never picked while avoidable)
//! - distance from the token's current position, in thousandths of a unit
//!
//! Surplus tokens stay unassigned; surplus slots stay empty.

use pathfinding::kuhn_munkres::kuhn_munkres_min;
use pathfinding::matrix::Matrix;
use serde::{Deserialize, Serialize};

use super::role::Role;
use super::slot::{Formation, Slot, SlotId};
use crate::spatial::{distance, Position, Token, TokenId, TokenSpec};

const COST_SAME_CATEGORY: i64 = 200;
const COST_CATEGORY_MISMATCH: i64 = 10_000;
const COST_GOALKEEPER_MISMATCH: i64 = 1_000_000;
const DISTANCE_SCALE: f32 = 1000.0;

/// What the matcher needs to know about one token.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignee {
    pub id: TokenId,
    pub role: Role,
    pub position: Option<Position>,
}

impl From<&Token> for Assignee {
    fn from(token: &Token) -> Self {
        Self { id: token.id.clone(), role: token.role, position: Some(token.position) }
    }
}

impl From<&TokenSpec> for Assignee {
    fn from(spec: &TokenSpec) -> Self {
        Self { id: spec.id.clone(), role: spec.role, position: spec.position }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotAssignment {
    /// (token, slot) pairs in input token order
    pub pairs: Vec<(TokenId, SlotId)>,
    pub unassigned: Vec<TokenId>,
    /// Slots left without a token, in formation order
    pub empty_slots: Vec<SlotId>,
    pub total_cost: i64,
}

impl SlotAssignment {
    pub fn slot_for(&self, token: &TokenId) -> Option<&SlotId> {
        self.pairs.iter().find(|(t, _)| t == token).map(|(_, s)| s)
    }

    pub fn is_complete(&self) -> bool {
        self.unassigned.is_empty() && self.empty_slots.is_empty()
    }
}

fn assignment_cost(assignee: &Assignee, slot: &Slot) -> i64 {
    let is_gk = assignee.role == Role::Goalkeeper;
    let role_cost = if is_gk != (slot.role == Role::Goalkeeper) {
        COST_GOALKEEPER_MISMATCH
    } else if assignee.role == slot.role {
        0
    } else if assignee.role.is_compatible_with(slot.role) {
        COST_SAME_CATEGORY
    } else {
        COST_CATEGORY_MISMATCH
    };
    let distance_cost = assignee
        .position
        .map(|p| (distance(p, slot.position) * DISTANCE_SCALE).round() as i64)
        .unwrap_or(0);
    role_cost + distance_cost
}

/// Match `tokens` to the slots of `formation` with minimum total cost.
pub fn assign_tokens(tokens: &[Assignee], formation: &Formation) -> SlotAssignment {
    let slots = formation.slots();
    if tokens.is_empty() || slots.is_empty() {
        return SlotAssignment {
            pairs: Vec::new(),
            unassigned: tokens.iter().map(|t| t.id.clone()).collect(),
            empty_slots: slots.iter().map(|s| s.id.clone()).collect(),
            total_cost: 0,
        };
    }

    // kuhn_munkres needs rows <= columns
    let mut slot_for_token: Vec<Option<usize>> = vec![None; tokens.len()];
    let total_cost = if tokens.len() <= slots.len() {
        let costs = Matrix::from_fn(tokens.len(), slots.len(), |(t, s)| {
            assignment_cost(&tokens[t], &slots[s])
        });
        let (total, assignments) = kuhn_munkres_min(&costs);
        for (t, &s) in assignments.iter().enumerate() {
            slot_for_token[t] = Some(s);
        }
        total
    } else {
        let costs = Matrix::from_fn(slots.len(), tokens.len(), |(s, t)| {
            assignment_cost(&tokens[t], &slots[s])
        });
        let (total, assignments) = kuhn_munkres_min(&costs);
        for (s, &t) in assignments.iter().enumerate() {
            slot_for_token[t] = Some(s);
        }
        total
    };

    let mut used = vec![false; slots.len()];
    let mut pairs = Vec::with_capacity(tokens.len().min(slots.len()));
    let mut unassigned = Vec::new();
    for (token, slot_idx) in tokens.iter().zip(&slot_for_token) {
        match slot_idx {
            Some(s) => {
                used[*s] = true;
                pairs.push((token.id.clone(), slots[*s].id.clone()));
            }
            None => unassigned.push(token.id.clone()),
        }
    }
    let empty_slots = slots
        .iter()
        .zip(&used)
        .filter(|(_, used)| !**used)
        .map(|(slot, _)| slot.id.clone())
        .collect();

    SlotAssignment { pairs, unassigned, empty_slots, total_cost }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formation::FormationPreset;

    fn roster_442() -> Vec<Assignee> {
        // Deliberately shuffled
        [
            ("st1", Role::ForwardRight),
            ("cb1", Role::DefenderCenterLeft),
            ("gk", Role::Goalkeeper),
            ("lb", Role::DefenderLeft),
            ("cm1", Role::MidfielderCenterLeft),
            ("rm", Role::MidfielderRight),
            ("cb2", Role::DefenderCenterRight),
            ("rb", Role::DefenderRight),
            ("lm", Role::MidfielderLeft),
            ("cm2", Role::MidfielderCenterRight),
            ("st2", Role::ForwardLeft),
        ]
        .into_iter()
        .map(|(id, role)| Assignee { id: TokenId::new(id), role, position: None })
        .collect()
    }

    #[test]
    fn test_exact_roles_land_on_their_slots() {
        let formation = FormationPreset::T442.formation();
        let result = assign_tokens(&roster_442(), &formation);
        assert!(result.is_complete());
        assert_eq!(result.total_cost, 0);
        assert_eq!(result.slot_for(&TokenId::new("gk")), Some(&SlotId::new("GK")));
        assert_eq!(result.slot_for(&TokenId::new("lb")), Some(&SlotId::new("LB")));
        assert_eq!(result.slot_for(&TokenId::new("st2")), Some(&SlotId::new("LW")));
        // Pairs follow input order
        assert_eq!(result.pairs[0].0, TokenId::new("st1"));
    }

    #[test]
    fn test_goalkeeper_never_displaced_by_outfield() {
        let formation = FormationPreset::T433.formation();
        let mut roster = roster_442();
        // Drop the real keeper: someone must cover GK, but the keeper slot
        // still goes to exactly one token
        roster.retain(|a| a.id.as_str() != "gk");
        let result = assign_tokens(&roster, &formation);
        assert_eq!(result.pairs.len(), 10);
        assert_eq!(result.empty_slots.len(), 1);
        assert_eq!(result.empty_slots[0], SlotId::new("GK"));
    }

    #[test]
    fn test_surplus_tokens_stay_unassigned() {
        let formation = Formation::new(
            "mini",
            vec![
                Slot::new("GK", Role::Goalkeeper, 0.5, 0.95, 0),
                Slot::new("CB", Role::DefenderCenter, 0.5, 0.8, 1),
            ],
        )
        .unwrap();
        let tokens = vec![
            Assignee { id: TokenId::new("a"), role: Role::Striker, position: None },
            Assignee { id: TokenId::new("b"), role: Role::DefenderCenter, position: None },
            Assignee { id: TokenId::new("c"), role: Role::Goalkeeper, position: None },
        ];
        let result = assign_tokens(&tokens, &formation);
        assert_eq!(result.unassigned, vec![TokenId::new("a")]);
        assert_eq!(result.slot_for(&TokenId::new("c")), Some(&SlotId::new("GK")));
        assert!(result.empty_slots.is_empty());
    }

    #[test]
    fn test_distance_breaks_role_ties() {
        let formation = Formation::new(
            "pair",
            vec![
                Slot::new("L", Role::MidfielderCenter, 0.3, 0.5, 0),
                Slot::new("R", Role::MidfielderCenter, 0.7, 0.5, 1),
            ],
        )
        .unwrap();
        let tokens = vec![
            Assignee {
                id: TokenId::new("right-ish"),
                role: Role::MidfielderCenter,
                position: Some(Position::new(0.72, 0.5)),
            },
            Assignee {
                id: TokenId::new("left-ish"),
                role: Role::MidfielderCenter,
                position: Some(Position::new(0.25, 0.5)),
            },
        ];
        let result = assign_tokens(&tokens, &formation);
        assert_eq!(result.slot_for(&TokenId::new("right-ish")), Some(&SlotId::new("R")));
        assert_eq!(result.slot_for(&TokenId::new("left-ish")), Some(&SlotId::new("L")));
    }

    #[test]
    fn test_empty_inputs() {
        let formation = FormationPreset::T442.formation();
        let result = assign_tokens(&[], &formation);
        assert_eq!(result.empty_slots.len(), 11);
        assert!(result.pairs.is_empty());
    }
}
