//! Board CLI Library
//!
//! File loaders and the script replayer behind the `board_cli` binary:
//! formations (preset name or YAML/JSON file), rosters, arrangements,
//! board configs and recorded input scripts.

use anyhow::{bail, Context, Result};
use board_core::{
    Board, BoardConfig, Finding, Formation, FormationPreset, FormationValidator, InputEvent,
    MutationEvent, Position, PositioningMode, Role, SlotId, SpatialModel, TokenId, TokenSpec,
    ValidationReport, ValidationRules,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// File formats
// ============================================================================

/// Saved board state: tokens exactly where they were left.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arrangement {
    #[serde(default)]
    pub mode: PositioningMode,
    pub tokens: Vec<ArrangedToken>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrangedToken {
    pub id: TokenId,
    pub role: Role,
    pub position: Position,
    #[serde(default)]
    pub slot: Option<SlotId>,
    #[serde(default)]
    pub locked: bool,
}

/// One step of a recorded session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Pointer event `{ "op": "input", "event": { "type": "down", ... } }`
    Input { event: InputEvent },
    EndFrame,
    Undo,
    Redo,
    /// Programmatic move, no gesture involved
    Move { token_id: TokenId, position: Position },
    /// Preset name or formation file
    LoadFormation { formation: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedToken {
    pub id: TokenId,
    pub x: f32,
    pub y: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<SlotId>,
}

/// A step the board refused. Replay keeps going after these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepError {
    pub step: usize,
    pub message: String,
}

/// Replay result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayReport {
    pub formation: String,
    pub positions: Vec<PlacedToken>,
    pub events: Vec<MutationEvent>,
    pub findings: Vec<Finding>,
    pub rejected: Vec<StepError>,
}

// ============================================================================
// Loaders
// ============================================================================

/// Resolve a formation argument: preset id or display name first, then a
/// YAML/JSON file path.
pub fn load_formation(source: &str) -> Result<Formation> {
    if let Ok(preset) = source.parse::<FormationPreset>() {
        return Ok(preset.formation());
    }
    let path = Path::new(source);
    if !path.exists() {
        bail!("'{}' is neither a formation preset nor a file", source);
    }
    let text = read(path)?;
    let formation = if is_yaml(path) {
        Formation::from_yaml_str(&text)
    } else {
        Formation::from_json_str(&text)
    };
    formation.with_context(|| format!("Invalid formation file: {}", path.display()))
}

pub fn load_config(path: &Path) -> Result<BoardConfig> {
    let text = read(path)?;
    let config = if is_yaml(path) {
        BoardConfig::from_yaml_str(&text)
    } else {
        BoardConfig::from_json_str(&text)
    };
    config.with_context(|| format!("Invalid board config: {}", path.display()))
}

pub fn load_roster(path: &Path) -> Result<Vec<TokenSpec>> {
    parse_json(path, "roster")
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>> {
    parse_json(path, "script")
}

pub fn load_arrangement(path: &Path) -> Result<Arrangement> {
    parse_json(path, "arrangement")
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn parse_json<T: for<'de> Deserialize<'de>>(path: &Path, what: &str) -> Result<T> {
    let text = read(path)?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse {} file: {}", what, path.display()))
}

fn is_yaml(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("yaml") | Some("yml"))
}

// ============================================================================
// Commands
// ============================================================================

/// Validate a saved arrangement against a formation without a board.
pub fn validate_arrangement(
    formation: Formation,
    arrangement: &Arrangement,
    rules: ValidationRules,
) -> Result<ValidationReport> {
    let mut model = SpatialModel::new(arrangement.mode, formation);
    for token in &arrangement.tokens {
        let mut spec = TokenSpec::new(token.id.clone(), token.role);
        spec.locked = token.locked;
        model
            .insert_token(&spec, token.position, token.slot.clone())
            .with_context(|| format!("Cannot place token {}", token.id))?;
    }
    Ok(FormationValidator::new(rules).validate(&model))
}

/// Replay `steps` against `board`.
///
/// Refused steps are collected in the report, including formations that
/// cannot be resolved or loaded; only fatal board errors (unknown tokens,
/// broken slot invariants) abort the replay.
pub fn run_script(board: &mut Board, steps: &[ScriptStep]) -> Result<ReplayReport> {
    let mut rejected = Vec::new();
    for (index, step) in steps.iter().enumerate() {
        let result = match step {
            ScriptStep::Input { event } => board.handle_input(event).map(|_| ()),
            ScriptStep::EndFrame => {
                board.end_frame();
                Ok(())
            }
            ScriptStep::Undo => board.undo().map(|_| ()),
            ScriptStep::Redo => board.redo().map(|_| ()),
            ScriptStep::Move { token_id, position } => {
                board.move_token(token_id, *position).map(|_| ())
            }
            ScriptStep::LoadFormation { formation } => match load_formation(formation) {
                Ok(formation) => board.load_formation(formation).map(|_| ()),
                Err(err) => {
                    log::warn!("step {} rejected: {:#}", index, err);
                    rejected.push(StepError { step: index, message: format!("{:#}", err) });
                    continue;
                }
            },
        };
        match result {
            Ok(()) => {}
            Err(err) if err.is_fatal() => {
                return Err(err).with_context(|| format!("Script step {} failed", index));
            }
            Err(err) => {
                log::warn!("step {} rejected: {}", index, err);
                rejected.push(StepError { step: index, message: err.to_string() });
            }
        }
    }
    // A trailing move without end_frame still counts
    board.end_frame();

    let positions = board
        .model()
        .tokens()
        .iter()
        .map(|t| PlacedToken {
            id: t.id.clone(),
            x: t.position.x,
            y: t.position.y,
            slot: t.slot.clone(),
        })
        .collect();
    Ok(ReplayReport {
        formation: board.formation().name().to_string(),
        positions,
        events: board.take_mutation_events(),
        findings: board.get_validation_findings().to_vec(),
        rejected,
    })
}

/// One line per preset: id, display name, defender-midfielder-forward counts.
pub fn preset_listing() -> Vec<String> {
    FormationPreset::all()
        .iter()
        .map(|preset| {
            let (def, mid, fwd) = preset.shape();
            format!("{:<8} {:<22} {}-{}-{}", preset.id(), preset.display_name(), def, mid, fwd)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use board_core::{BoardError, MutationKind};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn roster_442() -> Vec<TokenSpec> {
        FormationPreset::T442
            .formation()
            .slots()
            .iter()
            .map(|s| TokenSpec::new(format!("p-{}", s.id), s.role))
            .collect()
    }

    #[test]
    fn test_load_formation_preset_and_file() {
        assert_eq!(load_formation("4-3-3").unwrap().name(), "4-3-3");
        assert_eq!(load_formation("t442").unwrap().capacity(), 11);

        let yaml = "name: pair\nslots:\n  - { id: GK, role: GK, position: { x: 0.5, y: 0.95 }, priority: 0 }\n  - { id: ST, role: ST, position: { x: 0.5, y: 0.2 }, priority: 1 }\n";
        let file = temp_file(".yaml", yaml);
        let formation = load_formation(file.path().to_str().unwrap()).unwrap();
        assert_eq!(formation.name(), "pair");
        assert_eq!(formation.capacity(), 2);

        assert!(load_formation("not-a-preset-or-file").is_err());
    }

    #[test]
    fn test_load_config_rejects_bad_values() {
        let good = temp_file(".yaml", "mode: freeform\nmin_distance: 0.04\n");
        let config = load_config(good.path()).unwrap();
        assert_eq!(config.mode, PositioningMode::Freeform);
        assert_eq!(config.min_distance, 0.04);
        assert_eq!(config.snap_distance, 0.08);

        let bad = temp_file(".json", r#"{"snap_distance": -1.0}"#);
        let err = load_config(bad.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid board config"));
    }

    #[test]
    fn test_validate_arrangement_reports_missing_keeper() {
        let formation = FormationPreset::T442.formation();
        let tokens = formation
            .slots()
            .iter()
            .filter(|s| s.role != Role::Goalkeeper)
            .map(|s| ArrangedToken {
                id: TokenId::new(format!("p-{}", s.id)),
                role: s.role,
                position: s.position,
                slot: Some(s.id.clone()),
                locked: false,
            })
            .collect();
        let arrangement = Arrangement { mode: PositioningMode::Formation, tokens };
        let report =
            validate_arrangement(formation, &arrangement, ValidationRules::default()).unwrap();
        assert!(report.has_errors());
        assert!(report.contains_key(board_core::validator::KEY_REQUIRED_SLOT_EMPTY));
    }

    #[test]
    fn test_script_step_parsing() {
        let json = r#"[
            {"op": "input", "event": {"type": "down", "token_id": "p-LW", "position": {"x": 0.35, "y": 0.2}}},
            {"op": "input", "event": {"type": "move", "position": {"x": 0.64, "y": 0.21}}},
            {"op": "end_frame"},
            {"op": "input", "event": {"type": "up", "position": {"x": 0.64, "y": 0.21}}},
            {"op": "undo"},
            {"op": "move", "token_id": "p-GK", "position": {"x": 0.5, "y": 0.2}},
            {"op": "load_formation", "formation": "4-3-3"}
        ]"#;
        let file = temp_file(".json", json);
        let steps = load_script(file.path()).unwrap();
        assert_eq!(steps.len(), 7);
        assert_eq!(steps[2], ScriptStep::EndFrame);
        assert!(matches!(steps[5], ScriptStep::Move { .. }));
    }

    #[test]
    fn test_run_script_collects_events_and_rejections() {
        let mut board =
            Board::with_preset(BoardConfig::default(), FormationPreset::T442, roster_442())
                .unwrap();
        let steps = vec![
            ScriptStep::Input { event: InputEvent::down(Some(TokenId::new("p-LW")), 0.35, 0.2) },
            ScriptStep::Input { event: InputEvent::moved(0.64, 0.21) },
            ScriptStep::EndFrame,
            ScriptStep::Input { event: InputEvent::up(0.64, 0.21) },
            ScriptStep::Undo,
            ScriptStep::Redo,
            ScriptStep::Redo,
        ];
        let report = run_script(&mut board, &steps).unwrap();

        let kinds: Vec<MutationKind> = report.events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![MutationKind::Swap, MutationKind::Undo, MutationKind::Redo]);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].step, 6);
        assert_eq!(report.formation, "4-4-2");

        let lw = report.positions.iter().find(|p| p.id == TokenId::new("p-LW")).unwrap();
        assert_eq!((lw.x, lw.y), (0.65, 0.2));
    }

    #[test]
    fn test_run_script_aborts_on_unknown_token() {
        let mut board =
            Board::with_preset(BoardConfig::default(), FormationPreset::T442, roster_442())
                .unwrap();
        let steps = vec![ScriptStep::Move {
            token_id: TokenId::new("ghost"),
            position: Position::new(0.5, 0.5),
        }];
        let err = run_script(&mut board, &steps).unwrap_err();
        assert!(matches!(
            err.root_cause().downcast_ref::<BoardError>(),
            Some(BoardError::TokenNotFound(_))
        ));
    }

    #[test]
    fn test_run_script_keeps_going_past_unknown_formation() {
        let mut board =
            Board::with_preset(BoardConfig::default(), FormationPreset::T442, roster_442())
                .unwrap();
        let steps = vec![
            ScriptStep::LoadFormation { formation: "9-9-9".to_string() },
            ScriptStep::LoadFormation { formation: "4-3-3".to_string() },
        ];
        let report = run_script(&mut board, &steps).unwrap();

        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].step, 0);
        assert!(report.rejected[0].message.contains("9-9-9"));
        assert_eq!(report.formation, "4-3-3");
        let kinds: Vec<MutationKind> = report.events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![MutationKind::FormationChange]);
    }

    #[test]
    fn test_preset_listing_covers_library() {
        let lines = preset_listing();
        assert_eq!(lines.len(), FormationPreset::all().len());
        assert!(lines[0].starts_with("T442"));
    }
}
