//! Level catalogue
//!
//! Each sector is an immutable `LevelBlueprint` (spawn, flags, interactables,
//! script) plus a tile map. The simulation deep-copies per-playthrough state
//! from the blueprint on every (re)load.

mod maps;
mod scripts;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::audio::MusicTrack;
use crate::error::LevelError;
use crate::sim::grid::TileGrid;
use crate::sim::interaction::{NpcBlueprint, NpcKind, PuzzleBlueprint};
use crate::sim::message::HintRule;
use crate::sim::timeline::Script;
use crate::consts::{BOSS_PROJECTILE_CAP, PROJECTILE_CAP};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LevelId {
    #[serde(rename = "level_1")]
    Sector1,
    #[serde(rename = "level_2")]
    Sector2,
    #[serde(rename = "level_3")]
    Sector3,
    #[serde(rename = "level_4")]
    Sector4,
}

impl LevelId {
    pub const ALL: [LevelId; 4] = [
        LevelId::Sector1,
        LevelId::Sector2,
        LevelId::Sector3,
        LevelId::Sector4,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LevelId::Sector1 => "level_1",
            LevelId::Sector2 => "level_2",
            LevelId::Sector3 => "level_3",
            LevelId::Sector4 => "level_4",
        }
    }

    /// Sector after this one, if any
    pub fn next(&self) -> Option<LevelId> {
        match self {
            LevelId::Sector1 => Some(LevelId::Sector2),
            LevelId::Sector2 => Some(LevelId::Sector3),
            LevelId::Sector3 => Some(LevelId::Sector4),
            LevelId::Sector4 => None,
        }
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LevelId {
    type Err = LevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LevelId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| LevelError::UnknownLevel(s.to_string()))
    }
}

/// When probe mode may be entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeGate {
    Always,
    /// Only once the level script has started
    AfterScriptStart,
}

/// Objectives card shown on level load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objectives {
    pub title: String,
    pub objectives: Vec<String>,
    pub concept: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelBlueprint {
    pub id: LevelId,
    pub spawn: Vec2,
    /// Clamp the camera to the map bounds
    pub bounded: bool,
    /// Probe returns on its own after a fixed time
    pub auto_return: bool,
    pub probe_gate: ProbeGate,
    /// Exit door placed from the start
    pub door: Option<Vec2>,
    pub boss: Option<Vec2>,
    pub projectile_cap: usize,
    pub music: MusicTrack,
    pub npcs: Vec<NpcBlueprint>,
    pub puzzle: Option<PuzzleBlueprint>,
    pub filter: Option<Vec2>,
    pub script: Option<Script>,
    pub hints: Vec<HintRule>,
    pub objectives: Objectives,
    /// Banner drawn over the level
    pub banner: Option<String>,
    /// Show the tutorial prompts
    pub tutorial: bool,
}

fn npc(x: f32, y: f32, name: &str, kind: NpcKind, lines: [&str; 3]) -> NpcBlueprint {
    NpcBlueprint {
        pos: Vec2::new(x, y),
        name: name.to_string(),
        kind,
        lines: lines.iter().map(|l| l.to_string()).collect(),
    }
}

fn puzzle(x: f32, y: f32, answer: &str, question: &str) -> PuzzleBlueprint {
    PuzzleBlueprint {
        pos: Vec2::new(x, y),
        answer: answer.to_string(),
        question: question.to_string(),
    }
}

fn objectives(title: &str, objectives: &[&str], concept: &[&str]) -> Objectives {
    Objectives {
        title: title.to_string(),
        objectives: objectives.iter().map(|s| s.to_string()).collect(),
        concept: concept.iter().map(|s| s.to_string()).collect(),
    }
}

impl LevelBlueprint {
    /// Built-in definition of a sector
    pub fn builtin(id: LevelId) -> Self {
        match id {
            LevelId::Sector1 => Self {
                id,
                spawn: Vec2::new(180.0, 50.0),
                bounded: true,
                auto_return: true,
                probe_gate: ProbeGate::AfterScriptStart,
                door: Some(Vec2::new(728.0, 57.0)),
                boss: None,
                projectile_cap: PROJECTILE_CAP,
                music: MusicTrack::Main,
                npcs: vec![
                    npc(250.0, 165.0, "Firewall Alpha", NpcKind::Firewall, [
                        "Bienvenido, Guardian de Red.",
                        "Los FIREWALLS bloquean trafico no autorizado.",
                        "Recolecta recursos para explorar zonas peligrosas.",
                    ]),
                    npc(420.0, 165.0, "Servidor Aliado", NpcKind::Server, [
                        "Los ataques DDoS saturan servidores con trafico.",
                        "Necesitas recursos para usar tu sonda remota.",
                        "El puerto seguro esta al final del sector.",
                    ]),
                ],
                puzzle: Some(puzzle(
                    650.0,
                    80.0,
                    "FIREWALL",
                    "Barrera que filtra trafico de red? (F_R_W_LL)",
                )),
                filter: Some(Vec2::new(500.0, 165.0)),
                script: Some(scripts::sector1()),
                hints: scripts::sector1_hints(),
                objectives: objectives(
                    "SECTOR 1: ZONA DE ENTRENAMIENTO",
                    &[
                        "1. Aprende los controles basicos",
                        "2. Recolecta 1 firewall (recurso)",
                        "3. Habla con los NPCs (tecla E)",
                        "4. Usa tu sonda remota (flecha abajo)",
                        "5. Alcanza el puerto seguro",
                    ],
                    &[
                        "CONCEPTO: Los firewalls son barreras de seguridad",
                        "que protegen redes de accesos no autorizados.",
                    ],
                ),
                banner: None,
                tutorial: true,
            },
            LevelId::Sector2 => Self {
                id,
                spawn: Vec2::new(350.0, 80.0),
                bounded: true,
                auto_return: false,
                probe_gate: ProbeGate::Always,
                door: None,
                boss: None,
                projectile_cap: PROJECTILE_CAP,
                music: MusicTrack::Main,
                npcs: vec![
                    npc(450.0, 168.0, "Firewall Beta", NpcKind::Firewall, [
                        "Este sector sufre ataques de paquetes maliciosos.",
                        "Los atacantes envian datos daninos a la red.",
                        "Usa tu agilidad para esquivar las amenazas.",
                    ]),
                    npc(600.0, 168.0, "Nodo de Inteligencia", NpcKind::Server, [
                        "El protocolo HTTPS protege las comunicaciones.",
                        "Encripta datos entre cliente y servidor.",
                        "Resuelve el terminal para avanzar de forma segura.",
                    ]),
                ],
                puzzle: Some(puzzle(
                    700.0,
                    120.0,
                    "HTTPS",
                    "Protocolo web seguro con encriptacion? (HTTP_)",
                )),
                filter: Some(Vec2::new(550.0, 100.0)),
                script: Some(scripts::sector2()),
                hints: Vec::new(),
                objectives: objectives(
                    "SECTOR 2: TRAFICO MALICIOSO",
                    &[
                        "1. Esquiva los paquetes maliciosos",
                        "2. Encuentra y habla con los NPCs",
                        "3. Resuelve el desafio de protocolo",
                        "4. Sobrevive a las oleadas de ataques",
                        "5. Accede al puerto seguro",
                    ],
                    &[
                        "CONCEPTO: HTTPS es el protocolo seguro de internet.",
                        "Encripta la comunicacion entre navegador y servidor.",
                    ],
                ),
                banner: None,
                tutorial: false,
            },
            LevelId::Sector3 => Self {
                id,
                spawn: Vec2::new(350.0, 362.0),
                bounded: true,
                auto_return: false,
                probe_gate: ProbeGate::Always,
                door: None,
                boss: Some(Vec2::new(386.0, 220.0)),
                projectile_cap: BOSS_PROJECTILE_CAP,
                music: MusicTrack::Boss,
                npcs: vec![
                    npc(400.0, 380.0, "Firewall Gamma", NpcKind::Firewall, [
                        "Amenaza Persistente Avanzada (APT) detectada.",
                        "Los APT son ataques sofisticados y prolongados.",
                        "La ENCRIPTACION protege datos sensibles.",
                    ]),
                    npc(550.0, 380.0, "Centro de Operaciones", NpcKind::Server, [
                        "La encriptacion transforma datos en codigo.",
                        "Solo quien tiene la clave puede leerlos.",
                        "Es fundamental para la privacidad digital.",
                    ]),
                ],
                puzzle: Some(puzzle(
                    650.0,
                    380.0,
                    "ENCRYPTION",
                    "Protege datos convirtiendolos en codigo? (_NCR_PT__N)",
                )),
                filter: None,
                script: Some(scripts::sector3()),
                hints: Vec::new(),
                objectives: objectives(
                    "SECTOR 3: AMENAZA PERSISTENTE",
                    &[
                        "1. Enfrenta al servidor comprometido",
                        "2. Aprende sobre encriptacion",
                        "3. Usa tus recursos estrategicamente",
                        "4. Neutraliza la amenaza avanzada",
                        "5. Restaura la seguridad del sector",
                    ],
                    &[
                        "CONCEPTO: La encriptacion protege datos",
                        "transformandolos en codigo ilegible sin la clave.",
                    ],
                ),
                banner: None,
                tutorial: false,
            },
            LevelId::Sector4 => Self {
                id,
                spawn: Vec2::new(350.0, 202.0),
                bounded: false,
                auto_return: true,
                probe_gate: ProbeGate::Always,
                door: None,
                boss: None,
                projectile_cap: PROJECTILE_CAP,
                music: MusicTrack::Main,
                npcs: vec![npc(400.0, 215.0, "Firewall Omega", NpcKind::Firewall, [
                    "Has llegado al nucleo del sistema.",
                    "La seguridad en capas usa multiples defensas.",
                    "Felicidades, Guardian. Red restaurada!",
                ])],
                puzzle: Some(puzzle(
                    500.0,
                    215.0,
                    "GUARDIAN",
                    "Defensor de la seguridad digital? (GU_RD__N)",
                )),
                filter: None,
                script: None,
                hints: Vec::new(),
                objectives: objectives(
                    "SECTOR 4: NUCLEO DEL SISTEMA",
                    &[
                        "1. Alcanza el nucleo central",
                        "2. Completa el desafio final",
                        "3. Restaura la seguridad global",
                        "4. Conviertete en el Guardian definitivo",
                    ],
                    &[
                        "CONCEPTO: La seguridad en capas combina",
                        "multiples defensas para proteccion robusta.",
                    ],
                ),
                banner: Some("System Secured!".to_string()),
                tutorial: false,
            },
        }
    }
}

/// All sectors, with optional on-disk map overrides
#[derive(Debug, Clone)]
pub struct LevelCatalog {
    blueprints: BTreeMap<LevelId, Arc<LevelBlueprint>>,
    /// Directory searched for `<level_id>.json` maps
    asset_dir: Option<PathBuf>,
}

impl Default for LevelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LevelCatalog {
    pub fn builtin() -> Self {
        let blueprints = LevelId::ALL
            .into_iter()
            .map(|id| (id, Arc::new(LevelBlueprint::builtin(id))))
            .collect();
        Self {
            blueprints,
            asset_dir: None,
        }
    }

    /// Prefer maps found in `dir` over the built-in ones
    pub fn with_asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.asset_dir = Some(dir.into());
        self
    }

    pub fn blueprint(&self, id: LevelId) -> Result<Arc<LevelBlueprint>, LevelError> {
        self.blueprints
            .get(&id)
            .cloned()
            .ok_or_else(|| LevelError::UnknownLevel(id.to_string()))
    }

    /// Blueprint and a fresh tile map for `id`
    pub fn load(&self, id: LevelId) -> Result<(Arc<LevelBlueprint>, TileGrid), LevelError> {
        let blueprint = self.blueprint(id)?;
        let grid = match self.map_override(id) {
            Some(path) => Self::read_map(&path)?,
            None => maps::builtin(id),
        };
        log::debug!("Loaded {id} ({} solid tiles)", grid.solid_count());
        Ok((blueprint, grid))
    }

    fn map_override(&self, id: LevelId) -> Option<PathBuf> {
        let path = self.asset_dir.as_ref()?.join(format!("{}.json", id.as_str()));
        path.is_file().then_some(path)
    }

    fn read_map(path: &Path) -> Result<TileGrid, LevelError> {
        let json = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Using map override {}", path.display());
        TileGrid::from_json(&json)
    }
}
