//! Proximity-gated interactables: dialogue NPCs, terminal puzzles and the
//! packet filter terminal.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::minigame::PacketFilterGame;
use super::queue::Feedback;
use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpcKind {
    Firewall,
    Server,
}

/// Immutable NPC template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcBlueprint {
    pub pos: Vec2,
    pub name: String,
    pub kind: NpcKind,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Npc {
    pub pos: Vec2,
    pub name: String,
    pub kind: NpcKind,
    lines: Vec<String>,
    cursor: usize,
    talked: bool,
}

impl Npc {
    pub fn from_blueprint(bp: &NpcBlueprint) -> Self {
        Self {
            pos: bp.pos,
            name: bp.name.clone(),
            kind: bp.kind,
            lines: bp.lines.clone(),
            cursor: 0,
            talked: false,
        }
    }

    pub fn can_interact(&self, player_pos: Vec2) -> bool {
        player_pos.distance(self.pos) < NPC_RADIUS
    }

    /// Next dialogue line; None once every line has been delivered
    pub fn interact(&mut self) -> Option<&str> {
        let line = self.lines.get(self.cursor)?;
        self.cursor += 1;
        self.talked = true;
        Some(line.as_str())
    }

    pub fn talked(&self) -> bool {
        self.talked
    }

    pub fn remaining(&self) -> usize {
        self.lines.len() - self.cursor
    }
}

/// Immutable terminal puzzle template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuzzleBlueprint {
    pub pos: Vec2,
    pub answer: String,
    pub question: String,
}

#[derive(Debug, Clone)]
pub struct Puzzle {
    pub pos: Vec2,
    pub question: String,
    answer: String,
    solved: bool,
    feedback: Feedback,
}

impl Puzzle {
    pub fn from_blueprint(bp: &PuzzleBlueprint) -> Self {
        Self {
            pos: bp.pos,
            question: bp.question.clone(),
            answer: bp.answer.clone(),
            solved: false,
            feedback: Feedback::default(),
        }
    }

    pub fn can_activate(&self, player_pos: Vec2) -> bool {
        !self.solved && player_pos.distance(self.pos) < PUZZLE_RADIUS
    }

    /// Compare case-insensitively, ignoring surrounding whitespace
    pub fn check_answer(&mut self, answer: &str) -> bool {
        if self.solved {
            return true;
        }
        if answer.trim().to_uppercase() == self.answer.trim().to_uppercase() {
            self.solved = true;
            self.feedback.set("ACCESO CONCEDIDO!", 120.0);
            true
        } else {
            self.feedback.set("ACCESO DENEGADO", 60.0);
            false
        }
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.text()
    }

    pub fn tick(&mut self, dt: f32) {
        self.feedback.tick(dt);
    }
}

/// Keys routed to an open text field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKey {
    Char(char),
    Backspace,
    Enter,
    Escape,
}

/// Single-line uppercase text field
#[derive(Debug, Clone, Default)]
pub struct TextField {
    buffer: String,
    open: bool,
    max_len: usize,
}

impl TextField {
    pub fn new(max_len: usize) -> Self {
        Self {
            buffer: String::new(),
            open: false,
            max_len,
        }
    }

    pub fn open(&mut self) {
        self.open = true;
        self.buffer.clear();
    }

    pub fn close(&mut self) {
        self.open = false;
        self.buffer.clear();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Accept ASCII letters, digits and spaces up to the length limit
    pub fn push(&mut self, c: char) -> bool {
        if !(c.is_ascii_alphanumeric() || c == ' ') || self.buffer.chars().count() >= self.max_len {
            return false;
        }
        self.buffer.push(c.to_ascii_uppercase());
        true
    }

    pub fn backspace(&mut self) {
        self.buffer.pop();
    }
}

/// What a press of the interact key did
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    Dialogue { name: String, line: String },
    TerminalOpened { question: String },
    FilterToggled { active: bool },
}

/// Result of a key routed to the answer field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Accepted,
    Rejected,
    Cancelled,
}

/// All interactables of the current level
#[derive(Debug, Clone)]
pub struct InteractionRegistry {
    pub npcs: Vec<Npc>,
    pub puzzle: Option<Puzzle>,
    pub filter: Option<PacketFilterGame>,
    pub answer: TextField,
}

impl InteractionRegistry {
    pub fn new(npcs: &[NpcBlueprint], puzzle: Option<&PuzzleBlueprint>, filter: Option<Vec2>) -> Self {
        Self {
            npcs: npcs.iter().map(Npc::from_blueprint).collect(),
            puzzle: puzzle.map(Puzzle::from_blueprint),
            filter: filter.map(PacketFilterGame::new),
            answer: TextField::new(ANSWER_MAX_LEN),
        }
    }

    /// Handle the interact key at `player_pos`.
    ///
    /// Only the first NPC in range responds; the terminal and filter are
    /// checked independently.
    pub fn interact(&mut self, player_pos: Vec2) -> Vec<Interaction> {
        let mut out = Vec::new();

        if let Some(npc) = self.npcs.iter_mut().find(|n| n.can_interact(player_pos)) {
            let name = npc.name.clone();
            if let Some(line) = npc.interact() {
                out.push(Interaction::Dialogue {
                    name,
                    line: line.to_string(),
                });
            }
        }

        if let Some(puzzle) = &self.puzzle
            && puzzle.can_activate(player_pos)
        {
            self.answer.open();
            out.push(Interaction::TerminalOpened {
                question: puzzle.question.clone(),
            });
        }

        if let Some(filter) = &mut self.filter
            && filter.can_activate(player_pos)
        {
            let active = filter.toggle();
            out.push(Interaction::FilterToggled { active });
        }

        out
    }

    /// Route a key to the open answer field
    pub fn answer_key(&mut self, key: TextKey) -> Option<AnswerOutcome> {
        if !self.answer.is_open() {
            return None;
        }
        match key {
            TextKey::Char(c) => {
                self.answer.push(c);
                None
            }
            TextKey::Backspace => {
                self.answer.backspace();
                None
            }
            TextKey::Escape => {
                self.answer.close();
                Some(AnswerOutcome::Cancelled)
            }
            TextKey::Enter => {
                if self.answer.text().is_empty() {
                    return None;
                }
                let submitted = self.answer.text().to_string();
                self.answer.close();
                let puzzle = self.puzzle.as_mut()?;
                if puzzle.check_answer(&submitted) {
                    Some(AnswerOutcome::Accepted)
                } else {
                    Some(AnswerOutcome::Rejected)
                }
            }
        }
    }

    /// The exit opens when the level has no terminal or it is solved
    pub fn exit_unlocked(&self) -> bool {
        self.puzzle.as_ref().is_none_or(Puzzle::is_solved)
    }

    pub fn tick(&mut self, dt: f32, rng: &mut impl Rng) {
        if let Some(puzzle) = &mut self.puzzle {
            puzzle.tick(dt);
        }
        if let Some(filter) = &mut self.filter {
            filter.step(dt, rng);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn npc_bp(x: f32) -> NpcBlueprint {
        NpcBlueprint {
            pos: Vec2::new(x, 165.0),
            name: "Firewall Alpha".into(),
            kind: NpcKind::Firewall,
            lines: vec!["uno".into(), "dos".into()],
        }
    }

    fn puzzle_bp() -> PuzzleBlueprint {
        PuzzleBlueprint {
            pos: Vec2::new(650.0, 80.0),
            answer: "FIREWALL".into(),
            question: "Barrera?".into(),
        }
    }

    #[test]
    fn test_npc_cursor_advances_and_exhausts() {
        let mut npc = Npc::from_blueprint(&npc_bp(0.0));
        assert!(!npc.talked());
        assert_eq!(npc.interact(), Some("uno"));
        assert!(npc.talked());
        assert_eq!(npc.interact(), Some("dos"));
        assert_eq!(npc.interact(), None);
        assert_eq!(npc.remaining(), 0);
    }

    #[test]
    fn test_blueprint_is_not_mutated() {
        let bp = npc_bp(0.0);
        let mut a = Npc::from_blueprint(&bp);
        a.interact();
        let b = Npc::from_blueprint(&bp);
        assert_eq!(b.remaining(), 2);
    }

    #[test]
    fn test_puzzle_answer_normalized() {
        let mut puzzle = Puzzle::from_blueprint(&puzzle_bp());
        assert!(!puzzle.check_answer("firewal"));
        assert_eq!(puzzle.feedback(), Some("ACCESO DENEGADO"));
        assert!(puzzle.check_answer("  firewall "));
        assert!(puzzle.is_solved());
        assert_eq!(puzzle.feedback(), Some("ACCESO CONCEDIDO!"));
        assert!(!puzzle.can_activate(Vec2::new(650.0, 80.0)));
    }

    #[test]
    fn test_text_field_filters_input() {
        let mut field = TextField::new(5);
        field.open();
        assert!(field.push('a'));
        assert!(!field.push('!'));
        assert!(field.push(' '));
        assert!(field.push('9'));
        assert!(field.push('b'));
        assert!(field.push('c'));
        assert!(!field.push('d'));
        assert_eq!(field.text(), "A 9BC");
        field.backspace();
        assert_eq!(field.text(), "A 9B");
    }

    #[test]
    fn test_interact_first_npc_only() {
        let mut reg = InteractionRegistry::new(&[npc_bp(100.0), npc_bp(105.0)], None, None);
        let out = reg.interact(Vec2::new(102.0, 165.0));
        assert_eq!(out.len(), 1);
        assert_eq!(reg.npcs[0].remaining(), 1);
        assert_eq!(reg.npcs[1].remaining(), 2);
    }

    #[test]
    fn test_terminal_flow() {
        let mut reg = InteractionRegistry::new(&[], Some(&puzzle_bp()), None);
        assert!(!reg.exit_unlocked());
        let out = reg.interact(Vec2::new(645.0, 70.0));
        assert!(matches!(out.as_slice(), [Interaction::TerminalOpened { .. }]));
        assert!(reg.answer.is_open());

        for c in "wrong".chars() {
            reg.answer_key(TextKey::Char(c));
        }
        assert_eq!(reg.answer_key(TextKey::Enter), Some(AnswerOutcome::Rejected));
        assert!(!reg.answer.is_open());

        reg.interact(Vec2::new(645.0, 70.0));
        assert_eq!(reg.answer_key(TextKey::Enter), None);
        for c in "firewall".chars() {
            reg.answer_key(TextKey::Char(c));
        }
        assert_eq!(reg.answer_key(TextKey::Enter), Some(AnswerOutcome::Accepted));
        assert!(reg.exit_unlocked());
    }

    #[test]
    fn test_escape_cancels_entry() {
        let mut reg = InteractionRegistry::new(&[], Some(&puzzle_bp()), None);
        reg.interact(Vec2::new(650.0, 80.0));
        reg.answer_key(TextKey::Char('x'));
        assert_eq!(reg.answer_key(TextKey::Escape), Some(AnswerOutcome::Cancelled));
        assert!(!reg.answer.is_open());
        assert_eq!(reg.answer_key(TextKey::Char('y')), None);
    }

    #[test]
    fn test_filter_toggle_by_proximity() {
        let mut reg = InteractionRegistry::new(&[], None, Some(Vec2::new(500.0, 165.0)));
        assert_eq!(
            reg.interact(Vec2::new(495.0, 160.0)),
            vec![Interaction::FilterToggled { active: true }]
        );
        assert!(reg.interact(Vec2::new(100.0, 160.0)).is_empty());
        assert_eq!(
            reg.interact(Vec2::new(495.0, 160.0)),
            vec![Interaction::FilterToggled { active: false }]
        );
    }

    #[test]
    fn test_no_puzzle_means_unlocked() {
        let reg = InteractionRegistry::new(&[], None, None);
        assert!(reg.exit_unlocked());
    }
}
